//! Runs one batch on its own thread and reports back over a bounded channel.
//!
//! The worker sends zero or more [`TaskMessage::Progress`] messages followed by exactly one
//! terminal message. The output moves to the caller inside [`TaskMessage::Finished`].

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use log::debug;

use crate::batch::{convert_request, BatchRequest};
use crate::entry::BatchOutput;
use crate::error::{Error, Result};

/// Progress messages queued before the worker blocks on a slow receiver.
const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug)]
pub enum TaskMessage {
  Progress { processed: usize },
  Finished(BatchOutput),
  /// Human-readable reason; a failed batch has no partial results.
  Failed(String),
}

pub struct ConversionTask {
  rx: mpsc::Receiver<TaskMessage>,
  handle: Option<JoinHandle<()>>,
}

/// Convert `request` on a background thread with the swash font and tiny-skia surfaces.
pub fn spawn(request: BatchRequest) -> Result<ConversionTask> {
  spawn_job(move |progress| convert_request(&request, progress))
}

/// Run an arbitrary batch closure on a background thread. The closure reports progress through
/// the callback it is handed.
pub fn spawn_job<J>(job: J) -> Result<ConversionTask>
where
  J: FnOnce(&mut dyn FnMut(usize)) -> Result<BatchOutput> + Send + 'static,
{
  let (tx, rx) = mpsc::sync_channel::<TaskMessage>(CHANNEL_CAPACITY);
  let handle = thread::Builder::new()
    .name("inkglyph-convert".into())
    .spawn(move || {
      let progress_tx = tx.clone();
      let mut report = move |processed: usize| {
        // a dropped receiver only loses progress; the batch still runs to completion
        let _ = progress_tx.send(TaskMessage::Progress { processed });
      };
      let terminal = match job(&mut report) {
        Ok(out) => TaskMessage::Finished(out),
        Err(e) => TaskMessage::Failed(e.to_string()),
      };
      if tx.send(terminal).is_err() {
        debug!("conversion result dropped: receiver gone");
      }
    })
    .map_err(Error::Spawn)?;
  Ok(ConversionTask { rx, handle: Some(handle) })
}

impl ConversionTask {
  /// Block for the next message; `None` once the terminal message was consumed.
  pub fn recv(&self) -> Option<TaskMessage> {
    self.rx.recv().ok()
  }

  /// Drain the channel, forwarding progress, and return the terminal outcome.
  pub fn wait(mut self, mut on_progress: impl FnMut(usize)) -> core::result::Result<BatchOutput, String> {
    let outcome = loop {
      match self.rx.recv() {
        Ok(TaskMessage::Progress { processed }) => on_progress(processed),
        Ok(TaskMessage::Finished(out)) => break Ok(out),
        Ok(TaskMessage::Failed(msg)) => break Err(msg),
        Err(_) => break Err("conversion thread exited without a result".to_string()),
      }
    };
    if let Some(handle) = self.handle.take() {
      let _ = handle.join();
    }
    outcome
  }
}

impl Drop for ConversionTask {
  fn drop(&mut self) {
    if let Some(handle) = self.handle.take() {
      // disconnect so a worker blocked on a full channel can finish
      drop(std::mem::replace(&mut self.rx, mpsc::sync_channel(0).1));
      let _ = handle.join();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::batch::convert;
  use crate::options::{ConvertOptions, FirmwareMode};
  use crate::test_support::{FakeFont, FakeSurfaces};

  #[test]
  fn reports_progress_then_finishes() {
    let task = spawn_job(|progress| {
      let mut font = FakeFont::new(1000).with_glyph('A', 1, 600.0, 0.0, Some((0.0, 0.0, 4.0, 4.0)));
      let opts = ConvertOptions::new(12.0, FirmwareMode::Binary);
      convert(&mut font, &mut FakeSurfaces::default(), &['A'; 420], &opts, progress)
    })
    .unwrap();
    let mut seen = Vec::new();
    let out = task.wait(|n| seen.push(n)).unwrap();
    assert_eq!(seen, vec![200, 400]);
    assert_eq!(out.entries.len(), 420);
    assert!(out.is_consistent());
  }

  #[test]
  fn failure_is_one_message() {
    let req = BatchRequest { font_data: vec![0; 8], charset: vec!["A".into()], options: ConvertOptions::default() };
    let task = spawn(req).unwrap();
    match task.recv() {
      Some(TaskMessage::Failed(msg)) => assert!(msg.contains("font"), "{msg}"),
      other => panic!("unexpected {other:?}"),
    }
    assert!(task.recv().is_none());
  }

  #[test]
  fn dropping_the_handle_does_not_hang() {
    let task = spawn_job(|progress| {
      for i in 1..=100 {
        progress(i);
      }
      Ok(BatchOutput::default())
    })
    .unwrap();
    drop(task);
  }
}
