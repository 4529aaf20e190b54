//! Progress reporting for long-running mailbox operations.
//!
//! Scans, unsubscribe runs, and deletions block the thread that calls
//! them, typically a worker. Progress flows through a [`ProgressSink`] so a
//! front end can repaint from its own event loop without the engine knowing
//! anything about it. Progress is advisory: no engine behavior depends on
//! what a sink does with an update.

use std::sync::mpsc;

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Human-readable status line.
    pub text: String,
    /// Completion percentage, 0..=100.
    pub percent: u8,
}

/// Receiver of progress notifications, invoked from the worker context.
pub trait ProgressSink {
    fn update(&mut self, text: &str, percent: u8);
}

/// Any closure taking `(text, percent)` is a sink.
impl<F: FnMut(&str, u8)> ProgressSink for F {
    fn update(&mut self, text: &str, percent: u8) {
        self(text, percent)
    }
}

/// Sink that drops every notification.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _text: &str, _percent: u8) {}
}

/// Sink that forwards events over a channel, for front ends that run the
/// engine on a worker thread and consume progress elsewhere.
pub struct ChannelProgress {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelProgress {
    /// Create the sink plus the receiving end for the caller's loop.
    pub fn new() -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgress {
    fn update(&mut self, text: &str, percent: u8) {
        // A departed receiver just means nobody is watching anymore.
        let _ = self.tx.send(ProgressEvent {
            text: text.to_string(),
            percent,
        });
    }
}
