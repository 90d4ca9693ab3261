//! Progress events from the crawl engine to an observer
//!
//! Events travel over an unbounded FIFO channel: the observer receives them in
//! exactly the order the engine produced them, and nothing is dropped while the
//! receiving half is alive. A run always ends with a single [`Event::Done`].

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Receiving half of the event channel
pub type EventReceiver = UnboundedReceiver<Event>;

/// A notification from the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Human readable log line
    Log(String),

    /// Short status text describing the current step
    Status(String),

    /// Page progress; `total` is `None` for an unbounded run
    Progress { done: u32, total: Option<u32> },

    /// Terminal event, always the last one of a run
    Done { success: bool, summary: String },
}

impl Event {
    /// Returns true for the terminal event
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    /// Completed fraction in `0.0..=1.0` for determinate progress events
    pub fn fraction(&self) -> Option<f64> {
        match self {
            Self::Progress {
                done,
                total: Some(total),
            } if *total > 0 => Some((*done as f64 / *total as f64).min(1.0)),
            _ => None,
        }
    }
}

/// Creates a connected emitter/receiver pair
pub fn channel() -> (EventEmitter, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventEmitter { tx }, rx)
}

/// Producing half of the event channel, owned by the crawl worker
///
/// Sending never blocks. If the observer has gone away, events are discarded.
#[derive(Debug)]
pub struct EventEmitter {
    tx: UnboundedSender<Event>,
}

impl EventEmitter {
    /// Sends a log line
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(target: "spacebar_scraper::events", "{}", message);
        self.send(Event::Log(message));
    }

    /// Sends a status update
    pub fn status(&self, message: impl Into<String>) {
        self.send(Event::Status(message.into()));
    }

    /// Sends a progress update
    pub fn progress(&self, done: u32, total: Option<u32>) {
        self.send(Event::Progress { done, total });
    }

    /// Sends the terminal event
    ///
    /// Consumes the emitter, so nothing can be sent after it.
    pub fn finish(self, success: bool, summary: impl Into<String>) {
        self.send(Event::Done {
            success,
            summary: summary.into(),
        });
    }

    fn send(&self, event: Event) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Event observer dropped; discarding event");
        }
    }
}
