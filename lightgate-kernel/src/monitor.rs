//! Status monitor: turns the board's GREEN / RED lines into the readiness flag.
//!
//! The loop runs on a blocking tokio task for the life of the process. Each
//! iteration reads at most one frame, then sleeps for the poll interval, so a
//! flag read by an HTTP handler is never older than one interval plus one
//! read timeout.

use crate::error::GateError;
use crate::serial::LineSource;
use crate::state::Readiness;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Vocabulary understood from the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Green,
    Red,
}

impl Signal {
    /// Expects an already trimmed, upper-cased token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "GREEN" => Some(Signal::Green),
            "RED" => Some(Signal::Red),
            _ => None,
        }
    }

    pub fn is_ready(self) -> bool {
        matches!(self, Signal::Green)
    }
}

/// Decode, trim and upper-case a raw frame.
pub fn normalize_frame(frame: &[u8]) -> Result<String, GateError> {
    let text = std::str::from_utf8(frame)?;
    Ok(text.trim().to_uppercase())
}

pub struct StatusMonitor<S> {
    link: Option<S>,
    readiness: Readiness,
    poll_interval: Duration,
}

impl<S: LineSource> StatusMonitor<S> {
    pub fn new(link: Option<S>, readiness: Readiness, poll_interval: Duration) -> Self {
        Self { link, readiness, poll_interval }
    }

    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    /// One iteration without the sleep. Returns the signal applied, if any.
    pub fn step(&mut self) -> Option<Signal> {
        let link = self.link.as_mut()?;

        let token = match link.read_frame().and_then(|frame| normalize_frame(&frame)) {
            Ok(token) => token,
            Err(e) if e.is_link_lost() => {
                error!(error = %e, "serial link lost, readiness frozen until restart");
                self.link = None;
                return None;
            }
            Err(e) => {
                warn!(error = %e, "serial read error");
                return None;
            }
        };

        let Some(signal) = Signal::parse(&token) else {
            if !token.is_empty() {
                debug!(token = %token, "ignoring unknown token");
            }
            return None;
        };

        self.readiness.set(signal.is_ready());
        match signal {
            Signal::Green => info!("light says GREEN, access allowed"),
            Signal::Red => info!("light says RED, access locked"),
        }
        Some(signal)
    }

    /// Runs until `shutdown` turns true or its sender is dropped.
    pub fn run(mut self, shutdown: watch::Receiver<bool>) {
        loop {
            if shutdown.has_changed().is_err() || *shutdown.borrow() {
                break;
            }
            self.step();
            std::thread::sleep(self.poll_interval);
        }
        debug!("status monitor stopped");
    }
}

/// Handle on the background monitor task.
pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Asks the loop to exit and waits for it. Takes at most one read timeout
    /// plus one poll interval.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "status monitor task failed");
        }
    }
}

pub fn spawn_status_monitor<S: LineSource>(monitor: StatusMonitor<S>) -> MonitorHandle {
    let (shutdown, rx) = watch::channel(false);
    let task = tokio::task::spawn_blocking(move || monitor.run(rx));
    MonitorHandle { shutdown, task }
}
