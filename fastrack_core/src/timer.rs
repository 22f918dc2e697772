//! Periodic wall-clock ticker.
//!
//! A timer thread sends the current time over a channel once per period
//! until stopped. Stopping disconnects the stop channel and joins the
//! thread, so no tick is produced after `stop` returns.

use chrono::{DateTime, Utc};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct Ticker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl Ticker {
    /// Start ticking every `period`; ticks arrive on the returned receiver
    pub fn spawn(period: Duration) -> (Self, Receiver<DateTime<Utc>>) {
        let (tick_tx, tick_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || loop {
            match stop_rx.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => {
                    if tick_tx.send(Utc::now()).is_err() {
                        // Receiver dropped
                        break;
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        tracing::debug!("Ticker started with period {:?}", period);
        (
            Self {
                stop_tx: Some(stop_tx),
                handle: Some(handle),
                period,
            },
            tick_rx,
        )
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Cancel the ticker and wait for its thread to exit
    pub fn stop(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Ticker thread panicked");
            }
            tracing::debug!("Ticker stopped");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
