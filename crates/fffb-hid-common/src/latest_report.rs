//! Single-slot "latest input report" cell
//!
//! Asynchronous input delivery (a platform callback or a reader thread) posts
//! every received report here; the protocol side consumes it. There is no
//! queue: a new arrival overwrites an unconsumed one. Replies are rare relative
//! to the poll granularity so this is normally harmless, but a burst of
//! unrelated input can overwrite a reply before it is observed. The number of
//! overwritten reports is counted so that loss is at least visible.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::Report;

#[derive(Debug, Default)]
struct CellState {
    latest: Option<Report>,
    overwritten: u64,
}

/// Latest-report cell with a ready flag and a timeout-bounded wait.
#[derive(Debug, Default)]
pub struct LatestReportCell {
    state: Mutex<CellState>,
    ready: Condvar,
}

impl LatestReportCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `report`, replacing any unconsumed one, and wake a waiter.
    pub fn post(&self, report: Report) {
        let mut state = self.state.lock();
        if let Some(dropped) = state.latest.replace(report) {
            state.overwritten = state.overwritten.saturating_add(1);
            trace!(dropped = ?dropped, "unconsumed input report overwritten");
        }
        drop(state);
        self.ready.notify_one();
    }

    /// Consume the pending report, if any.
    pub fn take(&self) -> Option<Report> {
        self.state.lock().latest.take()
    }

    /// Whether a report is pending.
    pub fn is_ready(&self) -> bool {
        self.state.lock().latest.is_some()
    }

    /// Consume the pending report, waiting at most `timeout` for one to arrive.
    pub fn wait_take(&self, timeout: Duration) -> Option<Report> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        loop {
            if let Some(report) = state.latest.take() {
                return Some(report);
            }
            let Some(deadline) = deadline else {
                self.ready.wait(&mut state);
                continue;
            };
            if self.ready.wait_until(&mut state, deadline).timed_out() {
                return state.latest.take();
            }
        }
    }

    /// Drop any pending report.
    pub fn clear(&self) {
        self.state.lock().latest = None;
    }

    /// How many reports were overwritten before being consumed.
    pub fn overwritten(&self) -> u64 {
        self.state.lock().overwritten
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn input(byte: u8) -> Result<Report, crate::HidCommonError> {
        Report::input(0x11, &[0x11, byte])
    }

    #[test]
    fn test_post_then_take() -> Result<(), Box<dyn std::error::Error>> {
        let cell = LatestReportCell::new();
        assert!(!cell.is_ready());
        cell.post(input(1)?);
        assert!(cell.is_ready());
        assert_eq!(cell.take(), Some(input(1)?));
        assert_eq!(cell.take(), None);
        Ok(())
    }

    #[test]
    fn test_new_arrival_overwrites_unconsumed() -> Result<(), Box<dyn std::error::Error>> {
        let cell = LatestReportCell::new();
        cell.post(input(1)?);
        cell.post(input(2)?);
        cell.post(input(3)?);
        assert_eq!(cell.take(), Some(input(3)?));
        assert_eq!(cell.overwritten(), 2);
        Ok(())
    }

    #[test]
    fn test_wait_take_times_out_empty() {
        let cell = LatestReportCell::new();
        let start = Instant::now();
        assert_eq!(cell.wait_take(Duration::from_millis(20)), None);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_wait_take_wakes_on_post() -> Result<(), Box<dyn std::error::Error>> {
        let cell = Arc::new(LatestReportCell::new());
        let poster = Arc::clone(&cell);
        let expected = input(7)?;
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            poster.post(expected);
        });
        let got = cell.wait_take(Duration::from_secs(2));
        if handle.join().is_err() {
            return Err("poster thread panicked".into());
        }
        assert_eq!(got, Some(input(7)?));
        Ok(())
    }

    #[test]
    fn test_clear_drops_pending() -> Result<(), Box<dyn std::error::Error>> {
        let cell = LatestReportCell::new();
        cell.post(input(1)?);
        cell.clear();
        assert!(!cell.is_ready());
        assert_eq!(cell.overwritten(), 0);
        Ok(())
    }
}
