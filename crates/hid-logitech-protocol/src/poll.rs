//! Slice-based reply polling.
//!
//! Every synchronous exchange writes a request and then drains input in fixed
//! slices until a reply matches or the budget runs out. The budget is charged
//! both by wall-clock time and by slices that came back empty, so a transport
//! that returns early on an empty read still times out after
//! `budget / slice` idle polls.

use std::time::{Duration, Instant};

use fffb_hid_common::{DeviceHandle, HidTransport};
use tracing::trace;

use crate::error::{FfbError, FfbResult};
use crate::hidpp::frame::HidppMessage;

#[derive(Debug, Clone, Copy)]
pub struct PollDeadline {
    slice: Duration,
    budget: Duration,
    idle: Duration,
    started: Instant,
}

impl PollDeadline {
    pub fn new(slice: Duration, budget: Duration) -> Self {
        Self {
            slice,
            budget,
            idle: Duration::ZERO,
            started: Instant::now(),
        }
    }

    pub fn slice(&self) -> Duration {
        self.slice
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Charge one empty slice.
    pub fn record_idle(&mut self) {
        self.idle = self.idle.saturating_add(self.slice);
    }

    pub fn expired(&self) -> bool {
        self.idle >= self.budget || self.started.elapsed() >= self.budget
    }
}

/// What to do with one received message.
pub(crate) enum Verdict<T> {
    /// The reply we were waiting for.
    Accept(T),
    /// Unrelated traffic, keep waiting.
    Ignore,
    /// A reply that ends the wait with an error.
    Fail(FfbError),
}

/// Poll until `classify` accepts a message or the deadline expires.
///
/// Returns `Ok(None)` on timeout. Transport read failures are propagated.
pub(crate) fn wait_for_reply<X, T, F>(
    transport: &mut X,
    handle: &DeviceHandle,
    mut deadline: PollDeadline,
    mut classify: F,
) -> FfbResult<Option<T>>
where
    X: HidTransport + ?Sized,
    F: FnMut(&HidppMessage) -> Verdict<T>,
{
    let mut discarded = 0usize;
    while !deadline.expired() {
        let Some(report) = transport.read_input(handle, deadline.slice())? else {
            deadline.record_idle();
            continue;
        };
        let msg = HidppMessage::normalize(&report);
        match classify(&msg) {
            Verdict::Accept(value) => return Ok(Some(value)),
            Verdict::Fail(err) => return Err(err),
            Verdict::Ignore => {
                discarded += 1;
                trace!(message = ?msg, discarded, "discarded unrelated input report");
            }
        }
    }
    Ok(None)
}
