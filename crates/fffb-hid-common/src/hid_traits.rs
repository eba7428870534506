//! HID transport trait

use std::time::Duration;

use crate::{DeviceHandle, HidCommonResult, HidDeviceInfo, Report};

/// The platform side of a force-feedback session.
///
/// Implementations own device enumeration, open/close, report writes and the
/// asynchronous input path. Every call is synchronous; `read_input` is the only
/// one that blocks, and never for longer than its `timeout`.
pub trait HidTransport {
    /// List attached HID interfaces.
    fn enumerate(&mut self) -> HidCommonResult<Vec<HidDeviceInfo>>;

    /// Open a device. Opening an already open device succeeds.
    fn open(&mut self, handle: &DeviceHandle) -> HidCommonResult<()>;

    /// Close a device. Closing an already closed device succeeds.
    fn close(&mut self, handle: &DeviceHandle) -> HidCommonResult<()>;

    /// Send exactly `report.len()` bytes tagged with the report id and kind.
    fn write(&mut self, handle: &DeviceHandle, report: &Report) -> HidCommonResult<()>;

    /// The most recent unconsumed input report, waiting at most `timeout`.
    fn read_input(
        &mut self,
        handle: &DeviceHandle,
        timeout: Duration,
    ) -> HidCommonResult<Option<Report>>;

    /// Arm asynchronous input delivery. Idempotent.
    fn enable_input_delivery(&mut self, handle: &DeviceHandle) -> HidCommonResult<()>;
}

impl<T: HidTransport + ?Sized> HidTransport for &mut T {
    fn enumerate(&mut self) -> HidCommonResult<Vec<HidDeviceInfo>> {
        (**self).enumerate()
    }

    fn open(&mut self, handle: &DeviceHandle) -> HidCommonResult<()> {
        (**self).open(handle)
    }

    fn close(&mut self, handle: &DeviceHandle) -> HidCommonResult<()> {
        (**self).close(handle)
    }

    fn write(&mut self, handle: &DeviceHandle, report: &Report) -> HidCommonResult<()> {
        (**self).write(handle, report)
    }

    fn read_input(
        &mut self,
        handle: &DeviceHandle,
        timeout: Duration,
    ) -> HidCommonResult<Option<Report>> {
        (**self).read_input(handle, timeout)
    }

    fn enable_input_delivery(&mut self, handle: &DeviceHandle) -> HidCommonResult<()> {
        (**self).enable_input_delivery(handle)
    }
}

impl<T: HidTransport + ?Sized> HidTransport for Box<T> {
    fn enumerate(&mut self) -> HidCommonResult<Vec<HidDeviceInfo>> {
        (**self).enumerate()
    }

    fn open(&mut self, handle: &DeviceHandle) -> HidCommonResult<()> {
        (**self).open(handle)
    }

    fn close(&mut self, handle: &DeviceHandle) -> HidCommonResult<()> {
        (**self).close(handle)
    }

    fn write(&mut self, handle: &DeviceHandle, report: &Report) -> HidCommonResult<()> {
        (**self).write(handle, report)
    }

    fn read_input(
        &mut self,
        handle: &DeviceHandle,
        timeout: Duration,
    ) -> HidCommonResult<Option<Report>> {
        (**self).read_input(handle, timeout)
    }

    fn enable_input_delivery(&mut self, handle: &DeviceHandle) -> HidCommonResult<()> {
        (**self).enable_input_delivery(handle)
    }
}

pub mod mock {
    //! Scripted in-memory transport.
    //!
    //! Clones share state, so a test keeps one handle for inspection while the
    //! session under test owns another. A responder closure sees every written
    //! report and returns the input reports the "device" answers with; they
    //! are delivered one per `read_input` call, in order. An empty read returns
    //! immediately: callers account elapsed time in poll slices, which keeps
    //! timeout paths deterministic and fast.

    use super::*;
    use crate::HidCommonError;
    use parking_lot::Mutex;
    use std::collections::{HashSet, VecDeque};
    use std::sync::Arc;

    type Responder = Box<dyn FnMut(&Report) -> Vec<Report> + Send>;

    #[derive(Default)]
    struct MockState {
        devices: Vec<HidDeviceInfo>,
        open: HashSet<DeviceHandle>,
        input_enabled: HashSet<DeviceHandle>,
        inbox: VecDeque<Report>,
        writes: Vec<Report>,
        responder: Option<Responder>,
        fail_writes: bool,
        fail_open: bool,
        disconnected: bool,
        open_calls: usize,
        close_calls: usize,
        idle_reads: usize,
    }

    #[derive(Clone, Default)]
    pub struct MockTransport {
        state: Arc<Mutex<MockState>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_device(self, info: HidDeviceInfo) -> Self {
            self.add_device(info);
            self
        }

        pub fn add_device(&self, info: HidDeviceInfo) {
            self.state.lock().devices.push(info);
        }

        /// Install the closure that answers written reports.
        pub fn set_responder<F>(&self, responder: F)
        where
            F: FnMut(&Report) -> Vec<Report> + Send + 'static,
        {
            self.state.lock().responder = Some(Box::new(responder));
        }

        /// Queue an input report independently of any write.
        pub fn queue_input(&self, report: Report) {
            self.state.lock().inbox.push_back(report);
        }

        pub fn pending_input(&self) -> usize {
            self.state.lock().inbox.len()
        }

        pub fn fail_writes(&self, fail: bool) {
            self.state.lock().fail_writes = fail;
        }

        pub fn fail_open(&self, fail: bool) {
            self.state.lock().fail_open = fail;
        }

        /// Simulate an unplug: writes and reads on open handles fail with
        /// [`HidCommonError::Disconnected`] until the device is reopened.
        pub fn disconnect(&self) {
            let mut state = self.state.lock();
            state.disconnected = true;
            state.inbox.clear();
        }

        pub fn write_history(&self) -> Vec<Report> {
            self.state.lock().writes.clone()
        }

        pub fn write_count(&self) -> usize {
            self.state.lock().writes.len()
        }

        pub fn clear_write_history(&self) {
            self.state.lock().writes.clear();
        }

        pub fn is_open(&self, handle: &DeviceHandle) -> bool {
            self.state.lock().open.contains(handle)
        }

        pub fn input_enabled(&self, handle: &DeviceHandle) -> bool {
            self.state.lock().input_enabled.contains(handle)
        }

        pub fn open_calls(&self) -> usize {
            self.state.lock().open_calls
        }

        pub fn close_calls(&self) -> usize {
            self.state.lock().close_calls
        }

        /// Reads that found nothing to deliver.
        pub fn idle_reads(&self) -> usize {
            self.state.lock().idle_reads
        }
    }

    fn ensure_open(state: &MockState, handle: &DeviceHandle) -> HidCommonResult<()> {
        if !state.open.contains(handle) {
            return Err(HidCommonError::NotOpen(handle.to_string()));
        }
        if state.disconnected {
            return Err(HidCommonError::Disconnected);
        }
        Ok(())
    }

    impl HidTransport for MockTransport {
        fn enumerate(&mut self) -> HidCommonResult<Vec<HidDeviceInfo>> {
            Ok(self.state.lock().devices.clone())
        }

        fn open(&mut self, handle: &DeviceHandle) -> HidCommonResult<()> {
            let mut state = self.state.lock();
            if state.fail_open {
                return Err(HidCommonError::OpenError(handle.to_string()));
            }
            if !state.devices.iter().any(|d| &d.handle == handle) {
                return Err(HidCommonError::DeviceNotFound(handle.to_string()));
            }
            if state.open.insert(handle.clone()) {
                state.open_calls += 1;
                state.disconnected = false;
            }
            Ok(())
        }

        fn close(&mut self, handle: &DeviceHandle) -> HidCommonResult<()> {
            let mut state = self.state.lock();
            if state.open.remove(handle) {
                state.close_calls += 1;
                state.input_enabled.remove(handle);
                state.inbox.clear();
            }
            Ok(())
        }

        fn write(&mut self, handle: &DeviceHandle, report: &Report) -> HidCommonResult<()> {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            ensure_open(state, handle)?;
            if state.fail_writes {
                return Err(HidCommonError::WriteError(format!(
                    "injected write failure on {handle}"
                )));
            }
            if report.is_empty() {
                return Err(HidCommonError::InvalidReport("empty report".to_string()));
            }
            state.writes.push(*report);
            if let Some(responder) = state.responder.as_mut() {
                state.inbox.extend(responder(report));
            }
            Ok(())
        }

        fn read_input(
            &mut self,
            handle: &DeviceHandle,
            _timeout: Duration,
        ) -> HidCommonResult<Option<Report>> {
            let mut state = self.state.lock();
            ensure_open(&state, handle)?;
            match state.inbox.pop_front() {
                Some(report) => Ok(Some(report)),
                None => {
                    state.idle_reads += 1;
                    Ok(None)
                }
            }
        }

        fn enable_input_delivery(&mut self, handle: &DeviceHandle) -> HidCommonResult<()> {
            let mut state = self.state.lock();
            ensure_open(&state, handle)?;
            state.input_enabled.insert(handle.clone());
            Ok(())
        }
    }
}
