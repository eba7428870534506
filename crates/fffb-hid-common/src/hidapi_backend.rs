//! `hidapi` transport
//!
//! Each open device gets a reader thread that polls `read_timeout` and posts
//! every input report into a [`LatestReportCell`]. Writes share the device
//! behind a mutex with the reader. A read failure ends the reader and marks
//! the device disconnected; every later read or write on it fails with
//! [`HidCommonError::Disconnected`] until it is closed and reopened.

use std::collections::HashMap;
use std::ffi::CString;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hidapi::{HidApi, HidDevice};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{
    DeviceHandle, HidCommonError, HidCommonResult, HidDeviceInfo, HidTransport, LatestReportCell,
    REPORT_MAX_LEN, Report, ReportKind,
};

/// Reader thread poll slice, in milliseconds.
const READER_POLL_MS: i32 = 10;

struct OpenDevice {
    device: Arc<Mutex<HidDevice>>,
    input: Arc<LatestReportCell>,
    running: Arc<AtomicBool>,
    disconnected: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl OpenDevice {
    fn ensure_connected(&self) -> HidCommonResult<()> {
        if self.disconnected.load(Ordering::Acquire) {
            return Err(HidCommonError::Disconnected);
        }
        Ok(())
    }

    fn stop_reader(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                warn!("input reader thread panicked");
            }
        }
    }
}

pub struct HidapiTransport {
    api: HidApi,
    open: HashMap<DeviceHandle, OpenDevice>,
}

impl HidapiTransport {
    pub fn new() -> HidCommonResult<Self> {
        let api = HidApi::new().map_err(|e| HidCommonError::OpenError(e.to_string()))?;
        Ok(Self {
            api,
            open: HashMap::new(),
        })
    }

    fn device(&self, handle: &DeviceHandle) -> HidCommonResult<&OpenDevice> {
        self.open
            .get(handle)
            .ok_or_else(|| HidCommonError::NotOpen(handle.to_string()))
    }
}

impl HidTransport for HidapiTransport {
    fn enumerate(&mut self) -> HidCommonResult<Vec<HidDeviceInfo>> {
        self.api
            .refresh_devices()
            .map_err(|e| HidCommonError::ReadError(e.to_string()))?;
        let devices = self
            .api
            .device_list()
            .map(|info| {
                let mut out = HidDeviceInfo::new(
                    info.vendor_id(),
                    info.product_id(),
                    info.path().to_string_lossy().into_owned(),
                )
                .with_usage(info.usage_page(), info.usage());
                if let Some(manufacturer) = info.manufacturer_string() {
                    out = out.with_manufacturer(manufacturer);
                }
                if let Some(product) = info.product_string() {
                    out = out.with_product_name(product);
                }
                out
            })
            .collect();
        Ok(devices)
    }

    fn open(&mut self, handle: &DeviceHandle) -> HidCommonResult<()> {
        if self.open.contains_key(handle) {
            return Ok(());
        }
        let path = CString::new(handle.as_str())
            .map_err(|e| HidCommonError::OpenError(format!("{handle}: {e}")))?;
        let device = self
            .api
            .open_path(&path)
            .map_err(|e| HidCommonError::OpenError(format!("{handle}: {e}")))?;
        debug!(device = %handle, "opened hid device");
        self.open.insert(
            handle.clone(),
            OpenDevice {
                device: Arc::new(Mutex::new(device)),
                input: Arc::new(LatestReportCell::new()),
                running: Arc::new(AtomicBool::new(false)),
                disconnected: Arc::new(AtomicBool::new(false)),
                reader: None,
            },
        );
        Ok(())
    }

    fn close(&mut self, handle: &DeviceHandle) -> HidCommonResult<()> {
        if let Some(mut dev) = self.open.remove(handle) {
            dev.stop_reader();
            dev.input.clear();
            debug!(device = %handle, "closed hid device");
        }
        Ok(())
    }

    fn write(&mut self, handle: &DeviceHandle, report: &Report) -> HidCommonResult<()> {
        let dev = self.device(handle)?;
        dev.ensure_connected()?;
        if report.is_empty() {
            return Err(HidCommonError::InvalidReport("empty report".to_string()));
        }
        // hidapi takes the report number as the first byte, zero for unnumbered.
        let mut buf = Vec::with_capacity(report.len() + 1);
        buf.push(report.report_id());
        buf.extend_from_slice(report.as_bytes());
        trace!(device = %handle, bytes = ?report.as_bytes(), "hid write");

        let device = dev.device.lock();
        match report.kind() {
            ReportKind::Feature => device
                .send_feature_report(&buf)
                .map_err(|e| HidCommonError::WriteError(e.to_string())),
            ReportKind::Output | ReportKind::Input => match device.write(&buf) {
                Ok(n) if n == buf.len() => Ok(()),
                Ok(n) => Err(HidCommonError::WriteError(format!(
                    "short write: {n} of {} bytes",
                    buf.len()
                ))),
                Err(e) => Err(HidCommonError::WriteError(e.to_string())),
            },
        }
    }

    fn read_input(
        &mut self,
        handle: &DeviceHandle,
        timeout: Duration,
    ) -> HidCommonResult<Option<Report>> {
        self.enable_input_delivery(handle)?;
        let dev = self.device(handle)?;
        dev.ensure_connected()?;
        match dev.input.wait_take(timeout) {
            Some(report) => Ok(Some(report)),
            None => dev.ensure_connected().map(|()| None),
        }
    }

    fn enable_input_delivery(&mut self, handle: &DeviceHandle) -> HidCommonResult<()> {
        let dev = self
            .open
            .get_mut(handle)
            .ok_or_else(|| HidCommonError::NotOpen(handle.to_string()))?;
        dev.ensure_connected()?;
        if dev.reader.is_some() {
            return Ok(());
        }
        dev.running.store(true, Ordering::Release);

        let device = Arc::clone(&dev.device);
        let input = Arc::clone(&dev.input);
        let running = Arc::clone(&dev.running);
        let disconnected = Arc::clone(&dev.disconnected);
        let name = handle.to_string();
        let reader = thread::Builder::new()
            .name(format!("hid-input {name}"))
            .spawn(move || {
                let mut buf = [0u8; REPORT_MAX_LEN];
                while running.load(Ordering::Acquire) {
                    let result = device.lock().read_timeout(&mut buf, READER_POLL_MS);
                    match result {
                        Ok(0) => {}
                        Ok(n) => {
                            let bytes = buf.get(..n).unwrap_or(buf.as_slice());
                            if let Some(&report_id) = bytes.first() {
                                input.post(Report::truncated(ReportKind::Input, report_id, bytes));
                            }
                        }
                        Err(e) => {
                            warn!(device = %name, error = %e, "input reader failed, device disconnected");
                            disconnected.store(true, Ordering::Release);
                            running.store(false, Ordering::Release);
                        }
                    }
                }
            })?;
        dev.reader = Some(reader);
        debug!(device = %handle, "input delivery enabled");
        Ok(())
    }
}

impl Drop for HidapiTransport {
    fn drop(&mut self) {
        for (_, mut dev) in self.open.drain() {
            dev.stop_reader();
        }
    }
}
