//! Common HID plumbing for force-feedback protocol engines
//!
//! This crate owns the boundary between a protocol engine and the platform:
//! the fixed-capacity [`Report`] model, device identity, the [`HidTransport`]
//! trait, and the single-slot [`LatestReportCell`] that asynchronous input
//! delivery writes into. Protocol crates depend only on the trait, so every
//! protocol path can be exercised against [`mock::MockTransport`].

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod device_info;
pub mod hid_traits;
pub mod latest_report;
pub mod report;
pub mod report_parser;

#[cfg(feature = "hidapi")]
pub mod hidapi_backend;

pub use device_info::*;
pub use hid_traits::*;
pub use latest_report::LatestReportCell;
pub use report::{REPORT_MAX_LEN, Report, ReportKind};
pub use report_parser::ReportCursor;

#[cfg(feature = "hidapi")]
pub use hidapi_backend::HidapiTransport;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HidCommonError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to open device: {0}")]
    OpenError(String),

    #[error("Failed to read from device: {0}")]
    ReadError(String),

    #[error("Failed to write to device: {0}")]
    WriteError(String),

    #[error("Invalid report format: {0}")]
    InvalidReport(String),

    #[error("Device not open: {0}")]
    NotOpen(String),

    #[error("Device disconnected")]
    Disconnected,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type HidCommonResult<T> = Result<T, HidCommonError>;
