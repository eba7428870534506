//! Fixed-capacity HID report representation shared by reads and writes

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{HidCommonError, HidCommonResult};

/// Capacity of a [`Report`] in bytes.
///
/// Eight bytes is enough for the classic wheel dialect, HID++ needs 20 and
/// sometimes 64.
pub const REPORT_MAX_LEN: usize = 64;

/// What kind of HID report this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReportKind {
    #[default]
    Output,
    Input,
    Feature,
}

/// A HID report: report id, kind and up to [`REPORT_MAX_LEN`] payload bytes.
///
/// Only the first [`Report::len`] bytes are meaningful. Bytes past the length
/// are always zero, so growing the length pads with zeros.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Report {
    report_id: u8,
    kind: ReportKind,
    len: usize,
    data: [u8; REPORT_MAX_LEN],
}

impl Report {
    /// An empty report.
    pub const fn new(kind: ReportKind, report_id: u8) -> Self {
        Self {
            report_id,
            kind,
            len: 0,
            data: [0; REPORT_MAX_LEN],
        }
    }

    /// A zero-filled report of `len` bytes.
    pub fn zeroed(kind: ReportKind, report_id: u8, len: usize) -> HidCommonResult<Self> {
        let mut report = Self::new(kind, report_id);
        report.set_len(len)?;
        Ok(report)
    }

    /// Copy `bytes` into a new report, failing if they exceed the capacity.
    pub fn from_bytes(kind: ReportKind, report_id: u8, bytes: &[u8]) -> HidCommonResult<Self> {
        if bytes.len() > REPORT_MAX_LEN {
            return Err(HidCommonError::InvalidReport(format!(
                "{} bytes exceed report capacity of {REPORT_MAX_LEN}",
                bytes.len()
            )));
        }
        Ok(Self::truncated(kind, report_id, bytes))
    }

    /// Copy at most [`REPORT_MAX_LEN`] bytes into a new report.
    ///
    /// Used on the receive path where the platform may hand over more bytes
    /// than the report model keeps.
    pub fn truncated(kind: ReportKind, report_id: u8, bytes: &[u8]) -> Self {
        let mut report = Self::new(kind, report_id);
        for (slot, byte) in report.data.iter_mut().zip(bytes) {
            *slot = *byte;
        }
        report.len = bytes.len().min(REPORT_MAX_LEN);
        report
    }

    /// Convenience constructor for an input report, as delivered by a device.
    pub fn input(report_id: u8, bytes: &[u8]) -> HidCommonResult<Self> {
        Self::from_bytes(ReportKind::Input, report_id, bytes)
    }

    pub fn report_id(&self) -> u8 {
        self.report_id
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        REPORT_MAX_LEN
    }

    /// The meaningful bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.data.get(..self.len).unwrap_or(&[])
    }

    /// Byte at `index`, or `None` past the meaningful length.
    pub fn get(&self, index: usize) -> Option<u8> {
        self.as_bytes().get(index).copied()
    }

    /// Resize the meaningful region. Shrinking zeroes the dropped tail.
    pub fn set_len(&mut self, len: usize) -> HidCommonResult<()> {
        if len > REPORT_MAX_LEN {
            return Err(HidCommonError::InvalidReport(format!(
                "length {len} exceeds report capacity of {REPORT_MAX_LEN}"
            )));
        }
        if let Some(tail) = self.data.get_mut(len..self.len) {
            tail.fill(0);
        }
        self.len = len;
        Ok(())
    }

    /// Overwrite the byte at `index`, which must lie inside the meaningful region.
    pub fn set(&mut self, index: usize, value: u8) -> HidCommonResult<()> {
        match self.data.get_mut(..self.len).and_then(|data| data.get_mut(index)) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(HidCommonError::InvalidReport(format!(
                "index {index} outside report length {}",
                self.len
            ))),
        }
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new(ReportKind::Output, 0)
    }
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Report")
            .field("report_id", &format_args!("0x{:02X}", self.report_id))
            .field("kind", &self.kind)
            .field("bytes", &format_args!("{:02X?}", self.as_bytes()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_keeps_length() -> Result<(), Box<dyn std::error::Error>> {
        let report = Report::from_bytes(ReportKind::Output, 0x11, &[1, 2, 3])?;
        assert_eq!(report.len(), 3);
        assert_eq!(report.as_bytes(), &[1, 2, 3]);
        assert_eq!(report.report_id(), 0x11);
        assert_eq!(report.kind(), ReportKind::Output);
        Ok(())
    }

    #[test]
    fn test_oversized_report_rejected() {
        let bytes = [0u8; REPORT_MAX_LEN + 1];
        let result = Report::from_bytes(ReportKind::Output, 0, &bytes);
        assert!(matches!(result, Err(HidCommonError::InvalidReport(_))));
    }

    #[test]
    fn test_truncated_clamps_to_capacity() {
        let bytes = [0xAB; 80];
        let report = Report::truncated(ReportKind::Input, 0x12, &bytes);
        assert_eq!(report.len(), REPORT_MAX_LEN);
        assert_eq!(report.capacity(), REPORT_MAX_LEN);
    }

    #[test]
    fn test_shrink_then_grow_pads_with_zero() -> Result<(), Box<dyn std::error::Error>> {
        let mut report = Report::from_bytes(ReportKind::Output, 0, &[9, 9, 9, 9])?;
        report.set_len(1)?;
        report.set_len(4)?;
        assert_eq!(report.as_bytes(), &[9, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_set_outside_length_fails() -> Result<(), Box<dyn std::error::Error>> {
        let mut report = Report::zeroed(ReportKind::Output, 0, 2)?;
        report.set(1, 0x7F)?;
        assert_eq!(report.get(1), Some(0x7F));
        assert!(matches!(
            report.set(2, 0x01),
            Err(HidCommonError::InvalidReport(_))
        ));
        assert_eq!(report.get(2), None);
        Ok(())
    }

    #[test]
    fn test_debug_shows_meaningful_bytes_only() -> Result<(), Box<dyn std::error::Error>> {
        let report = Report::from_bytes(ReportKind::Input, 0x10, &[0x10, 0xFF])?;
        let text = format!("{report:?}");
        assert!(text.contains("0x10"));
        assert!(text.contains("[10, FF]"));
        Ok(())
    }
}
