//! HID++ message framing.
//!
//! Devices disagree on whether the report id is repeated as the first payload
//! byte. Outgoing requests follow a [`Framing`] learned during negotiation;
//! incoming reports are normalized so the report id always sits at byte 0:
//!
//! ```text
//! [report_id, device_index, feature_index, function|sw_id, params...]
//! ```

use fffb_hid_common::{REPORT_MAX_LEN, Report, ReportKind};
use serde::{Deserialize, Serialize};

use crate::error::{FfbError, FfbResult};
use crate::ids::hidpp;

/// Bytes between the optional id and the parameters: index, feature, function.
pub const HEADER_LEN: usize = 3;

/// How requests are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Framing {
    pub report_id: u8,
    /// Payload bytes handed to the transport, id byte included when repeated.
    pub report_len: usize,
    /// Whether the payload starts with a copy of the report id.
    pub id_in_payload: bool,
}

impl Framing {
    /// The padded framing of a HID++ tier.
    pub const fn for_tier(report_id: u8, id_in_payload: bool) -> Self {
        let total = hidpp::tier_len(report_id);
        Self {
            report_id,
            report_len: if id_in_payload { total } else { total.saturating_sub(1) },
            id_in_payload,
        }
    }

    /// The very-long tier used when parameters overflow the negotiated one.
    pub const fn very_long(id_in_payload: bool) -> Self {
        Self::for_tier(hidpp::REPORT_ID_VERY_LONG, id_in_payload)
    }

    /// Offset of the device index byte in the payload.
    pub const fn header_offset(&self) -> usize {
        if self.id_in_payload { 1 } else { 0 }
    }

    /// Whether `params_len` parameter bytes fit after the header.
    pub const fn fits(&self, params_len: usize) -> bool {
        let need = self.header_offset() + HEADER_LEN + params_len;
        need <= self.report_len && self.report_len <= REPORT_MAX_LEN
    }

    /// Length on the wire counting the report id once.
    pub const fn total_len(&self) -> usize {
        if self.id_in_payload {
            self.report_len
        } else {
            self.report_len + 1
        }
    }
}

impl Default for Framing {
    /// Very long, id not repeated: what an unnegotiated session assumes.
    fn default() -> Self {
        Self::very_long(false)
    }
}

/// Build a request report padded to the full framing length.
///
/// Parameters that would run past the end are cut off; callers pick a
/// framing that [`Framing::fits`] first.
pub fn build_request(
    framing: &Framing,
    device_index: u8,
    feature_index: u8,
    function: u8,
    params: &[u8],
) -> FfbResult<Report> {
    let mut report = Report::zeroed(ReportKind::Output, framing.report_id, framing.report_len)?;
    let mut offset = 0;
    if framing.id_in_payload {
        report.set(offset, framing.report_id)?;
        offset += 1;
    }
    for byte in [device_index, feature_index, function]
        .into_iter()
        .chain(params.iter().copied())
    {
        if offset >= framing.report_len {
            break;
        }
        report.set(offset, byte)?;
        offset += 1;
    }
    Ok(report)
}

/// An input report normalized so byte 0 is the report id.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct HidppMessage {
    bytes: [u8; REPORT_MAX_LEN + 1],
    len: usize,
    source_report_id: u8,
    source_len: usize,
    id_in_payload: bool,
}

impl HidppMessage {
    /// Normalize a received report.
    ///
    /// A payload that already starts with its own HID++ report id is taken as
    /// is; anything else gets the report id prepended.
    pub fn normalize(report: &Report) -> Self {
        let payload = report.as_bytes();
        let report_id = report.report_id();
        let repeated = payload.first() == Some(&report_id) && hidpp::is_hidpp_report_id(report_id);

        let prefix = if repeated { None } else { Some(report_id) };
        let mut bytes = [0u8; REPORT_MAX_LEN + 1];
        let len = bytes
            .iter_mut()
            .zip(prefix.into_iter().chain(payload.iter().copied()))
            .map(|(slot, byte)| *slot = byte)
            .count();
        Self {
            bytes,
            len,
            source_report_id: report_id,
            source_len: payload.len(),
            id_in_payload: payload.first() == Some(&report_id),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.get(..self.len).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.as_bytes().get(index).copied()
    }

    pub fn report_id(&self) -> u8 {
        self.bytes[0]
    }

    /// Whether byte 0 is one of the HID++ report ids.
    pub fn is_hidpp(&self) -> bool {
        !self.is_empty() && hidpp::is_hidpp_report_id(self.report_id())
    }

    pub fn device_index(&self) -> Option<u8> {
        self.get(1)
    }

    pub fn feature_index(&self) -> Option<u8> {
        self.get(2)
    }

    pub fn function(&self) -> Option<u8> {
        self.get(3)
    }

    /// Bytes after the header.
    pub fn params(&self) -> &[u8] {
        self.as_bytes().get(1 + HEADER_LEN..).unwrap_or(&[])
    }

    /// The framing the device used for this message, as written on the wire.
    pub fn source_framing(&self) -> Framing {
        Framing {
            report_id: self.source_report_id,
            report_len: self.source_len,
            id_in_payload: self.id_in_payload,
        }
    }

    /// Decode a HID++ 2.0 error reply:
    /// `[rid, dev, 0xFF, feature_index, function, code]`.
    pub fn as_error(&self) -> Option<ErrorReply> {
        if !self.is_hidpp() || self.feature_index() != Some(hidpp::ERROR_FEATURE_INDEX) {
            return None;
        }
        let [device_index, _, feature_index, function, code] =
            <[u8; 5]>::try_from(self.as_bytes().get(1..6)?).ok()?;
        Some(ErrorReply {
            device_index,
            feature_index,
            function,
            code,
        })
    }
}

impl core::fmt::Debug for HidppMessage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "HidppMessage({:02X?})", self.as_bytes())
    }
}

/// Fields of a HID++ 2.0 error reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorReply {
    pub device_index: u8,
    /// Feature index of the rejected request.
    pub feature_index: u8,
    /// Function byte of the rejected request.
    pub function: u8,
    pub code: u8,
}

/// Require at least `min` normalized bytes.
pub(crate) fn require_len(msg: &HidppMessage, min: usize) -> FfbResult<()> {
    if msg.len() < min {
        return Err(FfbError::malformed(format!(
            "reply of {} bytes, need {min}: {:02X?}",
            msg.len(),
            msg.as_bytes()
        )));
    }
    Ok(())
}
