//! Virtual G920 for integration tests.
//!
//! `VirtualG920` is a responder for [`MockTransport::set_responder`]. It only
//! answers pings on the report tier and id policy it is configured for, hands
//! out effect handles in allocation order, and can be told to stay silent,
//! reject a function, bury replies under unrelated input, or answer on a
//! different report tier than the request used.

use fffb_hid_common::mock::MockTransport;
use fffb_hid_common::{DeviceHandle, HidDeviceInfo, Report, ReportKind};
use fffb_hid_logitech_protocol::ids::{ff_functions, hidpp, product_ids};

pub const G920_PATH: &str = "/dev/hidraw7";

pub fn g920_info() -> HidDeviceInfo {
    HidDeviceInfo::new(0x046D, product_ids::G920, G920_PATH).with_product_name("G920 Driving Force")
}

pub fn g920_handle() -> DeviceHandle {
    DeviceHandle::new(G920_PATH)
}

/// Request bytes with the report id at byte 0.
pub fn normalized(report: &Report) -> Vec<u8> {
    let bytes = report.as_bytes();
    if bytes.first() == Some(&report.report_id()) && hidpp::is_hidpp_report_id(report.report_id())
    {
        bytes.to_vec()
    } else {
        let mut out = Vec::with_capacity(bytes.len() + 1);
        out.push(report.report_id());
        out.extend_from_slice(bytes);
        out
    }
}

/// Parameters of a written HID++ request, after the header.
pub fn request_params(report: &Report) -> Vec<u8> {
    normalized(report).get(4..).map(<[u8]>::to_vec).unwrap_or_default()
}

/// Function byte of a written HID++ request.
pub fn request_function(report: &Report) -> Option<u8> {
    normalized(report).get(3).copied()
}

/// Feature index byte of a written HID++ request.
pub fn request_feature(report: &Report) -> Option<u8> {
    normalized(report).get(2).copied()
}

/// Behaviour of the virtual wheel.
#[derive(Debug, Clone)]
pub struct VirtualG920 {
    /// Index the wheel answers on.
    pub device_index: u8,
    /// Report id pings must arrive on to be answered.
    pub report_id: u8,
    /// Whether pings must repeat their report id to be answered.
    pub id_in_payload: bool,
    /// Report id of every reply. `None` answers on `report_id`.
    pub reply_report_id: Option<u8>,
    /// Replies repeat their report id as the first payload byte.
    pub reply_repeats_id: bool,
    pub ff_index: u8,
    /// Unrelated input reports queued ahead of every reply.
    pub noise: usize,
    /// Force feedback functions left unanswered.
    pub silent: Vec<u8>,
    /// Force feedback functions answered with an error reply of this code.
    pub reject: Option<(u8, u8)>,
    /// Reply function bytes get the high bit set.
    pub mark_replies: bool,
    pub effect_capacity: u8,
}

impl Default for VirtualG920 {
    fn default() -> Self {
        Self {
            device_index: 0x03,
            report_id: hidpp::REPORT_ID_LONG,
            id_in_payload: false,
            reply_report_id: None,
            reply_repeats_id: false,
            ff_index: 0x0B,
            noise: 0,
            silent: Vec::new(),
            reject: None,
            mark_replies: false,
            effect_capacity: 16,
        }
    }
}

impl VirtualG920 {
    /// A wheel that takes pings on `report_id` but answers everything on the
    /// very-long tier.
    pub fn answering_very_long(report_id: u8, reply_repeats_id: bool) -> Self {
        Self {
            report_id,
            reply_report_id: Some(hidpp::REPORT_ID_VERY_LONG),
            reply_repeats_id,
            ..Self::default()
        }
    }

    fn reply(&self, body: &[u8]) -> Report {
        let report_id = self.reply_report_id.unwrap_or(self.report_id);
        let total = hidpp::tier_len(report_id);
        let mut bytes = Vec::with_capacity(total);
        if self.reply_repeats_id {
            bytes.push(report_id);
        }
        bytes.extend_from_slice(body);
        // The id byte counts towards the tier length whether or not it is repeated.
        bytes.resize(total.saturating_sub(usize::from(!self.reply_repeats_id)), 0);
        Report::truncated(ReportKind::Input, report_id, &bytes)
    }

    fn noise_reports(&self) -> Vec<Report> {
        (0..self.noise)
            .map(|i| {
                let seq = u8::try_from(i).unwrap_or(0xFF);
                Report::truncated(ReportKind::Input, 0x01, &[0x01, 0x80, 0x00, seq])
            })
            .collect()
    }

    /// A responder for [`MockTransport::set_responder`].
    pub fn responder(self) -> impl FnMut(&Report) -> Vec<Report> + Send + 'static {
        let mut next_handle = 1u8;
        move |report: &Report| {
            let msg = normalized(report);
            let (Some(&dev), Some(&feature), Some(&function)) = (msg.get(1), msg.get(2), msg.get(3))
            else {
                return Vec::new();
            };
            if !hidpp::is_hidpp_report_id(report.report_id()) {
                return Vec::new();
            }
            let params = msg.get(4..).unwrap_or(&[]).to_vec();
            let param = |i: usize| params.get(i).copied().unwrap_or(0);

            let mut out = Vec::new();
            if feature == hidpp::ROOT_FEATURE_INDEX && function & 0xF0 == hidpp::ROOT_PING {
                let repeated = report.as_bytes().first() == Some(&report.report_id());
                if dev != self.device_index
                    || report.report_id() != self.report_id
                    || repeated != self.id_in_payload
                {
                    return out;
                }
                out.extend(self.noise_reports());
                out.push(self.reply(&[self.device_index, 0x00, function, 0x04, 0x02, param(2)]));
                return out;
            }
            if dev != self.device_index {
                return out;
            }
            if feature == hidpp::ROOT_FEATURE_INDEX {
                let id = u16::from_be_bytes([param(0), param(1)]);
                out.extend(self.noise_reports());
                if id == hidpp::FEATURE_FORCE_FEEDBACK {
                    out.push(self.reply(&[dev, 0x00, function, self.ff_index, 0x00, 0x00]));
                } else {
                    out.push(self.reply(&[dev, 0xFF, 0x00, function, 0x09]));
                }
                return out;
            }
            if feature != self.ff_index || self.silent.contains(&function) {
                return out;
            }
            out.extend(self.noise_reports());
            if let Some((rejected, code)) = self.reject {
                if rejected == function {
                    out.push(self.reply(&[dev, 0xFF, feature, function, code]));
                    return out;
                }
            }
            let reply_fn = if self.mark_replies { function | 0x80 } else { function };
            let first = match function {
                ff_functions::DOWNLOAD_EFFECT => match param(0) {
                    0 => {
                        let handle = next_handle;
                        next_handle = next_handle.wrapping_add(1);
                        handle
                    }
                    requested => requested,
                },
                ff_functions::GET_INFO => self.effect_capacity,
                _ => 0x00,
            };
            out.push(self.reply(&[dev, feature, reply_fn, first]));
            out
        }
    }

    /// A mock transport that knows the G920 and answers as this wheel.
    pub fn transport(self) -> MockTransport {
        let transport = MockTransport::new().with_device(g920_info());
        transport.set_responder(self.responder());
        transport
    }
}
