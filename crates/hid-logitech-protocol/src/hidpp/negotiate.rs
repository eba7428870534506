//! HID++ ping negotiation.
//!
//! A device's addressing byte and framing are not known up front. The
//! negotiator pings every combination of candidate device index, id
//! repetition policy and framing tier until one answers:
//!
//! ```text
//! request  [rid?] dev 0x00 0x1n 0x00 0x00 tag     (n = sw_id)
//! reply    rid    dev 0x00 0x1n major minor tag
//! ```
//!
//! Attempts are produced by [`ping_attempts`] in a fixed order so the search
//! can be inspected without a transport.

use fffb_hid_common::{DeviceHandle, HidCommonError, HidTransport, Report};
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::error::{FfbError, FfbResult};
use crate::hidpp::frame::{Framing, HidppMessage, build_request};
use crate::hidpp::session::{ProtocolVersion, SessionContext};
use crate::ids::hidpp;
use crate::poll::{PollDeadline, Verdict, wait_for_reply};

/// Report ids tried for each policy, short before long.
const PING_TIERS: [u8; 2] = [hidpp::REPORT_ID_SHORT, hidpp::REPORT_ID_LONG];
/// Id repetition policies, repeated before bare.
const PING_POLICIES: [bool; 2] = [true, false];

/// One point of the negotiation search space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingAttempt {
    pub device_index: u8,
    pub framing: Framing,
}

impl PingAttempt {
    /// The ping request for this attempt.
    pub fn request(&self, sw_id: u8, tag: u8) -> FfbResult<Report> {
        build_request(
            &self.framing,
            self.device_index,
            hidpp::ROOT_FEATURE_INDEX,
            ping_function(sw_id),
            &[0x00, 0x00, tag],
        )
    }
}

/// Function byte of a ping: root function 1 composed with the software id.
pub fn ping_function(sw_id: u8) -> u8 {
    hidpp::ROOT_PING | (sw_id & 0x0F)
}

/// Every attempt in search order: for each candidate index, id repeated then
/// bare; within each policy, short tier then long tier.
pub fn ping_attempts(candidates: &[u8]) -> impl Iterator<Item = PingAttempt> + '_ {
    candidates.iter().flat_map(|&device_index| {
        PING_POLICIES.into_iter().flat_map(move |id_in_payload| {
            PING_TIERS.into_iter().map(move |report_id| PingAttempt {
                device_index,
                framing: Framing::for_tier(report_id, id_in_payload),
            })
        })
    })
}

/// What negotiation learned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    /// Index the device answered with. May differ from the candidate tried.
    pub device_index: u8,
    /// Framing of the reply, used for every later request.
    pub framing: Framing,
    pub version: ProtocolVersion,
    /// Ping requests written before the match, the matching one included.
    pub attempts: usize,
}

/// Check a normalized message against a ping sent to `device_index`.
///
/// The echoed index may come back as a wildcard (0x00 or 0xFF) whatever was
/// addressed.
pub fn match_ping_reply(
    msg: &HidppMessage,
    device_index: u8,
    sw_id: u8,
    tag: u8,
) -> Option<(u8, ProtocolVersion)> {
    if !msg.is_hidpp() {
        return None;
    }
    let &[_, replied, root, function, major, minor, echoed_tag, ..] = msg.as_bytes() else {
        return None;
    };
    if replied != device_index && replied != 0xFF && replied != 0x00 {
        return None;
    }
    if root != hidpp::ROOT_FEATURE_INDEX || function != ping_function(sw_id) || echoed_tag != tag {
        return None;
    }
    Some((replied, ProtocolVersion { major, minor }))
}

/// Run the ping search and record the outcome in `ctx`.
///
/// A write failure skips to the next attempt. Exhausting every attempt is
/// [`FfbError::NegotiationFailed`].
pub fn negotiate<X: HidTransport + ?Sized>(
    transport: &mut X,
    handle: &DeviceHandle,
    config: &SessionConfig,
    ctx: &mut SessionContext,
) -> FfbResult<Negotiated> {
    let sw_id = ctx.sw_id();
    let tag = config.ping_tag;
    let mut attempts = 0usize;

    for attempt in ping_attempts(&config.candidate_indices) {
        attempts += 1;
        let request = attempt.request(sw_id, tag)?;
        trace!(
            attempt = attempts,
            device_index = attempt.device_index,
            report_id = attempt.framing.report_id,
            id_in_payload = attempt.framing.id_in_payload,
            "hid++ ping"
        );
        match transport.write(handle, &request) {
            Ok(()) => {}
            Err(HidCommonError::Disconnected) => return Err(HidCommonError::Disconnected.into()),
            Err(e) => {
                debug!(attempt = attempts, error = %e, "ping write failed, trying next");
                continue;
            }
        }

        let deadline = PollDeadline::new(config.poll_slice(), config.ping_timeout());
        let found = wait_for_reply(transport, handle, deadline, |msg| {
            match match_ping_reply(msg, attempt.device_index, sw_id, tag) {
                Some((replied, version)) => {
                    Verdict::Accept((replied, version, msg.source_framing()))
                }
                None => Verdict::Ignore,
            }
        })?;

        if let Some((device_index, version, framing)) = found {
            ctx.device_index = device_index;
            ctx.framing = framing;
            ctx.version = Some(version);
            info!(
                device_index,
                report_id = framing.report_id,
                report_len = framing.report_len,
                id_in_payload = framing.id_in_payload,
                version = %format_args!("{}.{}", version.major, version.minor),
                attempts,
                "hid++ negotiated"
            );
            return Ok(Negotiated {
                device_index,
                framing,
                version,
                attempts,
            });
        }
    }

    warn!(attempts, "hid++ negotiation failed");
    Err(FfbError::NegotiationFailed { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_order() {
        let attempts: Vec<_> = ping_attempts(&[0x01, 0xFF]).collect();
        assert_eq!(attempts.len(), 8);
        let shape: Vec<_> = attempts
            .iter()
            .map(|a| (a.device_index, a.framing.report_id, a.framing.id_in_payload))
            .collect();
        assert_eq!(
            shape,
            vec![
                (0x01, 0x10, true),
                (0x01, 0x11, true),
                (0x01, 0x10, false),
                (0x01, 0x11, false),
                (0xFF, 0x10, true),
                (0xFF, 0x11, true),
                (0xFF, 0x10, false),
                (0xFF, 0x11, false),
            ]
        );
    }

    #[test]
    fn test_ping_request_lengths() -> Result<(), Box<dyn std::error::Error>> {
        let lens: Vec<_> = ping_attempts(&[0x01])
            .map(|a| a.request(0x0E, 0xAA).map(|r| r.len()))
            .collect::<Result<_, _>>()?;
        assert_eq!(lens, vec![7, 20, 6, 19]);
        Ok(())
    }

    #[test]
    fn test_ping_request_bytes() -> Result<(), Box<dyn std::error::Error>> {
        let attempt = PingAttempt {
            device_index: 0x03,
            framing: Framing::for_tier(0x10, false),
        };
        let request = attempt.request(0x0E, 0xAA)?;
        assert_eq!(request.report_id(), 0x10);
        assert_eq!(request.as_bytes(), &[0x03, 0x00, 0x1E, 0x00, 0x00, 0xAA]);
        Ok(())
    }

    #[test]
    fn test_match_accepts_wildcard_echo() -> Result<(), Box<dyn std::error::Error>> {
        let reply = Report::input(0x10, &[0x10, 0xFF, 0x00, 0x1E, 0x04, 0x02, 0xAA])?;
        let msg = HidppMessage::normalize(&reply);
        let matched = match_ping_reply(&msg, 0x01, 0x0E, 0xAA);
        assert_eq!(matched, Some((0xFF, ProtocolVersion { major: 4, minor: 2 })));
        Ok(())
    }

    #[test]
    fn test_match_rejects_other_index_tag_and_function() -> Result<(), Box<dyn std::error::Error>> {
        let other_index = Report::input(0x10, &[0x10, 0x02, 0x00, 0x1E, 0x04, 0x02, 0xAA])?;
        let bad_tag = Report::input(0x10, &[0x10, 0x01, 0x00, 0x1E, 0x04, 0x02, 0x55])?;
        let bad_fn = Report::input(0x10, &[0x10, 0x01, 0x00, 0x1F, 0x04, 0x02, 0xAA])?;
        let short = Report::input(0x10, &[0x10, 0x01, 0x00, 0x1E, 0x04])?;
        for report in [other_index, bad_tag, bad_fn, short] {
            let msg = HidppMessage::normalize(&report);
            assert_eq!(match_ping_reply(&msg, 0x01, 0x0E, 0xAA), None);
        }
        Ok(())
    }
}
