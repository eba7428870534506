//! Feature directory lookups through the root feature.

use fffb_hid_common::{DeviceHandle, HidCommonError, HidTransport, Report};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{FfbError, FfbResult, HidppErrorCode};
use crate::hidpp::frame::{HidppMessage, build_request};
use crate::hidpp::session::{SessionContext, is_valid_feature_index};
use crate::ids::hidpp;
use crate::poll::{PollDeadline, Verdict, wait_for_reply};

/// Where a feature lives in the device's feature table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub index: u8,
    pub feature_type: u8,
}

/// Root function 0 composed with the software id.
pub fn get_feature_function(sw_id: u8) -> u8 {
    hidpp::ROOT_GET_FEATURE | (sw_id & 0x0F)
}

/// The root get-feature request for `feature_id` under one id policy.
pub fn feature_request(
    ctx: &SessionContext,
    feature_id: u16,
    id_in_payload: bool,
) -> FfbResult<Report> {
    let [hi, lo] = feature_id.to_be_bytes();
    build_request(
        &ctx.root_framing(id_in_payload),
        ctx.device_index(),
        hidpp::ROOT_FEATURE_INDEX,
        get_feature_function(ctx.sw_id()),
        &[hi, lo, 0x00],
    )
}

fn classify_feature_reply(
    msg: &HidppMessage,
    device_index: u8,
    function: u8,
) -> Verdict<FeatureInfo> {
    if !msg.is_hidpp() {
        return Verdict::Ignore;
    }
    if let Some(err) = msg.as_error() {
        if err.device_index == device_index
            && err.feature_index == hidpp::ROOT_FEATURE_INDEX
            && err.function == function
        {
            return Verdict::Fail(FfbError::DeviceError {
                command: function,
                code: HidppErrorCode(err.code),
            });
        }
        return Verdict::Ignore;
    }
    // Normalized replies carry the header plus index, type and one reserved byte.
    let &[_, replied, root, replied_fn, index, feature_type, _, ..] = msg.as_bytes() else {
        return Verdict::Ignore;
    };
    if replied != device_index || root != hidpp::ROOT_FEATURE_INDEX || replied_fn != function {
        return Verdict::Ignore;
    }
    // An unusable index is not an answer; keep listening until the deadline.
    if !is_valid_feature_index(index) {
        return Verdict::Ignore;
    }
    Verdict::Accept(FeatureInfo {
        index,
        feature_type,
    })
}

/// Look up `feature_id`, trying the id-repeated policy first, then bare.
///
/// A device error reply ends the current policy early. Running out of
/// policies is [`FfbError::FeatureNotFound`].
pub fn resolve_feature<X: HidTransport + ?Sized>(
    transport: &mut X,
    handle: &DeviceHandle,
    config: &SessionConfig,
    ctx: &SessionContext,
    feature_id: u16,
) -> FfbResult<FeatureInfo> {
    let device_index = ctx.device_index();
    let function = get_feature_function(ctx.sw_id());

    for id_in_payload in [true, false] {
        let request = feature_request(ctx, feature_id, id_in_payload)?;
        match transport.write(handle, &request) {
            Ok(()) => {}
            Err(HidCommonError::Disconnected) => return Err(HidCommonError::Disconnected.into()),
            Err(e) => {
                debug!(feature_id, id_in_payload, error = %e, "feature lookup write failed");
                continue;
            }
        }
        let deadline = PollDeadline::new(config.poll_slice(), config.feature_timeout());
        match wait_for_reply(transport, handle, deadline, |msg| {
            classify_feature_reply(msg, device_index, function)
        }) {
            Ok(Some(found)) => {
                debug!(
                    feature_id,
                    index = found.index,
                    feature_type = found.feature_type,
                    "feature resolved"
                );
                return Ok(found);
            }
            Ok(None) => {
                debug!(feature_id, id_in_payload, "no feature reply");
            }
            Err(FfbError::DeviceError { code, .. }) => {
                debug!(feature_id, id_in_payload, %code, "feature lookup rejected");
            }
            Err(e) => return Err(e),
        }
    }

    warn!(feature_id, "feature not found");
    Err(FfbError::FeatureNotFound { feature_id })
}

/// Resolve the force feedback feature and record it in `ctx`.
pub fn resolve_force_feedback<X: HidTransport + ?Sized>(
    transport: &mut X,
    handle: &DeviceHandle,
    config: &SessionConfig,
    ctx: &mut SessionContext,
) -> FfbResult<FeatureInfo> {
    let info = resolve_feature(transport, handle, config, ctx, hidpp::FEATURE_FORCE_FEEDBACK)?;
    ctx.ff_feature_index = info.index;
    ctx.ff_feature_type = info.feature_type;
    info!(
        index = info.index,
        feature_type = info.feature_type,
        "force feedback feature ready"
    );
    Ok(info)
}
