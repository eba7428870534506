//! Force feedback (0x8123) effect lifecycle.
//!
//! Parameter blocks are built by pure functions so they can be checked
//! without a device. [`ForceFeedback`] sends them through a transport and
//! correlates each reply by device index, feature index and function.
//!
//! ```text
//! DOWNLOAD_EFFECT  [handle, type|autostart, 0, 0, 0, 0, level_hi, level_lo, 0 x6]
//!        reply     [handle, ...]
//! SET_EFFECT_STATE [handle, state]
//! DESTROY_EFFECT   [handle]
//! ```

use fffb_hid_common::{DeviceHandle, HidCommonResult, HidTransport, Report, ReportCursor};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::SessionConfig;
use crate::error::{FfbError, FfbResult, HidppErrorCode};
use crate::force::{Force, ForceEffect, amplitude_to_level};
use crate::hidpp::frame::{HidppMessage, build_request, require_len};
use crate::hidpp::session::SessionContext;
use crate::ids::{effect_states, effect_types, ff_functions, slots};
use crate::poll::{PollDeadline, Verdict, wait_for_reply};

pub const DOWNLOAD_PARAMS_LEN: usize = 14;
pub const AUTOCENTER_PARAMS_LEN: usize = 18;

/// A DOWNLOAD_EFFECT parameter block for a continuous effect at `level`.
pub fn download_params(handle: u8, effect_type: u8, level: i16) -> [u8; DOWNLOAD_PARAMS_LEN] {
    let mut params = [0u8; DOWNLOAD_PARAMS_LEN];
    params[0] = handle;
    params[1] = effect_type;
    let [hi, lo] = level.to_be_bytes();
    params[6] = hi;
    params[7] = lo;
    params
}

/// Parameters downloading `force` into `handle` (0 allocates).
///
/// Only constant forces have a HID++ encoding here.
pub fn force_download_params(
    handle: u8,
    force: &Force,
) -> FfbResult<[u8; DOWNLOAD_PARAMS_LEN]> {
    match force.effect {
        ForceEffect::Constant(p) => Ok(download_params(
            handle,
            effect_types::CONSTANT | effect_types::AUTOSTART,
            amplitude_to_level(p.amplitude),
        )),
        _ => Err(FfbError::UnsupportedEffect { kind: force.kind() }),
    }
}

/// A symmetric centering spring. Coefficients and saturations are derived
/// from `magnitude` the way the kernel driver does.
pub fn autocenter_params(handle: u8, magnitude: u16) -> [u8; AUTOCENTER_PARAMS_LEN] {
    let low_byte = |value: u16| value.to_le_bytes()[0];
    let coefficient_hi = low_byte(magnitude >> 11);
    let coefficient_lo = low_byte(magnitude >> 3);
    let saturation_hi = low_byte(magnitude >> 9);
    let saturation_lo = low_byte(magnitude >> 1);

    let mut params = [0u8; AUTOCENTER_PARAMS_LEN];
    params[0] = handle;
    params[1] = effect_types::SPRING | effect_types::AUTOSTART;
    params[6] = saturation_hi;
    params[7] = saturation_lo;
    params[8] = coefficient_hi;
    params[9] = coefficient_lo;
    params[14] = coefficient_hi;
    params[15] = coefficient_lo;
    params[16] = saturation_hi;
    params[17] = saturation_lo;
    params
}

/// Fields of a DOWNLOAD_EFFECT parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadParams {
    pub handle: u8,
    /// Type code with the autostart bit removed.
    pub effect_type: u8,
    pub autostart: bool,
    pub level: i16,
}

pub fn decode_download_params(params: &[u8]) -> FfbResult<DownloadParams> {
    parse_download_params(params).map_err(|e| FfbError::malformed(e.to_string()))
}

fn parse_download_params(params: &[u8]) -> HidCommonResult<DownloadParams> {
    let mut cursor = ReportCursor::new(params);
    let handle = cursor.read_u8()?;
    let type_byte = cursor.read_u8()?;
    cursor.read_bytes(4)?;
    let level = cursor.read_i16_be()?;
    Ok(DownloadParams {
        handle,
        effect_type: type_byte & !effect_types::AUTOSTART,
        autostart: type_byte & effect_types::AUTOSTART != 0,
        level,
    })
}

/// Build a force feedback command for the resolved feature, upgrading to the
/// very-long tier when `params` do not fit the negotiated framing.
pub fn build_command(ctx: &SessionContext, command: u8, params: &[u8]) -> FfbResult<Report> {
    let feature_index = ctx.require_ff_index()?;
    build_request(
        &ctx.command_framing(params.len()),
        ctx.device_index(),
        feature_index,
        command,
        params,
    )
}

fn classify_command_reply(
    msg: &HidppMessage,
    device_index: u8,
    feature_index: u8,
    command: u8,
) -> Verdict<HidppMessage> {
    if !msg.is_hidpp() {
        return Verdict::Ignore;
    }
    if let Some(err) = msg.as_error() {
        if err.device_index == device_index
            && err.feature_index == feature_index
            && err.function & ff_functions::REPLY_MASK == command
        {
            return Verdict::Fail(FfbError::DeviceError {
                command,
                code: HidppErrorCode(err.code),
            });
        }
        return Verdict::Ignore;
    }
    match (msg.device_index(), msg.feature_index(), msg.function()) {
        (Some(dev), Some(feat), Some(function))
            if dev == device_index
                && feat == feature_index
                && function & ff_functions::REPLY_MASK == command =>
        {
            Verdict::Accept(*msg)
        }
        _ => Verdict::Ignore,
    }
}

/// Synchronous force feedback commands against one resolved device.
///
/// Borrows everything for the duration of a call sequence; the
/// [`SessionContext`] is updated as handles are learned and released.
pub struct ForceFeedback<'a, X: HidTransport + ?Sized> {
    transport: &'a mut X,
    handle: &'a DeviceHandle,
    config: &'a SessionConfig,
    ctx: &'a mut SessionContext,
}

impl<'a, X: HidTransport + ?Sized> ForceFeedback<'a, X> {
    pub fn new(
        transport: &'a mut X,
        handle: &'a DeviceHandle,
        config: &'a SessionConfig,
        ctx: &'a mut SessionContext,
    ) -> Self {
        Self {
            transport,
            handle,
            config,
            ctx,
        }
    }

    pub fn context(&self) -> &SessionContext {
        self.ctx
    }

    /// Send `command` and wait for its reply.
    pub fn command(&mut self, command: u8, params: &[u8]) -> FfbResult<HidppMessage> {
        let request = build_command(self.ctx, command, params)?;
        let device_index = self.ctx.device_index();
        let feature_index = self.ctx.ff_feature_index();
        trace!(command, request = ?request.as_bytes(), "hid++ command");
        self.transport.write(self.handle, &request)?;

        let deadline = PollDeadline::new(self.config.poll_slice(), self.config.command_timeout());
        let reply = wait_for_reply(&mut *self.transport, self.handle, deadline, |msg| {
            classify_command_reply(msg, device_index, feature_index, command)
        })?;
        reply.ok_or_else(|| {
            warn!(
                command,
                timeout_ms = self.config.command_timeout_ms,
                "hid++ command timed out"
            );
            FfbError::ReplyTimeout {
                command,
                timeout_ms: self.config.command_timeout_ms,
            }
        })
    }

    /// Download `force`, reusing the handle already learned for its slot.
    /// Returns the handle the slot holds afterwards.
    pub fn download_effect(&mut self, force: &Force) -> FfbResult<u8> {
        let slot = force.slot;
        let current = self.ctx.slots.handle(slot);
        let params = force_download_params(current, force)?;
        let reply = self.command(ff_functions::DOWNLOAD_EFFECT, &params)?;
        let learned = allocated_handle(&reply)?;
        self.ctx.slots.store(slot, learned);
        debug!(slot, sent = current, learned, "effect downloaded");
        Ok(self.ctx.slots.handle(slot))
    }

    /// Set the state of a device effect handle. Handle 0 is a no-op.
    pub fn set_effect_state(&mut self, handle: u8, state: u8) -> FfbResult<()> {
        if handle == 0 {
            return Ok(());
        }
        self.command(ff_functions::SET_EFFECT_STATE, &[handle, state])?;
        Ok(())
    }

    /// Start the effect held by `slot`, if any.
    pub fn play_slot(&mut self, slot: u8) -> FfbResult<()> {
        let handle = self.ctx.slots.handle(slot);
        self.set_effect_state(handle, effect_states::PLAY)
    }

    /// Stop the effect held by `slot`, if any.
    pub fn stop_slot(&mut self, slot: u8) -> FfbResult<()> {
        let handle = self.ctx.slots.handle(slot);
        self.set_effect_state(handle, effect_states::STOP)
    }

    /// Release the device effect held by `slot`. An empty slot is a no-op.
    pub fn destroy_effect(&mut self, slot: u8) -> FfbResult<()> {
        let handle = self.ctx.slots.handle(slot);
        if handle == 0 {
            return Ok(());
        }
        self.command(ff_functions::DESTROY_EFFECT, &[handle])?;
        self.ctx.slots.clear(slot);
        debug!(slot, handle, "effect destroyed");
        Ok(())
    }

    /// Stop and forget every effect on the device.
    pub fn reset_all(&mut self) -> FfbResult<()> {
        self.command(ff_functions::RESET_ALL, &[])?;
        self.ctx.slots.clear_all();
        debug!("all effects reset");
        Ok(())
    }

    /// Download the centering spring at `magnitude`.
    pub fn set_autocenter(&mut self, magnitude: u16) -> FfbResult<()> {
        let current = self.ctx.slots.handle(slots::AUTOCENTER);
        let params = autocenter_params(current, magnitude);
        let reply = self.command(ff_functions::DOWNLOAD_EFFECT, &params)?;
        let learned = allocated_handle(&reply)?;
        self.ctx.slots.store(slots::AUTOCENTER, learned);
        debug!(magnitude, handle = learned, "autocenter set");
        Ok(())
    }

    /// Query the effect capacity and record it in the context.
    pub fn get_info(&mut self) -> FfbResult<u8> {
        let reply = self.command(ff_functions::GET_INFO, &[])?;
        let count = first_param(&reply)?;
        self.ctx.effect_count = Some(count);
        Ok(count)
    }

    /// Rotation range in degrees.
    pub fn set_aperture(&mut self, degrees: u16) -> FfbResult<()> {
        self.command(ff_functions::SET_APERTURE, &degrees.to_be_bytes())?;
        Ok(())
    }

    pub fn set_global_gains(&mut self, gain: u16, boost: u16) -> FfbResult<()> {
        let [g_hi, g_lo] = gain.to_be_bytes();
        let [b_hi, b_lo] = boost.to_be_bytes();
        self.command(ff_functions::SET_GLOBAL_GAINS, &[g_hi, g_lo, b_hi, b_lo])?;
        Ok(())
    }
}

/// Handle returned by a DOWNLOAD_EFFECT reply, 0 when none was assigned.
fn allocated_handle(reply: &HidppMessage) -> FfbResult<u8> {
    first_param(reply)
}

fn first_param(reply: &HidppMessage) -> FfbResult<u8> {
    require_len(reply, 5)?;
    reply
        .params()
        .first()
        .copied()
        .ok_or_else(|| FfbError::malformed(format!("reply without parameters: {reply:?}")))
}
