//! One open wheel and the dialect it speaks.
//!
//! [`WheelSession`] owns the transport for the lifetime of the device session.
//! Classic commands are written and forgotten; HID++ commands go through
//! [`ForceFeedback`] and wait for their replies.

use fffb_hid_common::{HidDeviceInfo, HidTransport, Report};
use tracing::{debug, error, info, trace, warn};

use crate::classic;
use crate::config::SessionConfig;
use crate::error::{ErrorSeverity, FfbError, FfbResult};
use crate::force::{Force, SpringParams};
use crate::hidpp::{ForceFeedback, SessionContext, negotiate, resolve_force_feedback};
use crate::ids::{LOGITECH_VENDOR_ID, slots};
use crate::types::{Dialect, LogitechModel, dialect_for, is_wheel_product};

/// Enumerate the Logitech wheel interfaces the transport can see.
pub fn find_wheels<X: HidTransport + ?Sized>(transport: &mut X) -> FfbResult<Vec<HidDeviceInfo>> {
    let wheels: Vec<_> = transport
        .enumerate()?
        .into_iter()
        .filter(|d| {
            d.vendor_id == LOGITECH_VENDOR_ID
                && is_wheel_product(d.product_id)
                && d.is_wheel_interface()
        })
        .collect();
    debug!(count = wheels.len(), "logitech wheels found");
    Ok(wheels)
}

pub struct WheelSession<T: HidTransport> {
    transport: T,
    device: HidDeviceInfo,
    model: LogitechModel,
    dialect: Dialect,
    config: SessionConfig,
    hidpp: Option<SessionContext>,
    open: bool,
    playing: bool,
}

impl<T: HidTransport> WheelSession<T> {
    /// Open `device` and bring it to a known state.
    ///
    /// HID++ wheels are negotiated, their force feedback feature resolved,
    /// every effect reset and the baseline centering spring applied. Classic
    /// wheels get their init sequence. The device is closed again if any step
    /// fails.
    pub fn open(
        mut transport: T,
        device: HidDeviceInfo,
        config: SessionConfig,
    ) -> FfbResult<Self> {
        config.validate()?;
        let dialect = dialect_for(&device);
        if !dialect.is_supported() {
            return Err(FfbError::UnsupportedDevice {
                vendor_id: device.vendor_id,
                product_id: device.product_id,
            });
        }

        transport.open(&device.handle)?;
        let hidpp = (dialect == Dialect::Hidpp).then(|| SessionContext::new(config.sw_id));
        let mut session = Self {
            transport,
            model: LogitechModel::from_product_id(device.product_id),
            device,
            dialect,
            config,
            hidpp,
            open: true,
            playing: false,
        };

        let initialized = session.initialize();
        if let Err(e) = session.observe("open", initialized) {
            session.release();
            return Err(e);
        }
        info!(
            device = %session.device.display_name(),
            device_id = %format_args!("{:08x}", session.device.device_id()),
            model = %session.model,
            dialect = %session.dialect,
            "wheel session open"
        );
        Ok(session)
    }

    fn initialize(&mut self) -> FfbResult<()> {
        self.transport.enable_input_delivery(&self.device.handle)?;
        match self.dialect {
            Dialect::Hidpp => {
                let baseline = self.config.baseline_autocenter;
                let Some(ctx) = self.hidpp.as_mut() else {
                    return Err(FfbError::FeatureNotResolved);
                };
                negotiate(&mut self.transport, &self.device.handle, &self.config, ctx)?;
                resolve_force_feedback(
                    &mut self.transport,
                    &self.device.handle,
                    &self.config,
                    ctx,
                )?;
                let mut ff = ForceFeedback::new(
                    &mut self.transport,
                    &self.device.handle,
                    &self.config,
                    ctx,
                );
                ff.reset_all()?;
                ff.set_autocenter(baseline)
            }
            Dialect::Classic => {
                for report in classic::init_sequence(self.device.product_id) {
                    self.transport.write(&self.device.handle, &report)?;
                }
                Ok(())
            }
            Dialect::Unsupported => Err(FfbError::UnsupportedDevice {
                vendor_id: self.device.vendor_id,
                product_id: self.device.product_id,
            }),
        }
    }

    /// Log a failed operation at a level matching its severity.
    fn observe<R>(&self, operation: &'static str, result: FfbResult<R>) -> FfbResult<R> {
        if let Err(e) = &result {
            let device = self.device.display_name();
            let fatal = e.is_fatal_to_session();
            match e.severity() {
                ErrorSeverity::Critical => {
                    error!(%device, operation, fatal, error = %e, "wheel operation failed");
                }
                ErrorSeverity::Error => {
                    warn!(%device, operation, fatal, error = %e, "wheel operation failed");
                }
                ErrorSeverity::Warning | ErrorSeverity::Info => {
                    debug!(%device, operation, fatal, error = %e, "wheel operation failed");
                }
            }
        }
        result
    }

    fn ensure_open(&self) -> FfbResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(FfbError::SessionClosed)
        }
    }

    fn write(&mut self, operation: &'static str, report: &Report) -> FfbResult<()> {
        trace!(operation, report = ?report.as_bytes(), "classic write");
        let written = self
            .transport
            .write(&self.device.handle, report)
            .map_err(FfbError::from);
        self.observe(operation, written)
    }

    /// Run one HID++ exchange against the resolved force feedback feature.
    fn with_ff<R>(
        &mut self,
        operation: &'static str,
        exchange: impl FnOnce(&mut ForceFeedback<'_, T>) -> FfbResult<R>,
    ) -> FfbResult<R> {
        let result = match self.hidpp.as_mut() {
            Some(ctx) => exchange(&mut ForceFeedback::new(
                &mut self.transport,
                &self.device.handle,
                &self.config,
                ctx,
            )),
            None => Err(FfbError::FeatureNotResolved),
        };
        self.observe(operation, result)
    }

    /// Download one force. Disabled forces are skipped.
    pub fn download_force(&mut self, force: &Force) -> FfbResult<()> {
        self.ensure_open()?;
        if !force.enabled {
            trace!(kind = %force.kind(), "skipping disabled force");
            return Ok(());
        }
        match self.dialect {
            Dialect::Hidpp => self.with_ff("download_force", |ff| {
                ff.download_effect(force).map(|_| ())
            }),
            _ => self.write("download_force", &classic::download_report(force)),
        }
    }

    pub fn download_forces(&mut self, forces: &[Force]) -> FfbResult<()> {
        forces.iter().try_for_each(|force| self.download_force(force))
    }

    /// Update one force in place. HID++ re-downloads it into its handle.
    pub fn refresh_force(&mut self, force: &Force) -> FfbResult<()> {
        self.ensure_open()?;
        if !force.enabled {
            return Ok(());
        }
        match self.dialect {
            Dialect::Hidpp => self.with_ff("refresh_force", |ff| {
                ff.download_effect(force).map(|_| ())
            }),
            _ => self.write("refresh_force", &classic::refresh_report(force)),
        }
    }

    /// Update playing forces. A session that is not playing starts them
    /// instead.
    pub fn refresh_forces(&mut self, forces: &[Force]) -> FfbResult<()> {
        if !self.playing {
            return self.play_forces(forces);
        }
        forces.iter().try_for_each(|force| self.refresh_force(force))
    }

    /// Start every enabled force.
    pub fn play_forces(&mut self, forces: &[Force]) -> FfbResult<()> {
        self.ensure_open()?;
        self.playing = true;
        let mut enabled = forces.iter().filter(|force| force.enabled);
        match self.dialect {
            Dialect::Hidpp => self.with_ff("play_forces", |ff| {
                enabled.try_for_each(|force| ff.play_slot(force.slot))
            }),
            _ => {
                let mask = enabled.fold(0u8, |mask, force| mask | force.slot);
                if mask == 0 {
                    return Ok(());
                }
                self.write("play_forces", &classic::play_report(mask))
            }
        }
    }

    /// Stop everything. HID++ resets all effects and then puts the baseline
    /// centering spring back.
    pub fn stop_forces(&mut self) -> FfbResult<()> {
        self.ensure_open()?;
        self.playing = false;
        match self.dialect {
            Dialect::Hidpp => {
                let baseline = self.config.baseline_autocenter;
                self.with_ff("stop_forces", |ff| {
                    ff.reset_all()?;
                    ff.set_autocenter(baseline)
                })
            }
            _ => self.write("stop_forces", &classic::stop_report(slots::ALL)),
        }
    }

    /// Release the device effect held by `slot`. Classic slots have nothing
    /// to release.
    pub fn destroy_force(&mut self, slot: u8) -> FfbResult<()> {
        self.ensure_open()?;
        match self.dialect {
            Dialect::Hidpp => self.with_ff("destroy_force", |ff| ff.destroy_effect(slot)),
            _ => Ok(()),
        }
    }

    /// Centering spring strength. Zero turns classic autocenter off.
    pub fn set_autocenter(&mut self, magnitude: u16) -> FfbResult<()> {
        self.ensure_open()?;
        match self.dialect {
            Dialect::Hidpp => self.with_ff("set_autocenter", |ff| ff.set_autocenter(magnitude)),
            _ if magnitude == 0 => self.write(
                "set_autocenter",
                &classic::disable_autocenter_report(slots::ALL),
            ),
            _ => self.write(
                "set_autocenter",
                &classic::enable_autocenter_report(slots::ALL),
            ),
        }
    }

    /// Configure the classic centering spring. HID++ maps the amplitude onto
    /// a spring magnitude.
    pub fn set_autocenter_spring(&mut self, spring: &SpringParams) -> FfbResult<()> {
        self.ensure_open()?;
        match self.dialect {
            Dialect::Hidpp => {
                let magnitude = u16::from(spring.amplitude) << 8;
                self.with_ff("set_autocenter_spring", |ff| ff.set_autocenter(magnitude))
            }
            _ => self.write(
                "set_autocenter_spring",
                &classic::set_autocenter_report(spring),
            ),
        }
    }

    pub fn enable_autocenter(&mut self) -> FfbResult<()> {
        self.ensure_open()?;
        match self.dialect {
            Dialect::Hidpp => {
                let baseline = self.config.baseline_autocenter;
                self.with_ff("enable_autocenter", |ff| ff.set_autocenter(baseline))
            }
            _ => self.write(
                "enable_autocenter",
                &classic::enable_autocenter_report(slots::ALL),
            ),
        }
    }

    pub fn disable_autocenter(&mut self) -> FfbResult<()> {
        self.ensure_open()?;
        match self.dialect {
            Dialect::Hidpp => self.with_ff("disable_autocenter", |ff| ff.set_autocenter(0)),
            _ => self.write(
                "disable_autocenter",
                &classic::disable_autocenter_report(slots::ALL),
            ),
        }
    }

    /// Rev-light LEDs. HID++ wheels have none to drive; succeeds silently.
    pub fn set_led_pattern(&mut self, pattern: u8) -> FfbResult<()> {
        self.ensure_open()?;
        match self.dialect {
            Dialect::Hidpp => {
                debug!(pattern, "led pattern ignored on hid++");
                Ok(())
            }
            _ => self.write("set_led_pattern", &classic::led_pattern_report(pattern)),
        }
    }

    /// Rotation range in degrees, capped at what the model can turn.
    pub fn set_range(&mut self, degrees: u16) -> FfbResult<()> {
        self.ensure_open()?;
        let max = self.model.max_rotation_deg();
        if degrees > max {
            debug!(requested = degrees, max, model = %self.model, "range capped");
        }
        let degrees = degrees.min(max);
        match self.dialect {
            Dialect::Hidpp => self.with_ff("set_range", |ff| ff.set_aperture(degrees)),
            _ => self.write("set_range", &classic::set_range_report(degrees)),
        }
    }

    /// Overall force gain. Classic wheels have no gain command here.
    pub fn set_gain(&mut self, gain: u16) -> FfbResult<()> {
        self.ensure_open()?;
        match self.dialect {
            Dialect::Hidpp => self.with_ff("set_gain", |ff| ff.set_global_gains(gain, 0)),
            _ => {
                debug!(gain, "gain ignored on classic");
                Ok(())
            }
        }
    }

    /// Number of effects the device can hold. HID++ only.
    pub fn effect_capacity(&mut self) -> FfbResult<Option<u8>> {
        self.ensure_open()?;
        match self.dialect {
            Dialect::Hidpp => self.with_ff("effect_capacity", |ff| ff.get_info().map(Some)),
            _ => Ok(None),
        }
    }

    /// Stop forces, restore centering when configured, and close the device.
    /// Closing a closed session does nothing.
    pub fn close(&mut self) -> FfbResult<()> {
        if !self.open {
            return Ok(());
        }
        let restored = if self.config.restore_on_close {
            self.stop_forces().and_then(|()| self.enable_autocenter())
        } else {
            Ok(())
        };
        if let Err(e) = &restored {
            warn!(error = %e, "restore on close failed");
        }
        self.open = false;
        self.transport.close(&self.device.handle)?;
        info!(device = %self.device.display_name(), "wheel session closed");
        restored
    }

    /// Close the transport without any traffic.
    fn release(&mut self) {
        self.open = false;
        if let Err(e) = self.transport.close(&self.device.handle) {
            debug!(error = %e, "close after failed init");
        }
    }

    pub fn model(&self) -> LogitechModel {
        self.model
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn device(&self) -> &HidDeviceInfo {
        &self.device
    }

    /// HID++ session state, `None` for classic wheels.
    pub fn context(&self) -> Option<&SessionContext> {
        self.hidpp.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: HidTransport> Drop for WheelSession<T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "wheel session close on drop failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::product_ids;
    use fffb_hid_common::HidCommonError;
    use fffb_hid_common::mock::MockTransport;

    fn classic_device(product_id: u16) -> HidDeviceInfo {
        HidDeviceInfo::new(0x046D, product_id, "/dev/hidraw3")
    }

    #[test]
    fn test_unsupported_vendor_is_rejected() {
        let transport = MockTransport::new();
        let device = HidDeviceInfo::new(0x1234, 0x0001, "/dev/hidraw9");
        let result = WheelSession::open(transport.clone(), device, SessionConfig::default());
        assert!(matches!(result, Err(FfbError::UnsupportedDevice { .. })));
        assert_eq!(transport.open_calls(), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let transport = MockTransport::new().with_device(classic_device(product_ids::G27));
        let config = SessionConfig {
            poll_slice_ms: 0,
            ..SessionConfig::default()
        };
        let result = WheelSession::open(transport, classic_device(product_ids::G27), config);
        assert!(matches!(result, Err(FfbError::InvalidConfig(_))));
    }

    #[test]
    fn test_classic_open_sends_mode_switch() -> Result<(), Box<dyn std::error::Error>> {
        let transport = MockTransport::new().with_device(classic_device(product_ids::G923_PS));
        let session = WheelSession::open(
            transport.clone(),
            classic_device(product_ids::G923_PS),
            SessionConfig::default(),
        )?;
        assert_eq!(session.dialect(), Dialect::Classic);
        assert!(session.context().is_none());
        let writes = transport.write_history();
        assert_eq!(writes.len(), 1);
        assert_eq!(&writes[0].as_bytes()[..5], &[0x30, 0xF8, 0x09, 0x05, 0x01]);
        Ok(())
    }

    #[test]
    fn test_classic_play_skips_disabled_forces() -> Result<(), Box<dyn std::error::Error>> {
        let transport = MockTransport::new().with_device(classic_device(product_ids::G27));
        let mut session = WheelSession::open(
            transport.clone(),
            classic_device(product_ids::G27),
            SessionConfig::default(),
        )?;
        let forces = [Force::constant(200), Force::damper(Default::default())];
        session.play_forces(&forces)?;
        let writes = transport.write_history();
        assert_eq!(writes.last().map(|r| r.as_bytes()[0]), Some(0x12));
        assert!(session.is_playing());
        Ok(())
    }

    #[test]
    fn test_classic_play_without_enabled_forces() -> Result<(), Box<dyn std::error::Error>> {
        let transport = MockTransport::new().with_device(classic_device(product_ids::G27));
        let mut session = WheelSession::open(
            transport.clone(),
            classic_device(product_ids::G27),
            SessionConfig::default(),
        )?;
        session.play_forces(&[Force::constant(200).enabled(false)])?;
        assert_eq!(transport.write_count(), 0);
        Ok(())
    }

    #[test]
    fn test_classic_destroy_of_no_slot_sends_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let transport = MockTransport::new().with_device(classic_device(product_ids::G27));
        let mut session = WheelSession::open(
            transport.clone(),
            classic_device(product_ids::G27),
            SessionConfig::default(),
        )?;
        session.download_force(&Force::constant(200))?;
        let before = transport.write_count();
        session.destroy_force(0)?;
        assert_eq!(transport.write_count(), before);
        assert!(session.is_open());
        Ok(())
    }

    #[test]
    fn test_classic_unplug_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let transport = MockTransport::new().with_device(classic_device(product_ids::G27));
        let mut session = WheelSession::open(
            transport.clone(),
            classic_device(product_ids::G27),
            SessionConfig::default(),
        )?;
        transport.disconnect();

        let err = match session.download_force(&Force::constant(90)) {
            Err(err) => err,
            Ok(()) => return Err("download on an unplugged wheel succeeded".into()),
        };
        assert!(matches!(err, FfbError::Transport(HidCommonError::Disconnected)));
        assert!(err.is_fatal_to_session());
        assert!(!err.is_retryable());
        assert_eq!(transport.write_count(), 0);
        Ok(())
    }

    #[test]
    fn test_range_is_capped_at_model_maximum() -> Result<(), Box<dyn std::error::Error>> {
        let transport = MockTransport::new().with_device(classic_device(product_ids::G27));
        let mut session = WheelSession::open(
            transport.clone(),
            classic_device(product_ids::G27),
            SessionConfig::default(),
        )?;
        assert_eq!(session.model(), LogitechModel::G27);
        session.set_range(1080)?;
        session.set_range(540)?;
        let writes = transport.write_history();
        let ranges: Vec<&[u8]> = writes.iter().map(|r| r.as_bytes()).collect();
        assert_eq!(
            ranges,
            vec![
                &[0xF8, 0x81, 0x84, 0x03, 0, 0, 0, 0][..],
                &[0xF8, 0x81, 0x1C, 0x02, 0, 0, 0, 0][..],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_find_wheels_keeps_logitech_joystick_interfaces()
    -> Result<(), Box<dyn std::error::Error>> {
        let mut transport = MockTransport::new()
            .with_device(classic_device(product_ids::G27))
            .with_device(
                HidDeviceInfo::new(0x046D, product_ids::G920, "/dev/hidraw4")
                    .with_usage(0xFF43, 0x0602),
            )
            .with_device(HidDeviceInfo::new(0x046D, 0xC52B, "/dev/hidraw5"))
            .with_device(HidDeviceInfo::new(0x0EB7, 0x0001, "/dev/hidraw6"));
        let wheels = find_wheels(&mut transport)?;
        assert_eq!(wheels.len(), 1);
        assert_eq!(wheels[0].product_id, product_ids::G27);
        Ok(())
    }

    #[test]
    fn test_operations_after_close_fail() -> Result<(), Box<dyn std::error::Error>> {
        let transport = MockTransport::new().with_device(classic_device(product_ids::G27));
        let mut session = WheelSession::open(
            transport.clone(),
            classic_device(product_ids::G27),
            SessionConfig::default(),
        )?;
        session.close()?;
        assert!(!session.is_open());
        assert!(matches!(
            session.download_force(&Force::constant(10)),
            Err(FfbError::SessionClosed)
        ));
        let before = transport.write_count();
        session.close()?;
        assert_eq!(transport.write_count(), before);
        assert_eq!(transport.close_calls(), 1);
        Ok(())
    }
}
