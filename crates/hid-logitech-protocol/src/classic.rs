//! Classic dialect encoding.
//!
//! Every command is one fixed 8-byte output report with report id 0 and no
//! reply. Byte 0 packs the slot mask in the high nibble and the operation in
//! the low nibble; the remaining bytes are operation specific.
//!
//! ```text
//! download constant   [slot<<4|0x0, 0x00, a, a, a, a, 0x00, 0]
//! download spring     [slot<<4|0x0, 0x01, dead_start, dead_end, sr<<4|sl, ir<<4|il, amplitude, 0]
//! download damper     [slot<<4|0x0, 0x02, sl, il, sr, ir, 0x00, 0]
//! download trapezoid  [slot<<4|0x0, 0x06, max, min, t_max, t_min, dx<<4|dy, 0]
//! play / stop         [slots<<4|0x2 / 0x3, 0x00, ...]
//! autocenter on / off [slots<<4|0x4 / 0x5, ...]
//! refresh             download with op nibble 0xC
//! ```

use fffb_hid_common::{Report, ReportKind};

use crate::force::{Force, ForceEffect, SpringParams};
use crate::ids::{classic, slots};

fn report(bytes: &[u8]) -> Report {
    let mut padded = [0u8; classic::REPORT_LEN];
    for (slot, byte) in padded.iter_mut().zip(bytes) {
        *slot = *byte;
    }
    Report::truncated(ReportKind::Output, classic::REPORT_ID, &padded)
}

fn command(slot: u8, op: u8) -> u8 {
    ((slot & 0x0F) << 4) | (op & 0x0F)
}

/// Download (upload and arm) a force into its slot.
pub fn download_report(force: &Force) -> Report {
    encode_force(force, classic::ops::DOWNLOAD)
}

/// Update a playing force in place.
pub fn refresh_report(force: &Force) -> Report {
    encode_force(force, classic::ops::REFRESH)
}

fn encode_force(force: &Force, op: u8) -> Report {
    let cmd = command(force.slot, op);
    match force.effect {
        ForceEffect::Constant(p) => {
            let a = p.amplitude;
            report(&[cmd, classic::effects::CONSTANT, a, a, a, a, 0x00])
        }
        ForceEffect::Spring(p) => {
            let slope_left = p.slope_left & 0b0111;
            let slope_right = p.slope_right & 0b0111;
            let invert_left = p.invert_left & 0b0001;
            let invert_right = p.invert_right & 0b0001;
            report(&[
                cmd,
                classic::effects::SPRING,
                p.dead_start,
                p.dead_end,
                (slope_right << 4) | slope_left,
                (invert_right << 4) | invert_left,
                p.amplitude,
            ])
        }
        ForceEffect::Damper(p) => report(&[
            cmd,
            classic::effects::DAMPER,
            p.slope_left & 0b0111,
            p.invert_left & 0b0001,
            p.slope_right & 0b0111,
            p.invert_right & 0b0001,
            0x00,
        ]),
        ForceEffect::Trapezoid(p) => report(&[
            cmd,
            classic::effects::TRAPEZOID,
            p.amplitude_max,
            p.amplitude_min,
            p.t_at_max,
            p.t_at_min,
            (p.slope_step_x << 4) | p.slope_step_y,
        ]),
    }
}

pub fn play_report(slot_mask: u8) -> Report {
    report(&[command(slot_mask, classic::ops::PLAY), 0x00])
}

pub fn stop_report(slot_mask: u8) -> Report {
    report(&[command(slot_mask, classic::ops::STOP), 0x00])
}

pub fn enable_autocenter_report(slot_mask: u8) -> Report {
    report(&[command(slot_mask, classic::ops::AUTOCENTER_ON)])
}

pub fn disable_autocenter_report(slot_mask: u8) -> Report {
    report(&[command(slot_mask, classic::ops::AUTOCENTER_OFF)])
}

/// Configure the built-in centering spring. Both slopes get their low three
/// bits forced on.
pub fn set_autocenter_report(spring: &SpringParams) -> Report {
    report(&[
        command(slots::AUTOCENTER, classic::ops::SET_AUTOCENTER),
        0x00,
        spring.slope_left | 0b0111,
        spring.slope_right | 0b0111,
        spring.amplitude,
        0x00,
    ])
}

/// Rev-light LEDs, one bit per LED.
pub fn led_pattern_report(pattern: u8) -> Report {
    report(&[classic::EXTENDED, classic::EXT_SET_LEDS, pattern & 0x1F, 0x00])
}

/// Rotation range in degrees, little-endian.
pub fn set_range_report(degrees: u16) -> Report {
    let [lsb, msb] = degrees.to_le_bytes();
    report(&[classic::EXTENDED, classic::EXT_SET_RANGE, lsb, msb])
}

/// Reports to send right after opening a classic device. Empty for products
/// that need no mode switch.
pub fn init_sequence(product_id: u16) -> Vec<Report> {
    if crate::types::needs_mode_switch(product_id) {
        vec![report(&classic::MODE_SWITCH_SEQUENCE)]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::{DamperParams, TrapezoidParams};
    use crate::ids::product_ids;

    #[test]
    fn test_constant_download_layout() {
        let rep = download_report(&Force::constant(0x40));
        assert_eq!(rep.report_id(), 0);
        assert_eq!(rep.kind(), ReportKind::Output);
        assert_eq!(rep.as_bytes(), &[0x10, 0x00, 0x40, 0x40, 0x40, 0x40, 0x00, 0x00]);
    }

    #[test]
    fn test_spring_masks_slopes_and_inverts() {
        let force = Force::spring(SpringParams {
            dead_start: 100,
            dead_end: 150,
            slope_left: 0xFF,
            slope_right: 0x02,
            invert_left: 0x03,
            invert_right: 0x00,
            amplitude: 0x80,
        });
        let rep = download_report(&force);
        assert_eq!(rep.as_bytes(), &[0x30, 0x01, 100, 150, 0x27, 0x01, 0x80, 0x00]);
    }

    #[test]
    fn test_damper_layout() {
        let force = Force::damper(DamperParams {
            slope_left: 5,
            slope_right: 2,
            invert_left: 1,
            invert_right: 0,
        });
        assert_eq!(
            download_report(&force).as_bytes(),
            &[0x40, 0x02, 5, 1, 2, 0, 0, 0]
        );
    }

    #[test]
    fn test_trapezoid_layout() {
        let force = Force::trapezoid(TrapezoidParams {
            amplitude_max: 96,
            amplitude_min: 160,
            t_at_max: 32,
            t_at_min: 32,
            slope_step_x: 6,
            slope_step_y: 6,
        });
        assert_eq!(
            download_report(&force).as_bytes(),
            &[0x80, 0x06, 96, 160, 32, 32, 0x66, 0]
        );
    }

    #[test]
    fn test_refresh_swaps_op_nibble() {
        let rep = refresh_report(&Force::constant(200));
        assert_eq!(rep.get(0), Some(0x1C));
        assert_eq!(rep.get(2), Some(200));
    }

    #[test]
    fn test_slot_commands() {
        assert_eq!(play_report(0x0F).get(0), Some(0xF2));
        assert_eq!(stop_report(0x0F).get(0), Some(0xF3));
        assert_eq!(enable_autocenter_report(0x0F).get(0), Some(0xF4));
        assert_eq!(disable_autocenter_report(0x0F).get(0), Some(0xF5));
        assert_eq!(stop_report(0x01).len(), 8);
    }

    #[test]
    fn test_set_autocenter_forces_low_slope_bits() {
        let rep = set_autocenter_report(&SpringParams {
            slope_left: 0x10,
            slope_right: 0x00,
            amplitude: 0x60,
            ..SpringParams::default()
        });
        assert_eq!(rep.as_bytes(), &[0xFE, 0x00, 0x17, 0x07, 0x60, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_led_pattern_masks_to_five_bits() {
        assert_eq!(
            led_pattern_report(0xFF).as_bytes(),
            &[0xF8, 0x12, 0x1F, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_set_range_little_endian() {
        assert_eq!(
            set_range_report(900).as_bytes(),
            &[0xF8, 0x81, 0x84, 0x03, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_init_sequence_per_product() {
        let seq = init_sequence(product_ids::G29_PS);
        assert_eq!(seq.len(), 1);
        assert_eq!(seq[0].as_bytes(), &[0x30, 0xF8, 0x09, 0x05, 0x01, 0, 0, 0]);
        assert_eq!(init_sequence(product_ids::G923_PS).len(), 1);
        assert!(init_sequence(product_ids::G27).is_empty());
    }
}
