//! Force descriptions shared by both dialects.
//!
//! A [`Force`] pairs a logical slot and an enabled flag with one of four
//! effect payloads. Every payload fits the seven bytes a classic report has
//! after its command byte.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::slots;

/// Amplitude that produces no force.
pub const NEUTRAL_AMPLITUDE: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceKind {
    Constant,
    Spring,
    Damper,
    Trapezoid,
}

impl ForceKind {
    /// Logical slot mask the kind occupies by default.
    pub fn default_slot(self) -> u8 {
        match self {
            Self::Constant => slots::CONSTANT,
            Self::Spring => slots::SPRING,
            Self::Damper => slots::DAMPER,
            Self::Trapezoid => slots::TRAPEZOID,
        }
    }
}

impl fmt::Display for ForceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Constant => "constant",
            Self::Spring => "spring",
            Self::Damper => "damper",
            Self::Trapezoid => "trapezoid",
        })
    }
}

/// Constant force. `amplitude` 0..=255 with 128 neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantParams {
    pub amplitude: u8,
}

impl Default for ConstantParams {
    fn default() -> Self {
        Self {
            amplitude: NEUTRAL_AMPLITUDE,
        }
    }
}

/// Spring around a dead band. Slopes are 3-bit, inverts 1-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpringParams {
    pub dead_start: u8,
    pub dead_end: u8,
    pub slope_left: u8,
    pub slope_right: u8,
    pub invert_left: u8,
    pub invert_right: u8,
    pub amplitude: u8,
}

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            dead_start: 127,
            dead_end: 128,
            slope_left: 3,
            slope_right: 3,
            invert_left: 0,
            invert_right: 0,
            amplitude: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamperParams {
    pub slope_left: u8,
    pub slope_right: u8,
    pub invert_left: u8,
    pub invert_right: u8,
}

/// Periodic force alternating between two amplitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapezoidParams {
    pub amplitude_max: u8,
    pub amplitude_min: u8,
    pub t_at_max: u8,
    pub t_at_min: u8,
    pub slope_step_x: u8,
    pub slope_step_y: u8,
}

impl Default for TrapezoidParams {
    fn default() -> Self {
        Self {
            amplitude_max: 127,
            amplitude_min: 128,
            t_at_max: 0,
            t_at_min: 0,
            slope_step_x: 0,
            slope_step_y: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForceEffect {
    Constant(ConstantParams),
    Spring(SpringParams),
    Damper(DamperParams),
    Trapezoid(TrapezoidParams),
}

impl ForceEffect {
    pub fn kind(&self) -> ForceKind {
        match self {
            Self::Constant(_) => ForceKind::Constant,
            Self::Spring(_) => ForceKind::Spring,
            Self::Damper(_) => ForceKind::Damper,
            Self::Trapezoid(_) => ForceKind::Trapezoid,
        }
    }
}

/// A force bound to a logical slot.
///
/// The classic dialect sends `slot` on the wire. HID++ uses it only as the
/// key under which the device-assigned effect handle is remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Force {
    pub slot: u8,
    pub enabled: bool,
    pub effect: ForceEffect,
}

impl Force {
    /// A disabled force of `effect`'s kind in that kind's default slot.
    pub fn new(effect: ForceEffect) -> Self {
        Self {
            slot: effect.kind().default_slot(),
            enabled: false,
            effect,
        }
    }

    /// An enabled constant force.
    pub fn constant(amplitude: u8) -> Self {
        Self::new(ForceEffect::Constant(ConstantParams { amplitude })).enabled(true)
    }

    pub fn spring(params: SpringParams) -> Self {
        Self::new(ForceEffect::Spring(params))
    }

    pub fn damper(params: DamperParams) -> Self {
        Self::new(ForceEffect::Damper(params))
    }

    pub fn trapezoid(params: TrapezoidParams) -> Self {
        Self::new(ForceEffect::Trapezoid(params))
    }

    pub fn with_slot(mut self, slot: u8) -> Self {
        self.slot = slot & 0x0F;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn kind(&self) -> ForceKind {
        self.effect.kind()
    }
}

impl Default for Force {
    fn default() -> Self {
        Self::new(ForceEffect::Constant(ConstantParams::default()))
    }
}

/// The four default forces, all disabled, one per kind.
pub fn default_forces() -> [Force; 4] {
    [
        Force::default(),
        Force::spring(SpringParams::default()),
        Force::damper(DamperParams::default()),
        Force::trapezoid(TrapezoidParams::default()),
    ]
}

/// Map an 8-bit amplitude (128 neutral) to a signed 16-bit force level.
///
/// The two halves are scaled separately so both extremes hit the ends of the
/// `i16` range exactly: 255 maps to `0x7FFF` and 0 to `-0x8000`.
pub fn amplitude_to_level(amplitude: u8) -> i16 {
    let delta = i32::from(amplitude) - i32::from(NEUTRAL_AMPLITUDE);
    let level = if delta >= 0 {
        delta * 0x7FFF / 127
    } else {
        delta * 0x8000 / 128
    };
    i16::try_from(level).unwrap_or(if level < 0 { i16::MIN } else { i16::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_endpoints() {
        assert_eq!(amplitude_to_level(128), 0);
        assert_eq!(amplitude_to_level(255), 0x7FFF);
        assert_eq!(amplitude_to_level(0), -0x8000);
    }

    #[test]
    fn test_amplitude_near_neutral() {
        assert_eq!(amplitude_to_level(129), 258);
        assert_eq!(amplitude_to_level(127), -256);
    }

    #[test]
    fn test_default_slots_follow_kind() {
        let [constant, spring, damper, trapezoid] = default_forces();
        assert_eq!(constant.slot, slots::CONSTANT);
        assert_eq!(spring.slot, slots::SPRING);
        assert_eq!(damper.slot, slots::DAMPER);
        assert_eq!(trapezoid.slot, slots::TRAPEZOID);
        assert!(!constant.enabled);
    }

    #[test]
    fn test_constant_constructor_enables() {
        let force = Force::constant(200);
        assert!(force.enabled);
        assert_eq!(force.kind(), ForceKind::Constant);
        assert_eq!(force.slot, slots::CONSTANT);
    }

    #[test]
    fn test_with_slot_keeps_nibble() {
        let force = Force::constant(128).with_slot(0x13);
        assert_eq!(force.slot, 0x03);
    }

    #[test]
    fn test_force_serde_tagged() -> Result<(), Box<dyn std::error::Error>> {
        let force = Force::constant(200);
        let json = serde_json::to_string(&force)?;
        assert!(json.contains("\"kind\":\"constant\""));
        let back: Force = serde_json::from_str(&json)?;
        assert_eq!(back, force);
        Ok(())
    }
}
