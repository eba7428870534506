//! Logitech wheel force feedback: classic 8-byte reports and HID++ 2.0.
//!
//! The classic encoders are pure functions. The HID++ side negotiates
//! framing, resolves the force feedback feature and drives the effect
//! lifecycle through any [`fffb_hid_common::HidTransport`]. [`WheelSession`]
//! picks the dialect for a device and exposes one API over both.

#![deny(static_mut_refs)]

pub mod classic;
pub mod config;
pub mod error;
pub mod force;
pub mod hidpp;
pub mod ids;
mod poll;
pub mod types;
pub mod wheel;

pub use config::SessionConfig;
pub use error::{ErrorSeverity, FfbError, FfbResult, HidppErrorCode};
pub use force::{
    ConstantParams, DamperParams, Force, ForceEffect, ForceKind, SpringParams, TrapezoidParams,
    amplitude_to_level, default_forces,
};
pub use hidpp::{Framing, SessionContext};
pub use ids::{LOGITECH_VENDOR_ID, product_ids};
pub use poll::PollDeadline;
pub use types::{Dialect, LogitechModel, dialect_for, is_wheel_product, select_dialect};
pub use wheel::{WheelSession, find_wheels};
