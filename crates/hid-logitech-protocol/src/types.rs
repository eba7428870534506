//! Logitech device model classification and dialect selection.

use core::fmt;

use fffb_hid_common::HidDeviceInfo;
use serde::{Deserialize, Serialize};

use crate::ids::{LOGITECH_VENDOR_ID, product_ids};

/// Logitech wheel model classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogitechModel {
    G25,
    G27,
    G29,
    G920,
    G923,
    ProRacing,
    /// Unknown or future Logitech wheel.
    Unknown,
}

impl LogitechModel {
    /// Classify a device by its product ID.
    pub fn from_product_id(product_id: u16) -> Self {
        match product_id {
            product_ids::G25 => Self::G25,
            product_ids::G27_A | product_ids::G27 => Self::G27,
            product_ids::G29_PS | product_ids::G29_XBOX => Self::G29,
            product_ids::G920_V1 | product_ids::G920 => Self::G920,
            product_ids::G923_PS | product_ids::G923_PS_COMPAT | product_ids::G923_XBOX => {
                Self::G923
            }
            product_ids::PRO_RACING => Self::ProRacing,
            _ => Self::Unknown,
        }
    }

    /// Maximum wheel rotation in degrees.
    pub fn max_rotation_deg(self) -> u16 {
        match self {
            Self::ProRacing => 1080,
            _ => 900,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::G25 => "G25",
            Self::G27 => "G27",
            Self::G29 => "G29",
            Self::G920 => "G920",
            Self::G923 => "G923",
            Self::ProRacing => "Pro Racing Wheel",
            Self::Unknown => "unknown Logitech wheel",
        }
    }
}

impl fmt::Display for LogitechModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The force-feedback dialect a device speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Fixed 8-byte output reports, fire and forget.
    Classic,
    /// Feature-indexed HID++ 2.0 request/reply.
    Hidpp,
    /// Not a Logitech device.
    Unsupported,
}

impl Dialect {
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Classic => "classic",
            Self::Hidpp => "hid++",
            Self::Unsupported => "unsupported",
        })
    }
}

/// Pick the dialect for a vendor/product pair.
///
/// The G920 family speaks HID++; every other Logitech product gets the
/// classic encoding. Never fails: foreign vendors map to
/// [`Dialect::Unsupported`].
pub fn select_dialect(vendor_id: u16, product_id: u16) -> Dialect {
    if vendor_id != LOGITECH_VENDOR_ID {
        return Dialect::Unsupported;
    }
    match product_id {
        product_ids::G920_V1 | product_ids::G920 => Dialect::Hidpp,
        _ => Dialect::Classic,
    }
}

/// [`select_dialect`] for an enumerated device.
pub fn dialect_for(info: &HidDeviceInfo) -> Dialect {
    select_dialect(info.vendor_id, info.product_id)
}

/// Return `true` if the product ID corresponds to a known Logitech wheel.
pub fn is_wheel_product(product_id: u16) -> bool {
    LogitechModel::from_product_id(product_id) != LogitechModel::Unknown
}

/// Whether a classic-dialect product needs the mode-switch sequence on open.
pub fn needs_mode_switch(product_id: u16) -> bool {
    matches!(product_id, product_ids::G923_PS | product_ids::G29_PS)
}
