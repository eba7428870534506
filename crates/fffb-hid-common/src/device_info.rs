//! Device identity as reported by transport enumeration

use core::fmt;

use serde::{Deserialize, Serialize};

/// Generic desktop usage page.
pub const USAGE_PAGE_GENERIC_DESKTOP: u16 = 0x01;
/// Joystick usage on the generic desktop page. Wheels expose their force
/// feedback interface under this usage.
pub const USAGE_JOYSTICK: u16 = 0x04;

/// Opaque platform handle for an enumerated device (a hidraw or IOKit path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceHandle(String);

impl DeviceHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceHandle {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidDeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub usage_page: u16,
    pub usage: u16,
    pub handle: DeviceHandle,
    pub manufacturer: Option<String>,
    pub product_name: Option<String>,
}

impl HidDeviceInfo {
    pub fn new(vendor_id: u16, product_id: u16, handle: impl Into<DeviceHandle>) -> Self {
        Self {
            vendor_id,
            product_id,
            usage_page: USAGE_PAGE_GENERIC_DESKTOP,
            usage: USAGE_JOYSTICK,
            handle: handle.into(),
            manufacturer: None,
            product_name: None,
        }
    }

    pub fn with_usage(mut self, usage_page: u16, usage: u16) -> Self {
        self.usage_page = usage_page;
        self.usage = usage;
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }

    /// Whether this is the joystick interface of a composite device.
    ///
    /// Wheels enumerate several interfaces; only the joystick one accepts
    /// force-feedback reports.
    pub fn is_wheel_interface(&self) -> bool {
        self.usage_page == USAGE_PAGE_GENERIC_DESKTOP && self.usage == USAGE_JOYSTICK
    }

    /// `product << 16 | vendor`, the packed id used in log lines.
    pub fn device_id(&self) -> u32 {
        (u32::from(self.product_id) << 16) | u32::from(self.vendor_id)
    }

    pub fn display_name(&self) -> String {
        self.product_name
            .clone()
            .or_else(|| self.manufacturer.clone())
            .unwrap_or_else(|| format!("{:04x}:{:04x}", self.vendor_id, self.product_id))
    }
}

impl From<String> for DeviceHandle {
    fn from(path: String) -> Self {
        Self(path)
    }
}
