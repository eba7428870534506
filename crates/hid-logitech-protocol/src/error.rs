//! Force-feedback error taxonomy.

use core::fmt;

use fffb_hid_common::HidCommonError;

use crate::force::ForceKind;

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, may require attention
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, the session is unusable
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Error code carried by a HID++ 2.0 error reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HidppErrorCode(pub u8);

impl HidppErrorCode {
    pub const UNKNOWN: Self = Self(0x01);
    pub const INVALID_ARGUMENT: Self = Self(0x02);
    pub const OUT_OF_RANGE: Self = Self(0x03);
    pub const HARDWARE_ERROR: Self = Self(0x04);
    pub const LOGITECH_INTERNAL: Self = Self(0x05);
    pub const INVALID_FEATURE_INDEX: Self = Self(0x06);
    pub const INVALID_FUNCTION_ID: Self = Self(0x07);
    pub const BUSY: Self = Self(0x08);
    pub const UNSUPPORTED: Self = Self(0x09);

    pub fn description(self) -> &'static str {
        match self.0 {
            0x00 => "no error",
            0x01 => "unknown",
            0x02 => "invalid argument",
            0x03 => "out of range",
            0x04 => "hardware error",
            0x05 => "internal error",
            0x06 => "invalid feature index",
            0x07 => "invalid function",
            0x08 => "busy",
            0x09 => "unsupported",
            _ => "unrecognised error",
        }
    }
}

impl fmt::Display for HidppErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#04x})", self.description(), self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FfbError {
    /// Write, open, close, enumerate or read failed.
    #[error("Transport failure: {0}")]
    Transport(#[from] HidCommonError),

    /// No ping attempt produced a matching ping reply.
    #[error("HID++ negotiation failed after {attempts} ping attempts")]
    NegotiationFailed { attempts: usize },

    #[error("Feature {feature_id:#06x} not found in the device feature directory")]
    FeatureNotFound { feature_id: u16 },

    /// A lifecycle command was issued before the force feedback feature was
    /// resolved.
    #[error("Force feedback feature index not resolved")]
    FeatureNotResolved,

    #[error("No reply to command {command:#04x} within {timeout_ms}ms")]
    ReplyTimeout { command: u8, timeout_ms: u64 },

    #[error("Malformed reply: {reason}")]
    MalformedReply { reason: String },

    /// The device answered with a HID++ error reply.
    #[error("Device rejected command {command:#04x}: {code}")]
    DeviceError { command: u8, code: HidppErrorCode },

    #[error("Unsupported device: vendor={vendor_id:#06x}, product={product_id:#06x}")]
    UnsupportedDevice { vendor_id: u16, product_id: u16 },

    #[error("Effect '{kind}' cannot be downloaded in this dialect")]
    UnsupportedEffect { kind: ForceKind },

    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    #[error("Session is closed")]
    SessionClosed,
}

impl FfbError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FfbError::Transport(HidCommonError::Disconnected) => ErrorSeverity::Critical,
            FfbError::Transport(_) => ErrorSeverity::Error,
            FfbError::NegotiationFailed { .. } => ErrorSeverity::Error,
            FfbError::FeatureNotFound { .. } => ErrorSeverity::Error,
            FfbError::FeatureNotResolved => ErrorSeverity::Error,
            FfbError::ReplyTimeout { .. } => ErrorSeverity::Warning,
            FfbError::MalformedReply { .. } => ErrorSeverity::Warning,
            FfbError::DeviceError { .. } => ErrorSeverity::Warning,
            FfbError::UnsupportedDevice { .. } => ErrorSeverity::Error,
            FfbError::UnsupportedEffect { .. } => ErrorSeverity::Info,
            FfbError::InvalidConfig(_) => ErrorSeverity::Error,
            FfbError::SessionClosed => ErrorSeverity::Error,
        }
    }

    /// Check if retrying the operation might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FfbError::ReplyTimeout { .. } | FfbError::MalformedReply { .. } => true,
            FfbError::DeviceError { code, .. } => *code == HidppErrorCode::BUSY,
            _ => false,
        }
    }

    /// Whether the session cannot carry on after this error.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(
            self,
            FfbError::NegotiationFailed { .. }
                | FfbError::FeatureNotFound { .. }
                | FfbError::FeatureNotResolved
                | FfbError::UnsupportedDevice { .. }
                | FfbError::SessionClosed
                | FfbError::Transport(HidCommonError::Disconnected)
                | FfbError::Transport(HidCommonError::NotOpen(_))
        )
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        FfbError::MalformedReply {
            reason: reason.into(),
        }
    }
}

pub type FfbResult<T> = Result<T, FfbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity() {
        assert_eq!(
            FfbError::Transport(HidCommonError::Disconnected).severity(),
            ErrorSeverity::Critical
        );
        assert_eq!(
            FfbError::ReplyTimeout {
                command: 0x21,
                timeout_ms: 50
            }
            .severity(),
            ErrorSeverity::Warning
        );
        assert!(ErrorSeverity::Critical > ErrorSeverity::Warning);
    }

    #[test]
    fn test_retryable() {
        assert!(
            FfbError::ReplyTimeout {
                command: 0x21,
                timeout_ms: 50
            }
            .is_retryable()
        );
        assert!(
            FfbError::DeviceError {
                command: 0x21,
                code: HidppErrorCode::BUSY
            }
            .is_retryable()
        );
        assert!(
            !FfbError::DeviceError {
                command: 0x21,
                code: HidppErrorCode::INVALID_ARGUMENT
            }
            .is_retryable()
        );
        assert!(!FfbError::NegotiationFailed { attempts: 32 }.is_retryable());
    }

    #[test]
    fn test_fatal_to_session() {
        assert!(FfbError::NegotiationFailed { attempts: 32 }.is_fatal_to_session());
        assert!(FfbError::FeatureNotFound { feature_id: 0x8123 }.is_fatal_to_session());
        assert!(
            !FfbError::ReplyTimeout {
                command: 0x11,
                timeout_ms: 50
            }
            .is_fatal_to_session()
        );
    }

    #[test]
    fn test_display() {
        let err = FfbError::UnsupportedDevice {
            vendor_id: 0x1234,
            product_id: 0x5678,
        };
        assert_eq!(
            err.to_string(),
            "Unsupported device: vendor=0x1234, product=0x5678"
        );
        let err = FfbError::DeviceError {
            command: 0x21,
            code: HidppErrorCode::INVALID_ARGUMENT,
        };
        assert_eq!(
            err.to_string(),
            "Device rejected command 0x21: invalid argument (0x02)"
        );
        assert_eq!(
            FfbError::FeatureNotFound { feature_id: 0x8123 }.to_string(),
            "Feature 0x8123 not found in the device feature directory"
        );
    }

    #[test]
    fn test_transport_conversion() {
        let err: FfbError = HidCommonError::WriteError("pipe".into()).into();
        assert!(matches!(err, FfbError::Transport(_)));
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }
}
