//! Logitech USB ids and wire constants for both force-feedback dialects.

/// Logitech USB vendor ID.
pub const LOGITECH_VENDOR_ID: u16 = 0x046D;

/// Known Logitech wheel product IDs.
pub mod product_ids {
    /// G25 racing wheel.
    pub const G25: u16 = 0xC299;
    /// G27 racing wheel, revision A.
    pub const G27_A: u16 = 0xC294;
    /// G27 racing wheel.
    pub const G27: u16 = 0xC29B;
    /// G29 racing wheel (PlayStation 4 / PC).
    pub const G29_PS: u16 = 0xC24F;
    /// G29 racing wheel (Xbox variant).
    pub const G29_XBOX: u16 = 0xC260;
    /// G920 racing wheel, first enumeration before the mode switch.
    pub const G920_V1: u16 = 0xC261;
    /// G920 racing wheel (Xbox / PC). Speaks HID++ 2.0.
    pub const G920: u16 = 0xC262;
    /// G923 racing wheel (PlayStation / PC).
    pub const G923_PS: u16 = 0xC266;
    /// G923 PlayStation in compatibility mode, before the mode switch.
    pub const G923_PS_COMPAT: u16 = 0xC267;
    /// G923 racing wheel (Xbox / PC).
    pub const G923_XBOX: u16 = 0xC26E;
    /// Pro Racing Wheel (direct drive).
    pub const PRO_RACING: u16 = 0xC272;
}

/// Classic dialect: fixed 8-byte output reports, report id 0.
pub mod classic {
    pub const REPORT_ID: u8 = 0x00;
    pub const REPORT_LEN: usize = 8;

    /// Low nibble of byte 0.
    pub mod ops {
        pub const DOWNLOAD: u8 = 0x00;
        pub const PLAY: u8 = 0x02;
        pub const STOP: u8 = 0x03;
        pub const AUTOCENTER_ON: u8 = 0x04;
        pub const AUTOCENTER_OFF: u8 = 0x05;
        pub const REFRESH: u8 = 0x0C;
        pub const SET_AUTOCENTER: u8 = 0x0E;
    }

    /// Byte 1 of a download report.
    pub mod effects {
        pub const CONSTANT: u8 = 0x00;
        pub const SPRING: u8 = 0x01;
        pub const DAMPER: u8 = 0x02;
        pub const TRAPEZOID: u8 = 0x06;
    }

    /// Extended command prefix (byte 0) and its sub-commands.
    pub const EXTENDED: u8 = 0xF8;
    pub const EXT_SET_LEDS: u8 = 0x12;
    pub const EXT_SET_RANGE: u8 = 0x81;

    /// Mode switch sent to PlayStation-family wheels on session start.
    pub const MODE_SWITCH_SEQUENCE: [u8; 5] = [0x30, 0xF8, 0x09, 0x05, 0x01];
}

/// HID++ 2.0 framing and root-feature constants.
pub mod hidpp {
    /// Short message, 7 bytes including the report id.
    pub const REPORT_ID_SHORT: u8 = 0x10;
    /// Long message, 20 bytes including the report id.
    pub const REPORT_ID_LONG: u8 = 0x11;
    /// Very long message, 64 bytes including the report id.
    pub const REPORT_ID_VERY_LONG: u8 = 0x12;

    pub const SHORT_LEN: usize = 7;
    pub const LONG_LEN: usize = 20;
    pub const VERY_LONG_LEN: usize = 64;

    /// Index of the root feature, always present.
    pub const ROOT_FEATURE_INDEX: u8 = 0x00;
    /// Feature index byte that marks an error reply.
    pub const ERROR_FEATURE_INDEX: u8 = 0xFF;

    /// Force feedback feature id.
    pub const FEATURE_FORCE_FEEDBACK: u16 = 0x8123;

    /// Root function 0 (get feature) in the high nibble.
    pub const ROOT_GET_FEATURE: u8 = 0x00;
    /// Root function 1 (get protocol version / ping) in the high nibble.
    pub const ROOT_PING: u8 = 0x10;

    /// Software id used in the low nibble of function bytes.
    pub const DEFAULT_SW_ID: u8 = 0x0E;
    /// Echoed back in byte 6 of a ping reply.
    pub const PING_TAG: u8 = 0xAA;

    /// Device indices tried during negotiation, direct and receiver routes
    /// first, wildcards last.
    pub const CANDIDATE_INDICES: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0xFF, 0x00];

    /// Whether `report_id` is one of the three HID++ report ids.
    pub const fn is_hidpp_report_id(report_id: u8) -> bool {
        matches!(
            report_id,
            REPORT_ID_SHORT | REPORT_ID_LONG | REPORT_ID_VERY_LONG
        )
    }

    /// Total message length (including the id byte) for a report id.
    /// Unknown ids get the very-long length.
    pub const fn tier_len(report_id: u8) -> usize {
        match report_id {
            REPORT_ID_SHORT => SHORT_LEN,
            REPORT_ID_LONG => LONG_LEN,
            _ => VERY_LONG_LEN,
        }
    }
}

/// Function bytes of the force feedback feature (0x8123).
pub mod ff_functions {
    pub const GET_INFO: u8 = 0x01;
    pub const RESET_ALL: u8 = 0x11;
    pub const DOWNLOAD_EFFECT: u8 = 0x21;
    pub const SET_EFFECT_STATE: u8 = 0x31;
    pub const DESTROY_EFFECT: u8 = 0x41;
    pub const SET_APERTURE: u8 = 0x61;
    pub const SET_GLOBAL_GAINS: u8 = 0x81;

    /// Replies may set the high bit; correlation ignores it.
    pub const REPLY_MASK: u8 = 0x7F;
}

/// HID++ effect type byte of a download request.
pub mod effect_types {
    pub const CONSTANT: u8 = 0x00;
    pub const SPRING: u8 = 0x06;
    /// Start playing as soon as the download completes.
    pub const AUTOSTART: u8 = 0x80;
}

/// SET_EFFECT_STATE values.
pub mod effect_states {
    pub const STOP: u8 = 0x01;
    pub const PLAY: u8 = 0x02;
}

/// Logical slot masks. Classic uses them as the slot nibble, HID++ uses them
/// to key the slot table.
pub mod slots {
    pub const CONSTANT: u8 = 0b0001;
    pub const SPRING: u8 = 0b0011;
    pub const DAMPER: u8 = 0b0100;
    pub const TRAPEZOID: u8 = 0b1000;
    pub const AUTOCENTER: u8 = 0b1111;
    /// Every slot at once.
    pub const ALL: u8 = 0b1111;
}

/// Default HID++ autocenter spring magnitude.
pub const BASELINE_AUTOCENTER: u16 = 0x0C00;
