//! Per-device HID++ state.

use serde::{Deserialize, Serialize};

use crate::error::{FfbError, FfbResult};
use crate::hidpp::frame::Framing;
use crate::ids::hidpp;

/// Logical slot mask (0..=15) to device effect handle. Zero means unallocated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTable {
    handles: [u8; 16],
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The handle learned for `slot`, or 0.
    pub fn handle(&self, slot: u8) -> u8 {
        self.handles
            .get(usize::from(slot & 0x0F))
            .copied()
            .unwrap_or(0)
    }

    /// Remember `handle` for `slot`. A zero handle is ignored so a learned
    /// handle is never forgotten by an allocation that returned nothing.
    pub fn store(&mut self, slot: u8, handle: u8) {
        if handle == 0 {
            return;
        }
        if let Some(entry) = self.handles.get_mut(usize::from(slot & 0x0F)) {
            *entry = handle;
        }
    }

    /// Forget the handle of `slot`, returning it.
    pub fn clear(&mut self, slot: u8) -> u8 {
        self.handles
            .get_mut(usize::from(slot & 0x0F))
            .map(core::mem::take)
            .unwrap_or(0)
    }

    pub fn clear_all(&mut self) {
        self.handles = [0; 16];
    }

    /// `(slot, handle)` for every allocated slot.
    pub fn allocated(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        (0u8..16)
            .zip(self.handles.iter().copied())
            .filter(|(_, handle)| *handle != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.handles.iter().all(|h| *h == 0)
    }
}

/// HID++ protocol version from a ping reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

/// Everything a HID++ session learns about its device.
///
/// Created empty, filled in by negotiation and feature resolution, and
/// mutated by effect downloads. Owned by exactly one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub(crate) device_index: u8,
    pub(crate) sw_id: u8,
    pub(crate) framing: Framing,
    pub(crate) version: Option<ProtocolVersion>,
    pub(crate) ff_feature_index: u8,
    pub(crate) ff_feature_type: u8,
    pub(crate) slots: SlotTable,
    pub(crate) effect_count: Option<u8>,
}

impl SessionContext {
    pub fn new(sw_id: u8) -> Self {
        Self {
            device_index: 0xFF,
            sw_id: sw_id & 0x0F,
            framing: Framing::default(),
            version: None,
            ff_feature_index: 0,
            ff_feature_type: 0,
            slots: SlotTable::new(),
            effect_count: None,
        }
    }

    pub fn device_index(&self) -> u8 {
        self.device_index
    }

    pub fn sw_id(&self) -> u8 {
        self.sw_id
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn version(&self) -> Option<ProtocolVersion> {
        self.version
    }

    pub fn is_negotiated(&self) -> bool {
        self.version.is_some()
    }

    pub fn ff_feature_index(&self) -> u8 {
        self.ff_feature_index
    }

    pub fn ff_feature_type(&self) -> u8 {
        self.ff_feature_type
    }

    /// Whether the force feedback feature index is usable.
    pub fn is_ff_ready(&self) -> bool {
        is_valid_feature_index(self.ff_feature_index)
    }

    /// The force feedback feature index, or an error before resolution.
    pub fn require_ff_index(&self) -> FfbResult<u8> {
        if self.is_ff_ready() {
            Ok(self.ff_feature_index)
        } else {
            Err(FfbError::FeatureNotResolved)
        }
    }

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// Total effect count reported by GET_INFO, once queried.
    pub fn effect_count(&self) -> Option<u8> {
        self.effect_count
    }

    /// Framing for a command with `params_len` parameter bytes: the negotiated
    /// one when it fits, else the very-long tier.
    pub fn command_framing(&self, params_len: usize) -> Framing {
        if self.framing.fits(params_len) {
            self.framing
        } else {
            Framing::very_long(self.framing.id_in_payload)
        }
    }

    /// Framing of a root-feature request: the negotiated report id padded to
    /// its tier length.
    pub fn root_framing(&self, id_in_payload: bool) -> Framing {
        Framing::for_tier(self.framing.report_id, id_in_payload)
    }
}

/// Feature indices 0x00 (root) and 0xFF (error marker) never address a
/// real feature.
pub fn is_valid_feature_index(index: u8) -> bool {
    index != hidpp::ROOT_FEATURE_INDEX && index != hidpp::ERROR_FEATURE_INDEX
}
