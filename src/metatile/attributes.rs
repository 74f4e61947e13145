//! # Metatile Attributes
//!
//! Behaviour and layering data stored alongside `metatiles.bin`, one record per metatile. Two
//! record layouts exist and the caller chooses which one a table uses:
//!
//! - [`AttributeLayout::Packed4`]: u16 behaviour + u16 packed word
//!   (terrain bits 0-3, encounter type bits 4-6, layer type bits 7-8).
//! - [`AttributeLayout::Legacy2`]: a single u16 with behaviour in bits 0-7 and layer type in
//!   bits 12-15.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::{binary_utils::u16_array_le, diagnostics::Warning};

use super::behavior;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeLayout {
    Packed4,
    #[default]
    Legacy2,
}

impl AttributeLayout {
    pub const fn record_size(self) -> usize {
        match self {
            AttributeLayout::Packed4 => 4,
            AttributeLayout::Legacy2 => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerType {
    Normal,
    /// Top layer drawn over objects.
    Covered,
    /// Bottom tiles under objects, top tiles over them.
    Split,
    Other(u8),
}

impl LayerType {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => LayerType::Normal,
            1 => LayerType::Covered,
            2 => LayerType::Split,
            other => LayerType::Other(other),
        }
    }

    pub fn name(self) -> Cow<'static, str> {
        match self {
            LayerType::Normal => Cow::Borrowed("normal"),
            LayerType::Covered => Cow::Borrowed("covered"),
            LayerType::Split => Cow::Borrowed("split"),
            LayerType::Other(raw) => Cow::Owned(format!("other_{}", raw)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetatileAttributes {
    pub behavior: u8,
    pub terrain: u8,
    pub encounter_type: u8,
    pub layer_type: u8,
}

impl MetatileAttributes {
    pub fn from_packed(behavior: u16, packed: u16) -> Self {
        MetatileAttributes {
            behavior: (behavior & 0xFF) as u8,
            terrain: (packed & 0x000F) as u8,
            encounter_type: ((packed >> 4) & 0x0007) as u8,
            layer_type: ((packed >> 7) & 0x0003) as u8,
        }
    }

    pub fn from_legacy(raw: u16) -> Self {
        MetatileAttributes {
            behavior: (raw & 0x00FF) as u8,
            layer_type: ((raw >> 12) & 0xF) as u8,
            ..Default::default()
        }
    }

    pub fn from_bytes(record: &[u8], layout: AttributeLayout) -> Self {
        match layout {
            AttributeLayout::Packed4 => {
                let [behavior, packed] = u16_array_le::<2>(record);
                Self::from_packed(behavior, packed)
            }
            AttributeLayout::Legacy2 => {
                let [raw] = u16_array_le::<1>(record);
                Self::from_legacy(raw)
            }
        }
    }

    pub fn elevation(&self) -> u8 {
        self.terrain & 0x0F
    }

    pub fn layer(&self) -> LayerType {
        LayerType::from_raw(self.layer_type)
    }

    pub fn behavior_name(&self) -> Cow<'static, str> {
        behavior::behavior_name(self.behavior)
    }
}

/// Decode exactly `expected` attribute records.
///
/// A buffer shorter than `expected` records is zero-padded, so the missing tail decodes to
/// [`MetatileAttributes::default`]; the returned warning says by how much. Bytes past the
/// expected length are ignored.
pub fn decode_attributes(
    data: &[u8],
    layout: AttributeLayout,
    expected: usize,
) -> (Vec<MetatileAttributes>, Option<Warning>) {
    let record_size = layout.record_size();
    let wanted = expected * record_size;

    let mut bytes = data[..wanted.min(data.len())].to_vec();
    let warning = if bytes.len() < wanted {
        Some(Warning::TruncatedAttributes {
            have: data.len(),
            expected: wanted,
        })
    } else {
        None
    };
    bytes.resize(wanted, 0);

    let records = bytes
        .chunks_exact(record_size)
        .map(|record| MetatileAttributes::from_bytes(record, layout))
        .collect();
    (records, warning)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout_splits_subfields() {
        // terrain 0x5, encounter 0x3, layer 0x2
        let packed: u16 = 0x5 | (0x3 << 4) | (0x2 << 7);
        let mut data = 0x0101u16.to_le_bytes().to_vec();
        data.extend(packed.to_le_bytes());

        let attrs = MetatileAttributes::from_bytes(&data, AttributeLayout::Packed4);
        assert_eq!(attrs.behavior, 0x01);
        assert_eq!(attrs.terrain, 0x5);
        assert_eq!(attrs.elevation(), 0x5);
        assert_eq!(attrs.encounter_type, 0x3);
        assert_eq!(attrs.layer(), LayerType::Split);
    }

    #[test]
    fn legacy_layout_reads_behavior_and_layer() {
        let attrs = MetatileAttributes::from_bytes(&0x1033u16.to_le_bytes(), AttributeLayout::Legacy2);
        assert_eq!(attrs.behavior, 0x33);
        assert_eq!(attrs.layer(), LayerType::Covered);
        assert_eq!(attrs.behavior_name(), "MB_IMPASSABLE");
    }

    #[test]
    fn truncated_table_is_padded_to_expected_length() {
        let data = [0x02u8, 0x00, 0x04, 0x00, 0x06];
        let (records, warning) = decode_attributes(&data, AttributeLayout::Legacy2, 5);

        assert_eq!(records.len(), 5);
        assert_eq!(records[0].behavior, 0x02);
        assert_eq!(records[1].behavior, 0x04);
        // half a record is completed with zeros
        assert_eq!(records[2].behavior, 0x06);
        assert_eq!(records[3], MetatileAttributes::default());
        assert_eq!(records[4], MetatileAttributes::default());
        assert_eq!(
            warning,
            Some(Warning::TruncatedAttributes {
                have: 5,
                expected: 10
            })
        );
    }

    #[test]
    fn longer_table_is_cut_without_warning() {
        let data = [0u8; 4 * 3];
        let (records, warning) = decode_attributes(&data, AttributeLayout::Packed4, 2);
        assert_eq!(records.len(), 2);
        assert!(warning.is_none());
    }
}
