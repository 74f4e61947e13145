//! # Metatile Table
//!
//! Joins metatile records with their attributes and merges a primary and an optional secondary
//! tile source into one id space. Secondary ids start at [`SECONDARY_OFFSET`].

use std::collections::BTreeMap;

use crate::diagnostics::{Diagnostics, Warning};

use super::{
    attributes::{decode_attributes, AttributeLayout, MetatileAttributes},
    records::{decode_metatiles, trailing_bytes, MetatileRecord},
    SECONDARY_OFFSET,
};

/// Raw tables of one tile source, as read from disk.
#[derive(Clone, Copy, Debug)]
pub struct TileSource<'a> {
    pub metatiles: &'a [u8],
    pub attributes: Option<&'a [u8]>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Metatile {
    pub record: MetatileRecord,
    pub attributes: MetatileAttributes,
}

impl Metatile {
    pub const EMPTY: Metatile = Metatile {
        record: MetatileRecord::EMPTY,
        attributes: MetatileAttributes {
            behavior: 0,
            terrain: 0,
            encounter_type: 0,
            layer_type: 0,
        },
    };
}

impl<'a> TileSource<'a> {
    /// Decode the source. The attribute table is reconciled to the record count: missing or
    /// short attribute data is padded with defaults.
    pub fn decode(&self, layout: AttributeLayout, diagnostics: &mut Diagnostics) -> Vec<Metatile> {
        let records = decode_metatiles(self.metatiles);
        let trailing = trailing_bytes(self.metatiles);
        if trailing != 0 {
            diagnostics.warn(Warning::TrailingBytes {
                table: "metatiles.bin",
                count: trailing,
            });
        }

        let attributes = match self.attributes {
            Some(data) => {
                let (attributes, warning) = decode_attributes(data, layout, records.len());
                if let Some(warning) = warning {
                    diagnostics.warn(warning);
                }
                attributes
            }
            None => {
                diagnostics.warn(Warning::MissingAttributes {
                    records: records.len(),
                });
                vec![MetatileAttributes::default(); records.len()]
            }
        };

        log::debug!("Decoded {} metatiles", records.len());

        records
            .into_iter()
            .zip(attributes)
            .map(|(record, attributes)| Metatile { record, attributes })
            .collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MetatileTable {
    metatiles: BTreeMap<u16, Metatile>,
}

impl MetatileTable {
    /// Secondary entries are placed at `SECONDARY_OFFSET + index` and win over primary entries
    /// with the same id.
    pub fn new(primary: Vec<Metatile>, secondary: Option<Vec<Metatile>>) -> Self {
        let mut metatiles = BTreeMap::new();

        for (index, metatile) in primary.into_iter().enumerate() {
            let Ok(id) = u16::try_from(index) else {
                break;
            };
            metatiles.insert(id, metatile);
        }

        for (index, metatile) in secondary.into_iter().flatten().enumerate() {
            let Some(id) = u16::try_from(index)
                .ok()
                .and_then(|index| index.checked_add(SECONDARY_OFFSET))
            else {
                break;
            };
            metatiles.insert(id, metatile);
        }

        MetatileTable { metatiles }
    }

    pub fn load(
        primary: &TileSource,
        secondary: Option<&TileSource>,
        layout: AttributeLayout,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let primary = primary.decode(layout, diagnostics);
        let secondary = secondary.map(|source| source.decode(layout, diagnostics));
        Self::new(primary, secondary)
    }

    pub fn get(&self, id: u16) -> Option<&Metatile> {
        self.metatiles.get(&id)
    }

    pub fn len(&self) -> usize {
        self.metatiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metatiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &Metatile)> {
        self.metatiles.iter().map(|(&id, metatile)| (id, metatile))
    }

    /// Records in ascending id order.
    pub fn records(&self) -> impl Iterator<Item = &MetatileRecord> {
        self.metatiles.values().map(|metatile| &metatile.record)
    }
}
