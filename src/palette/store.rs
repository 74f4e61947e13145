//! # Palette Store
//!
//! All colour tables of one tileset, keyed by the number in their file name (`00.pal`,
//! `01.pal`, ...). Lookups never fail: a missing key resolves to the lowest key present and is
//! reported once per job.

use std::{collections::BTreeMap, path::Path};

use crate::{
    diagnostics::{Diagnostics, Warning},
    error::{Error, Result},
};

use super::{jasc::parse_jasc, PaletteTable};

#[derive(Clone, Debug)]
pub struct PaletteStore {
    tables: BTreeMap<u8, PaletteTable>,
    fallback: u8,
}

impl PaletteStore {
    pub fn new(tables: BTreeMap<u8, PaletteTable>) -> Result<Self> {
        let fallback = *tables.keys().next().ok_or(Error::NoPalettes)?;
        Ok(PaletteStore { tables, fallback })
    }

    /// Build a store from `(file name, file text)` pairs.
    pub fn from_sources<'a, I>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut tables = BTreeMap::new();
        for (name, text) in sources {
            let key = key_from_file_name(name).map_err(|e| Error::in_file(name, e))?;
            let table = parse_jasc(text).map_err(|e| Error::in_file(name, e))?;
            tables.insert(key, table);
        }
        Self::new(tables)
    }

    pub fn get(&self, key: u8) -> Option<&PaletteTable> {
        self.tables.get(&key)
    }

    pub fn fallback_key(&self) -> u8 {
        self.fallback
    }

    /// Table for `key`, or the lowest-numbered table if `key` is absent.
    pub fn resolve(&self, key: u8, diagnostics: &mut Diagnostics) -> &PaletteTable {
        if let Some(table) = self.tables.get(&key) {
            return table;
        }
        diagnostics.warn_once(Warning::MissingPalette {
            requested: key,
            fallback: self.fallback,
        });
        &self.tables[&self.fallback]
    }

    pub fn keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.tables.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

pub fn key_from_file_name(name: &str) -> Result<u8> {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name);
    stem.parse::<u8>()
        .map_err(|_| Error::PaletteName(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Rgb;

    fn pal(colour: u8) -> String {
        format!("JASC-PAL\n0100\n2\n0 0 0\n{0} {0} {0}\n", colour)
    }

    #[test]
    fn keys_come_from_file_stems() {
        let (a, b) = (pal(10), pal(30));
        let store = PaletteStore::from_sources([("03.pal", a.as_str()), ("11.pal", b.as_str())])
            .unwrap();

        assert_eq!(store.keys().collect::<Vec<_>>(), vec![3, 11]);
        assert_eq!(store.fallback_key(), 3);
        assert_eq!(
            store.get(11).unwrap().get(1),
            Some(Rgb {
                r: 30,
                g: 30,
                b: 30
            })
        );
    }

    #[test]
    fn missing_key_falls_back_and_warns_once() {
        let (a, b) = (pal(10), pal(30));
        let store = PaletteStore::from_sources([("05.pal", a.as_str()), ("02.pal", b.as_str())])
            .unwrap();
        let mut diagnostics = Diagnostics::new();

        for _ in 0..3 {
            let table = store.resolve(9, &mut diagnostics);
            assert_eq!(table, store.get(2).unwrap());
        }
        let _ = store.resolve(12, &mut diagnostics);
        let _ = store.resolve(5, &mut diagnostics);

        assert_eq!(
            diagnostics.warnings(),
            &[
                Warning::MissingPalette {
                    requested: 9,
                    fallback: 2
                },
                Warning::MissingPalette {
                    requested: 12,
                    fallback: 2
                },
            ]
        );
    }

    #[test]
    fn errors_name_the_file() {
        let err = PaletteStore::from_sources([("07.pal", "JASC-PAL\n0100\n1\n")]).unwrap_err();
        match err {
            Error::File { path, source } => {
                assert_eq!(path, Path::new("07.pal"));
                assert!(matches!(*source, Error::FormatLine { line: 4, .. }));
            }
            other => panic!("expected file error, got {:?}", other),
        }

        assert!(PaletteStore::from_sources([("grass.pal", "")]).is_err());
        assert!(matches!(
            PaletteStore::from_sources(std::iter::empty()),
            Err(Error::NoPalettes)
        ));
    }
}
