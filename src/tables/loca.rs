use crate::error::{FontError, Result};
use crate::stream::FontReader;

/// loca table - Index to location
///
/// Holds `numGlyphs + 1` byte offsets into `glyf`; the range
/// `[offset(i), offset(i + 1))` addresses glyph `i`.
#[derive(Debug, Clone)]
pub enum LocaTable {
    Short(Vec<u16>),
    Long(Vec<u32>),
}

impl LocaTable {
    pub fn from_reader(
        reader: &mut FontReader,
        _length: u32,
        num_glyphs: usize,
        is_long: bool,
    ) -> Result<Self> {
        let table = if is_long {
            let mut offsets = Vec::with_capacity(num_glyphs + 1);
            for _ in 0..=num_glyphs {
                offsets.push(reader.read_u32()?);
            }
            LocaTable::Long(offsets)
        } else {
            let mut offsets = Vec::with_capacity(num_glyphs + 1);
            for _ in 0..=num_glyphs {
                offsets.push(reader.read_u16()?);
            }
            LocaTable::Short(offsets)
        };

        for i in 0..num_glyphs {
            if table.get_offset(i)? > table.get_offset(i + 1)? {
                return Err(FontError::corrupt(
                    "loca",
                    format!("offsets not monotone at glyph {i}"),
                ));
            }
        }

        Ok(table)
    }

    pub fn len(&self) -> usize {
        match self {
            LocaTable::Short(offsets) => offsets.len(),
            LocaTable::Long(offsets) => offsets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte offset into glyf; short entries are stored divided by two.
    pub fn get_offset(&self, index: usize) -> Result<u32> {
        match self {
            LocaTable::Short(offsets) => {
                let offset = offsets.get(index).copied().ok_or(FontError::Corrupt {
                    tag: "loca",
                    reason: format!("offset index {index} out of range"),
                })?;
                Ok(offset as u32 * 2)
            }
            LocaTable::Long(offsets) => {
                offsets.get(index).copied().ok_or(FontError::Corrupt {
                    tag: "loca",
                    reason: format!("offset index {index} out of range"),
                })
            }
        }
    }
}
