use crate::error::Result;
use crate::stream::FontReader;
use crate::tables::FontTable;
use crate::tables::layout::LayoutTable;

/// GSUB table - Glyph substitution
#[derive(Debug, Clone)]
pub struct GsubTable {
    pub layout: LayoutTable,
}

impl GsubTable {
    pub const LOOKUP_SINGLE: u16 = 1;

    /// Apply a single-substitution lookup to one glyph. Lookup types other
    /// than single substitution are skipped with a warning.
    pub fn single_substitution(&self, lookup_index: u16, glyph_id: u16) -> Result<Option<u16>> {
        let lookup = self.layout.lookup(lookup_index)?;
        if lookup.lookup_type != Self::LOOKUP_SINGLE {
            log::warn!(
                "skipping GSUB lookup {lookup_index} with unsupported type {}",
                lookup.lookup_type
            );
            return Ok(None);
        }

        for &subtable_offset in &lookup.subtable_offsets {
            let mut reader = self.subtable_reader(subtable_offset)?;
            let format = reader.read_u16()?;
            let coverage_offset = reader.read_u16()? as usize;
            let coverage = self.layout.coverage(subtable_offset + coverage_offset)?;

            match format {
                1 => {
                    let delta_glyph_id = reader.read_i16()?;
                    if coverage.index(glyph_id).is_some() {
                        return Ok(Some((glyph_id as i32 + delta_glyph_id as i32) as u16));
                    }
                }
                2 => {
                    let glyph_count = reader.read_u16()?;
                    if let Some(index) = coverage.index(glyph_id) {
                        if index < glyph_count {
                            reader.skip(index as usize * 2)?;
                            return Ok(Some(reader.read_u16()?));
                        }
                    }
                }
                other => {
                    log::warn!("skipping GSUB single substitution subtable format {other}");
                }
            }
        }
        Ok(None)
    }

    fn subtable_reader(&self, offset: usize) -> Result<FontReader> {
        let mut reader = FontReader::from_slice(self.layout_data());
        reader.set_position(offset)?;
        Ok(reader)
    }

    fn layout_data(&self) -> &[u8] {
        // LayoutTable retains the raw bytes for on-demand parsing
        self.layout.data()
    }
}

impl FontTable for GsubTable {
    fn from_reader(reader: &mut FontReader, _length: u32) -> Result<Self> {
        Ok(GsubTable {
            layout: LayoutTable::from_reader(reader, "GSUB")?,
        })
    }
}
