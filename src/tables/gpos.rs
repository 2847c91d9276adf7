use crate::error::Result;
use crate::stream::FontReader;
use crate::tables::FontTable;
use crate::tables::layout::LayoutTable;

/// GPOS table - Glyph positioning
#[derive(Debug, Clone)]
pub struct GposTable {
    pub layout: LayoutTable,
}

/// Decoded positioning adjustment from a value record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValueRecord {
    pub x_placement: i16,
    pub y_placement: i16,
    pub x_advance: i16,
    pub y_advance: i16,
}

// valueFormat bits
const X_PLACEMENT: u16 = 0x0001;
const Y_PLACEMENT: u16 = 0x0002;
const X_ADVANCE: u16 = 0x0004;
const Y_ADVANCE: u16 = 0x0008;
const DEVICE_BITS: u16 = 0x00F0;

impl ValueRecord {
    fn from_reader(reader: &mut FontReader, value_format: u16) -> Result<Self> {
        let mut record = ValueRecord::default();
        if value_format & X_PLACEMENT != 0 {
            record.x_placement = reader.read_i16()?;
        }
        if value_format & Y_PLACEMENT != 0 {
            record.y_placement = reader.read_i16()?;
        }
        if value_format & X_ADVANCE != 0 {
            record.x_advance = reader.read_i16()?;
        }
        if value_format & Y_ADVANCE != 0 {
            record.y_advance = reader.read_i16()?;
        }
        // Device table offsets are skipped, not interpreted
        for bit in 0..4 {
            if value_format & (DEVICE_BITS & (0x0010 << bit)) != 0 {
                reader.skip(2)?;
            }
        }
        Ok(record)
    }
}

impl GposTable {
    pub const LOOKUP_SINGLE: u16 = 1;

    /// Apply a single-adjustment lookup to one glyph. Lookup types other
    /// than single adjustment are skipped with a warning.
    pub fn single_adjustment(
        &self,
        lookup_index: u16,
        glyph_id: u16,
    ) -> Result<Option<ValueRecord>> {
        let lookup = self.layout.lookup(lookup_index)?;
        if lookup.lookup_type != Self::LOOKUP_SINGLE {
            log::warn!(
                "skipping GPOS lookup {lookup_index} with unsupported type {}",
                lookup.lookup_type
            );
            return Ok(None);
        }

        for &subtable_offset in &lookup.subtable_offsets {
            let mut reader = FontReader::from_slice(self.layout.data());
            reader.set_position(subtable_offset)?;

            let format = reader.read_u16()?;
            let coverage_offset = reader.read_u16()? as usize;
            let value_format = reader.read_u16()?;
            let coverage = self.layout.coverage(subtable_offset + coverage_offset)?;

            match format {
                1 => {
                    if coverage.index(glyph_id).is_some() {
                        return Ok(Some(ValueRecord::from_reader(&mut reader, value_format)?));
                    }
                }
                2 => {
                    let value_count = reader.read_u16()?;
                    if let Some(index) = coverage.index(glyph_id) {
                        if index < value_count {
                            // Fixed-size records; skip ahead to the indexed one
                            let record_size = value_format.count_ones() as usize * 2;
                            reader.skip(index as usize * record_size)?;
                            return Ok(Some(ValueRecord::from_reader(&mut reader, value_format)?));
                        }
                    }
                }
                other => {
                    log::warn!("skipping GPOS single adjustment subtable format {other}");
                }
            }
        }
        Ok(None)
    }
}

impl FontTable for GposTable {
    fn from_reader(reader: &mut FontReader, _length: u32) -> Result<Self> {
        Ok(GposTable {
            layout: LayoutTable::from_reader(reader, "GPOS")?,
        })
    }
}
