use crate::error::{FontError, Result};
use crate::stream::FontReader;
use crate::tables::FontTable;
use crate::variation::{ItemVariationStore, NormalizedCoords};

/// MVAR table - Metrics variations for global font metrics
#[derive(Debug, Clone)]
pub struct MvarTable {
    pub store: ItemVariationStore,
    pub value_records: Vec<MvarValueRecord>,
}

#[derive(Debug, Clone)]
pub struct MvarValueRecord {
    pub value_tag: [u8; 4],
    pub delta_set_outer_index: u16,
    pub delta_set_inner_index: u16,
}

impl MvarTable {
    /// Delta for one metric selector (e.g. `hasc`, `hdsc`, `xhgt`).
    /// Tags absent from the table have no variation; the delta is zero.
    pub fn metric_delta(&self, value_tag: &[u8; 4], coords: &NormalizedCoords) -> Result<f64> {
        let record = match self
            .value_records
            .binary_search_by(|r| r.value_tag.cmp(value_tag))
        {
            Ok(idx) => &self.value_records[idx],
            Err(_) => return Ok(0.0),
        };
        self.store.delta(
            record.delta_set_outer_index,
            record.delta_set_inner_index,
            coords,
        )
    }
}

impl FontTable for MvarTable {
    fn from_reader(reader: &mut FontReader, _length: u32) -> Result<Self> {
        let major_version = reader.read_u16()?;
        let minor_version = reader.read_u16()?;
        if major_version != 1 {
            return Err(FontError::UnsupportedVersion {
                tag: "MVAR",
                version: ((major_version as u32) << 16) | minor_version as u32,
            });
        }

        reader.skip(2)?; // reserved
        let value_record_size = reader.read_u16()? as usize;
        let value_record_count = reader.read_u16()?;
        let store_offset = reader.read_u16()? as usize;

        if value_record_count > 0 && value_record_size < 8 {
            return Err(FontError::corrupt(
                "MVAR",
                format!("value record size {value_record_size} too small"),
            ));
        }

        let records_base = reader.position();
        let mut value_records = Vec::with_capacity(value_record_count as usize);
        for i in 0..value_record_count as usize {
            reader.set_position(records_base + i * value_record_size)?;
            value_records.push(MvarValueRecord {
                value_tag: reader.read_tag()?,
                delta_set_outer_index: reader.read_u16()?,
                delta_set_inner_index: reader.read_u16()?,
            });
        }

        // Records must be sorted by tag for binary search
        if !value_records.windows(2).all(|w| w[0].value_tag <= w[1].value_tag) {
            return Err(FontError::corrupt("MVAR", "value records not sorted by tag"));
        }

        let store = if store_offset != 0 {
            ItemVariationStore::from_reader(reader, store_offset)?
        } else {
            ItemVariationStore {
                regions: Vec::new(),
                data: Vec::new(),
            }
        };

        Ok(MvarTable {
            store,
            value_records,
        })
    }
}
