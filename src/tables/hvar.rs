use crate::error::{FontError, Result};
use crate::stream::FontReader;
use crate::tables::FontTable;
use crate::variation::{DeltaSetIndexMap, ItemVariationStore, NormalizedCoords};

/// HVAR table - Horizontal metrics variations
#[derive(Debug, Clone)]
pub struct HvarTable {
    pub store: ItemVariationStore,
    pub advance_width_mapping: Option<DeltaSetIndexMap>,
    pub lsb_mapping: Option<DeltaSetIndexMap>,
    pub rsb_mapping: Option<DeltaSetIndexMap>,
}

/// VVAR table - Vertical metrics variations (same shape as HVAR plus a
/// vertical-origin mapping)
#[derive(Debug, Clone)]
pub struct VvarTable {
    pub store: ItemVariationStore,
    pub advance_height_mapping: Option<DeltaSetIndexMap>,
    pub tsb_mapping: Option<DeltaSetIndexMap>,
    pub bsb_mapping: Option<DeltaSetIndexMap>,
    pub v_org_mapping: Option<DeltaSetIndexMap>,
}

fn check_version(reader: &mut FontReader, tag: &'static str) -> Result<()> {
    let major_version = reader.read_u16()?;
    let minor_version = reader.read_u16()?;
    if major_version != 1 {
        return Err(FontError::UnsupportedVersion {
            tag,
            version: ((major_version as u32) << 16) | minor_version as u32,
        });
    }
    Ok(())
}

fn read_mapping(reader: &mut FontReader, offset: u32) -> Result<Option<DeltaSetIndexMap>> {
    if offset == 0 {
        return Ok(None);
    }
    Ok(Some(DeltaSetIndexMap::from_reader(reader, offset as usize)?))
}

/// Delta lookup shared by HVAR and VVAR: identity mapping (outer 0, inner =
/// glyph id) when the index map is absent.
fn metric_delta(
    store: &ItemVariationStore,
    mapping: &Option<DeltaSetIndexMap>,
    glyph_id: u16,
    scalars: &[f32],
) -> Result<f64> {
    let (outer, inner) = match mapping {
        Some(map) => map
            .get(glyph_id)
            .ok_or_else(|| FontError::corrupt("HVAR", "empty delta-set index map"))?,
        None => (0, glyph_id),
    };
    store.delta_with_scalars(outer, inner, scalars)
}

impl HvarTable {
    /// Advance width delta, in font units.
    pub fn advance_delta(&self, glyph_id: u16, coords: &NormalizedCoords) -> Result<f64> {
        let scalars = self.store.region_scalars(coords);
        self.advance_delta_with_scalars(glyph_id, &scalars)
    }

    pub fn advance_delta_with_scalars(&self, glyph_id: u16, scalars: &[f32]) -> Result<f64> {
        metric_delta(&self.store, &self.advance_width_mapping, glyph_id, scalars)
    }

    /// Left side bearing delta; `None` when the font omits the mapping.
    pub fn lsb_delta(&self, glyph_id: u16, coords: &NormalizedCoords) -> Result<Option<f64>> {
        match &self.lsb_mapping {
            None => Ok(None),
            Some(_) => {
                let scalars = self.store.region_scalars(coords);
                metric_delta(&self.store, &self.lsb_mapping, glyph_id, &scalars).map(Some)
            }
        }
    }
}

impl VvarTable {
    pub fn advance_delta(&self, glyph_id: u16, coords: &NormalizedCoords) -> Result<f64> {
        let scalars = self.store.region_scalars(coords);
        metric_delta(&self.store, &self.advance_height_mapping, glyph_id, &scalars)
    }
}

impl FontTable for HvarTable {
    fn from_reader(reader: &mut FontReader, _length: u32) -> Result<Self> {
        check_version(reader, "HVAR")?;
        let store_offset = reader.read_u32()?;
        let advance_offset = reader.read_u32()?;
        let lsb_offset = reader.read_u32()?;
        let rsb_offset = reader.read_u32()?;

        let store = ItemVariationStore::from_reader(reader, store_offset as usize)?;

        Ok(HvarTable {
            store,
            advance_width_mapping: read_mapping(reader, advance_offset)?,
            lsb_mapping: read_mapping(reader, lsb_offset)?,
            rsb_mapping: read_mapping(reader, rsb_offset)?,
        })
    }
}

impl FontTable for VvarTable {
    fn from_reader(reader: &mut FontReader, _length: u32) -> Result<Self> {
        check_version(reader, "VVAR")?;
        let store_offset = reader.read_u32()?;
        let advance_offset = reader.read_u32()?;
        let tsb_offset = reader.read_u32()?;
        let bsb_offset = reader.read_u32()?;
        let v_org_offset = reader.read_u32()?;

        let store = ItemVariationStore::from_reader(reader, store_offset as usize)?;

        Ok(VvarTable {
            store,
            advance_height_mapping: read_mapping(reader, advance_offset)?,
            tsb_mapping: read_mapping(reader, tsb_offset)?,
            bsb_mapping: read_mapping(reader, bsb_offset)?,
            v_org_mapping: read_mapping(reader, v_org_offset)?,
        })
    }
}
