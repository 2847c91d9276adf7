use crate::error::{FontError, Result};
use crate::stream::FontReader;

/// A normalized axis coordinate vector, one value in [-1, +1] per fvar axis.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCoords(pub Vec<f32>);

impl NormalizedCoords {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, axis: usize) -> f32 {
        self.0.get(axis).copied().unwrap_or(0.0)
    }

    /// True at the origin, where every delta must evaluate to zero.
    pub fn is_default(&self) -> bool {
        self.0.iter().all(|&c| c == 0.0)
    }
}

/// Per-axis region triple; `(0, 0, 0)` means the axis does not participate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionAxis {
    pub start: f32,
    pub peak: f32,
    pub end: f32,
}

impl RegionAxis {
    /// Per-axis scalar: 0 outside [start, end], 1 at the peak, linear ramp
    /// between. Always in [0, 1].
    pub fn scalar(&self, coord: f32) -> f32 {
        if self.start == 0.0 && self.peak == 0.0 && self.end == 0.0 {
            return 1.0;
        }
        // Degenerate triples never match
        if self.start > self.peak || self.peak > self.end {
            return 1.0;
        }
        if self.start < 0.0 && self.end > 0.0 && self.peak != 0.0 {
            return 1.0;
        }
        if self.peak == 0.0 {
            return 1.0;
        }
        if coord < self.start || coord > self.end {
            return 0.0;
        }
        if coord == self.peak {
            return 1.0;
        }
        if coord < self.peak {
            if self.peak != self.start {
                (coord - self.start) / (self.peak - self.start)
            } else {
                0.0
            }
        } else if self.peak != self.end {
            (self.end - coord) / (self.end - self.peak)
        } else {
            0.0
        }
    }
}

/// A variation region: one triple per axis. The region scalar is the
/// product of the per-axis scalars.
#[derive(Debug, Clone)]
pub struct VariationRegion {
    pub axes: Vec<RegionAxis>,
}

impl VariationRegion {
    pub fn scalar(&self, coords: &NormalizedCoords) -> f32 {
        let mut scalar = 1.0;
        for (i, axis) in self.axes.iter().enumerate() {
            scalar *= axis.scalar(coords.get(i));
            if scalar == 0.0 {
                return 0.0;
            }
        }
        scalar
    }
}

/// An ItemVariationData subtable: per-region deltas addressed by inner index.
#[derive(Debug, Clone)]
pub struct ItemVariationData {
    pub region_indexes: Vec<u16>,
    /// item_count rows of region_indexes.len() deltas.
    pub deltas: Vec<Vec<f64>>,
}

/// ItemVariationStore: a region list plus delta matrices shared by
/// HVAR/VVAR/MVAR and CFF2 blending.
#[derive(Debug, Clone)]
pub struct ItemVariationStore {
    pub regions: Vec<VariationRegion>,
    pub data: Vec<ItemVariationData>,
}

impl ItemVariationStore {
    /// Parse from a reader positioned anywhere; `offset` addresses the store
    /// within the reader.
    pub fn from_reader(reader: &mut FontReader, offset: usize) -> Result<Self> {
        reader.set_position(offset)?;
        let format = reader.read_u16()?;
        if format != 1 {
            return Err(FontError::UnsupportedVersion {
                tag: "ItemVariationStore",
                version: format as u32,
            });
        }

        let region_list_offset = reader.read_u32()? as usize;
        let data_count = reader.read_u16()?;
        let mut data_offsets = Vec::with_capacity(data_count as usize);
        for _ in 0..data_count {
            data_offsets.push(reader.read_u32()? as usize);
        }

        // Region list
        reader.set_position(offset + region_list_offset)?;
        let axis_count = reader.read_u16()?;
        let region_count = reader.read_u16()?;
        let mut regions = Vec::with_capacity(region_count as usize);
        for _ in 0..region_count {
            let mut axes = Vec::with_capacity(axis_count as usize);
            for _ in 0..axis_count {
                axes.push(RegionAxis {
                    start: reader.read_f2dot14()?,
                    peak: reader.read_f2dot14()?,
                    end: reader.read_f2dot14()?,
                });
            }
            regions.push(VariationRegion { axes });
        }

        // ItemVariationData subtables
        let mut data = Vec::with_capacity(data_count as usize);
        for data_offset in data_offsets {
            reader.set_position(offset + data_offset)?;
            let item_count = reader.read_u16()?;
            let word_delta_count = reader.read_u16()?;
            let region_index_count = reader.read_u16()?;

            let long_words = word_delta_count & 0x8000 != 0;
            let word_count = (word_delta_count & 0x7FFF) as usize;
            if word_count > region_index_count as usize {
                return Err(FontError::corrupt(
                    "ItemVariationStore",
                    "wordDeltaCount exceeds regionIndexCount",
                ));
            }

            let mut region_indexes = Vec::with_capacity(region_index_count as usize);
            for _ in 0..region_index_count {
                let index = reader.read_u16()?;
                if index as usize >= regions.len() {
                    return Err(FontError::corrupt(
                        "ItemVariationStore",
                        "region index out of range",
                    ));
                }
                region_indexes.push(index);
            }

            let mut deltas = Vec::with_capacity(item_count as usize);
            for _ in 0..item_count {
                let mut row = Vec::with_capacity(region_index_count as usize);
                for i in 0..region_index_count as usize {
                    let value = if i < word_count {
                        if long_words {
                            reader.read_i32()? as f64
                        } else {
                            reader.read_i16()? as f64
                        }
                    } else if long_words {
                        reader.read_i16()? as f64
                    } else {
                        reader.read_i8()? as f64
                    };
                    row.push(value);
                }
                deltas.push(row);
            }

            data.push(ItemVariationData {
                region_indexes,
                deltas,
            });
        }

        Ok(ItemVariationStore { regions, data })
    }

    /// Precompute all region scalars for a coordinate vector. The result is
    /// shared across every delta evaluation for the query.
    pub fn region_scalars(&self, coords: &NormalizedCoords) -> Vec<f32> {
        self.regions.iter().map(|r| r.scalar(coords)).collect()
    }

    /// Evaluate one delta with precomputed scalars.
    pub fn delta_with_scalars(&self, outer: u16, inner: u16, scalars: &[f32]) -> Result<f64> {
        let data = self.data.get(outer as usize).ok_or_else(|| {
            FontError::corrupt("ItemVariationStore", format!("outer index {outer} out of range"))
        })?;
        let row = data.deltas.get(inner as usize).ok_or_else(|| {
            FontError::corrupt("ItemVariationStore", format!("inner index {inner} out of range"))
        })?;

        let mut delta = 0.0f64;
        for (region_index, value) in data.region_indexes.iter().zip(row) {
            let scalar = scalars.get(*region_index as usize).copied().unwrap_or(0.0);
            delta += scalar as f64 * value;
        }
        Ok(delta)
    }

    pub fn delta(&self, outer: u16, inner: u16, coords: &NormalizedCoords) -> Result<f64> {
        let scalars = self.region_scalars(coords);
        self.delta_with_scalars(outer, inner, &scalars)
    }

    /// Per-region blend scalars for one ItemVariationData, in region-index
    /// order, as the CFF2 blend operator consumes them.
    pub fn blend_scalars(&self, outer: u16, coords: &NormalizedCoords) -> Result<Vec<f32>> {
        let data = self.data.get(outer as usize).ok_or_else(|| {
            FontError::corrupt("ItemVariationStore", format!("outer index {outer} out of range"))
        })?;
        let scalars = self.region_scalars(coords);
        Ok(data
            .region_indexes
            .iter()
            .map(|&r| scalars.get(r as usize).copied().unwrap_or(0.0))
            .collect())
    }

    pub fn region_count(&self, outer: u16) -> usize {
        self.data
            .get(outer as usize)
            .map(|d| d.region_indexes.len())
            .unwrap_or(0)
    }
}

/// DeltaSetIndexMap as used by HVAR/VVAR: maps a glyph id to an
/// (outer, inner) pair into the variation store.
#[derive(Debug, Clone)]
pub struct DeltaSetIndexMap {
    pub entries: Vec<(u16, u16)>,
}

impl DeltaSetIndexMap {
    pub fn from_reader(reader: &mut FontReader, offset: usize) -> Result<Self> {
        reader.set_position(offset)?;
        let format = reader.read_u8()?;
        let entry_format = reader.read_u8()?;
        let map_count = match format {
            0 => reader.read_u16()? as u32,
            1 => reader.read_u32()?,
            other => {
                return Err(FontError::UnsupportedVersion {
                    tag: "DeltaSetIndexMap",
                    version: other as u32,
                });
            }
        };

        let inner_bits = (entry_format & 0x0F) as u32 + 1;
        let entry_size = ((entry_format & 0x30) >> 4) as usize + 1;

        let mut entries = Vec::with_capacity(map_count as usize);
        for _ in 0..map_count {
            let mut value = 0u32;
            for _ in 0..entry_size {
                value = (value << 8) | reader.read_u8()? as u32;
            }
            let outer = (value >> inner_bits) as u16;
            let inner = (value & ((1 << inner_bits) - 1)) as u16;
            entries.push((outer, inner));
        }

        Ok(DeltaSetIndexMap { entries })
    }

    /// Glyph ids past the end of the map reuse the last entry.
    pub fn get(&self, glyph_id: u16) -> Option<(u16, u16)> {
        self.entries
            .get(glyph_id as usize)
            .or(self.entries.last())
            .copied()
    }
}

/// Map one user coordinate into [-1, +1] against (min, default, max).
pub fn normalize_coordinate(value: f32, min: f32, default: f32, max: f32) -> f32 {
    let value = value.clamp(min, max);
    if value < default {
        if default == min {
            0.0
        } else {
            -(default - value) / (default - min)
        }
    } else if value > default {
        if max == default {
            0.0
        } else {
            (value - default) / (max - default)
        }
    } else {
        0.0
    }
}
