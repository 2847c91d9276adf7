use crate::error::{FontError, Result};
use crate::stream::FontReader;
use crate::tables::FontTable;

/// avar table - Axis variations (piecewise-linear remapping of normalized
/// coordinates)
#[derive(Debug, Clone)]
pub struct AvarTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub axis_segment_maps: Vec<AxisSegmentMap>,
}

#[derive(Debug, Clone)]
pub struct AxisSegmentMap {
    /// (fromCoordinate, toCoordinate) pairs sorted by fromCoordinate.
    pub position_map: Vec<(f32, f32)>,
}

impl AxisSegmentMap {
    /// Piecewise-linear remap of one normalized coordinate.
    pub fn remap(&self, value: f32) -> f32 {
        if self.position_map.len() < 2 {
            return value;
        }

        let first = self.position_map[0];
        if value <= first.0 {
            return first.1;
        }
        for pair in self.position_map.windows(2) {
            let (from0, to0) = pair[0];
            let (from1, to1) = pair[1];
            if value <= from1 {
                if from1 == from0 {
                    return to1;
                }
                return to0 + (to1 - to0) * (value - from0) / (from1 - from0);
            }
        }
        self.position_map.last().map(|&(_, to)| to).unwrap_or(value)
    }
}

impl AvarTable {
    /// Remap every coordinate through its axis map.
    pub fn remap_coordinates(&self, coords: &mut [f32]) {
        for (coord, map) in coords.iter_mut().zip(&self.axis_segment_maps) {
            *coord = map.remap(*coord);
        }
    }
}

impl FontTable for AvarTable {
    fn from_reader(reader: &mut FontReader, _length: u32) -> Result<Self> {
        let major_version = reader.read_u16()?;
        let minor_version = reader.read_u16()?;
        if major_version != 1 {
            return Err(FontError::UnsupportedVersion {
                tag: "avar",
                version: ((major_version as u32) << 16) | minor_version as u32,
            });
        }

        reader.skip(2)?; // reserved
        let axis_count = reader.read_u16()?;

        let mut axis_segment_maps = Vec::with_capacity(axis_count as usize);
        for _ in 0..axis_count {
            let position_map_count = reader.read_u16()?;
            let mut position_map = Vec::with_capacity(position_map_count as usize);
            for _ in 0..position_map_count {
                let from = reader.read_f2dot14()?;
                let to = reader.read_f2dot14()?;
                position_map.push((from, to));
            }
            axis_segment_maps.push(AxisSegmentMap { position_map });
        }

        Ok(AvarTable {
            major_version,
            minor_version,
            axis_segment_maps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_identity_endpoints() {
        let map = AxisSegmentMap {
            position_map: vec![(-1.0, -1.0), (0.0, 0.0), (0.5, 0.75), (1.0, 1.0)],
        };
        assert_eq!(map.remap(-1.0), -1.0);
        assert_eq!(map.remap(0.0), 0.0);
        assert_eq!(map.remap(0.5), 0.75);
        assert_eq!(map.remap(1.0), 1.0);
        // Between 0.5 and 1.0 the ramp runs 0.75 -> 1.0
        assert_eq!(map.remap(0.75), 0.875);
    }

    #[test]
    fn short_maps_pass_through() {
        let map = AxisSegmentMap {
            position_map: vec![],
        };
        assert_eq!(map.remap(0.25), 0.25);
    }
}
