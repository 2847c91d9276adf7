use crate::error::{FontError, Result};
use crate::stream::FontReader;
use crate::tables::FontTable;
use crate::variation::NormalizedCoords;

// tupleVariationCount flags
const SHARED_POINT_NUMBERS: u16 = 0x8000;
const COUNT_MASK: u16 = 0x0FFF;

// tupleIndex flags
const EMBEDDED_PEAK_TUPLE: u16 = 0x8000;
const INTERMEDIATE_REGION: u16 = 0x4000;
const PRIVATE_POINT_NUMBERS: u16 = 0x2000;
const TUPLE_INDEX_MASK: u16 = 0x0FFF;

/// gvar table - TrueType glyph variations
///
/// Per-glyph tuple variation data is parsed on demand; the table keeps the
/// raw serialized bytes per glyph.
#[derive(Debug, Clone)]
pub struct GvarTable {
    pub axis_count: u16,
    pub shared_tuples: Vec<Vec<f32>>,
    glyph_data: Vec<Vec<u8>>,
}

/// Deltas for one glyph at one coordinate vector, indexed by point number
/// (including the four phantom points at the tail).
pub type PointDeltas = Vec<(f32, f32)>;

impl FontTable for GvarTable {
    fn from_reader(reader: &mut FontReader, _length: u32) -> Result<Self> {
        let major_version = reader.read_u16()?;
        let _minor_version = reader.read_u16()?;
        if major_version != 1 {
            return Err(FontError::UnsupportedVersion {
                tag: "gvar",
                version: major_version as u32,
            });
        }

        let axis_count = reader.read_u16()?;
        let shared_tuple_count = reader.read_u16()?;
        let shared_tuples_offset = reader.read_u32()? as usize;
        let glyph_count = reader.read_u16()?;
        let flags = reader.read_u16()?;
        let data_array_offset = reader.read_u32()? as usize;

        let long_offsets = flags & 1 != 0;
        let mut offsets = Vec::with_capacity(glyph_count as usize + 1);
        for _ in 0..=glyph_count {
            if long_offsets {
                offsets.push(reader.read_u32()?);
            } else {
                offsets.push(reader.read_u16()? as u32 * 2);
            }
        }

        let mut shared_tuples = Vec::with_capacity(shared_tuple_count as usize);
        reader.set_position(shared_tuples_offset)?;
        for _ in 0..shared_tuple_count {
            let mut tuple = Vec::with_capacity(axis_count as usize);
            for _ in 0..axis_count {
                tuple.push(reader.read_f2dot14()?);
            }
            shared_tuples.push(tuple);
        }

        let mut glyph_data = Vec::with_capacity(glyph_count as usize);
        for pair in offsets.windows(2) {
            let (start, end) = (pair[0] as usize, pair[1] as usize);
            if end < start {
                return Err(FontError::corrupt("gvar", "glyph data offsets not monotone"));
            }
            if start == end {
                glyph_data.push(Vec::new());
                continue;
            }
            let mut sub = reader.subreader(data_array_offset + start, end - start)?;
            glyph_data.push(sub.read_bytes(end - start)?);
        }

        Ok(GvarTable {
            axis_count,
            shared_tuples,
            glyph_data,
        })
    }
}

impl GvarTable {
    pub fn glyph_count(&self) -> usize {
        self.glyph_data.len()
    }

    /// Compute point deltas for a glyph at the given coordinates.
    ///
    /// `num_points` includes the four phantom points; `end_pts` lists the
    /// real contour endpoints and drives IUP for untouched points. Returns
    /// `None` when the glyph carries no variation data or no tuple applies.
    pub fn glyph_deltas(
        &self,
        glyph_id: u16,
        coords: &NormalizedCoords,
        num_points: usize,
        end_pts: &[u16],
        point_coords: &[(f32, f32)],
    ) -> Result<Option<PointDeltas>> {
        let data = match self.glyph_data.get(glyph_id as usize) {
            Some(data) if !data.is_empty() => data,
            _ => return Ok(None),
        };

        let mut reader = FontReader::from_slice(data);
        let tuple_count_raw = reader.read_u16()?;
        let tuple_count = (tuple_count_raw & COUNT_MASK) as usize;
        let data_offset = reader.read_u16()? as usize;

        // Tuple headers live right after the count/offset words; serialized
        // per-tuple data starts at data_offset
        struct TupleHeader {
            data_size: usize,
            peak: Vec<f32>,
            intermediate: Option<(Vec<f32>, Vec<f32>)>,
            private_points: bool,
        }

        let mut headers = Vec::with_capacity(tuple_count);
        for _ in 0..tuple_count {
            let data_size = reader.read_u16()? as usize;
            let tuple_index = reader.read_u16()?;

            let peak = if tuple_index & EMBEDDED_PEAK_TUPLE != 0 {
                let mut tuple = Vec::with_capacity(self.axis_count as usize);
                for _ in 0..self.axis_count {
                    tuple.push(reader.read_f2dot14()?);
                }
                tuple
            } else {
                let index = (tuple_index & TUPLE_INDEX_MASK) as usize;
                self.shared_tuples
                    .get(index)
                    .cloned()
                    .ok_or_else(|| FontError::corrupt("gvar", "shared tuple index out of range"))?
            };

            let intermediate = if tuple_index & INTERMEDIATE_REGION != 0 {
                let mut start = Vec::with_capacity(self.axis_count as usize);
                for _ in 0..self.axis_count {
                    start.push(reader.read_f2dot14()?);
                }
                let mut end = Vec::with_capacity(self.axis_count as usize);
                for _ in 0..self.axis_count {
                    end.push(reader.read_f2dot14()?);
                }
                Some((start, end))
            } else {
                None
            };

            headers.push(TupleHeader {
                data_size,
                peak,
                intermediate,
                private_points: tuple_index & PRIVATE_POINT_NUMBERS != 0,
            });
        }

        let mut serialized = FontReader::from_slice(&data[data_offset..]);
        let shared_points = if tuple_count_raw & SHARED_POINT_NUMBERS != 0 {
            Some(read_packed_points(&mut serialized, num_points)?)
        } else {
            None
        };

        let mut deltas: PointDeltas = vec![(0.0, 0.0); num_points];
        let mut any_applied = false;

        for header in &headers {
            let tuple_start = serialized.position();

            let scalar = tuple_scalar(coords, &header.peak, header.intermediate.as_ref());

            let points: Option<Vec<u16>> = if header.private_points {
                Some(read_packed_points(&mut serialized, num_points)?)
            } else {
                shared_points.clone()
            };

            let target_count = points.as_ref().map(|p| p.len()).unwrap_or(num_points);
            let x_deltas = read_packed_deltas(&mut serialized, target_count)?;
            let y_deltas = read_packed_deltas(&mut serialized, target_count)?;

            if scalar != 0.0 {
                any_applied = true;
                let mut tuple_deltas: PointDeltas = vec![(0.0, 0.0); num_points];
                let mut touched = vec![false; num_points];
                match &points {
                    None => {
                        for i in 0..num_points {
                            tuple_deltas[i] = (
                                x_deltas[i] as f32 * scalar,
                                y_deltas[i] as f32 * scalar,
                            );
                            touched[i] = true;
                        }
                    }
                    Some(point_numbers) => {
                        for (j, &point) in point_numbers.iter().enumerate() {
                            let point = point as usize;
                            if point < num_points {
                                tuple_deltas[point] = (
                                    x_deltas[j] as f32 * scalar,
                                    y_deltas[j] as f32 * scalar,
                                );
                                touched[point] = true;
                            }
                        }
                        interpolate_untouched_points(
                            &mut tuple_deltas,
                            &touched,
                            end_pts,
                            point_coords,
                        );
                    }
                }
                for i in 0..num_points {
                    deltas[i].0 += tuple_deltas[i].0;
                    deltas[i].1 += tuple_deltas[i].1;
                }
            }

            // Each tuple consumes exactly data_size bytes
            serialized.set_position(tuple_start + header.data_size)?;
        }

        Ok(any_applied.then_some(deltas))
    }
}

/// Scalar for one tuple region at the given coordinates.
fn tuple_scalar(
    coords: &NormalizedCoords,
    peak: &[f32],
    intermediate: Option<&(Vec<f32>, Vec<f32>)>,
) -> f32 {
    let mut scalar = 1.0f32;
    for (axis, &peak_value) in peak.iter().enumerate() {
        if peak_value == 0.0 {
            continue;
        }
        let coord = coords.get(axis);
        if coord == peak_value {
            continue;
        }

        match intermediate {
            None => {
                if coord == 0.0
                    || coord < peak_value.min(0.0)
                    || coord > peak_value.max(0.0)
                {
                    return 0.0;
                }
                scalar *= coord / peak_value;
            }
            Some((starts, ends)) => {
                let start = starts.get(axis).copied().unwrap_or(0.0);
                let end = ends.get(axis).copied().unwrap_or(0.0);
                if start > peak_value || peak_value > end {
                    continue;
                }
                if start < 0.0 && end > 0.0 && peak_value != 0.0 {
                    continue;
                }
                if coord < start || coord > end {
                    return 0.0;
                }
                if coord < peak_value {
                    if peak_value != start {
                        scalar *= (coord - start) / (peak_value - start);
                    }
                } else if peak_value != end {
                    scalar *= (end - coord) / (end - peak_value);
                }
            }
        }
    }
    scalar
}

/// Packed point numbers: count then byte/word runs of deltas.
fn read_packed_points(reader: &mut FontReader, num_points: usize) -> Result<Vec<u16>> {
    let first = reader.read_u8()?;
    if first == 0 {
        // All points
        return Ok((0..num_points as u16).collect());
    }
    let count = if first & 0x80 != 0 {
        (((first & 0x7F) as usize) << 8) | reader.read_u8()? as usize
    } else {
        first as usize
    };

    let mut points = Vec::with_capacity(count);
    let mut point = 0u16;
    while points.len() < count {
        let control = reader.read_u8()?;
        let words = control & 0x80 != 0;
        let run_count = (control & 0x7F) as usize + 1;
        for _ in 0..run_count {
            if points.len() == count {
                return Err(FontError::corrupt("gvar", "packed point run overflow"));
            }
            let delta = if words {
                reader.read_u16()?
            } else {
                reader.read_u8()? as u16
            };
            point = point.wrapping_add(delta);
            points.push(point);
        }
    }
    Ok(points)
}

/// Packed deltas: zero/byte/word runs.
fn read_packed_deltas(reader: &mut FontReader, count: usize) -> Result<Vec<i16>> {
    const DELTAS_ARE_ZERO: u8 = 0x80;
    const DELTAS_ARE_WORDS: u8 = 0x40;
    const DELTA_RUN_COUNT_MASK: u8 = 0x3F;

    let mut deltas = Vec::with_capacity(count);
    while deltas.len() < count {
        let control = reader.read_u8()?;
        let run_count = (control & DELTA_RUN_COUNT_MASK) as usize + 1;
        for _ in 0..run_count {
            if deltas.len() == count {
                return Err(FontError::corrupt("gvar", "packed delta run overflow"));
            }
            let delta = if control & DELTAS_ARE_ZERO != 0 {
                0
            } else if control & DELTAS_ARE_WORDS != 0 {
                reader.read_i16()?
            } else {
                reader.read_i8()? as i16
            };
            deltas.push(delta);
        }
    }
    Ok(deltas)
}

/// Interpolation of untouched points, per contour and per axis
/// independently. Phantom points are outside every contour and never
/// interpolated.
fn interpolate_untouched_points(
    deltas: &mut PointDeltas,
    touched: &[bool],
    end_pts: &[u16],
    point_coords: &[(f32, f32)],
) {
    let mut start = 0usize;
    for &end in end_pts {
        let end = end as usize;
        if end >= touched.len() || end < start {
            break;
        }
        for axis in 0..2 {
            interpolate_contour(deltas, touched, point_coords, start, end, axis);
        }
        start = end + 1;
    }
}

fn axis_value(v: &(f32, f32), axis: usize) -> f32 {
    if axis == 0 { v.0 } else { v.1 }
}

fn set_axis_value(v: &mut (f32, f32), axis: usize, value: f32) {
    if axis == 0 {
        v.0 = value;
    } else {
        v.1 = value;
    }
}

fn interpolate_contour(
    deltas: &mut PointDeltas,
    touched: &[bool],
    point_coords: &[(f32, f32)],
    start: usize,
    end: usize,
    axis: usize,
) {
    let touched_points: Vec<usize> = (start..=end).filter(|&i| touched[i]).collect();
    if touched_points.is_empty() {
        return;
    }
    if touched_points.len() == 1 {
        // A single touched point shifts the whole contour
        let delta = axis_value(&deltas[touched_points[0]], axis);
        for i in start..=end {
            if !touched[i] {
                set_axis_value(&mut deltas[i], axis, delta);
            }
        }
        return;
    }

    for i in start..=end {
        if touched[i] {
            continue;
        }
        // Nearest touched neighbors, wrapping around the contour
        let prev = *touched_points
            .iter()
            .rev()
            .find(|&&t| t < i)
            .unwrap_or(touched_points.last().unwrap());
        let next = *touched_points
            .iter()
            .find(|&&t| t > i)
            .unwrap_or(&touched_points[0]);

        let c = axis_value(&point_coords[i], axis);
        let c_prev = axis_value(&point_coords[prev], axis);
        let c_next = axis_value(&point_coords[next], axis);
        let d_prev = axis_value(&deltas[prev], axis);
        let d_next = axis_value(&deltas[next], axis);

        let (c_lo, d_lo, c_hi, d_hi) = if c_prev <= c_next {
            (c_prev, d_prev, c_next, d_next)
        } else {
            (c_next, d_next, c_prev, d_prev)
        };

        let value = if c <= c_lo {
            d_lo
        } else if c >= c_hi {
            d_hi
        } else if c_hi != c_lo {
            d_lo + (d_hi - d_lo) * (c - c_lo) / (c_hi - c_lo)
        } else {
            d_lo
        };
        set_axis_value(&mut deltas[i], axis, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_points_all() {
        let mut reader = FontReader::from_slice(&[0]);
        assert_eq!(read_packed_points(&mut reader, 4).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn packed_points_runs() {
        // count=3, one byte run of 3: deltas 1, 2, 3 -> points 1, 3, 6
        let mut reader = FontReader::from_slice(&[3, 0x02, 1, 2, 3]);
        assert_eq!(read_packed_points(&mut reader, 10).unwrap(), vec![1, 3, 6]);
    }

    #[test]
    fn packed_deltas_mixed_runs() {
        // 2 words (256, -1), 3 zeros, 1 byte (-5)
        let data = [0x41, 0x01, 0x00, 0xFF, 0xFF, 0x82, 0x00, 0xFB];
        let mut reader = FontReader::from_slice(&data);
        assert_eq!(
            read_packed_deltas(&mut reader, 6).unwrap(),
            vec![256, -1, 0, 0, 0, -5]
        );
    }

    #[test]
    fn tuple_scalar_simple_region() {
        let coords = NormalizedCoords(vec![0.5]);
        assert_eq!(tuple_scalar(&coords, &[1.0], None), 0.5);
        assert_eq!(tuple_scalar(&coords, &[0.5], None), 1.0);
        assert_eq!(tuple_scalar(&NormalizedCoords(vec![0.0]), &[1.0], None), 0.0);
        // Null peak applies everywhere
        assert_eq!(tuple_scalar(&NormalizedCoords(vec![0.9]), &[0.0], None), 1.0);
    }

    #[test]
    fn tuple_scalar_intermediate_region() {
        let intermediate = (vec![0.25], vec![1.0]);
        let peak = [0.5];
        let at = |c: f32| tuple_scalar(&NormalizedCoords(vec![c]), &peak, Some(&intermediate));
        assert_eq!(at(0.5), 1.0);
        assert_eq!(at(0.25), 0.0);
        assert_eq!(at(0.375), 0.5);
        assert_eq!(at(1.0), 0.0);
        assert_eq!(at(0.1), 0.0);
    }
}
