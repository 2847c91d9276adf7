//! Inverse transforms for WOFF2 `glyf`, `loca`, and `hmtx`.

use crate::error::{FontError, Result};
use crate::stream::{FontReader, FontWriter};

// Simple glyph flags, as written back into the reconstructed glyf
const GLYF_ON_CURVE: u8 = 1 << 0;
const GLYF_X_SHORT: u8 = 1 << 1;
const GLYF_Y_SHORT: u8 = 1 << 2;
const GLYF_REPEAT: u8 = 1 << 3;
const GLYF_X_SAME_OR_POSITIVE: u8 = 1 << 4;
const GLYF_Y_SAME_OR_POSITIVE: u8 = 1 << 5;
const GLYF_OVERLAP_SIMPLE: u8 = 1 << 6;

// Composite glyph flags
const ARG_1_AND_2_ARE_WORDS: u16 = 1 << 0;
const WE_HAVE_A_SCALE: u16 = 1 << 3;
const MORE_COMPONENTS: u16 = 1 << 5;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 1 << 6;
const WE_HAVE_A_TWO_BY_TWO: u16 = 1 << 7;
const WE_HAVE_INSTRUCTIONS: u16 = 1 << 8;

// Transformed glyf header option flags
const OVERLAP_SIMPLE_BITMAP: u16 = 1 << 0;

#[derive(Debug, Clone, Copy)]
struct DecodedPoint {
    x: i32,
    y: i32,
    on_curve: bool,
}

/// Everything the rest of the reconstruction needs from the glyf inverse:
/// the rebuilt tables plus the per-glyph xMin values `hmtx` may consume.
#[derive(Debug, Clone)]
pub struct ReconstructedGlyf {
    pub glyf: Vec<u8>,
    pub loca: Vec<u8>,
    pub num_glyphs: u16,
    pub index_format: u16,
    pub x_mins: Vec<i16>,
}

/// Invert the WOFF2 glyf transform and synthesize loca from the rebuilt
/// glyph extents.
pub fn reconstruct_glyf(data: &[u8]) -> Result<ReconstructedGlyf> {
    let mut header = FontReader::from_slice(data);

    let _reserved = header.read_u16()?;
    let option_flags = header.read_u16()?;
    let num_glyphs = header.read_u16()?;
    let index_format = header.read_u16()?;
    if index_format > 1 {
        return Err(FontError::corrupt(
            "glyf",
            format!("invalid indexFormat {index_format}"),
        ));
    }

    // Seven substream sizes follow the fixed fields
    let mut sizes = [0usize; 7];
    for size in sizes.iter_mut() {
        *size = header.read_u32()? as usize;
    }

    let mut offset = header.position();
    let mut streams: Vec<&[u8]> = Vec::with_capacity(7);
    for &size in &sizes {
        let end = offset.checked_add(size).filter(|&end| end <= data.len()).ok_or_else(
            || FontError::corrupt("glyf", "substream sizes exceed transform data"),
        )?;
        streams.push(&data[offset..end]);
        offset = end;
    }

    let mut n_contour_stream = FontReader::from_slice(streams[0]);
    let mut n_points_stream = FontReader::from_slice(streams[1]);
    let mut flag_stream = FontReader::from_slice(streams[2]);
    let mut glyph_stream = FontReader::from_slice(streams[3]);
    let mut composite_stream = FontReader::from_slice(streams[4]);
    let bbox_stream_bytes = streams[5];
    let mut instruction_stream = FontReader::from_slice(streams[6]);

    // The bbox substream opens with a bitmap, one bit per glyph, padded to
    // a 4-byte boundary
    let bbox_bitmap_len = ((num_glyphs as usize + 31) >> 5) << 2;
    if bbox_bitmap_len > bbox_stream_bytes.len() {
        return Err(FontError::corrupt("glyf", "bbox bitmap exceeds stream"));
    }
    let bbox_bitmap = &bbox_stream_bytes[..bbox_bitmap_len];
    let mut bbox_stream = FontReader::from_slice(&bbox_stream_bytes[bbox_bitmap_len..]);

    let overlap_bitmap = if option_flags & OVERLAP_SIMPLE_BITMAP != 0 {
        let len = (num_glyphs as usize + 7) >> 3;
        let end = offset.checked_add(len).filter(|&end| end <= data.len()).ok_or_else(
            || FontError::corrupt("glyf", "overlap bitmap exceeds transform data"),
        )?;
        Some(&data[offset..end])
    } else {
        None
    };

    let bit_set = |bitmap: &[u8], i: usize| bitmap[i >> 3] & (0x80 >> (i & 7)) != 0;

    let mut glyf = FontWriter::new();
    let mut loca_offsets = Vec::with_capacity(num_glyphs as usize + 1);
    let mut x_mins = vec![0i16; num_glyphs as usize];

    for glyph_index in 0..num_glyphs as usize {
        loca_offsets.push(glyf.position() as u32);

        let n_contours = n_contour_stream.read_i16()?;
        let have_bbox = bit_set(bbox_bitmap, glyph_index);

        if n_contours == 0 {
            // Empty glyph; an explicit bbox would be meaningless
            if have_bbox {
                return Err(FontError::corrupt("glyf", "empty glyph has a bbox"));
            }
            continue;
        }

        if n_contours == -1 {
            // Composite glyphs must carry an explicit bbox
            if !have_bbox {
                return Err(FontError::corrupt("glyf", "composite glyph missing bbox"));
            }
            reconstruct_composite(
                &mut composite_stream,
                &mut glyph_stream,
                &mut instruction_stream,
                &mut bbox_stream,
                &mut glyf,
            )?;
        } else if n_contours > 0 {
            let x_min = reconstruct_simple(
                n_contours as usize,
                &mut n_points_stream,
                &mut flag_stream,
                &mut glyph_stream,
                &mut instruction_stream,
                &mut bbox_stream,
                have_bbox,
                overlap_bitmap.map(|b| bit_set(b, glyph_index)).unwrap_or(false),
                &mut glyf,
            )?;
            x_mins[glyph_index] = x_min;
        } else {
            return Err(FontError::corrupt(
                "glyf",
                format!("invalid contour count {n_contours}"),
            ));
        }

        glyf.write_padding(4);
    }

    loca_offsets.push(glyf.position() as u32);

    let glyf = glyf.into_inner();
    let loca = store_loca(&loca_offsets, index_format)?;

    Ok(ReconstructedGlyf {
        glyf,
        loca,
        num_glyphs,
        index_format,
        x_mins,
    })
}

/// Emit loca in short or long format per the transformed header's
/// indexFormat.
fn store_loca(offsets: &[u32], index_format: u16) -> Result<Vec<u8>> {
    let mut writer = FontWriter::with_capacity(offsets.len() * 4);
    for &offset in offsets {
        if index_format == 0 {
            if offset % 2 != 0 || offset / 2 > u16::MAX as u32 {
                return Err(FontError::corrupt(
                    "loca",
                    "offset not representable in short format",
                ));
            }
            writer.write_u16((offset / 2) as u16);
        } else {
            writer.write_u32(offset);
        }
    }
    Ok(writer.into_inner())
}

#[allow(clippy::too_many_arguments)]
fn reconstruct_simple(
    n_contours: usize,
    n_points_stream: &mut FontReader,
    flag_stream: &mut FontReader,
    glyph_stream: &mut FontReader,
    instruction_stream: &mut FontReader,
    bbox_stream: &mut FontReader,
    have_bbox: bool,
    overlap_bit: bool,
    out: &mut FontWriter,
) -> Result<i16> {
    // Per-contour point counts, 255UInt16 coded
    let mut end_pts = Vec::with_capacity(n_contours);
    let mut total_points = 0usize;
    for _ in 0..n_contours {
        let n = n_points_stream.read_255u16()? as usize;
        total_points += n;
        if total_points == 0 || total_points > 0xFFFF {
            return Err(FontError::corrupt("glyf", "bad point count"));
        }
        end_pts.push(total_points - 1);
    }

    // One flag byte per point: bit 7 clear means on-curve, low bits select
    // the triplet encoding
    let flags = flag_stream.read_bytes(total_points)?;
    let mut points = Vec::with_capacity(total_points);
    let mut x = 0i32;
    let mut y = 0i32;
    for &flag in &flags {
        let (dx, dy) = decode_triplet(flag & 0x7F, glyph_stream)?;
        x = x.checked_add(dx).ok_or_else(|| FontError::corrupt("glyf", "coordinate overflow"))?;
        y = y.checked_add(dy).ok_or_else(|| FontError::corrupt("glyf", "coordinate overflow"))?;
        points.push(DecodedPoint {
            x,
            y,
            on_curve: flag & 0x80 == 0,
        });
    }

    let instruction_size = glyph_stream.read_255u16()? as usize;
    let instructions = instruction_stream.read_bytes(instruction_size)?;

    out.write_i16(n_contours as i16);
    if have_bbox {
        out.write_bytes(&bbox_stream.read_bytes(8)?);
    } else {
        write_bbox(&points, out);
    }
    // xMin sits right after the contour count
    let x_min_bytes = &out.as_slice()[out.position() - 8..out.position() - 6];
    let x_min = i16::from_be_bytes([x_min_bytes[0], x_min_bytes[1]]);

    for &end in &end_pts {
        out.write_u16(end as u16);
    }
    out.write_u16(instruction_size as u16);
    out.write_bytes(&instructions);
    write_points(&points, overlap_bit, out);

    Ok(x_min)
}

fn reconstruct_composite(
    composite_stream: &mut FontReader,
    glyph_stream: &mut FontReader,
    instruction_stream: &mut FontReader,
    bbox_stream: &mut FontReader,
    out: &mut FontWriter,
) -> Result<()> {
    out.write_i16(-1);
    out.write_bytes(&bbox_stream.read_bytes(8)?);

    // Component records are already in sfnt form; copy them through
    let mut have_instructions = false;
    let mut flags = MORE_COMPONENTS;
    while flags & MORE_COMPONENTS != 0 {
        flags = composite_stream.read_u16()?;
        have_instructions |= flags & WE_HAVE_INSTRUCTIONS != 0;

        let mut arg_size = 2; // glyph index
        if flags & ARG_1_AND_2_ARE_WORDS != 0 {
            arg_size += 4;
        } else {
            arg_size += 2;
        }
        if flags & WE_HAVE_A_SCALE != 0 {
            arg_size += 2;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            arg_size += 4;
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            arg_size += 8;
        }

        out.write_u16(flags);
        out.write_bytes(&composite_stream.read_bytes(arg_size)?);
    }

    if have_instructions {
        let instruction_size = glyph_stream.read_255u16()? as usize;
        out.write_u16(instruction_size as u16);
        out.write_bytes(&instruction_stream.read_bytes(instruction_size)?);
    }

    Ok(())
}

/// Decode one coordinate triplet. The code (the flag's low 7 bits) selects
/// 1-4 data bytes and the delta layout per the WOFF2 triplet table.
fn decode_triplet(code: u8, stream: &mut FontReader) -> Result<(i32, i32)> {
    fn with_sign(flag: u8, value: i32) -> i32 {
        if flag & 1 != 0 { value } else { -value }
    }

    let code = code as i32;
    Ok(match code {
        0..=9 => {
            let b0 = stream.read_u8()? as i32;
            (0, with_sign(code as u8, ((code & 14) << 7) + b0))
        }
        10..=19 => {
            let b0 = stream.read_u8()? as i32;
            (with_sign(code as u8, (((code - 10) & 14) << 7) + b0), 0)
        }
        20..=83 => {
            let b0 = code - 20;
            let b1 = stream.read_u8()? as i32;
            (
                with_sign(code as u8, 1 + (b0 & 0x30) + (b1 >> 4)),
                with_sign((code >> 1) as u8, 1 + ((b0 & 0x0C) << 2) + (b1 & 0x0F)),
            )
        }
        84..=119 => {
            let b0 = code - 84;
            let b1 = stream.read_u8()? as i32;
            let b2 = stream.read_u8()? as i32;
            (
                with_sign(code as u8, 1 + ((b0 / 12) << 8) + b1),
                with_sign((code >> 1) as u8, 1 + (((b0 % 12) >> 2) << 8) + b2),
            )
        }
        120..=123 => {
            let b0 = stream.read_u8()? as i32;
            let b1 = stream.read_u8()? as i32;
            let b2 = stream.read_u8()? as i32;
            (
                with_sign(code as u8, (b0 << 4) + (b1 >> 4)),
                with_sign((code >> 1) as u8, ((b1 & 0x0F) << 8) + b2),
            )
        }
        _ => {
            let b0 = stream.read_u8()? as i32;
            let b1 = stream.read_u8()? as i32;
            let b2 = stream.read_u8()? as i32;
            let b3 = stream.read_u8()? as i32;
            (
                with_sign(code as u8, (b0 << 8) + b1),
                with_sign((code >> 1) as u8, (b2 << 8) + b3),
            )
        }
    })
}

fn write_bbox(points: &[DecodedPoint], out: &mut FontWriter) {
    let mut x_min = 0;
    let mut y_min = 0;
    let mut x_max = 0;
    let mut y_max = 0;
    if let Some(first) = points.first() {
        x_min = first.x;
        x_max = first.x;
        y_min = first.y;
        y_max = first.y;
    }
    for p in points.iter().skip(1) {
        x_min = x_min.min(p.x);
        x_max = x_max.max(p.x);
        y_min = y_min.min(p.y);
        y_max = y_max.max(p.y);
    }
    out.write_i16(x_min as i16);
    out.write_i16(y_min as i16);
    out.write_i16(x_max as i16);
    out.write_i16(y_max as i16);
}

/// Re-encode points with the standard glyf flag/coordinate packing,
/// including the repeat mechanism.
fn write_points(points: &[DecodedPoint], overlap_bit: bool, out: &mut FontWriter) {
    let mut flags = Vec::with_capacity(points.len());
    let mut x_bytes = FontWriter::new();
    let mut y_bytes = FontWriter::new();

    let mut last_x = 0i32;
    let mut last_y = 0i32;
    for (i, point) in points.iter().enumerate() {
        let mut flag = if point.on_curve { GLYF_ON_CURVE } else { 0 };
        if overlap_bit && i == 0 {
            flag |= GLYF_OVERLAP_SIMPLE;
        }

        let dx = point.x - last_x;
        let dy = point.y - last_y;

        if dx == 0 {
            flag |= GLYF_X_SAME_OR_POSITIVE;
        } else if (-255..=255).contains(&dx) {
            flag |= GLYF_X_SHORT;
            if dx > 0 {
                flag |= GLYF_X_SAME_OR_POSITIVE;
            }
            x_bytes.write_u8(dx.unsigned_abs() as u8);
        } else {
            x_bytes.write_i16(dx as i16);
        }

        if dy == 0 {
            flag |= GLYF_Y_SAME_OR_POSITIVE;
        } else if (-255..=255).contains(&dy) {
            flag |= GLYF_Y_SHORT;
            if dy > 0 {
                flag |= GLYF_Y_SAME_OR_POSITIVE;
            }
            y_bytes.write_u8(dy.unsigned_abs() as u8);
        } else {
            y_bytes.write_i16(dy as i16);
        }

        flags.push(flag);
        last_x = point.x;
        last_y = point.y;
    }

    // Flags with run-length compression
    let mut i = 0;
    while i < flags.len() {
        let flag = flags[i];
        let mut repeat = 0usize;
        while i + 1 + repeat < flags.len() && flags[i + 1 + repeat] == flag && repeat < 255 {
            repeat += 1;
        }
        if repeat > 0 {
            out.write_u8(flag | GLYF_REPEAT);
            out.write_u8(repeat as u8);
            i += 1 + repeat;
        } else {
            out.write_u8(flag);
            i += 1;
        }
    }

    out.write_bytes(x_bytes.as_slice());
    out.write_bytes(y_bytes.as_slice());
}

/// Invert the WOFF2 hmtx transform: advances are stored in full, elided
/// side bearings come back from the glyph bounding boxes.
pub fn reconstruct_hmtx(
    data: &[u8],
    num_glyphs: u16,
    num_h_metrics: u16,
    x_mins: &[i16],
) -> Result<Vec<u8>> {
    let mut reader = FontReader::from_slice(data);

    let flags = reader.read_u8()?;
    let has_proportional_lsbs = flags & 0x01 == 0;
    let has_monospace_lsbs = flags & 0x02 == 0;

    if flags & 0xFC != 0 {
        return Err(FontError::corrupt("hmtx", "reserved transform flag bits set"));
    }
    // A transform that elides nothing carries no information
    if has_proportional_lsbs && has_monospace_lsbs {
        return Err(FontError::corrupt("hmtx", "transform elides no side bearings"));
    }
    if num_h_metrics > num_glyphs {
        return Err(FontError::InvariantViolation(format!(
            "hhea.numberOfHMetrics ({num_h_metrics}) exceeds numGlyphs ({num_glyphs})"
        )));
    }
    if num_h_metrics < 1 {
        return Err(FontError::InvariantViolation(
            "hhea.numberOfHMetrics must be at least 1".to_string(),
        ));
    }
    if x_mins.len() != num_glyphs as usize {
        return Err(FontError::corrupt("hmtx", "missing glyf bounding boxes"));
    }

    let mut advances = Vec::with_capacity(num_h_metrics as usize);
    for _ in 0..num_h_metrics {
        advances.push(reader.read_u16()?);
    }

    let mut lsbs = Vec::with_capacity(num_glyphs as usize);
    for i in 0..num_h_metrics as usize {
        if has_proportional_lsbs {
            lsbs.push(reader.read_i16()?);
        } else {
            lsbs.push(x_mins[i]);
        }
    }
    for i in num_h_metrics as usize..num_glyphs as usize {
        if has_monospace_lsbs {
            lsbs.push(reader.read_i16()?);
        } else {
            lsbs.push(x_mins[i]);
        }
    }

    let mut out = FontWriter::with_capacity(2 * num_glyphs as usize + 2 * num_h_metrics as usize);
    for i in 0..num_glyphs as usize {
        if i < num_h_metrics as usize {
            out.write_u16(advances[i]);
        }
        out.write_i16(lsbs[i]);
    }
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triplet_zero_dx_small_dy() {
        // Code 1: dy = (0 << 7) + b0, positive
        let mut stream = FontReader::from_slice(&[42]);
        assert_eq!(decode_triplet(1, &mut stream).unwrap(), (0, 42));
        // Code 0: same magnitude, negative
        let mut stream = FontReader::from_slice(&[42]);
        assert_eq!(decode_triplet(0, &mut stream).unwrap(), (0, -42));
    }

    #[test]
    fn triplet_two_byte_pair() {
        // Code 20: b0 = 0, dx = 1 + (b1 >> 4), dy = 1 + (b1 & 0xF),
        // both negative (sign bits clear)
        let mut stream = FontReader::from_slice(&[0x53]);
        assert_eq!(decode_triplet(20, &mut stream).unwrap(), (-6, -4));
    }

    #[test]
    fn triplet_full_words() {
        let mut stream = FontReader::from_slice(&[0x01, 0x00, 0x02, 0x00]);
        // Code 127: both signs positive
        assert_eq!(decode_triplet(127, &mut stream).unwrap(), (256, 512));
    }

    #[test]
    fn hmtx_rejects_reserved_flags() {
        let err = reconstruct_hmtx(&[0x04], 1, 1, &[0]).unwrap_err();
        assert!(matches!(err, FontError::Corrupt { tag: "hmtx", .. }));
    }

    #[test]
    fn hmtx_backfills_lsb_from_xmin() {
        // flags: bit0 set (proportional LSBs elided), bit1 clear would elide
        // nothing; elide only proportional
        let mut data = Vec::new();
        data.push(0x01);
        data.extend_from_slice(&500u16.to_be_bytes()); // advance
        // no proportional lsbs; monospace lsbs present for glyph 1
        data.extend_from_slice(&7i16.to_be_bytes());
        let hmtx = reconstruct_hmtx(&data, 2, 1, &[33, 0]).unwrap();
        // glyph 0: advance 500, lsb = xMin 33; glyph 1: lsb 7
        assert_eq!(hmtx, vec![0x01, 0xF4, 0x00, 0x21, 0x00, 0x07]);
    }

    #[test]
    fn store_loca_short_divides_by_two() {
        let loca = store_loca(&[0, 100, 200], 0).unwrap();
        assert_eq!(loca, vec![0, 0, 0, 50, 0, 100]);
    }
}
