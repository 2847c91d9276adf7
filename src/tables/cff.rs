use crate::error::{FontError, Result};
use crate::outline::Outline;
use crate::stream::FontReader;
use crate::tables::FontTable;

use super::charstring::CharstringInterpreter;

/// CFF INDEX: `count` variable-length items addressed through `count + 1`
/// offsets.
#[derive(Debug, Clone, Default)]
pub struct Index {
    pub items: Vec<Vec<u8>>,
}

impl Index {
    pub fn empty() -> Self {
        Index { items: Vec::new() }
    }

    /// CFF1 INDEX with a 16-bit count.
    pub fn from_reader(reader: &mut FontReader) -> Result<Self> {
        let count = reader.read_u16()? as usize;
        Self::read_body(reader, count)
    }

    /// CFF2 INDEX with a 32-bit count.
    pub fn from_reader_u32(reader: &mut FontReader) -> Result<Self> {
        let count = reader.read_u32()? as usize;
        Self::read_body(reader, count)
    }

    fn read_body(reader: &mut FontReader, count: usize) -> Result<Self> {
        if count == 0 {
            return Ok(Index::empty());
        }

        let off_size = reader.read_u8()?;
        if !(1..=4).contains(&off_size) {
            return Err(FontError::corrupt(
                "CFF ",
                format!("INDEX offSize {off_size} out of range"),
            ));
        }

        let mut offsets = Vec::with_capacity(count + 1);
        for _ in 0..=count {
            let mut value = 0u32;
            for _ in 0..off_size {
                value = (value << 8) | reader.read_u8()? as u32;
            }
            if value == 0 {
                return Err(FontError::corrupt("CFF ", "INDEX offset is zero"));
            }
            offsets.push(value);
        }

        let data_start = reader.position();
        let mut items = Vec::with_capacity(count);
        for pair in offsets.windows(2) {
            let (start, end) = (pair[0] as usize, pair[1] as usize);
            if end < start {
                return Err(FontError::corrupt("CFF ", "INDEX offsets not monotone"));
            }
            // Offsets are 1-based from the byte preceding the data
            let mut sub = reader.subreader(data_start + start - 1, end - start)?;
            items.push(sub.read_bytes(end - start)?);
        }

        // Leave the cursor after the INDEX data
        let total = offsets.last().copied().unwrap_or(1) as usize - 1;
        reader.set_position(data_start + total)?;

        Ok(Index { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.items.get(index).map(Vec::as_slice)
    }

    /// Subroutine bias per the Type 2 spec.
    pub fn bias(&self) -> i32 {
        if self.len() < 1240 {
            107
        } else if self.len() < 33900 {
            1131
        } else {
            32768
        }
    }
}

/// CFF DICT operator keys. Two-byte operators are keyed as `0x0c00 | b1`.
pub mod dict_op {
    pub const CHARSET: u16 = 15;
    pub const ENCODING: u16 = 16;
    pub const CHARSTRINGS: u16 = 17;
    pub const PRIVATE: u16 = 18;
    pub const SUBRS: u16 = 19;
    pub const DEFAULT_WIDTH_X: u16 = 20;
    pub const NOMINAL_WIDTH_X: u16 = 21;
    pub const VSINDEX: u16 = 22;
    pub const BLEND: u16 = 23;
    pub const VSTORE: u16 = 24;
    pub const ROS: u16 = 0x0C1E;
    pub const FD_ARRAY: u16 = 0x0C24;
    pub const FD_SELECT: u16 = 0x0C25;
}

/// A parsed DICT: operator key to operand list, in file order.
#[derive(Debug, Clone, Default)]
pub struct Dict {
    pub entries: Vec<(u16, Vec<f64>)>,
}

impl Dict {
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut operands: Vec<f64> = Vec::new();
        let mut i = 0usize;

        while i < data.len() {
            let b0 = data[i];
            match b0 {
                0..=27 => {
                    let op = if b0 == 12 {
                        i += 1;
                        let b1 = *data.get(i).ok_or_else(|| {
                            FontError::corrupt("CFF ", "truncated DICT operator")
                        })?;
                        0x0C00 | b1 as u16
                    } else {
                        b0 as u16
                    };
                    i += 1;

                    if op == dict_op::BLEND {
                        // Blended DICT values need a region count to resolve;
                        // outline decoding only consults unblended entries
                        operands.clear();
                        continue;
                    }
                    entries.push((op, std::mem::take(&mut operands)));
                }
                28 => {
                    if i + 3 > data.len() {
                        return Err(FontError::corrupt("CFF ", "truncated DICT operand"));
                    }
                    operands.push(i16::from_be_bytes([data[i + 1], data[i + 2]]) as f64);
                    i += 3;
                }
                29 => {
                    if i + 5 > data.len() {
                        return Err(FontError::corrupt("CFF ", "truncated DICT operand"));
                    }
                    operands.push(i32::from_be_bytes([
                        data[i + 1],
                        data[i + 2],
                        data[i + 3],
                        data[i + 4],
                    ]) as f64);
                    i += 5;
                }
                30 => {
                    let (value, consumed) = parse_real(&data[i + 1..])?;
                    operands.push(value);
                    i += 1 + consumed;
                }
                32..=246 => {
                    operands.push(b0 as f64 - 139.0);
                    i += 1;
                }
                247..=250 => {
                    if i + 2 > data.len() {
                        return Err(FontError::corrupt("CFF ", "truncated DICT operand"));
                    }
                    operands.push((b0 as f64 - 247.0) * 256.0 + data[i + 1] as f64 + 108.0);
                    i += 2;
                }
                251..=254 => {
                    if i + 2 > data.len() {
                        return Err(FontError::corrupt("CFF ", "truncated DICT operand"));
                    }
                    operands.push(-(b0 as f64 - 251.0) * 256.0 - data[i + 1] as f64 - 108.0);
                    i += 2;
                }
                other => {
                    return Err(FontError::corrupt(
                        "CFF ",
                        format!("unknown DICT operator {other}"),
                    ));
                }
            }
        }

        Ok(Dict { entries })
    }

    pub fn get(&self, op: u16) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|(key, _)| *key == op)
            .map(|(_, operands)| operands.as_slice())
    }

    pub fn get_offset(&self, op: u16) -> Option<usize> {
        self.get(op)?.first().map(|&v| v as usize)
    }

    pub fn get_f64(&self, op: u16) -> Option<f64> {
        self.get(op)?.first().copied()
    }
}

/// Nibble-coded real number. Returns the value and bytes consumed.
fn parse_real(data: &[u8]) -> Result<(f64, usize)> {
    let mut text = String::new();
    for (consumed, &byte) in data.iter().enumerate() {
        for nibble in [byte >> 4, byte & 0x0F] {
            match nibble {
                0..=9 => text.push((b'0' + nibble) as char),
                0x0A => text.push('.'),
                0x0B => text.push('E'),
                0x0C => text.push_str("E-"),
                0x0E => text.push('-'),
                0x0F => {
                    let value = text.parse::<f64>().map_err(|_| {
                        FontError::corrupt("CFF ", format!("malformed real '{text}'"))
                    })?;
                    return Ok((value, consumed + 1));
                }
                _ => return Err(FontError::corrupt("CFF ", "reserved nibble in real")),
            }
        }
    }
    Err(FontError::corrupt("CFF ", "unterminated real operand"))
}

/// FDSelect: glyph id to Font DICT index for CID-keyed fonts.
#[derive(Debug, Clone)]
pub enum FdSelect {
    Format0(Vec<u8>),
    Format3 { ranges: Vec<(u16, u8)>, sentinel: u16 },
}

impl FdSelect {
    pub fn from_reader(reader: &mut FontReader, num_glyphs: u16) -> Result<Self> {
        let format = reader.read_u8()?;
        match format {
            0 => {
                let mut fds = Vec::with_capacity(num_glyphs as usize);
                for _ in 0..num_glyphs {
                    fds.push(reader.read_u8()?);
                }
                Ok(FdSelect::Format0(fds))
            }
            3 => {
                let range_count = reader.read_u16()?;
                let mut ranges = Vec::with_capacity(range_count as usize);
                for _ in 0..range_count {
                    let first = reader.read_u16()?;
                    let fd = reader.read_u8()?;
                    ranges.push((first, fd));
                }
                let sentinel = reader.read_u16()?;
                Ok(FdSelect::Format3 { ranges, sentinel })
            }
            other => Err(FontError::corrupt(
                "CFF ",
                format!("unknown FDSelect format {other}"),
            )),
        }
    }

    pub fn fd_index(&self, glyph_id: u16) -> Option<u8> {
        match self {
            FdSelect::Format0(fds) => fds.get(glyph_id as usize).copied(),
            FdSelect::Format3 { ranges, sentinel } => {
                if glyph_id >= *sentinel {
                    return None;
                }
                let idx = ranges.partition_point(|&(first, _)| first <= glyph_id);
                idx.checked_sub(1).map(|i| ranges[i].1)
            }
        }
    }
}

/// Charset: glyph id to SID (string id). Predefined charsets keep only
/// their id.
#[derive(Debug, Clone)]
pub enum Charset {
    Predefined(u8),
    Custom(Vec<u16>),
}

impl Charset {
    pub fn sid(&self, glyph_id: u16) -> Option<u16> {
        match self {
            Charset::Predefined(_) => Some(glyph_id),
            Charset::Custom(sids) => sids.get(glyph_id as usize).copied(),
        }
    }
}

/// One set of per-glyph decoding resources: local subrs plus width
/// defaults. Non-CID fonts have exactly one; CID fonts one per Font DICT.
#[derive(Debug, Clone, Default)]
pub struct Subfont {
    pub local_subrs: Index,
    pub default_width_x: f64,
    pub nominal_width_x: f64,
    /// CFF2 only: the Private DICT's default ItemVariationData index.
    pub vsindex: u16,
}

/// CFF table - Compact Font Format (version 1) outlines
#[derive(Debug, Clone)]
pub struct CffTable {
    pub charstrings: Index,
    pub global_subrs: Index,
    pub charset: Charset,
    pub subfonts: Vec<Subfont>,
    pub fd_select: Option<FdSelect>,
}

impl CffTable {
    pub fn num_glyphs(&self) -> u16 {
        self.charstrings.len() as u16
    }

    fn subfont_for_glyph(&self, glyph_id: u16) -> Result<&Subfont> {
        let index = match &self.fd_select {
            Some(fd_select) => fd_select.fd_index(glyph_id).ok_or_else(|| {
                FontError::corrupt("CFF ", format!("no FD for glyph {glyph_id}"))
            })? as usize,
            None => 0,
        };
        self.subfonts
            .get(index)
            .ok_or_else(|| FontError::corrupt("CFF ", format!("FD index {index} out of range")))
    }

    /// Interpret the glyph's charstring into the shared contour
    /// abstraction.
    pub fn outline(&self, glyph_id: u16) -> Result<Outline> {
        Ok(self.decode_glyph(glyph_id)?.0)
    }

    /// Glyph advance width from the charstring's width operand, resolved
    /// against the Private DICT defaults.
    pub fn glyph_width(&self, glyph_id: u16) -> Result<f64> {
        let subfont = self.subfont_for_glyph(glyph_id)?;
        let width = self.decode_glyph(glyph_id)?.1;
        Ok(match width {
            Some(width) => subfont.nominal_width_x + width,
            None => subfont.default_width_x,
        })
    }

    fn decode_glyph(&self, glyph_id: u16) -> Result<(Outline, Option<f64>)> {
        let charstring = self
            .charstrings
            .get(glyph_id as usize)
            .ok_or_else(|| FontError::corrupt("CFF ", format!("glyph {glyph_id} out of range")))?;
        let subfont = self.subfont_for_glyph(glyph_id)?;

        let interpreter =
            CharstringInterpreter::new(&self.global_subrs, &subfont.local_subrs, false, None);
        interpreter.run_with_width(charstring)
    }
}

/// Parse a Private DICT and its local subrs. `table` addresses the whole
/// CFF table so the Subrs offset (relative to the Private DICT) resolves.
fn parse_private(
    table: &mut FontReader,
    private_offset: usize,
    private_size: usize,
) -> Result<Subfont> {
    let mut sub = table.subreader(private_offset, private_size)?;
    let dict_bytes = sub.read_bytes(private_size)?;
    let private = Dict::from_slice(&dict_bytes)?;

    let local_subrs = match private.get_offset(dict_op::SUBRS) {
        Some(subrs_offset) => {
            table.set_position(private_offset + subrs_offset)?;
            Index::from_reader(table)?
        }
        None => Index::empty(),
    };

    Ok(Subfont {
        local_subrs,
        default_width_x: private.get_f64(dict_op::DEFAULT_WIDTH_X).unwrap_or(0.0),
        nominal_width_x: private.get_f64(dict_op::NOMINAL_WIDTH_X).unwrap_or(0.0),
        vsindex: private.get_f64(dict_op::VSINDEX).unwrap_or(0.0) as u16,
    })
}

fn parse_charset(reader: &mut FontReader, offset: usize, num_glyphs: u16) -> Result<Charset> {
    if offset <= 2 {
        return Ok(Charset::Predefined(offset as u8));
    }

    reader.set_position(offset)?;
    let format = reader.read_u8()?;
    // Glyph 0 (.notdef) is implicit
    let mut sids = Vec::with_capacity(num_glyphs as usize);
    sids.push(0);

    match format {
        0 => {
            while sids.len() < num_glyphs as usize {
                sids.push(reader.read_u16()?);
            }
        }
        1 | 2 => {
            while sids.len() < num_glyphs as usize {
                let first = reader.read_u16()?;
                let n_left = if format == 1 {
                    reader.read_u8()? as u32
                } else {
                    reader.read_u16()? as u32
                };
                for i in 0..=n_left {
                    if sids.len() == num_glyphs as usize {
                        break;
                    }
                    sids.push((first as u32 + i) as u16);
                }
            }
        }
        other => {
            return Err(FontError::corrupt(
                "CFF ",
                format!("unknown charset format {other}"),
            ));
        }
    }

    Ok(Charset::Custom(sids))
}

impl FontTable for CffTable {
    fn from_reader(reader: &mut FontReader, _length: u32) -> Result<Self> {
        let major = reader.read_u8()?;
        let _minor = reader.read_u8()?;
        if major != 1 {
            return Err(FontError::UnsupportedVersion {
                tag: "CFF ",
                version: major as u32,
            });
        }
        let header_size = reader.read_u8()? as usize;
        let _off_size = reader.read_u8()?;

        reader.set_position(header_size)?;
        let _name_index = Index::from_reader(reader)?;
        let top_dict_index = Index::from_reader(reader)?;
        let _string_index = Index::from_reader(reader)?;
        let global_subrs = Index::from_reader(reader)?;

        let top_dict_bytes = top_dict_index
            .get(0)
            .ok_or_else(|| FontError::corrupt("CFF ", "missing Top DICT"))?;
        let top_dict = Dict::from_slice(top_dict_bytes)?;

        let charstrings_offset = top_dict
            .get_offset(dict_op::CHARSTRINGS)
            .ok_or_else(|| FontError::corrupt("CFF ", "Top DICT missing CharStrings"))?;
        reader.set_position(charstrings_offset)?;
        let charstrings = Index::from_reader(reader)?;
        let num_glyphs = charstrings.len() as u16;

        let charset = match top_dict.get_offset(dict_op::CHARSET) {
            Some(offset) => parse_charset(reader, offset, num_glyphs)?,
            None => Charset::Predefined(0),
        };

        let is_cid = top_dict.get(dict_op::ROS).is_some();

        let (subfonts, fd_select) = if is_cid {
            let fd_array_offset = top_dict
                .get_offset(dict_op::FD_ARRAY)
                .ok_or_else(|| FontError::corrupt("CFF ", "CID font missing FDArray"))?;
            let fd_select_offset = top_dict
                .get_offset(dict_op::FD_SELECT)
                .ok_or_else(|| FontError::corrupt("CFF ", "CID font missing FDSelect"))?;

            reader.set_position(fd_array_offset)?;
            let fd_array = Index::from_reader(reader)?;

            let mut subfonts = Vec::with_capacity(fd_array.len());
            for fd_bytes in &fd_array.items {
                let font_dict = Dict::from_slice(fd_bytes)?;
                let subfont = match font_dict.get(dict_op::PRIVATE) {
                    Some([size, offset]) => {
                        parse_private(reader, *offset as usize, *size as usize)?
                    }
                    _ => Subfont::default(),
                };
                subfonts.push(subfont);
            }

            reader.set_position(fd_select_offset)?;
            let fd_select = FdSelect::from_reader(reader, num_glyphs)?;
            (subfonts, Some(fd_select))
        } else {
            let subfont = match top_dict.get(dict_op::PRIVATE) {
                Some([size, offset]) => parse_private(reader, *offset as usize, *size as usize)?,
                _ => Subfont::default(),
            };
            (vec![subfont], None)
        };

        Ok(CffTable {
            charstrings,
            global_subrs,
            charset,
            subfonts,
            fd_select,
        })
    }
}
