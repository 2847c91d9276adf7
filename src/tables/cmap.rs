use crate::error::{FontError, Result};
use crate::stream::FontReader;
use crate::tables::FontTable;

/// cmap table - Character to glyph mapping
#[derive(Debug, Clone)]
pub struct CmapTable {
    pub version: u16,
    pub encoding_records: Vec<EncodingRecord>,
    pub subtables: Vec<CmapSubtable>,
    /// Index into `subtables` of the preferred base subtable.
    best_subtable: Option<usize>,
    /// Index into `subtables` of the format 14 subtable, if any.
    variation_subtable: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct EncodingRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub offset: u32,
}

#[derive(Debug, Clone)]
pub enum CmapSubtable {
    Format0(Format0),
    Format2(Format2),
    Format4(Format4),
    Format6(Format6),
    Format10(Format10),
    Format12(Format12),
    Format13(Format13),
    Format14(Format14),
}

impl CmapSubtable {
    pub fn format(&self) -> u16 {
        match self {
            CmapSubtable::Format0(_) => 0,
            CmapSubtable::Format2(_) => 2,
            CmapSubtable::Format4(_) => 4,
            CmapSubtable::Format6(_) => 6,
            CmapSubtable::Format10(_) => 10,
            CmapSubtable::Format12(_) => 12,
            CmapSubtable::Format13(_) => 13,
            CmapSubtable::Format14(_) => 14,
        }
    }

    /// Base lookup; format 14 subtables never match here.
    pub fn get_glyph(&self, code: u32) -> Option<u16> {
        match self {
            CmapSubtable::Format0(f) if code <= 0xFF => f.get_glyph(code as u8),
            CmapSubtable::Format2(f) if code <= 0xFFFF => f.get_glyph(code as u16),
            CmapSubtable::Format4(f) if code <= 0xFFFF => f.get_glyph(code as u16),
            CmapSubtable::Format6(f) if code <= 0xFFFF => f.get_glyph(code as u16),
            CmapSubtable::Format10(f) => f.get_glyph(code),
            CmapSubtable::Format12(f) => f.get_glyph(code),
            CmapSubtable::Format13(f) => f.get_glyph(code),
            _ => None,
        }
    }
}

/// 256-entry byte encoding table
#[derive(Debug, Clone)]
pub struct Format0 {
    pub language: u16,
    pub glyph_id_array: Vec<u8>,
}

impl Format0 {
    pub fn get_glyph(&self, char_code: u8) -> Option<u16> {
        match self.glyph_id_array.get(char_code as usize) {
            Some(0) | None => None,
            Some(&id) => Some(id as u16),
        }
    }
}

/// High-byte mapping through sub-headers (mixed 8/16-bit encodings)
#[derive(Debug, Clone)]
pub struct Format2 {
    pub language: u16,
    pub sub_header_keys: Vec<u16>,
    pub sub_headers: Vec<SubHeader>,
}

#[derive(Debug, Clone)]
pub struct SubHeader {
    pub first_code: u16,
    pub entry_count: u16,
    pub id_delta: i16,
    /// Glyph indices materialized from the idRangeOffset pointer chase.
    pub glyph_indices: Vec<u16>,
}

impl Format2 {
    pub fn get_glyph(&self, char_code: u16) -> Option<u16> {
        let high = (char_code >> 8) as usize;
        let low = char_code & 0xFF;

        let key = *self.sub_header_keys.get(high)? as usize / 8;
        if key == 0 {
            // Single-byte code; the high byte is the whole code
            if char_code > 0xFF {
                return None;
            }
            return self.lookup(0, char_code);
        }
        self.lookup(key, low)
    }

    fn lookup(&self, sub_header: usize, low: u16) -> Option<u16> {
        let sub = self.sub_headers.get(sub_header)?;
        if low < sub.first_code || low >= sub.first_code.wrapping_add(sub.entry_count) {
            return None;
        }
        let index = (low - sub.first_code) as usize;
        let glyph = *sub.glyph_indices.get(index)?;
        if glyph == 0 {
            return None;
        }
        Some((glyph as i32 + sub.id_delta as i32) as u16)
    }
}

/// Segment mapping to delta values (BMP)
#[derive(Debug, Clone)]
pub struct Format4 {
    pub language: u16,
    pub end_codes: Vec<u16>,
    pub start_codes: Vec<u16>,
    pub id_deltas: Vec<i16>,
    pub id_range_offsets: Vec<u16>,
    pub glyph_id_array: Vec<u16>,
    segments_sorted: bool,
}

impl Format4 {
    pub fn seg_count(&self) -> usize {
        self.end_codes.len()
    }

    pub fn get_glyph(&self, char_code: u16) -> Option<u16> {
        let seg = if self.segments_sorted {
            self.find_segment_binary(char_code)?
        } else {
            // Malformed segment ordering; fall back to a linear scan
            self.find_segment_linear(char_code)?
        };

        let start_code = self.start_codes[seg];
        if char_code < start_code {
            return None;
        }

        let id_delta = self.id_deltas[seg] as i32;
        let id_range_offset = self.id_range_offsets[seg];

        let glyph = if id_range_offset == 0 {
            (char_code as i32 + id_delta) as u16
        } else {
            // The stored offset is relative to its own slot in the
            // idRangeOffset array; rebase it onto glyph_id_array
            let index = (id_range_offset as usize / 2 + (char_code - start_code) as usize)
                .checked_sub(self.seg_count() - seg)?;
            let glyph = *self.glyph_id_array.get(index)?;
            if glyph == 0 {
                return None;
            }
            (glyph as i32 + id_delta) as u16
        };

        if glyph == 0 { None } else { Some(glyph) }
    }

    fn find_segment_binary(&self, char_code: u16) -> Option<usize> {
        let seg = self.end_codes.partition_point(|&end| end < char_code);
        (seg < self.end_codes.len()).then_some(seg)
    }

    fn find_segment_linear(&self, char_code: u16) -> Option<usize> {
        self.end_codes
            .iter()
            .zip(&self.start_codes)
            .position(|(&end, &start)| start <= char_code && char_code <= end)
    }
}

/// Trimmed table mapping
#[derive(Debug, Clone)]
pub struct Format6 {
    pub language: u16,
    pub first_code: u16,
    pub glyph_id_array: Vec<u16>,
}

impl Format6 {
    pub fn get_glyph(&self, char_code: u16) -> Option<u16> {
        let index = char_code.checked_sub(self.first_code)? as usize;
        match self.glyph_id_array.get(index) {
            Some(0) | None => None,
            Some(&id) => Some(id),
        }
    }
}

/// Trimmed array (32-bit codepoints)
#[derive(Debug, Clone)]
pub struct Format10 {
    pub language: u32,
    pub start_char_code: u32,
    pub glyph_id_array: Vec<u16>,
}

impl Format10 {
    pub fn get_glyph(&self, char_code: u32) -> Option<u16> {
        let index = char_code.checked_sub(self.start_char_code)? as usize;
        match self.glyph_id_array.get(index) {
            Some(0) | None => None,
            Some(&id) => Some(id),
        }
    }
}

/// Segmented coverage: sequential groups
#[derive(Debug, Clone)]
pub struct Format12 {
    pub language: u32,
    pub groups: Vec<MapGroup>,
}

/// Many-to-one range mappings: constant groups
#[derive(Debug, Clone)]
pub struct Format13 {
    pub language: u32,
    pub groups: Vec<MapGroup>,
}

#[derive(Debug, Clone)]
pub struct MapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub glyph_id: u32,
}

fn find_group(groups: &[MapGroup], char_code: u32) -> Option<&MapGroup> {
    let idx = groups.partition_point(|g| g.end_char_code < char_code);
    let group = groups.get(idx)?;
    (group.start_char_code <= char_code).then_some(group)
}

impl Format12 {
    pub fn get_glyph(&self, char_code: u32) -> Option<u16> {
        let group = find_group(&self.groups, char_code)?;
        let glyph = group.glyph_id + (char_code - group.start_char_code);
        if glyph == 0 { None } else { Some(glyph as u16) }
    }
}

impl Format13 {
    pub fn get_glyph(&self, char_code: u32) -> Option<u16> {
        let group = find_group(&self.groups, char_code)?;
        if group.glyph_id == 0 {
            None
        } else {
            Some(group.glyph_id as u16)
        }
    }
}

/// Unicode variation sequences
#[derive(Debug, Clone)]
pub struct Format14 {
    pub records: Vec<VariationSelectorRecord>,
}

#[derive(Debug, Clone)]
pub struct VariationSelectorRecord {
    pub var_selector: u32,
    pub default_ranges: Vec<UnicodeRange>,
    pub non_default_mappings: Vec<UvsMapping>,
}

#[derive(Debug, Clone)]
pub struct UnicodeRange {
    pub start_unicode_value: u32,
    pub additional_count: u8,
}

#[derive(Debug, Clone)]
pub struct UvsMapping {
    pub unicode_value: u32,
    pub glyph_id: u16,
}

/// Result of a variation-sequence lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariantResult {
    /// The sequence selects an explicit glyph.
    Glyph(u16),
    /// The sequence maps to the character's default glyph (use the base
    /// cmap lookup).
    UseDefault,
}

impl Format14 {
    pub fn get_variant(&self, char_code: u32, var_selector: u32) -> Option<VariantResult> {
        let idx = self
            .records
            .binary_search_by_key(&var_selector, |r| r.var_selector)
            .ok()?;
        let record = &self.records[idx];

        if let Some(mapping) = record
            .non_default_mappings
            .iter()
            .find(|m| m.unicode_value == char_code)
        {
            return Some(VariantResult::Glyph(mapping.glyph_id));
        }

        let in_default = record.default_ranges.iter().any(|r| {
            char_code >= r.start_unicode_value
                && char_code <= r.start_unicode_value + r.additional_count as u32
        });
        in_default.then_some(VariantResult::UseDefault)
    }
}

impl CmapTable {
    /// Subtable selection priority: Unicode full > Unicode BMP > Mac Roman.
    const PREFERRED_ENCODINGS: [(u16, u16); 8] = [
        (3, 10), // Windows, Unicode full
        (0, 6),  // Unicode, full repertoire
        (0, 4),  // Unicode 2.0+, full repertoire
        (3, 1),  // Windows, Unicode BMP
        (0, 3),  // Unicode 2.0+, BMP
        (0, 2),  // ISO 10646
        (0, 1),  // Unicode 1.1
        (1, 0),  // Macintosh, Roman
    ];

    pub fn best_subtable(&self) -> Option<&CmapSubtable> {
        self.best_subtable.map(|i| &self.subtables[i])
    }

    pub fn variation_subtable(&self) -> Option<&Format14> {
        self.variation_subtable
            .and_then(|i| match &self.subtables[i] {
                CmapSubtable::Format14(f) => Some(f),
                _ => None,
            })
    }

    /// Unified lookup: `variation_selector` consults format 14 first; a
    /// sequence that is neither a non-default nor a default mapping returns
    /// `None` so the caller can fall back to a base-only lookup.
    pub fn glyph_id(&self, char_code: u32, variation_selector: Option<u32>) -> Option<u16> {
        match variation_selector {
            None => self.best_subtable()?.get_glyph(char_code),
            Some(vs) => match self.variation_subtable()?.get_variant(char_code, vs)? {
                VariantResult::Glyph(glyph) => Some(glyph),
                VariantResult::UseDefault => self.best_subtable()?.get_glyph(char_code),
            },
        }
    }

    pub fn map_char(&self, c: char) -> Option<u16> {
        self.glyph_id(c as u32, None)
    }

    fn select_best(encoding_records: &[EncodingRecord], subtables: &[Option<usize>]) -> Option<usize> {
        for (platform_id, encoding_id) in &Self::PREFERRED_ENCODINGS {
            for (i, record) in encoding_records.iter().enumerate() {
                if record.platform_id == *platform_id && record.encoding_id == *encoding_id {
                    if let Some(subtable) = subtables[i] {
                        return Some(subtable);
                    }
                }
            }
        }
        // Fall back to any decoded non-variation subtable
        subtables.iter().flatten().copied().next()
    }
}

impl FontTable for CmapTable {
    fn from_reader(reader: &mut FontReader, _length: u32) -> Result<Self> {
        let version = reader.read_u16()?;
        let num_tables = reader.read_u16()?;

        let mut encoding_records = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            encoding_records.push(EncodingRecord {
                platform_id: reader.read_u16()?,
                encoding_id: reader.read_u16()?,
                offset: reader.read_u32()?,
            });
        }

        let mut subtables = Vec::new();
        // Per encoding record: index into `subtables` if it decoded
        let mut decoded: Vec<Option<usize>> = Vec::with_capacity(num_tables as usize);
        let mut variation_subtable = None;

        for record in &encoding_records {
            reader.set_position(record.offset as usize)?;
            match parse_subtable(reader) {
                Ok(subtable) => {
                    if subtable.format() == 14 && variation_subtable.is_none() {
                        variation_subtable = Some(subtables.len());
                    }
                    decoded.push(Some(subtables.len()));
                    subtables.push(subtable);
                }
                Err(FontError::Corrupt { reason, .. }) => {
                    // Skip this encoding record; another will be chosen
                    log::warn!(
                        "skipping cmap subtable for platform {} encoding {}: {}",
                        record.platform_id,
                        record.encoding_id,
                        reason
                    );
                    decoded.push(None);
                }
                Err(other) => return Err(other),
            }
        }

        let best_subtable = CmapTable::select_best(&encoding_records, &decoded)
            .filter(|&i| subtables[i].format() != 14);

        Ok(CmapTable {
            version,
            encoding_records,
            subtables,
            best_subtable,
            variation_subtable,
        })
    }
}

fn parse_subtable(reader: &mut FontReader) -> Result<CmapSubtable> {
    let base = reader.position();
    let format = reader.read_u16()?;
    match format {
        0 => {
            let _length = reader.read_u16()?;
            let language = reader.read_u16()?;
            let glyph_id_array = reader.read_bytes(256)?;
            Ok(CmapSubtable::Format0(Format0 {
                language,
                glyph_id_array,
            }))
        }
        2 => parse_format2(reader),
        4 => parse_format4(reader),
        6 => {
            let _length = reader.read_u16()?;
            let language = reader.read_u16()?;
            let first_code = reader.read_u16()?;
            let entry_count = reader.read_u16()?;
            let mut glyph_id_array = Vec::with_capacity(entry_count as usize);
            for _ in 0..entry_count {
                glyph_id_array.push(reader.read_u16()?);
            }
            Ok(CmapSubtable::Format6(Format6 {
                language,
                first_code,
                glyph_id_array,
            }))
        }
        10 => {
            reader.skip(2)?; // reserved
            let _length = reader.read_u32()?;
            let language = reader.read_u32()?;
            let start_char_code = reader.read_u32()?;
            let num_chars = reader.read_u32()?;
            let mut glyph_id_array = Vec::with_capacity(num_chars as usize);
            for _ in 0..num_chars {
                glyph_id_array.push(reader.read_u16()?);
            }
            Ok(CmapSubtable::Format10(Format10 {
                language,
                start_char_code,
                glyph_id_array,
            }))
        }
        12 => {
            let groups = parse_groups(reader)?;
            Ok(CmapSubtable::Format12(Format12 {
                language: groups.0,
                groups: groups.1,
            }))
        }
        13 => {
            let groups = parse_groups(reader)?;
            Ok(CmapSubtable::Format13(Format13 {
                language: groups.0,
                groups: groups.1,
            }))
        }
        14 => parse_format14(reader, base),
        other => Err(FontError::corrupt(
            "cmap",
            format!("unsupported subtable format {other}"),
        )),
    }
}

fn parse_format2(reader: &mut FontReader) -> Result<CmapSubtable> {
    let _length = reader.read_u16()?;
    let language = reader.read_u16()?;

    let mut sub_header_keys = Vec::with_capacity(256);
    let mut max_key = 0u16;
    for _ in 0..256 {
        let key = reader.read_u16()?;
        max_key = max_key.max(key / 8);
        sub_header_keys.push(key);
    }

    let sub_header_base = reader.position();
    let num_sub_headers = max_key as usize + 1;

    let mut sub_headers = Vec::with_capacity(num_sub_headers);
    for i in 0..num_sub_headers {
        reader.set_position(sub_header_base + i * 8)?;
        let first_code = reader.read_u16()?;
        let entry_count = reader.read_u16()?;
        let id_delta = reader.read_i16()?;
        let id_range_offset = reader.read_u16()?;

        // idRangeOffset is relative to its own slot; materialize the glyph
        // index run it points at
        let slot_pos = sub_header_base + i * 8 + 6;
        let array_pos = slot_pos + id_range_offset as usize;
        let mut glyph_indices = Vec::with_capacity(entry_count as usize);
        if entry_count > 0 {
            reader.set_position(array_pos)?;
            for _ in 0..entry_count {
                glyph_indices.push(reader.read_u16()?);
            }
        }

        sub_headers.push(SubHeader {
            first_code,
            entry_count,
            id_delta,
            glyph_indices,
        });
    }

    Ok(CmapSubtable::Format2(Format2 {
        language,
        sub_header_keys,
        sub_headers,
    }))
}

fn parse_format4(reader: &mut FontReader) -> Result<CmapSubtable> {
    let length = reader.read_u16()?;
    let language = reader.read_u16()?;
    let seg_count_x2 = reader.read_u16()?;
    if seg_count_x2 == 0 || seg_count_x2 % 2 != 0 {
        return Err(FontError::corrupt(
            "cmap",
            format!("format 4 has invalid segCountX2 {seg_count_x2}"),
        ));
    }
    let seg_count = (seg_count_x2 / 2) as usize;
    let _search_range = reader.read_u16()?;
    let _entry_selector = reader.read_u16()?;
    let _range_shift = reader.read_u16()?;

    let mut end_codes = Vec::with_capacity(seg_count);
    for _ in 0..seg_count {
        end_codes.push(reader.read_u16()?);
    }

    let _reserved_pad = reader.read_u16()?;

    let mut start_codes = Vec::with_capacity(seg_count);
    for _ in 0..seg_count {
        start_codes.push(reader.read_u16()?);
    }

    let mut id_deltas = Vec::with_capacity(seg_count);
    for _ in 0..seg_count {
        id_deltas.push(reader.read_i16()?);
    }

    let mut id_range_offsets = Vec::with_capacity(seg_count);
    for _ in 0..seg_count {
        id_range_offsets.push(reader.read_u16()?);
    }

    // The glyph id array fills the rest of the subtable; a lying length
    // field is capped by the data actually present
    let fixed_size = 16 + seg_count * 8;
    let remaining_words = ((length as usize).saturating_sub(fixed_size) / 2)
        .min(reader.remaining() / 2);
    let mut glyph_id_array = Vec::with_capacity(remaining_words);
    for _ in 0..remaining_words {
        glyph_id_array.push(reader.read_u16()?);
    }

    // The last segment must be the 0xFFFF terminator
    if end_codes.last() != Some(&0xFFFF) {
        return Err(FontError::corrupt(
            "cmap",
            "format 4 missing 0xFFFF terminator segment",
        ));
    }

    let segments_sorted = end_codes.windows(2).all(|pair| pair[0] <= pair[1]);
    if !segments_sorted {
        log::warn!("cmap format 4 segments not sorted by endCode; using linear scan");
    }

    Ok(CmapSubtable::Format4(Format4 {
        language,
        end_codes,
        start_codes,
        id_deltas,
        id_range_offsets,
        glyph_id_array,
        segments_sorted,
    }))
}

fn parse_groups(reader: &mut FontReader) -> Result<(u32, Vec<MapGroup>)> {
    reader.skip(2)?; // reserved
    let _length = reader.read_u32()?;
    let language = reader.read_u32()?;
    let num_groups = reader.read_u32()?;

    let mut groups = Vec::with_capacity(num_groups as usize);
    let mut prev_end = None;
    for _ in 0..num_groups {
        let start_char_code = reader.read_u32()?;
        let end_char_code = reader.read_u32()?;
        let glyph_id = reader.read_u32()?;
        if end_char_code < start_char_code {
            return Err(FontError::corrupt("cmap", "group end before start"));
        }
        if let Some(prev) = prev_end {
            if start_char_code <= prev {
                return Err(FontError::corrupt("cmap", "groups not sorted"));
            }
        }
        prev_end = Some(end_char_code);
        groups.push(MapGroup {
            start_char_code,
            end_char_code,
            glyph_id,
        });
    }

    Ok((language, groups))
}

fn parse_format14(reader: &mut FontReader, base: usize) -> Result<CmapSubtable> {
    let _length = reader.read_u32()?;
    let num_selectors = reader.read_u32()?;

    struct RawSelector {
        var_selector: u32,
        default_uvs_offset: u32,
        non_default_uvs_offset: u32,
    }

    let mut raw = Vec::with_capacity(num_selectors as usize);
    for _ in 0..num_selectors {
        raw.push(RawSelector {
            var_selector: reader.read_u24()?,
            default_uvs_offset: reader.read_u32()?,
            non_default_uvs_offset: reader.read_u32()?,
        });
    }

    let mut records = Vec::with_capacity(num_selectors as usize);
    for selector in raw {
        let mut default_ranges = Vec::new();
        if selector.default_uvs_offset != 0 {
            reader.set_position(base + selector.default_uvs_offset as usize)?;
            let num_ranges = reader.read_u32()?;
            default_ranges.reserve(num_ranges as usize);
            for _ in 0..num_ranges {
                default_ranges.push(UnicodeRange {
                    start_unicode_value: reader.read_u24()?,
                    additional_count: reader.read_u8()?,
                });
            }
        }

        let mut non_default_mappings = Vec::new();
        if selector.non_default_uvs_offset != 0 {
            reader.set_position(base + selector.non_default_uvs_offset as usize)?;
            let num_mappings = reader.read_u32()?;
            non_default_mappings.reserve(num_mappings as usize);
            for _ in 0..num_mappings {
                non_default_mappings.push(UvsMapping {
                    unicode_value: reader.read_u24()?,
                    glyph_id: reader.read_u16()?,
                });
            }
        }

        records.push(VariationSelectorRecord {
            var_selector: selector.var_selector,
            default_ranges,
            non_default_mappings,
        });
    }

    Ok(CmapSubtable::Format14(Format14 { records }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format4_fixture() -> Format4 {
        // Segments: [0x41..0x5A] delta -0x40, terminator 0xFFFF -> 0
        Format4 {
            language: 0,
            end_codes: vec![0x5A, 0xFFFF],
            start_codes: vec![0x41, 0xFFFF],
            id_deltas: vec![-0x40, 1],
            id_range_offsets: vec![0, 0],
            glyph_id_array: vec![],
            segments_sorted: true,
        }
    }

    #[test]
    fn format4_delta_segment() {
        let f = format4_fixture();
        assert_eq!(f.get_glyph(0x41), Some(1));
        assert_eq!(f.get_glyph(0x5A), Some(0x1A));
        assert_eq!(f.get_glyph(0x40), None);
        assert_eq!(f.get_glyph(0x5B), None);
    }

    #[test]
    fn format4_terminator_segment_maps_to_zero() {
        let f = format4_fixture();
        // 0xFFFF + 1 == 0 mod 65536, and glyph 0 reads as unmapped
        assert_eq!(f.get_glyph(0xFFFF), None);
    }

    #[test]
    fn format4_range_offset_segment() {
        // One mapped segment [0x61..0x63] via glyph id array
        let f = Format4 {
            language: 0,
            end_codes: vec![0x63, 0xFFFF],
            start_codes: vec![0x61, 0xFFFF],
            id_deltas: vec![0, 1],
            // Slot 0 points 2 slots ahead (past the remaining 2 offsets)
            id_range_offsets: vec![4, 0],
            glyph_id_array: vec![10, 11, 12],
            segments_sorted: true,
        };
        assert_eq!(f.get_glyph(0x61), Some(10));
        assert_eq!(f.get_glyph(0x62), Some(11));
        assert_eq!(f.get_glyph(0x63), Some(12));
    }

    #[test]
    fn format12_sequential_group() {
        let f = Format12 {
            language: 0,
            groups: vec![MapGroup {
                start_char_code: 0x1F600,
                end_char_code: 0x1F60F,
                glyph_id: 100,
            }],
        };
        assert_eq!(f.get_glyph(0x1F600), Some(100));
        assert_eq!(f.get_glyph(0x1F605), Some(105));
        assert_eq!(f.get_glyph(0x1F610), None);
    }

    #[test]
    fn format13_constant_group() {
        let f = Format13 {
            language: 0,
            groups: vec![MapGroup {
                start_char_code: 0,
                end_char_code: 0xFFFF,
                glyph_id: 7,
            }],
        };
        assert_eq!(f.get_glyph(0), Some(7));
        assert_eq!(f.get_glyph(0x1234), Some(7));
        assert_eq!(f.get_glyph(0x10000), None);
    }

    #[test]
    fn format14_variant_selection() {
        let f = Format14 {
            records: vec![VariationSelectorRecord {
                var_selector: 0xFE00,
                default_ranges: vec![UnicodeRange {
                    start_unicode_value: 0x2600,
                    additional_count: 4,
                }],
                non_default_mappings: vec![UvsMapping {
                    unicode_value: 0x2764,
                    glyph_id: 55,
                }],
            }],
        };
        assert_eq!(
            f.get_variant(0x2764, 0xFE00),
            Some(VariantResult::Glyph(55))
        );
        assert_eq!(
            f.get_variant(0x2602, 0xFE00),
            Some(VariantResult::UseDefault)
        );
        assert_eq!(f.get_variant(0x41, 0xFE00), None);
        assert_eq!(f.get_variant(0x2764, 0xFE01), None);
    }
}
