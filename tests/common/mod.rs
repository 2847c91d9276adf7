// Shared fixture builder: synthesizes a minimal but valid TrueType font
// in memory so the integration tests never depend on files on disk.
#![allow(dead_code)]

use otf_rs::{FontWriter, calculate_checksum};

pub struct TestFontBuilder {
    tables: Vec<([u8; 4], Vec<u8>)>,
}

impl Default for TestFontBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFontBuilder {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    pub fn table(mut self, tag: [u8; 4], data: Vec<u8>) -> Self {
        self.tables.push((tag, data));
        self
    }

    /// Assemble an sfnt with proper directory, padding, and checksums.
    pub fn build(mut self) -> Vec<u8> {
        self.tables.sort_by(|a, b| a.0.cmp(&b.0));
        let num_tables = self.tables.len() as u16;

        let mut max_power = 1u16;
        let mut entry_selector = 0u16;
        while max_power * 2 <= num_tables {
            max_power *= 2;
            entry_selector += 1;
        }

        let mut writer = FontWriter::new();
        writer.write_u32(0x00010000);
        writer.write_u16(num_tables);
        writer.write_u16(max_power * 16);
        writer.write_u16(entry_selector);
        writer.write_u16(num_tables * 16 - max_power * 16);

        let mut offset = 12 + num_tables as u32 * 16;
        for (tag, data) in &self.tables {
            writer.write_tag(tag);
            writer.write_u32(calculate_checksum(data));
            writer.write_u32(offset);
            writer.write_u32(data.len() as u32);
            offset += data.len().next_multiple_of(4) as u32;
        }
        for (_, data) in &self.tables {
            writer.write_bytes(data);
            writer.write_padding(4);
        }

        writer.into_inner()
    }
}

pub fn head_table(index_to_loc_format: i16) -> Vec<u8> {
    let mut writer = FontWriter::new();
    writer.write_fixed(1.0);
    writer.write_fixed(1.0);
    writer.write_u32(0); // checksumAdjustment
    writer.write_u32(0x5F0F3CF5);
    writer.write_u16(0); // flags
    writer.write_u16(1000); // unitsPerEm
    writer.write_i64(0); // created
    writer.write_i64(0); // modified
    writer.write_i16(0);
    writer.write_i16(0);
    writer.write_i16(1000);
    writer.write_i16(1000);
    writer.write_u16(0); // macStyle
    writer.write_u16(8); // lowestRecPPEM
    writer.write_i16(2); // fontDirectionHint
    writer.write_i16(index_to_loc_format);
    writer.write_i16(0); // glyphDataFormat
    writer.into_inner()
}

pub fn maxp_table(num_glyphs: u16) -> Vec<u8> {
    let mut writer = FontWriter::new();
    writer.write_u32(0x00010000);
    writer.write_u16(num_glyphs);
    for _ in 0..13 {
        writer.write_u16(0);
    }
    writer.into_inner()
}

pub fn hhea_table(number_of_h_metrics: u16) -> Vec<u8> {
    let mut writer = FontWriter::new();
    writer.write_fixed(1.0);
    writer.write_i16(800); // ascent
    writer.write_i16(-200); // descent
    writer.write_i16(90); // lineGap
    writer.write_u16(600); // advanceWidthMax
    writer.write_i16(0);
    writer.write_i16(0);
    writer.write_i16(600);
    writer.write_i16(1);
    writer.write_i16(0);
    writer.write_i16(0);
    for _ in 0..4 {
        writer.write_i16(0); // reserved
    }
    writer.write_i16(0); // metricDataFormat
    writer.write_u16(number_of_h_metrics);
    writer.into_inner()
}

pub fn hmtx_table(metrics: &[(u16, i16)], trailing_lsbs: &[i16]) -> Vec<u8> {
    let mut writer = FontWriter::new();
    for &(advance, lsb) in metrics {
        writer.write_u16(advance);
        writer.write_i16(lsb);
    }
    for &lsb in trailing_lsbs {
        writer.write_i16(lsb);
    }
    writer.into_inner()
}

/// A format 4 cmap with one (3,1) encoding record, mapping 'A'..='Z' to
/// glyphs 1..=26 via idDelta.
pub fn cmap_format4_table() -> Vec<u8> {
    let mut sub = FontWriter::new();
    sub.write_u16(4); // format
    sub.write_u16(32); // length: 16 fixed + 2 segments * 8
    sub.write_u16(0); // language
    sub.write_u16(4); // segCountX2
    sub.write_u16(4); // searchRange
    sub.write_u16(1); // entrySelector
    sub.write_u16(0); // rangeShift
    sub.write_u16(0x5A); // endCode[0] = 'Z'
    sub.write_u16(0xFFFF); // endCode[1]
    sub.write_u16(0); // reservedPad
    sub.write_u16(0x41); // startCode[0] = 'A'
    sub.write_u16(0xFFFF); // startCode[1]
    sub.write_i16(-0x40); // idDelta[0]: 'A' (0x41) -> glyph 1
    sub.write_i16(1); // idDelta[1]
    sub.write_u16(0); // idRangeOffset[0]
    sub.write_u16(0); // idRangeOffset[1]
    let sub = sub.into_inner();

    let mut writer = FontWriter::new();
    writer.write_u16(0); // version
    writer.write_u16(1); // numTables
    writer.write_u16(3); // platformID
    writer.write_u16(1); // encodingID
    writer.write_u32(12); // offset
    writer.write_bytes(&sub);
    writer.into_inner()
}

/// A simple triangle glyph record: one contour, three on-curve points.
pub fn simple_glyph() -> Vec<u8> {
    let mut writer = FontWriter::new();
    writer.write_i16(1); // numberOfContours
    writer.write_i16(0); // xMin
    writer.write_i16(0); // yMin
    writer.write_i16(100); // xMax
    writer.write_i16(100); // yMax
    writer.write_u16(2); // endPtsOfContours[0]
    writer.write_u16(0); // instructionLength
    for _ in 0..3 {
        writer.write_u8(0x01); // on-curve, long x and y deltas
    }
    writer.write_i16(0);
    writer.write_i16(100);
    writer.write_i16(-50);
    writer.write_i16(0);
    writer.write_i16(0);
    writer.write_i16(100);
    writer.into_inner()
}

/// loca (long format) for glyph records laid out back to back.
pub fn loca_long(glyph_lengths: &[u32]) -> Vec<u8> {
    let mut writer = FontWriter::new();
    let mut offset = 0u32;
    writer.write_u32(0);
    for &len in glyph_lengths {
        offset += len;
        writer.write_u32(offset);
    }
    writer.into_inner()
}

/// A two-glyph TrueType font: glyph 0 empty, glyph 1 a triangle mapped
/// from 'A'..='Z'.
pub fn build_test_font() -> Vec<u8> {
    let glyph = simple_glyph();
    let glyf = glyph.clone();
    let loca = loca_long(&[0, glyph.len() as u32]);

    TestFontBuilder::new()
        .table(*b"head", head_table(1))
        .table(*b"maxp", maxp_table(2))
        .table(*b"hhea", hhea_table(2))
        .table(*b"hmtx", hmtx_table(&[(500, 0), (600, 10)], &[]))
        .table(*b"cmap", cmap_format4_table())
        .table(*b"loca", loca)
        .table(*b"glyf", glyf)
        .build()
}
