mod common;

use common::{build_test_font, head_table};
use otf_rs::{
    CmapSubtable, CmapTable, Font, FontError, FontReader, FontTable, FontWriter, HeadTable,
    MaxpTable, NameTable, PostTable,
};

#[test]
fn head_table_parses() {
    let data = head_table(1);
    let len = data.len() as u32;
    let head = HeadTable::from_reader(&mut FontReader::new(data), len).unwrap();
    assert_eq!(head.units_per_em, 1000);
    assert_eq!(head.magic_number, 0x5F0F3CF5);
    assert!(head.is_long_loca_format());
}

#[test]
fn head_table_rejects_bad_magic() {
    let mut data = head_table(0);
    data[12] = 0; // clobber the magic number
    let len = data.len() as u32;
    let err = HeadTable::from_reader(&mut FontReader::new(data), len).unwrap_err();
    assert!(matches!(err, FontError::Corrupt { tag: "head", .. }));
}

#[test]
fn maxp_rejects_zero_glyphs() {
    let mut writer = FontWriter::new();
    writer.write_u32(0x00010000);
    writer.write_u16(0);
    let data = writer.into_inner();
    let len = data.len() as u32;
    let err = MaxpTable::from_reader(&mut FontReader::new(data), len).unwrap_err();
    assert!(matches!(err, FontError::InvariantViolation(_)));
}

#[test]
fn maxp_version_05_stops_early() {
    let mut writer = FontWriter::new();
    writer.write_u32(0x00005000);
    writer.write_u16(7);
    let data = writer.into_inner();
    let len = data.len() as u32;
    let maxp = MaxpTable::from_reader(&mut FontReader::new(data), len).unwrap();
    assert!(maxp.is_version_0_5());
    assert_eq!(maxp.num_glyphs, 7);
    assert_eq!(maxp.max_points, None);
}

#[test]
fn cmap_selects_preferred_subtable() {
    let font = Font::from_data(build_test_font()).unwrap();
    let cmap = font.cmap_table().unwrap();
    let best = cmap.best_subtable().unwrap();
    assert_eq!(best.format(), 4);
    assert_eq!(cmap.map_char('A'), Some(1));
    assert_eq!(cmap.map_char('Z'), Some(26));
    assert_eq!(cmap.map_char('a'), None);
}

#[test]
fn cmap_skips_unknown_subtable_formats() {
    // Two encoding records: a bogus format 99 subtable and a format 0
    let mut format0 = FontWriter::new();
    format0.write_u16(0);
    format0.write_u16(262);
    format0.write_u16(0);
    let mut glyphs = vec![0u8; 256];
    glyphs[b'A' as usize] = 5;
    format0.write_bytes(&glyphs);
    let format0 = format0.into_inner();

    let mut writer = FontWriter::new();
    writer.write_u16(0);
    writer.write_u16(2);
    writer.write_u16(0); // platform
    writer.write_u16(3);
    writer.write_u32(20); // offset of the bogus subtable
    writer.write_u16(1); // platform
    writer.write_u16(0);
    writer.write_u32(24); // offset of the format 0 subtable
    writer.write_u16(99); // unknown format
    writer.write_u16(0);
    writer.write_bytes(&format0);
    let data = writer.into_inner();

    let len = data.len() as u32;
    let cmap = CmapTable::from_reader(&mut FontReader::new(data), len).unwrap();
    let best = cmap.best_subtable().unwrap();
    assert!(matches!(best, CmapSubtable::Format0(_)));
    assert_eq!(cmap.glyph_id('A' as u32, None), Some(5));
}

#[test]
fn cmap_prefers_unicode_full_over_bmp() {
    // (3,1) format 4 maps 'A' to glyph 1; (3,10) format 12 maps 'A' to
    // glyph 100 and must win the subtable selection
    let mut format12 = FontWriter::new();
    format12.write_u16(12);
    format12.write_u16(0); // reserved
    format12.write_u32(16 + 12); // length
    format12.write_u32(0); // language
    format12.write_u32(1); // numGroups
    format12.write_u32(0x41);
    format12.write_u32(0x5A);
    format12.write_u32(100);
    let format12 = format12.into_inner();

    // Reuse the shared format 4 subtable bytes (they start at offset 12
    // inside the fixture table)
    let format4 = common::cmap_format4_table()[12..].to_vec();

    let mut writer = FontWriter::new();
    writer.write_u16(0);
    writer.write_u16(2);
    writer.write_u16(3);
    writer.write_u16(1);
    writer.write_u32(20); // format 4 offset
    writer.write_u16(3);
    writer.write_u16(10);
    writer.write_u32(20 + format4.len() as u32); // format 12 offset
    writer.write_bytes(&format4);
    writer.write_bytes(&format12);
    let data = writer.into_inner();

    let len = data.len() as u32;
    let cmap = CmapTable::from_reader(&mut FontReader::new(data), len).unwrap();
    assert_eq!(cmap.best_subtable().unwrap().format(), 12);
    assert_eq!(cmap.glyph_id('A' as u32, None), Some(100));
}

#[test]
fn name_table_decodes_utf16() {
    let value: Vec<u8> = "Demo".encode_utf16().flat_map(|u| u.to_be_bytes()).collect();

    let mut writer = FontWriter::new();
    writer.write_u16(0); // format
    writer.write_u16(1); // count
    writer.write_u16(18); // stringOffset
    writer.write_u16(3); // platformID
    writer.write_u16(1); // encodingID
    writer.write_u16(0x409); // languageID
    writer.write_u16(1); // nameID: family
    writer.write_u16(value.len() as u16);
    writer.write_u16(0); // offset
    writer.write_bytes(&value);
    let data = writer.into_inner();

    let len = data.len() as u32;
    let name = NameTable::from_reader(&mut FontReader::new(data), len).unwrap();
    assert_eq!(name.family_name(), Some("Demo"));
}

#[test]
fn post_version_2_glyph_names() {
    let mut writer = FontWriter::new();
    writer.write_u32(0x00020000);
    writer.write_fixed(0.0);
    writer.write_i16(-100);
    writer.write_i16(50);
    writer.write_u32(0);
    writer.write_u32(0);
    writer.write_u32(0);
    writer.write_u32(0);
    writer.write_u32(0);
    writer.write_u16(2); // numGlyphs
    writer.write_u16(0); // glyph 0: standard .notdef
    writer.write_u16(258); // glyph 1: first custom name
    writer.write_u8(5);
    writer.write_bytes(b"alpha");
    let data = writer.into_inner();

    let len = data.len() as u32;
    let post = PostTable::from_reader(&mut FontReader::new(data), len).unwrap();
    assert_eq!(post.glyph_name(1), Some("alpha"));
    assert_eq!(post.glyph_name(0), None);
}
