mod common;

use common::{TestFontBuilder, build_test_font, head_table, maxp_table};
use otf_rs::{
    Font, FontError, FontFormat, FontWriter, TableRegistry, calculate_checksum, detect_format,
};

#[test]
fn open_and_list_tables() {
    let font = Font::from_data(build_test_font()).unwrap();
    assert_eq!(font.sfnt_version, 0x00010000);
    let tables = font.list_tables();
    assert!(tables.contains(&"glyf".to_string()));
    assert!(tables.contains(&"cmap".to_string()));
    // Directory is sorted ascending by tag
    let mut sorted = tables.clone();
    sorted.sort();
    assert_eq!(tables, sorted);
}

#[test]
fn open_too_short_file_fails_with_bounds() {
    // A 12-byte header claiming tables it doesn't have
    let mut writer = FontWriter::new();
    writer.write_u32(0x00010000);
    writer.write_u16(4);
    writer.write_u16(64);
    writer.write_u16(2);
    writer.write_u16(0);
    let err = Font::from_data(writer.into_inner()).unwrap_err();
    assert!(matches!(err, FontError::BoundsExceeded { .. }));
}

#[test]
fn table_out_of_bounds_is_invariant_violation() {
    let mut writer = FontWriter::new();
    writer.write_u32(0x00010000);
    writer.write_u16(1);
    writer.write_u16(16);
    writer.write_u16(0);
    writer.write_u16(0);
    writer.write_tag(b"head");
    writer.write_u32(0);
    writer.write_u32(28); // offset
    writer.write_u32(1000); // length beyond EOF
    let err = Font::from_data(writer.into_inner()).unwrap_err();
    assert!(matches!(err, FontError::InvariantViolation(_)));
}

#[test]
fn unknown_magic_is_bad_magic() {
    let err = Font::from_data(b"junkdata".to_vec()).unwrap_err();
    assert!(matches!(err, FontError::BadMagic { .. }));
}

#[test]
fn missing_table_is_unknown_table() {
    let font = Font::from_data(build_test_font()).unwrap();
    let err = font.os2_table().unwrap_err();
    match err {
        FontError::UnknownTable(tag) => assert_eq!(tag, "OS/2"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn glyph_queries_through_registry() {
    let registry = TableRegistry::new(Font::from_data(build_test_font()).unwrap());

    assert_eq!(registry.num_glyphs().unwrap(), 2);
    // 'A' maps to glyph 1; unmapped codepoints resolve to None
    assert_eq!(registry.glyph_id('A' as u32, None).unwrap(), Some(1));
    assert_eq!(registry.glyph_id('a' as u32, None).unwrap(), None);

    // Glyph 0 always resolves (empty outline here)
    let notdef = registry.outline(0, None).unwrap();
    assert!(notdef.is_empty());

    let outline = registry.outline(1, None).unwrap();
    assert_eq!(outline.contours.len(), 1);
    assert_eq!(outline.contours[0].points.len(), 3);

    assert_eq!(registry.advance_width(0, None).unwrap(), 500);
    assert_eq!(registry.advance_width(1, None).unwrap(), 600);
    assert_eq!(registry.left_side_bearing(1, None).unwrap(), 10);
    assert!(registry.outline(2, None).is_err());
}

#[test]
fn registry_caches_parses() {
    let registry = TableRegistry::new(Font::from_data(build_test_font()).unwrap());
    let first = registry.cmap().unwrap();
    let second = registry.cmap().unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[test]
fn reencode_preserves_table_checksums() {
    let font = Font::from_data(build_test_font()).unwrap();
    let reencoded = Font::from_data(font.to_bytes().unwrap()).unwrap();

    for record in &font.table_records {
        let data = font.get_table_data(&record.table_tag).unwrap();
        let expected = calculate_checksum(&data);
        let actual = reencoded
            .get_table_record(&record.table_tag)
            .unwrap()
            .checksum;
        // head is summed with checksumAdjustment zeroed, which our fixture
        // already has
        assert_eq!(actual, expected, "checksum for {}", record.tag_to_string());
    }

    // Re-encoding is idempotent
    let twice = Font::from_data(reencoded.to_bytes().unwrap()).unwrap();
    assert_eq!(reencoded.to_bytes().unwrap(), twice.to_bytes().unwrap());
}

#[test]
fn checksum_adjustment_written() {
    let font = Font::from_data(build_test_font()).unwrap();
    let bytes = font.to_bytes().unwrap();
    let reopened = Font::from_data(bytes.clone()).unwrap();
    let head = reopened.head_table().unwrap();

    // Zeroing the adjustment and summing the file must yield the magic
    let head_record = reopened.get_table_record(b"head").unwrap();
    let mut zeroed = bytes.clone();
    let adj_offset = head_record.offset as usize + 8;
    zeroed[adj_offset..adj_offset + 4].fill(0);
    let file_sum = calculate_checksum(&zeroed);
    assert_eq!(head.checksum_adjustment, 0xB1B0AFBAu32.wrapping_sub(file_sum));
}

#[test]
fn collection_opens_members() {
    // Build a ttcf wrapping two copies of the same offset table
    let member = build_test_font();
    let header_len: u32 = 12 + 2 * 4;
    let mut writer = FontWriter::new();
    writer.write_tag(b"ttcf");
    writer.write_u32(0x00010000);
    writer.write_u32(2); // numFonts
    writer.write_u32(header_len);
    writer.write_u32(header_len);
    writer.write_bytes(&member);
    let data = writer.into_inner();

    assert_eq!(detect_format(&data), FontFormat::Collection);
    assert_eq!(Font::collection_count(&data).unwrap(), 2);

    // Both members share the same offset table; table offsets are relative
    // to the whole file, so records must be rebased for a real collection.
    // Here the member was built with offsets from its own start, so member
    // parsing validates the directory shape only.
    assert!(Font::from_data_at(data.clone(), 0).is_ok());
    assert!(Font::from_data_at(data.clone(), 1).is_ok());
    let err = Font::from_data_at(data.clone(), 2).unwrap_err();
    assert!(matches!(err, FontError::InvariantViolation(_)));
}

#[test]
fn detects_cff_flavor() {
    let font = TestFontBuilder::new()
        .table(*b"head", head_table(0))
        .table(*b"maxp", maxp_table(1))
        .build();
    // Patch the flavor to OTTO
    let mut data = font;
    data[..4].copy_from_slice(&0x4F54544Fu32.to_be_bytes());
    let font = Font::from_data(data).unwrap();
    assert_eq!(font.format(), FontFormat::Otf);
}
