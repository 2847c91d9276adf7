use otf_rs::{
    Cff2Table, CffTable, FontError, FontReader, FontTable, FontWriter, NormalizedCoords,
};

/// Build a minimal CFF1 table with two charstrings: .notdef (bare endchar)
/// and a triangle drawn with rmoveto/rlineto.
fn build_cff1() -> Vec<u8> {
    let glyph0 = vec![14u8]; // endchar
    let glyph1 = vec![
        139, 139, 21, // 0 0 rmoveto
        239, 139, 5, // 100 0 rlineto
        139, 239, 5, // 0 100 rlineto
        14, // endchar
    ];

    let mut writer = FontWriter::new();
    // Header
    writer.write_u8(1);
    writer.write_u8(0);
    writer.write_u8(4); // hdrSize
    writer.write_u8(1); // offSize

    // Name INDEX: one name, "A"
    writer.write_u16(1);
    writer.write_u8(1);
    writer.write_u8(1);
    writer.write_u8(2);
    writer.write_u8(b'A');

    // Top DICT INDEX: CharStrings offset as a 5-byte operand so the
    // layout is fixed: 4 (header) + 6 (name) + 11 (this) + 2 + 2 = 25
    let charstrings_offset = 25u32;
    writer.write_u16(1);
    writer.write_u8(1);
    writer.write_u8(1);
    writer.write_u8(7);
    writer.write_u8(29);
    writer.write_u32(charstrings_offset);
    writer.write_u8(17); // CharStrings operator

    // String INDEX and Global Subr INDEX, both empty
    writer.write_u16(0);
    writer.write_u16(0);

    // CharStrings INDEX
    assert_eq!(writer.position(), charstrings_offset as usize);
    writer.write_u16(2);
    writer.write_u8(1);
    writer.write_u8(1);
    writer.write_u8(1 + glyph0.len() as u8);
    writer.write_u8(1 + (glyph0.len() + glyph1.len()) as u8);
    writer.write_bytes(&glyph0);
    writer.write_bytes(&glyph1);

    writer.into_inner()
}

#[test]
fn cff1_outlines_decode() {
    let data = build_cff1();
    let len = data.len() as u32;
    let cff = CffTable::from_reader(&mut FontReader::new(data), len).unwrap();

    assert_eq!(cff.num_glyphs(), 2);

    let notdef = cff.outline(0).unwrap();
    assert!(notdef.is_empty());

    let outline = cff.outline(1).unwrap();
    assert_eq!(outline.contours.len(), 1);
    let points: Vec<(f32, f32)> = outline.contours[0]
        .points
        .iter()
        .map(|p| (p.x, p.y))
        .collect();
    // rlineto operands are deltas and accumulate
    assert_eq!(points, vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)]);
}

#[test]
fn cff1_out_of_range_glyph_is_corrupt() {
    let data = build_cff1();
    let len = data.len() as u32;
    let cff = CffTable::from_reader(&mut FontReader::new(data), len).unwrap();
    assert!(matches!(
        cff.outline(2),
        Err(FontError::Corrupt { tag: "CFF ", .. })
    ));
}

#[test]
fn cff1_rejects_wrong_major_version() {
    let mut data = build_cff1();
    data[0] = 3;
    let len = data.len() as u32;
    let err = CffTable::from_reader(&mut FontReader::new(data), len).unwrap_err();
    assert!(matches!(err, FontError::UnsupportedVersion { tag: "CFF ", .. }));
}

/// Build a minimal CFF2 table with one glyph whose x coordinate blends a
/// delta of +50 over a single region peaking at +1 on the only axis.
fn build_cff2() -> Vec<u8> {
    let charstring = vec![
        239, // 100
        189, // 50
        140, // 1 (number of blended values)
        16,  // blend
        22,  // hmoveto
    ];

    let mut writer = FontWriter::new();
    // Header: major, minor, headerSize, topDictLength
    writer.write_u8(2);
    writer.write_u8(0);
    writer.write_u8(5);
    writer.write_u16(19);

    // Top DICT: all operands 5-byte so offsets are fixed
    let gsubrs_offset = 24usize;
    let vstore_offset = gsubrs_offset + 4;
    let fdarray_offset = vstore_offset + 2 + 30;
    let charstrings_offset = fdarray_offset + 18;

    writer.write_u8(29);
    writer.write_u32(charstrings_offset as u32);
    writer.write_u8(17); // CharStrings
    writer.write_u8(29);
    writer.write_u32(fdarray_offset as u32);
    writer.write_u8(12);
    writer.write_u8(36); // FDArray
    writer.write_u8(29);
    writer.write_u32(vstore_offset as u32);
    writer.write_u8(24); // vstore

    // Global Subr INDEX (32-bit count, empty)
    assert_eq!(writer.position(), gsubrs_offset);
    writer.write_u32(0);

    // vstore: length, then an ItemVariationStore with one region (0, 1, 1)
    // and one ItemVariationData holding that region
    assert_eq!(writer.position(), vstore_offset);
    writer.write_u16(30);
    writer.write_u16(1); // format
    writer.write_u32(12); // regionListOffset
    writer.write_u16(1); // itemVariationDataCount
    writer.write_u32(22); // dataOffsets[0]
    writer.write_u16(1); // axisCount
    writer.write_u16(1); // regionCount
    writer.write_f2dot14(0.0);
    writer.write_f2dot14(1.0);
    writer.write_f2dot14(1.0);
    writer.write_u16(0); // itemCount
    writer.write_u16(0); // wordDeltaCount
    writer.write_u16(1); // regionIndexCount
    writer.write_u16(0); // regionIndexes[0]

    // FDArray: one Font DICT with an empty Private DICT
    assert_eq!(writer.position(), fdarray_offset);
    writer.write_u32(1);
    writer.write_u8(1);
    writer.write_u8(1);
    writer.write_u8(12);
    writer.write_u8(29);
    writer.write_u32(0); // private size
    writer.write_u8(29);
    writer.write_u32(0); // private offset
    writer.write_u8(18); // Private

    // CharStrings INDEX
    assert_eq!(writer.position(), charstrings_offset);
    writer.write_u32(1);
    writer.write_u8(1);
    writer.write_u8(1);
    writer.write_u8(1 + charstring.len() as u8);
    writer.write_bytes(&charstring);

    writer.into_inner()
}

fn blended_x(coord: f32) -> f32 {
    let data = build_cff2();
    let len = data.len() as u32;
    let cff2 = Cff2Table::from_reader(&mut FontReader::new(data), len).unwrap();
    let outline = cff2.outline(0, &NormalizedCoords(vec![coord])).unwrap();
    assert_eq!(outline.contours.len(), 1);
    outline.contours[0].points[0].x
}

#[test]
fn cff2_blend_at_origin_gives_base_value() {
    assert_eq!(blended_x(0.0), 100.0);
}

#[test]
fn cff2_blend_scales_with_region_scalar() {
    assert_eq!(blended_x(1.0), 150.0);
    // Doubling the scalar doubles the delta contribution
    assert_eq!(blended_x(0.25), 112.5);
    assert_eq!(blended_x(0.5), 125.0);
}

#[test]
fn cff2_rejects_wrong_major_version() {
    let mut data = build_cff2();
    data[0] = 1;
    let len = data.len() as u32;
    let err = Cff2Table::from_reader(&mut FontReader::new(data), len).unwrap_err();
    assert!(matches!(err, FontError::UnsupportedVersion { tag: "CFF2", .. }));
}

#[test]
fn cff2_endchar_is_rejected() {
    // Patch the charstring's final hmoveto into endchar; CFF2 charstrings
    // terminate at the end of data instead
    let mut data = build_cff2();
    let last = data.len() - 1;
    data[last] = 14;
    let len = data.len() as u32;
    let cff2 = Cff2Table::from_reader(&mut FontReader::new(data), len).unwrap();
    assert!(cff2.outline(0, &NormalizedCoords(vec![0.0])).is_err());
}
