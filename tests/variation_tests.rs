mod common;

use common::{
    TestFontBuilder, cmap_format4_table, head_table, hhea_table, hmtx_table, loca_long,
    maxp_table, simple_glyph,
};
use otf_rs::{
    Font, FontReader, FontWriter, ItemVariationStore, NormalizedCoords, TableRegistry,
};

/// fvar with a single wght axis (100/400/900) and no named instances.
fn fvar_table() -> Vec<u8> {
    let mut writer = FontWriter::new();
    writer.write_u16(1); // majorVersion
    writer.write_u16(0); // minorVersion
    writer.write_u16(16); // axesArrayOffset
    writer.write_u16(2); // reserved
    writer.write_u16(1); // axisCount
    writer.write_u16(20); // axisSize
    writer.write_u16(0); // instanceCount
    writer.write_u16(8); // instanceSize
    writer.write_tag(b"wght");
    writer.write_fixed(100.0);
    writer.write_fixed(400.0);
    writer.write_fixed(900.0);
    writer.write_u16(0); // flags
    writer.write_u16(256); // axisNameID
    writer.into_inner()
}

/// avar bending the upper half of the wght axis: 0.5 maps to 0.75.
fn avar_table() -> Vec<u8> {
    let mut writer = FontWriter::new();
    writer.write_u16(1);
    writer.write_u16(0);
    writer.write_u16(0); // reserved
    writer.write_u16(1); // axisCount
    writer.write_u16(4); // positionMapCount
    for (from, to) in [(-1.0f32, -1.0f32), (0.0, 0.0), (0.5, 0.75), (1.0, 1.0)] {
        writer.write_f2dot14(from);
        writer.write_f2dot14(to);
    }
    writer.into_inner()
}

/// HVAR with an identity mapping and per-glyph advance deltas {0: +10,
/// 1: +20} over a single region peaking at wght = +1.
fn hvar_table() -> Vec<u8> {
    let mut writer = FontWriter::new();
    writer.write_u32(0x00010000); // version
    writer.write_u32(20); // itemVariationStoreOffset
    writer.write_u32(0); // advanceWidthMappingOffset (identity)
    writer.write_u32(0); // lsbMappingOffset
    writer.write_u32(0); // rsbMappingOffset

    // ItemVariationStore
    writer.write_u16(1); // format
    writer.write_u32(12); // regionListOffset
    writer.write_u16(1); // itemVariationDataCount
    writer.write_u32(22); // dataOffsets[0]
    writer.write_u16(1); // axisCount
    writer.write_u16(1); // regionCount
    writer.write_f2dot14(0.0);
    writer.write_f2dot14(1.0);
    writer.write_f2dot14(1.0);
    writer.write_u16(2); // itemCount
    writer.write_u16(0); // wordDeltaCount
    writer.write_u16(1); // regionIndexCount
    writer.write_u16(0); // regionIndexes[0]
    writer.write_i8(10); // delta set 0
    writer.write_i8(20); // delta set 1
    writer.into_inner()
}

/// gvar shifting the triangle glyph (glyph 1) right by 10 units at
/// wght = +1, with explicit deltas for every point including phantoms.
fn gvar_table() -> Vec<u8> {
    // Serialized tuple data: x deltas [10,10,10,0,0,0,0], y deltas all zero
    let mut serialized = FontWriter::new();
    serialized.write_u8(0x06); // 7 byte-sized deltas
    for delta in [10i8, 10, 10, 0, 0, 0, 0] {
        serialized.write_i8(delta);
    }
    serialized.write_u8(0x86); // 7 zero deltas
    let serialized = serialized.into_inner();

    // GlyphVariationData for glyph 1
    let mut gvd = FontWriter::new();
    gvd.write_u16(1); // tupleVariationCount
    gvd.write_u16(10); // dataOffset
    gvd.write_u16(serialized.len() as u16); // variationDataSize
    gvd.write_u16(0x8000); // tupleIndex: embedded peak
    gvd.write_f2dot14(1.0); // peak
    gvd.write_bytes(&serialized);
    gvd.write_padding(2); // short offsets address half-words
    let gvd = gvd.into_inner();

    let mut writer = FontWriter::new();
    writer.write_u16(1); // majorVersion
    writer.write_u16(0); // minorVersion
    writer.write_u16(1); // axisCount
    writer.write_u16(0); // sharedTupleCount
    writer.write_u32(26); // sharedTuplesOffset
    writer.write_u16(2); // glyphCount
    writer.write_u16(0); // flags: short offsets
    writer.write_u32(26); // glyphVariationDataArrayOffset
    // Offsets, stored divided by two: glyph 0 empty, glyph 1 has data
    writer.write_u16(0);
    writer.write_u16(0);
    writer.write_u16((gvd.len() / 2) as u16);
    writer.write_bytes(&gvd);
    writer.into_inner()
}

fn build_variable_font(with_hvar: bool, with_avar: bool, with_gvar: bool) -> Vec<u8> {
    let glyph = simple_glyph();
    let loca = loca_long(&[0, glyph.len() as u32]);

    let mut builder = TestFontBuilder::new()
        .table(*b"head", head_table(1))
        .table(*b"maxp", maxp_table(2))
        .table(*b"hhea", hhea_table(2))
        .table(*b"hmtx", hmtx_table(&[(500, 0), (600, 10)], &[]))
        .table(*b"cmap", cmap_format4_table())
        .table(*b"loca", loca)
        .table(*b"glyf", glyph)
        .table(*b"fvar", fvar_table());
    if with_hvar {
        builder = builder.table(*b"HVAR", hvar_table());
    }
    if with_avar {
        builder = builder.table(*b"avar", avar_table());
    }
    if with_gvar {
        builder = builder.table(*b"gvar", gvar_table());
    }
    builder.build()
}

#[test]
fn axes_and_normalization() {
    let registry =
        TableRegistry::new(Font::from_data(build_variable_font(true, false, false)).unwrap());

    let axes = registry.variation_axes().unwrap();
    assert_eq!(axes.len(), 1);
    assert_eq!(axes[0].tag, *b"wght");
    assert_eq!(axes[0].default_value, 400.0);

    let coords = registry.normalize_coordinates(&[(*b"wght", 900.0)]).unwrap();
    assert_eq!(coords.0, vec![1.0]);
    let coords = registry.normalize_coordinates(&[(*b"wght", 400.0)]).unwrap();
    assert!(coords.is_default());
    let coords = registry.normalize_coordinates(&[]).unwrap();
    assert!(coords.is_default());
    // Out-of-range user values clamp to the axis range
    let coords = registry.normalize_coordinates(&[(*b"wght", 2000.0)]).unwrap();
    assert_eq!(coords.0, vec![1.0]);
}

#[test]
fn avar_remaps_normalized_coordinates() {
    let registry =
        TableRegistry::new(Font::from_data(build_variable_font(false, true, false)).unwrap());

    // 650 normalizes to +0.5, which avar bends to +0.75
    let coords = registry.normalize_coordinates(&[(*b"wght", 650.0)]).unwrap();
    assert_eq!(coords.0, vec![0.75]);
    // Endpoints survive the remap
    let coords = registry.normalize_coordinates(&[(*b"wght", 900.0)]).unwrap();
    assert_eq!(coords.0, vec![1.0]);
}

#[test]
fn hvar_advance_deltas_apply() {
    let registry =
        TableRegistry::new(Font::from_data(build_variable_font(true, false, false)).unwrap());

    // At the default location the static metrics hold exactly
    let origin = registry.normalize_coordinates(&[(*b"wght", 400.0)]).unwrap();
    assert_eq!(registry.advance_width(1, Some(&origin)).unwrap(), 600);

    // At wght max the HVAR delta applies, integer rounded
    let max = registry.normalize_coordinates(&[(*b"wght", 900.0)]).unwrap();
    assert_eq!(registry.advance_width(1, Some(&max)).unwrap(), 620);
    assert_eq!(registry.advance_width(0, Some(&max)).unwrap(), 510);

    // Halfway up the region the delta scales linearly
    let mid = registry.normalize_coordinates(&[(*b"wght", 650.0)]).unwrap();
    assert_eq!(registry.advance_width(1, Some(&mid)).unwrap(), 610);
}

#[test]
fn gvar_deltas_move_outline_points() {
    let registry =
        TableRegistry::new(Font::from_data(build_variable_font(false, false, true)).unwrap());

    // Static outline at the origin
    let origin = registry.normalize_coordinates(&[(*b"wght", 400.0)]).unwrap();
    let outline = registry.outline(1, Some(&origin)).unwrap();
    let points: Vec<(f32, f32)> = outline.contours[0]
        .points
        .iter()
        .map(|p| (p.x, p.y))
        .collect();
    assert_eq!(points, vec![(0.0, 0.0), (100.0, 0.0), (50.0, 100.0)]);

    // At wght max every point shifts +10 in x
    let max = registry.normalize_coordinates(&[(*b"wght", 900.0)]).unwrap();
    let outline = registry.outline(1, Some(&max)).unwrap();
    let points: Vec<(f32, f32)> = outline.contours[0]
        .points
        .iter()
        .map(|p| (p.x, p.y))
        .collect();
    assert_eq!(points, vec![(10.0, 0.0), (110.0, 0.0), (60.0, 100.0)]);

    // Halfway the deltas interpolate
    let mid = registry.normalize_coordinates(&[(*b"wght", 650.0)]).unwrap();
    let outline = registry.outline(1, Some(&mid)).unwrap();
    assert_eq!(outline.contours[0].points[0].x, 5.0);
}

#[test]
fn item_variation_store_parses_and_evaluates() {
    // Reuse the HVAR fixture bytes; the store starts at offset 20
    let hvar = hvar_table();
    let mut reader = FontReader::from_slice(&hvar);
    let store = ItemVariationStore::from_reader(&mut reader, 20).unwrap();

    assert_eq!(store.regions.len(), 1);
    assert_eq!(store.data.len(), 1);

    let at = |coord: f32, inner: u16| {
        store
            .delta(0, inner, &NormalizedCoords(vec![coord]))
            .unwrap()
    };
    assert_eq!(at(0.0, 0), 0.0);
    assert_eq!(at(1.0, 0), 10.0);
    assert_eq!(at(1.0, 1), 20.0);
    assert_eq!(at(0.5, 1), 10.0);

    // Scalars are in [0, 1] across the axis range
    for coord in [-1.0f32, -0.5, 0.0, 0.25, 0.75, 1.0] {
        let scalar = store.regions[0].scalar(&NormalizedCoords(vec![coord]));
        assert!((0.0..=1.0).contains(&scalar), "scalar {scalar} at {coord}");
    }
}
