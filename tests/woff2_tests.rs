mod common;

use common::{head_table, hhea_table, maxp_table};
use otf_rs::{
    Font, FontError, FontFormat, FontWriter, TableRegistry, decompress_woff2, detect_format,
};

/// Encode bytes as a Brotli stream of uncompressed meta-blocks. Good
/// enough for fixtures; a real encoder would actually compress.
fn brotli_store(data: &[u8]) -> Vec<u8> {
    assert!(!data.is_empty() && data.len() <= 1 << 16);
    let mlen_minus_one = (data.len() - 1) as u32;

    // Bit layout (LSB first): WBITS=16 ('0'), ISLAST=0, MNIBBLES=0 (4
    // nibbles), MLEN-1 (16 bits), ISUNCOMPRESSED=1, pad to byte boundary.
    let mut out = Vec::with_capacity(data.len() + 4);
    out.push(((mlen_minus_one & 0x0F) << 4) as u8);
    out.push(((mlen_minus_one >> 4) & 0xFF) as u8);
    out.push((((mlen_minus_one >> 12) & 0x0F) | 0x10) as u8);
    out.extend_from_slice(data);
    // Final meta-block: ISLAST=1, ISLASTEMPTY=1
    out.push(0x03);
    out
}

struct Woff2Table {
    flag: u8,
    tag: Option<[u8; 4]>,
    orig_length: u32,
    transform_length: Option<u32>,
    payload: Vec<u8>,
}

fn build_woff2(tables: &[Woff2Table]) -> Vec<u8> {
    let mut payload = Vec::new();
    for table in tables {
        payload.extend_from_slice(&table.payload);
    }
    let compressed = brotli_store(&payload);

    let mut directory = FontWriter::new();
    for table in tables {
        directory.write_u8(table.flag);
        if let Some(tag) = table.tag {
            directory.write_tag(&tag);
        }
        directory.write_base128(table.orig_length);
        if let Some(transform_length) = table.transform_length {
            directory.write_base128(transform_length);
        }
    }
    let directory = directory.into_inner();

    let total_len = 48 + directory.len() + compressed.len();
    let mut writer = FontWriter::new();
    writer.write_u32(0x774F4632); // 'wOF2'
    writer.write_u32(0x00010000); // flavor
    writer.write_u32(total_len as u32);
    writer.write_u16(tables.len() as u16);
    writer.write_u16(0); // reserved
    writer.write_u32(0); // totalSfntSize (unchecked)
    writer.write_u32(compressed.len() as u32);
    writer.write_u16(1); // majorVersion
    writer.write_u16(0); // minorVersion
    writer.write_u32(0); // metaOffset
    writer.write_u32(0); // metaLength
    writer.write_u32(0); // metaOrigLength
    writer.write_u32(0); // privOffset
    writer.write_u32(0); // privLength
    writer.write_bytes(&directory);
    writer.write_bytes(&compressed);
    writer.into_inner()
}

/// Transformed glyf for two glyphs: glyph 0 empty, glyph 1 a triangle
/// (0,0) (100,0) (0,100) with no instructions and a computed bbox.
fn transformed_glyf() -> Vec<u8> {
    let n_contour_stream: Vec<u8> = vec![0, 0, 0, 1];
    let n_points_stream: Vec<u8> = vec![3]; // one contour, 3 points
    // Triplet codes: (0,0), (+100,0), (-100,+100)
    let flag_stream: Vec<u8> = vec![0, 11, 86];
    let glyph_stream: Vec<u8> = vec![
        0,  // code 0 data: dy magnitude 0
        100, // code 11 data: dx magnitude 100
        99, 99, // code 86 data: dx 1+99, dy 1+99
        0,  // instruction length (255UInt16)
    ];
    let composite_stream: Vec<u8> = vec![];
    let bbox_stream: Vec<u8> = vec![0, 0, 0, 0]; // bitmap only, no bits set
    let instruction_stream: Vec<u8> = vec![];

    let mut writer = FontWriter::new();
    writer.write_u16(0); // reserved
    writer.write_u16(0); // optionFlags
    writer.write_u16(2); // numGlyphs
    writer.write_u16(0); // indexFormat: short loca
    for stream in [
        &n_contour_stream,
        &n_points_stream,
        &flag_stream,
        &glyph_stream,
        &composite_stream,
        &bbox_stream,
        &instruction_stream,
    ] {
        writer.write_u32(stream.len() as u32);
    }
    for stream in [
        n_contour_stream,
        n_points_stream,
        flag_stream,
        glyph_stream,
        composite_stream,
        bbox_stream,
        instruction_stream,
    ] {
        writer.write_bytes(&stream);
    }
    writer.into_inner()
}

/// Transformed hmtx: both LSB arrays elided is illegal, so elide only the
/// proportional run (flags bit 0).
fn transformed_hmtx() -> Vec<u8> {
    let mut writer = FontWriter::new();
    writer.write_u8(0x01); // proportional LSBs elided
    writer.write_u16(500); // advance, glyph 0
    writer.write_u16(600); // advance, glyph 1
    // no monospace glyphs (numberOfHMetrics == numGlyphs), bit 1 clear
    writer.into_inner()
}

// Directory flag bytes: known-tag index | transform version << 6
const FLAG_HEAD: u8 = 1;
const FLAG_HHEA: u8 = 2;
const FLAG_HMTX_TRANSFORMED: u8 = 3 | (1 << 6);
const FLAG_MAXP: u8 = 4;
const FLAG_GLYF_TRANSFORMED: u8 = 10;
const FLAG_LOCA_TRANSFORMED: u8 = 11;

fn woff2_fixture() -> Vec<u8> {
    let head = head_table(0); // short loca
    let hhea = hhea_table(2);
    let maxp = maxp_table(2);
    let glyf = transformed_glyf();
    let hmtx = transformed_hmtx();

    // Stream order follows the usual alphabetic sfnt layout, which keeps
    // glyf ahead of the tables that depend on its reconstruction
    build_woff2(&[
        Woff2Table {
            flag: FLAG_GLYF_TRANSFORMED,
            tag: None,
            orig_length: 0, // reconstructed; not validated
            transform_length: Some(glyf.len() as u32),
            payload: glyf,
        },
        Woff2Table {
            flag: FLAG_HEAD,
            tag: None,
            orig_length: head.len() as u32,
            transform_length: None,
            payload: head,
        },
        Woff2Table {
            flag: FLAG_HHEA,
            tag: None,
            orig_length: hhea.len() as u32,
            transform_length: None,
            payload: hhea,
        },
        Woff2Table {
            flag: FLAG_HMTX_TRANSFORMED,
            tag: None,
            orig_length: 8, // 2 full (advance, lsb) records
            transform_length: Some(hmtx.len() as u32),
            payload: hmtx,
        },
        Woff2Table {
            flag: FLAG_LOCA_TRANSFORMED,
            tag: None,
            orig_length: 6, // (numGlyphs + 1) * 2, short format
            transform_length: Some(0),
            payload: Vec::new(),
        },
        Woff2Table {
            flag: FLAG_MAXP,
            tag: None,
            orig_length: maxp.len() as u32,
            transform_length: None,
            payload: maxp,
        },
    ])
}

#[test]
fn woff2_reconstructs_sfnt() {
    let woff2 = woff2_fixture();
    assert_eq!(detect_format(&woff2), FontFormat::Woff2);

    let sfnt = decompress_woff2(&woff2).unwrap();
    assert_eq!(&sfnt[..4], &[0x00, 0x01, 0x00, 0x00]);

    let font = Font::from_data(sfnt).unwrap();
    assert_eq!(font.num_glyphs().unwrap(), 2);

    // Reconstructed outline matches the encoded triangle
    let registry = TableRegistry::new(font);
    let outline = registry.outline(1, None).unwrap();
    assert_eq!(outline.contours.len(), 1);
    let points: Vec<(f32, f32)> = outline.contours[0]
        .points
        .iter()
        .map(|p| (p.x, p.y))
        .collect();
    assert_eq!(points, vec![(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);

    // Advances survive the hmtx inverse; elided LSBs come from xMin
    assert_eq!(registry.advance_width(0, None).unwrap(), 500);
    assert_eq!(registry.advance_width(1, None).unwrap(), 600);
    assert_eq!(registry.hmtx().unwrap().get_lsb(1), 0); // xMin of triangle
}

#[test]
fn woff2_loca_is_synthesized_monotone() {
    let sfnt = decompress_woff2(&woff2_fixture()).unwrap();
    let font = Font::from_data(sfnt).unwrap();
    let loca = font.loca_table().unwrap();
    assert_eq!(loca.len(), 3);
    assert_eq!(loca.get_offset(0).unwrap(), 0);
    assert_eq!(loca.get_offset(1).unwrap(), 0); // glyph 0 empty
    assert!(loca.get_offset(2).unwrap() > 0);
}

#[test]
fn woff2_nonzero_loca_transform_length_is_corrupt() {
    let head = head_table(0);
    let glyf = transformed_glyf();
    let woff2 = build_woff2(&[
        Woff2Table {
            flag: FLAG_HEAD,
            tag: None,
            orig_length: head.len() as u32,
            transform_length: None,
            payload: head,
        },
        Woff2Table {
            flag: FLAG_GLYF_TRANSFORMED,
            tag: None,
            orig_length: 0,
            transform_length: Some(glyf.len() as u32),
            payload: glyf,
        },
        Woff2Table {
            flag: FLAG_LOCA_TRANSFORMED,
            tag: None,
            orig_length: 6,
            transform_length: Some(4), // must be zero
            payload: vec![0, 0, 0, 0],
        },
    ]);
    let err = decompress_woff2(&woff2).unwrap_err();
    match err {
        FontError::Corrupt { tag, .. } => assert_eq!(tag, "loca"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn woff2_glyf_without_loca_is_corrupt() {
    let glyf = transformed_glyf();
    let woff2 = build_woff2(&[Woff2Table {
        flag: FLAG_GLYF_TRANSFORMED,
        tag: None,
        orig_length: 0,
        transform_length: Some(glyf.len() as u32),
        payload: glyf,
    }]);
    assert!(decompress_woff2(&woff2).is_err());
}

#[test]
fn woff2_explicit_tag_in_directory() {
    // Flag 0x3F forces an explicit tag
    let payload = vec![0u8; 8];
    let head = head_table(0);
    let woff2 = build_woff2(&[
        Woff2Table {
            flag: FLAG_HEAD,
            tag: None,
            orig_length: head.len() as u32,
            transform_length: None,
            payload: head,
        },
        Woff2Table {
            flag: 0x3F,
            tag: Some(*b"TEST"),
            orig_length: 8,
            transform_length: None,
            payload,
        },
    ]);
    let sfnt = decompress_woff2(&woff2).unwrap();
    let font = Font::from_data(sfnt).unwrap();
    assert!(font.get_table_record(b"TEST").is_some());
}

#[test]
fn woff2_short_input_is_bounds_exceeded() {
    let err = decompress_woff2(&0x774F4632u32.to_be_bytes()).unwrap_err();
    assert!(matches!(err, FontError::BoundsExceeded { .. }));
}
