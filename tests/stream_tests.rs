use otf_rs::{FontError, FontReader, FontWriter, calculate_checksum};

#[test]
fn test_font_reader_operations() {
    let data = vec![
        0x00, 0x01, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x20, 0x00, 0x03, 0x00, 0x10, 0x12, 0x34, 0x56,
        0x78,
    ];

    let mut reader = FontReader::from_slice(&data);

    assert_eq!(reader.read_u32().unwrap(), 0x00010000);
    assert_eq!(reader.read_u16().unwrap(), 10);
    assert_eq!(reader.read_u16().unwrap(), 0x20);
    assert_eq!(reader.read_u16().unwrap(), 3);
    assert_eq!(reader.read_u16().unwrap(), 0x10);
    assert_eq!(reader.position(), 12);

    reader.set_position(0).unwrap();
    assert_eq!(reader.position(), 0);

    let bytes = reader.read_bytes(4).unwrap();
    assert_eq!(bytes, &[0x00, 0x01, 0x00, 0x00]);
    assert_eq!(reader.position(), 4);
}

#[test]
fn test_font_writer_round_trip() {
    let mut writer = FontWriter::new();
    writer.write_u8(0x12);
    writer.write_i8(-5);
    writer.write_u16(0xABCD);
    writer.write_i16(-1000);
    writer.write_u24(0x010203);
    writer.write_u32(0xDEADBEEF);
    writer.write_i64(-42);
    writer.write_fixed(1.5);
    writer.write_f2dot14(-0.25);
    writer.write_tag(b"glyf");

    let mut reader = FontReader::new(writer.into_inner());
    assert_eq!(reader.read_u8().unwrap(), 0x12);
    assert_eq!(reader.read_i8().unwrap(), -5);
    assert_eq!(reader.read_u16().unwrap(), 0xABCD);
    assert_eq!(reader.read_i16().unwrap(), -1000);
    assert_eq!(reader.read_u24().unwrap(), 0x010203);
    assert_eq!(reader.read_u32().unwrap(), 0xDEADBEEF);
    assert_eq!(reader.read_i64().unwrap(), -42);
    assert!((reader.read_fixed().unwrap() - 1.5).abs() < 1e-6);
    assert!((reader.read_f2dot14().unwrap() + 0.25).abs() < 1e-6);
    assert_eq!(reader.read_tag().unwrap(), *b"glyf");
    assert!(reader.is_empty());
}

#[test]
fn test_reader_reports_bounds() {
    let mut reader = FontReader::from_slice(&[1, 2]);
    reader.read_u8().unwrap();
    let err = reader.read_u32().unwrap_err();
    match err {
        FontError::BoundsExceeded {
            position,
            need,
            have,
        } => {
            assert_eq!(position, 1);
            assert_eq!(need, 4);
            assert_eq!(have, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_subreader_is_independent() {
    let mut reader = FontReader::from_slice(&[0, 1, 2, 3, 4, 5, 6, 7]);
    reader.read_u16().unwrap();

    let mut sub = reader.subreader(4, 2).unwrap();
    assert_eq!(sub.read_u16().unwrap(), 0x0405);
    assert!(sub.read_u8().is_err());

    // Parent cursor unmoved
    assert_eq!(reader.position(), 2);
    assert!(reader.subreader(6, 4).is_err());
}

#[test]
fn test_checksum_matches_known_values() {
    assert_eq!(calculate_checksum(&[]), 0);
    assert_eq!(calculate_checksum(&[0, 0, 0, 1]), 1);
    // Trailing bytes pad with zeros
    assert_eq!(calculate_checksum(&[0x01, 0x02]), 0x01020000);
    let data = [0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0xFF];
    assert_eq!(calculate_checksum(&data), 1 + 2 + 0xFF000000);
}

#[test]
fn test_woff2_variable_length_codecs() {
    let mut writer = FontWriter::new();
    for value in [0u16, 252, 253, 505, 506, 758, 759, 0xFFFF] {
        writer.write_255u16(value);
    }
    writer.write_base128(0);
    writer.write_base128(0x3FFF);
    writer.write_base128(u32::MAX);

    let mut reader = FontReader::new(writer.into_inner());
    for value in [0u16, 252, 253, 505, 506, 758, 759, 0xFFFF] {
        assert_eq!(reader.read_255u16().unwrap(), value);
    }
    assert_eq!(reader.read_base128().unwrap(), 0);
    assert_eq!(reader.read_base128().unwrap(), 0x3FFF);
    assert_eq!(reader.read_base128().unwrap(), u32::MAX);
    assert!(reader.is_empty());
}
