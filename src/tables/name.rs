use crate::error::Result;
use crate::stream::FontReader;
use crate::tables::FontTable;

/// name table - Naming table
#[derive(Debug, Clone)]
pub struct NameTable {
    pub format: u16,
    pub name_records: Vec<NameRecord>,
}

#[derive(Debug, Clone)]
pub struct NameRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub value: String,
}

impl NameRecord {
    pub const COPYRIGHT_NOTICE: u16 = 0;
    pub const FONT_FAMILY_NAME: u16 = 1;
    pub const FONT_SUBFAMILY_NAME: u16 = 2;
    pub const UNIQUE_FONT_ID: u16 = 3;
    pub const FULL_FONT_NAME: u16 = 4;
    pub const VERSION_STRING: u16 = 5;
    pub const POSTSCRIPT_NAME: u16 = 6;
    pub const TRADEMARK: u16 = 7;
    pub const MANUFACTURER_NAME: u16 = 8;
    pub const DESIGNER: u16 = 9;
    pub const DESCRIPTION: u16 = 10;
    pub const VENDOR_URL: u16 = 11;
    pub const DESIGNER_URL: u16 = 12;
    pub const LICENSE_DESCRIPTION: u16 = 13;
    pub const LICENSE_URL: u16 = 14;
    pub const TYPOGRAPHIC_FAMILY_NAME: u16 = 16;
    pub const TYPOGRAPHIC_SUBFAMILY_NAME: u16 = 17;
    pub const COMPATIBLE_FULL_NAME: u16 = 18;
    pub const SAMPLE_TEXT: u16 = 19;

    fn is_unicode(&self) -> bool {
        self.platform_id == 0 || (self.platform_id == 3 && (self.encoding_id == 1 || self.encoding_id == 10))
    }
}

impl NameTable {
    pub fn get_name(&self, name_id: u16) -> Option<&str> {
        // Prefer a Unicode-encoded record when both are present
        self.name_records
            .iter()
            .filter(|r| r.name_id == name_id)
            .max_by_key(|r| r.is_unicode())
            .map(|r| r.value.as_str())
    }

    pub fn family_name(&self) -> Option<&str> {
        self.get_name(NameRecord::FONT_FAMILY_NAME)
    }

    pub fn full_name(&self) -> Option<&str> {
        self.get_name(NameRecord::FULL_FONT_NAME)
    }

    pub fn postscript_name(&self) -> Option<&str> {
        self.get_name(NameRecord::POSTSCRIPT_NAME)
    }
}

fn decode_utf16_be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn decode_mac_roman(bytes: &[u8]) -> String {
    // ASCII subset covers every name seen in practice; anything above 0x7F
    // is replaced rather than mapped through the full Mac Roman table.
    bytes
        .iter()
        .map(|&b| if b < 0x80 { b as char } else { '\u{FFFD}' })
        .collect()
}

impl FontTable for NameTable {
    fn from_reader(reader: &mut FontReader, _length: u32) -> Result<Self> {
        let format = reader.read_u16()?;
        let count = reader.read_u16()?;
        let string_offset = reader.read_u16()? as usize;

        struct RawRecord {
            platform_id: u16,
            encoding_id: u16,
            language_id: u16,
            name_id: u16,
            length: u16,
            offset: u16,
        }

        let mut raw_records = Vec::with_capacity(count as usize);
        for _ in 0..count {
            raw_records.push(RawRecord {
                platform_id: reader.read_u16()?,
                encoding_id: reader.read_u16()?,
                language_id: reader.read_u16()?,
                name_id: reader.read_u16()?,
                length: reader.read_u16()?,
                offset: reader.read_u16()?,
            });
        }

        let mut name_records = Vec::with_capacity(count as usize);
        for raw in raw_records {
            let start = string_offset + raw.offset as usize;
            let mut sub = match reader.subreader(start, raw.length as usize) {
                Ok(sub) => sub,
                // Records pointing outside the table are dropped, not fatal
                Err(_) => continue,
            };
            let bytes = sub.read_bytes(raw.length as usize)?;

            let record = NameRecord {
                platform_id: raw.platform_id,
                encoding_id: raw.encoding_id,
                language_id: raw.language_id,
                name_id: raw.name_id,
                value: String::new(),
            };
            let value = if record.is_unicode() {
                decode_utf16_be(&bytes)
            } else {
                decode_mac_roman(&bytes)
            };
            name_records.push(NameRecord { value, ..record });
        }

        Ok(NameTable {
            format,
            name_records,
        })
    }
}
