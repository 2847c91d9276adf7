//! WOFF1 container decoding: per-table zlib decompression and sfnt
//! reassembly.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{FontError, Result};
use crate::font::assemble_sfnt;
use crate::stream::FontReader;

pub const WOFF_MAGIC: u32 = 0x774F4646; // 'wOFF'

/// WOFF header structure
#[derive(Debug, Clone)]
pub struct WoffHeader {
    pub flavor: u32,
    pub length: u32,
    pub num_tables: u16,
    pub total_sfnt_size: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub meta_offset: u32,
    pub meta_length: u32,
    pub private_offset: u32,
    pub private_length: u32,
}

/// WOFF table directory entry
#[derive(Debug, Clone)]
pub struct WoffTableEntry {
    pub tag: [u8; 4],
    pub offset: u32,
    pub comp_length: u32,
    pub orig_length: u32,
    pub orig_checksum: u32,
}

/// Decompress a WOFF1 container into sfnt bytes. Each table is inflated
/// with zlib when `compLength < origLength` and copied verbatim otherwise.
pub fn decompress_woff(data: &[u8]) -> Result<Vec<u8>> {
    let mut reader = FontReader::from_slice(data);

    let signature = reader.read_u32()?;
    if signature != WOFF_MAGIC {
        return Err(FontError::BadMagic {
            found: signature,
            expected: WOFF_MAGIC,
        });
    }

    let header = WoffHeader {
        flavor: reader.read_u32()?,
        length: reader.read_u32()?,
        num_tables: {
            let num_tables = reader.read_u16()?;
            reader.skip(2)?; // reserved
            num_tables
        },
        total_sfnt_size: reader.read_u32()?,
        major_version: reader.read_u16()?,
        minor_version: reader.read_u16()?,
        meta_offset: reader.read_u32()?,
        meta_length: reader.read_u32()?,
        private_offset: reader.read_u32()?,
        private_length: reader.read_u32()?,
    };

    if header.length as usize != data.len() {
        return Err(FontError::corrupt("wOFF", "header length disagrees with data"));
    }

    let mut entries = Vec::with_capacity(header.num_tables as usize);
    for _ in 0..header.num_tables {
        entries.push(WoffTableEntry {
            tag: reader.read_tag()?,
            offset: reader.read_u32()?,
            comp_length: reader.read_u32()?,
            orig_length: reader.read_u32()?,
            orig_checksum: reader.read_u32()?,
        });
    }

    let mut tables = Vec::with_capacity(entries.len());
    for entry in &entries {
        let start = entry.offset as usize;
        let end = start
            .checked_add(entry.comp_length as usize)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                FontError::InvariantViolation(format!(
                    "WOFF table {} extends past end of file",
                    String::from_utf8_lossy(&entry.tag)
                ))
            })?;
        let compressed = &data[start..end];

        let bytes = if entry.comp_length < entry.orig_length {
            let mut decoder = ZlibDecoder::new(compressed);
            let mut decompressed = Vec::with_capacity(entry.orig_length as usize);
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| FontError::DecompressFailed(e.to_string()))?;
            if decompressed.len() != entry.orig_length as usize {
                return Err(FontError::DecompressFailed(format!(
                    "table {} inflated to {} bytes, expected {}",
                    String::from_utf8_lossy(&entry.tag),
                    decompressed.len(),
                    entry.orig_length
                )));
            }
            decompressed
        } else if entry.comp_length == entry.orig_length {
            compressed.to_vec()
        } else {
            return Err(FontError::corrupt(
                "wOFF",
                "compressed length exceeds original length",
            ));
        };

        tables.push((entry.tag, bytes));
    }

    assemble_sfnt(header.flavor, tables)
}
