//! WOFF2 container decoding: header, compact table directory, Brotli
//! payload, and sfnt reconstruction.

use brotli_decompressor::{BrotliResult, brotli_decode};

use crate::error::{FontError, Result};
use crate::font::assemble_sfnt;
use crate::stream::FontReader;
use crate::woff2_transforms::{ReconstructedGlyf, reconstruct_glyf, reconstruct_hmtx};

pub const WOFF2_MAGIC: u32 = 0x774F4632; // 'wOF2'
const TTC_FLAVOR: u32 = 0x74746366; // 'ttcf'

// Over a large corpus the max compression ratio observed is ~20; far beyond
// that the declared uncompressed size is not credible.
const MAX_PLAUSIBLE_COMPRESSION_RATIO: u64 = 100;

/// Known-tag table for the compact directory; flag value 63 signals an
/// explicit 4-byte tag instead.
pub const KNOWN_TAGS: [[u8; 4]; 63] = [
    *b"cmap", *b"head", *b"hhea", *b"hmtx", *b"maxp", *b"name", *b"OS/2", *b"post",
    *b"cvt ", *b"fpgm", *b"glyf", *b"loca", *b"prep", *b"CFF ", *b"VORG", *b"EBDT",
    *b"EBLC", *b"gasp", *b"hdmx", *b"kern", *b"LTSH", *b"PCLT", *b"VDMX", *b"vhea",
    *b"vmtx", *b"BASE", *b"GDEF", *b"GPOS", *b"GSUB", *b"EBSC", *b"JSTF", *b"MATH",
    *b"CBDT", *b"CBLC", *b"COLR", *b"CPAL", *b"SVG ", *b"sbix", *b"acnt", *b"avar",
    *b"bdat", *b"bloc", *b"bsln", *b"cvar", *b"fdsc", *b"feat", *b"fmtx", *b"fvar",
    *b"gvar", *b"hsty", *b"just", *b"lcar", *b"mort", *b"morx", *b"opbd", *b"prop",
    *b"trak", *b"Zapf", *b"Silf", *b"Glat", *b"Gloc", *b"Feat", *b"Sill",
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Transform {
    /// Bytes are copied through unchanged.
    None,
    /// glyf/loca/hmtx table-specific transform.
    Inverse,
}

#[derive(Debug, Clone)]
struct Woff2TableEntry {
    tag: [u8; 4],
    transform: Transform,
    /// Bytes this table consumes in the decompressed stream.
    src_offset: usize,
    src_length: u32,
    orig_length: u32,
}

/// Decompress and reconstruct a WOFF2 container into sfnt bytes.
pub fn decompress_woff2(data: &[u8]) -> Result<Vec<u8>> {
    let mut reader = FontReader::from_slice(data);

    let signature = reader.read_u32()?;
    if signature != WOFF2_MAGIC {
        return Err(FontError::BadMagic {
            found: signature,
            expected: WOFF2_MAGIC,
        });
    }

    let flavor = reader.read_u32()?;
    if flavor == TTC_FLAVOR {
        return Err(FontError::DecompressFailed(
            "WOFF2 collections are not supported".to_string(),
        ));
    }

    let reported_length = reader.read_u32()?;
    if reported_length as usize != data.len() {
        return Err(FontError::corrupt("wOF2", "header length disagrees with data"));
    }

    let num_tables = reader.read_u16()?;
    if num_tables == 0 {
        return Err(FontError::corrupt("wOF2", "no tables"));
    }
    reader.skip(2)?; // reserved
    let _total_sfnt_size = reader.read_u32()?;
    let total_compressed_length = reader.read_u32()?;
    reader.skip(4)?; // major/minor version
    reader.skip(12)?; // metadata offset/length/origLength
    reader.skip(8)?; // private offset/length

    // Compact table directory
    let mut tables = Vec::with_capacity(num_tables as usize);
    let mut src_offset = 0usize;
    for _ in 0..num_tables {
        let flag_byte = reader.read_u8()?;
        let tag = if flag_byte & 0x3F == 0x3F {
            reader.read_tag()?
        } else {
            KNOWN_TAGS[(flag_byte & 0x3F) as usize]
        };
        let transform_version = (flag_byte >> 6) & 0x03;

        // glyf and loca transform under version 0; everything else under a
        // nonzero version
        let transform = match (&tag, transform_version) {
            (b"glyf" | b"loca", 0) => Transform::Inverse,
            (b"glyf" | b"loca", 3) => Transform::None,
            (b"glyf" | b"loca", v) => {
                return Err(FontError::UnsupportedVersion {
                    tag: "wOF2",
                    version: v as u32,
                });
            }
            (_, 0) => Transform::None,
            (b"hmtx", 1) => Transform::Inverse,
            (_, v) => {
                return Err(FontError::UnsupportedVersion {
                    tag: "wOF2",
                    version: v as u32,
                });
            }
        };

        let orig_length = reader.read_base128()?;
        let src_length = if transform == Transform::Inverse {
            let transform_length = reader.read_base128()?;
            if &tag == b"loca" && transform_length != 0 {
                return Err(FontError::corrupt("loca", "nonzero transformLength"));
            }
            transform_length
        } else {
            orig_length
        };

        tables.push(Woff2TableEntry {
            tag,
            transform,
            src_offset,
            src_length,
            orig_length,
        });
        src_offset = src_offset
            .checked_add(src_length as usize)
            .ok_or_else(|| FontError::corrupt("wOF2", "table sizes overflow"))?;
    }

    let total_uncompressed = src_offset;
    if (total_uncompressed as u64)
        > (total_compressed_length as u64).saturating_mul(MAX_PLAUSIBLE_COMPRESSION_RATIO)
    {
        return Err(FontError::DecompressFailed(
            "implausible uncompressed size".to_string(),
        ));
    }

    // glyf and loca must transform together
    let glyf_transformed = tables
        .iter()
        .find(|t| &t.tag == b"glyf")
        .map(|t| t.transform == Transform::Inverse);
    let loca_transformed = tables
        .iter()
        .find(|t| &t.tag == b"loca")
        .map(|t| t.transform == Transform::Inverse);
    match (glyf_transformed, loca_transformed) {
        (Some(g), Some(l)) if g != l => {
            return Err(FontError::corrupt("wOF2", "glyf and loca transforms disagree"));
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(FontError::corrupt("wOF2", "glyf and loca must appear together"));
        }
        _ => {}
    }

    // The compressed payload immediately follows the directory
    let compressed_offset = reader.position();
    let compressed_end = compressed_offset
        .checked_add(total_compressed_length as usize)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| FontError::corrupt("wOF2", "compressed payload out of bounds"))?;

    let mut decompressed = vec![0u8; total_uncompressed];
    let info = brotli_decode(&data[compressed_offset..compressed_end], &mut decompressed);
    if !matches!(info.result, BrotliResult::ResultSuccess) || info.decoded_size != total_uncompressed
    {
        return Err(FontError::DecompressFailed(format!(
            "brotli stream did not yield {total_uncompressed} bytes"
        )));
    }

    reconstruct_font(flavor, &tables, &decompressed)
}

/// Reconstruct the sfnt from decompressed per-table data.
fn reconstruct_font(
    flavor: u32,
    tables: &[Woff2TableEntry],
    decompressed: &[u8],
) -> Result<Vec<u8>> {
    // hhea is never transformed; hmtx reconstruction needs its metric count
    let num_h_metrics = tables
        .iter()
        .find(|t| &t.tag == b"hhea")
        .map(|t| {
            let bytes = table_slice(decompressed, t)?;
            if bytes.len() < 36 {
                return Err(FontError::corrupt("hhea", "table too short"));
            }
            Ok(u16::from_be_bytes([bytes[34], bytes[35]]))
        })
        .transpose()?;

    let mut glyf_result: Option<ReconstructedGlyf> = None;
    let mut output: Vec<([u8; 4], Vec<u8>)> = Vec::with_capacity(tables.len());

    for entry in tables {
        let src = table_slice(decompressed, entry)?;
        let bytes = match (&entry.tag, entry.transform) {
            (b"glyf", Transform::Inverse) => {
                let reconstructed = reconstruct_glyf(src)?;
                let glyf = reconstructed.glyf.clone();
                glyf_result = Some(reconstructed);
                glyf
            }
            (b"loca", Transform::Inverse) => {
                let reconstructed = glyf_result.as_ref().ok_or_else(|| {
                    FontError::corrupt("loca", "transformed loca precedes glyf")
                })?;
                let expected = expected_loca_length(reconstructed);
                if entry.orig_length != expected {
                    return Err(FontError::corrupt(
                        "loca",
                        format!(
                            "origLength {} disagrees with reconstruction ({expected})",
                            entry.orig_length
                        ),
                    ));
                }
                reconstructed.loca.clone()
            }
            (b"hmtx", Transform::Inverse) => {
                let reconstructed = glyf_result.as_ref().ok_or_else(|| {
                    FontError::corrupt("hmtx", "transformed hmtx requires transformed glyf")
                })?;
                let num_h_metrics = num_h_metrics
                    .ok_or_else(|| FontError::corrupt("hmtx", "transformed hmtx without hhea"))?;
                reconstruct_hmtx(
                    src,
                    reconstructed.num_glyphs,
                    num_h_metrics,
                    &reconstructed.x_mins,
                )?
            }
            _ => src.to_vec(),
        };

        if entry.transform == Transform::None && bytes.len() != entry.orig_length as usize {
            return Err(FontError::corrupt("wOF2", "table length mismatch"));
        }

        output.push((entry.tag, bytes));
    }

    assemble_sfnt(flavor, output)
}

fn table_slice<'a>(decompressed: &'a [u8], entry: &Woff2TableEntry) -> Result<&'a [u8]> {
    let end = entry
        .src_offset
        .checked_add(entry.src_length as usize)
        .filter(|&end| end <= decompressed.len())
        .ok_or_else(|| FontError::corrupt("wOF2", "table extends past payload"))?;
    Ok(&decompressed[entry.src_offset..end])
}

fn expected_loca_length(glyf: &ReconstructedGlyf) -> u32 {
    let entry_size: u32 = if glyf.index_format == 0 { 2 } else { 4 };
    entry_size * (glyf.num_glyphs as u32 + 1)
}
