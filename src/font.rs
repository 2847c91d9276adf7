use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{FontError, Result};
use crate::stream::{FontReader, FontWriter, calculate_checksum};
use crate::tables::{FontTable, TableRecord};
use crate::tables::avar::AvarTable;
use crate::tables::cff::CffTable;
use crate::tables::cff2::Cff2Table;
use crate::tables::cmap::CmapTable;
use crate::tables::cvt::CvtTable;
use crate::tables::fpgm::FpgmTable;
use crate::tables::fvar::FvarTable;
use crate::tables::gdef::GdefTable;
use crate::tables::glyf::GlyfTable;
use crate::tables::gpos::GposTable;
use crate::tables::gsub::GsubTable;
use crate::tables::gvar::GvarTable;
use crate::tables::head::HeadTable;
use crate::tables::hhea::HheaTable;
use crate::tables::hmtx::HmtxTable;
use crate::tables::hvar::{HvarTable, VvarTable};
use crate::tables::loca::LocaTable;
use crate::tables::maxp::MaxpTable;
use crate::tables::mvar::MvarTable;
use crate::tables::name::NameTable;
use crate::tables::os2::Os2Table;
use crate::tables::post::PostTable;
use crate::tables::prep::PrepTable;
use crate::tables::vhea::VheaTable;
use crate::tables::vmtx::VmtxTable;
use crate::woff::{WOFF_MAGIC, decompress_woff};
use crate::woff2::{WOFF2_MAGIC, decompress_woff2};

const SFNT_TRUETYPE: u32 = 0x0001_0000;
const SFNT_TRUE: u32 = 0x74727565; // 'true'
const SFNT_OPENTYPE: u32 = 0x4F54544F; // 'OTTO'
const TTC_MAGIC: u32 = 0x74746366; // 'ttcf'

/// Container format detected from the first four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFormat {
    Ttf,
    Otf,
    Woff,
    Woff2,
    Collection,
    Other,
}

/// Detect the container format of a font byte stream.
pub fn detect_format(data: &[u8]) -> FontFormat {
    if data.len() < 4 {
        return FontFormat::Other;
    }
    match u32::from_be_bytes([data[0], data[1], data[2], data[3]]) {
        SFNT_TRUETYPE | SFNT_TRUE => FontFormat::Ttf,
        SFNT_OPENTYPE => FontFormat::Otf,
        WOFF_MAGIC => FontFormat::Woff,
        WOFF2_MAGIC => FontFormat::Woff2,
        TTC_MAGIC => FontFormat::Collection,
        _ => FontFormat::Other,
    }
}

/// A parsed font image: the sfnt directory plus the owning byte buffer.
///
/// Container parsing (and WOFF/WOFF2 decompression) happens eagerly in
/// `from_data`; individual tables decode on demand through the parse
/// methods or a `TableRegistry`.
#[derive(Debug, Clone)]
pub struct Font {
    pub sfnt_version: u32,
    pub num_tables: u16,
    pub table_records: Vec<TableRecord>,
    pub data: Vec<u8>,
}

impl Font {
    /// Load a font from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let metadata = file.metadata()?;
        let mut data = Vec::with_capacity(metadata.len() as usize);
        file.read_to_end(&mut data)?;
        Self::from_data(data)
    }

    /// Load a font from raw bytes in any supported container. Collections
    /// open their first member; use `from_data_at` to pick another.
    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        match detect_format(&data) {
            FontFormat::Ttf | FontFormat::Otf => Self::from_sfnt(data, 0),
            FontFormat::Woff => {
                let sfnt = decompress_woff(&data)?;
                Self::from_sfnt(sfnt, 0)
            }
            FontFormat::Woff2 => {
                let sfnt = decompress_woff2(&data)?;
                Self::from_sfnt(sfnt, 0)
            }
            FontFormat::Collection => Self::from_data_at(data, 0),
            FontFormat::Other => {
                let found = if data.len() >= 4 {
                    u32::from_be_bytes([data[0], data[1], data[2], data[3]])
                } else {
                    return Err(FontError::BoundsExceeded {
                        position: 0,
                        need: 4,
                        have: data.len(),
                    });
                };
                Err(FontError::BadMagic {
                    found,
                    expected: SFNT_TRUETYPE,
                })
            }
        }
    }

    /// Number of member fonts in a collection (1 for plain sfnt input).
    pub fn collection_count(data: &[u8]) -> Result<u32> {
        if detect_format(data) != FontFormat::Collection {
            return Ok(1);
        }
        let mut reader = FontReader::from_slice(data);
        reader.skip(4)?; // 'ttcf'
        let _version = reader.read_u32()?;
        reader.read_u32()
    }

    /// Open one member of a TrueType collection by index.
    pub fn from_data_at(data: Vec<u8>, index: u32) -> Result<Self> {
        if detect_format(&data) != FontFormat::Collection {
            if index == 0 {
                return Self::from_data(data);
            }
            return Err(FontError::InvariantViolation(format!(
                "font index {index} out of range for a single font"
            )));
        }

        let mut reader = FontReader::from_slice(&data);
        reader.skip(4)?; // 'ttcf'
        let _version = reader.read_u32()?;
        let num_fonts = reader.read_u32()?;
        if index >= num_fonts {
            return Err(FontError::InvariantViolation(format!(
                "font index {index} out of range for a collection of {num_fonts}"
            )));
        }
        reader.skip(index as usize * 4)?;
        let offset_table = reader.read_u32()? as usize;

        Self::from_sfnt(data, offset_table)
    }

    /// Parse an sfnt offset table and directory starting at `offset` within
    /// the buffer.
    fn from_sfnt(data: Vec<u8>, offset: usize) -> Result<Self> {
        let mut reader = FontReader::from_slice(&data);
        reader.set_position(offset)?;

        let sfnt_version = reader.read_u32()?;
        if sfnt_version != SFNT_TRUETYPE
            && sfnt_version != SFNT_TRUE
            && sfnt_version != SFNT_OPENTYPE
        {
            return Err(FontError::BadMagic {
                found: sfnt_version,
                expected: SFNT_TRUETYPE,
            });
        }

        let num_tables = reader.read_u16()?;
        let _search_range = reader.read_u16()?;
        let _entry_selector = reader.read_u16()?;
        let _range_shift = reader.read_u16()?;

        let mut table_records = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            let record = TableRecord::from_reader(&mut reader)?;
            let end = record.offset.checked_add(record.length);
            match end {
                Some(end) if (end as usize) <= data.len() => {}
                _ => {
                    return Err(FontError::InvariantViolation(format!(
                        "table {} extends past end of file",
                        record.tag_to_string()
                    )));
                }
            }
            table_records.push(record);
        }

        // Directory order is supposed to be ascending by tag; tolerate
        // violations
        if !table_records
            .windows(2)
            .all(|pair| pair[0].table_tag <= pair[1].table_tag)
        {
            log::warn!("sfnt table directory is not sorted by tag");
        }

        Ok(Font {
            sfnt_version,
            num_tables,
            table_records,
            data,
        })
    }

    pub fn format(&self) -> FontFormat {
        if self.sfnt_version == SFNT_OPENTYPE {
            FontFormat::Otf
        } else {
            FontFormat::Ttf
        }
    }

    /// Whether glyph outlines live in CFF/CFF2 rather than glyf.
    pub fn has_cff_outlines(&self) -> bool {
        self.get_table_record(b"CFF ").is_some() || self.get_table_record(b"CFF2").is_some()
    }

    /// Get a table record by tag.
    pub fn get_table_record(&self, tag: &[u8; 4]) -> Option<&TableRecord> {
        self.table_records.iter().find(|r| r.table_tag == *tag)
    }

    /// Get raw table bytes by tag.
    pub fn get_table_data(&self, tag: &[u8; 4]) -> Option<Vec<u8>> {
        let record = self.get_table_record(tag)?;
        let start = record.offset as usize;
        let end = start + record.length as usize;
        if end > self.data.len() {
            return None;
        }
        Some(self.data[start..end].to_vec())
    }

    /// List all table tags in directory order.
    pub fn list_tables(&self) -> Vec<String> {
        self.table_records.iter().map(|r| r.tag_to_string()).collect()
    }

    pub(crate) fn table_reader(&self, tag: &[u8; 4]) -> Result<(FontReader, u32)> {
        let record = self
            .get_table_record(tag)
            .ok_or_else(|| FontError::UnknownTable(String::from_utf8_lossy(tag).to_string()))?;
        let start = record.offset as usize;
        let reader = FontReader::from_slice(&self.data[start..start + record.length as usize]);
        Ok((reader, record.length))
    }

    fn parse_table<T: FontTable>(&self, tag: &[u8; 4]) -> Result<T> {
        let (mut reader, length) = self.table_reader(tag)?;
        T::from_reader(&mut reader, length)
    }

    pub fn head_table(&self) -> Result<HeadTable> {
        self.parse_table(b"head")
    }

    pub fn maxp_table(&self) -> Result<MaxpTable> {
        self.parse_table(b"maxp")
    }

    pub fn cmap_table(&self) -> Result<CmapTable> {
        self.parse_table(b"cmap")
    }

    pub fn name_table(&self) -> Result<NameTable> {
        self.parse_table(b"name")
    }

    pub fn hhea_table(&self) -> Result<HheaTable> {
        self.parse_table(b"hhea")
    }

    pub fn vhea_table(&self) -> Result<VheaTable> {
        self.parse_table(b"vhea")
    }

    pub fn hmtx_table(&self) -> Result<HmtxTable> {
        let hhea = self.hhea_table()?;
        let maxp = self.maxp_table()?;
        let (mut reader, length) = self.table_reader(b"hmtx")?;
        HmtxTable::from_reader(
            &mut reader,
            length,
            maxp.num_glyphs,
            hhea.number_of_h_metrics,
        )
    }

    pub fn vmtx_table(&self) -> Result<VmtxTable> {
        let vhea = self.vhea_table()?;
        let maxp = self.maxp_table()?;
        let (mut reader, length) = self.table_reader(b"vmtx")?;
        VmtxTable::from_reader(
            &mut reader,
            length,
            maxp.num_glyphs,
            vhea.number_of_v_metrics,
        )
    }

    pub fn loca_table(&self) -> Result<LocaTable> {
        let head = self.head_table()?;
        let maxp = self.maxp_table()?;
        let (mut reader, length) = self.table_reader(b"loca")?;
        LocaTable::from_reader(
            &mut reader,
            length,
            maxp.num_glyphs as usize,
            head.is_long_loca_format(),
        )
    }

    pub fn glyf_table(&self) -> Result<GlyfTable> {
        let loca = self.loca_table()?;
        let maxp = self.maxp_table()?;
        let (mut reader, length) = self.table_reader(b"glyf")?;
        GlyfTable::from_reader(&mut reader, length, &loca, maxp.num_glyphs)
    }

    pub fn post_table(&self) -> Result<PostTable> {
        self.parse_table(b"post")
    }

    pub fn os2_table(&self) -> Result<Os2Table> {
        self.parse_table(b"OS/2")
    }

    pub fn cvt_table(&self) -> Result<CvtTable> {
        self.parse_table(b"cvt ")
    }

    pub fn fpgm_table(&self) -> Result<FpgmTable> {
        self.parse_table(b"fpgm")
    }

    pub fn prep_table(&self) -> Result<PrepTable> {
        self.parse_table(b"prep")
    }

    pub fn cff_table(&self) -> Result<CffTable> {
        self.parse_table(b"CFF ")
    }

    pub fn cff2_table(&self) -> Result<Cff2Table> {
        self.parse_table(b"CFF2")
    }

    pub fn fvar_table(&self) -> Result<FvarTable> {
        self.parse_table(b"fvar")
    }

    pub fn avar_table(&self) -> Result<AvarTable> {
        self.parse_table(b"avar")
    }

    pub fn gvar_table(&self) -> Result<GvarTable> {
        self.parse_table(b"gvar")
    }

    pub fn hvar_table(&self) -> Result<HvarTable> {
        self.parse_table(b"HVAR")
    }

    pub fn vvar_table(&self) -> Result<VvarTable> {
        self.parse_table(b"VVAR")
    }

    pub fn mvar_table(&self) -> Result<MvarTable> {
        self.parse_table(b"MVAR")
    }

    pub fn gsub_table(&self) -> Result<GsubTable> {
        self.parse_table(b"GSUB")
    }

    pub fn gpos_table(&self) -> Result<GposTable> {
        self.parse_table(b"GPOS")
    }

    pub fn gdef_table(&self) -> Result<GdefTable> {
        self.parse_table(b"GDEF")
    }

    /// Get number of glyphs.
    pub fn num_glyphs(&self) -> Result<u16> {
        Ok(self.maxp_table()?.num_glyphs)
    }

    /// Get units per em.
    pub fn units_per_em(&self) -> Result<u16> {
        Ok(self.head_table()?.units_per_em)
    }

    /// Get font family name.
    pub fn family_name(&self) -> Result<String> {
        let name = self.name_table()?;
        Ok(name.family_name().unwrap_or("Unknown").to_string())
    }

    /// Get full font name.
    pub fn font_name(&self) -> Result<String> {
        let name = self.name_table()?;
        Ok(name.full_name().unwrap_or("Unknown").to_string())
    }

    /// Check if font is bold.
    pub fn is_bold(&self) -> Result<bool> {
        Ok(self.os2_table()?.is_bold())
    }

    /// Check if font is italic.
    pub fn is_italic(&self) -> Result<bool> {
        Ok(self.os2_table()?.is_italic())
    }

    /// Get glyph index for a character through the preferred cmap subtable.
    pub fn char_to_glyph(&self, c: char) -> Result<Option<u16>> {
        Ok(self.cmap_table()?.map_char(c))
    }

    /// Save the re-encoded font to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = self.to_bytes()?;
        let mut file = File::create(path)?;
        file.write_all(&data)?;
        Ok(())
    }

    /// Re-encode as sfnt bytes: tables ascending by tag, 4-byte padding,
    /// fresh checksums, and a recomputed `head.checksumAdjustment`. The
    /// encoding is idempotent.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut tables = Vec::with_capacity(self.table_records.len());
        for record in &self.table_records {
            let data = self.get_table_data(&record.table_tag).ok_or_else(|| {
                FontError::corrupt("sfnt", format!("table {} unreadable", record.tag_to_string()))
            })?;
            tables.push((record.table_tag, data));
        }
        assemble_sfnt(self.sfnt_version, tables)
    }
}

/// Assemble sfnt bytes from a table list: sorted ascending by tag, each
/// padded with zeros to a 4-byte boundary, per-table checksums, and
/// `head.checksumAdjustment = 0xB1B0AFBA - sum(file)` computed with the
/// field zeroed.
pub(crate) fn assemble_sfnt(flavor: u32, mut tables: Vec<([u8; 4], Vec<u8>)>) -> Result<Vec<u8>> {
    tables.sort_by(|a, b| a.0.cmp(&b.0));

    // checksumAdjustment is treated as zero while summing
    let mut head_index = None;
    for (i, (tag, data)) in tables.iter_mut().enumerate() {
        if tag == b"head" {
            if data.len() < 12 {
                return Err(FontError::corrupt("head", "table too short"));
            }
            data[HeadTable::CHECKSUM_ADJUSTMENT_OFFSET..HeadTable::CHECKSUM_ADJUSTMENT_OFFSET + 4]
                .fill(0);
            head_index = Some(i);
        }
    }

    let num_tables = tables.len() as u16;
    let (search_range, entry_selector, range_shift) = calculate_search_range(num_tables);

    let mut writer = FontWriter::new();
    writer.write_u32(flavor);
    writer.write_u16(num_tables);
    writer.write_u16(search_range);
    writer.write_u16(entry_selector);
    writer.write_u16(range_shift);

    // Directory placeholders; patched once offsets are known
    let directory_start = writer.position();
    for (tag, _) in &tables {
        writer.write_tag(tag);
        writer.write_u32(0); // checksum
        writer.write_u32(0); // offset
        writer.write_u32(0); // length
    }

    let mut head_offset = None;
    for (i, (_tag, data)) in tables.iter().enumerate() {
        writer.write_padding(4);
        let offset = writer.position() as u32;
        if Some(i) == head_index {
            head_offset = Some(offset);
        }
        let checksum = calculate_checksum(data);
        writer.write_bytes(data);

        let entry = directory_start + i * 16;
        writer.patch_u32(entry + 4, checksum);
        writer.patch_u32(entry + 8, offset);
        writer.patch_u32(entry + 12, data.len() as u32);
    }
    writer.write_padding(4);

    if let Some(head_offset) = head_offset {
        let file_checksum = calculate_checksum(writer.as_slice());
        let adjustment = 0xB1B0_AFBAu32.wrapping_sub(file_checksum);
        writer.patch_u32(
            head_offset as usize + HeadTable::CHECKSUM_ADJUSTMENT_OFFSET,
            adjustment,
        );
    }

    Ok(writer.into_inner())
}

/// searchRange/entrySelector/rangeShift for a table count.
fn calculate_search_range(num_tables: u16) -> (u16, u16, u16) {
    let mut max_power = 1u16;
    let mut entry_selector = 0u16;
    while max_power * 2 <= num_tables {
        max_power *= 2;
        entry_selector += 1;
    }
    let search_range = max_power * 16;
    let range_shift = (num_tables * 16).saturating_sub(search_range);
    (search_range, entry_selector, range_shift)
}
