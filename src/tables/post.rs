use crate::error::{FontError, Result};
use crate::stream::FontReader;
use crate::tables::FontTable;

/// post table - PostScript information
#[derive(Debug, Clone)]
pub struct PostTable {
    pub version: u32,
    pub italic_angle: f32,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub is_fixed_pitch: u32,
    pub min_mem_type42: u32,
    pub max_mem_type42: u32,
    pub min_mem_type1: u32,
    pub max_mem_type1: u32,
    /// Version 2.0 glyph name indices and the names they resolve to.
    pub glyph_name_indices: Vec<u16>,
    pub names: Vec<String>,
}

impl PostTable {
    pub const VERSION_1_0: u32 = 0x00010000;
    pub const VERSION_2_0: u32 = 0x00020000;
    pub const VERSION_2_5: u32 = 0x00025000;
    pub const VERSION_3_0: u32 = 0x00030000;

    /// Resolve the glyph name for a glyph id (version 2.0 only; standard
    /// Macintosh names for indices below 258 are not materialized).
    pub fn glyph_name(&self, glyph_id: u16) -> Option<&str> {
        let index = *self.glyph_name_indices.get(glyph_id as usize)?;
        if index >= 258 {
            self.names.get(index as usize - 258).map(String::as_str)
        } else {
            None
        }
    }
}

impl FontTable for PostTable {
    fn from_reader(reader: &mut FontReader, length: u32) -> Result<Self> {
        let version = reader.read_u32()?;
        let italic_angle = reader.read_fixed()?;
        let underline_position = reader.read_i16()?;
        let underline_thickness = reader.read_i16()?;
        let is_fixed_pitch = reader.read_u32()?;
        let min_mem_type42 = reader.read_u32()?;
        let max_mem_type42 = reader.read_u32()?;
        let min_mem_type1 = reader.read_u32()?;
        let max_mem_type1 = reader.read_u32()?;

        let mut glyph_name_indices = Vec::new();
        let mut names = Vec::new();

        if version == Self::VERSION_2_0 {
            let num_glyphs = reader.read_u16()?;
            glyph_name_indices.reserve(num_glyphs as usize);
            for _ in 0..num_glyphs {
                glyph_name_indices.push(reader.read_u16()?);
            }
            // Pascal strings until the end of the table
            while reader.position() < length as usize {
                let len = reader.read_u8()? as usize;
                let bytes = reader.read_bytes(len)?;
                names.push(String::from_utf8_lossy(&bytes).to_string());
            }
        } else if version != Self::VERSION_1_0
            && version != Self::VERSION_2_5
            && version != Self::VERSION_3_0
        {
            return Err(FontError::UnsupportedVersion {
                tag: "post",
                version,
            });
        }

        Ok(PostTable {
            version,
            italic_angle,
            underline_position,
            underline_thickness,
            is_fixed_pitch,
            min_mem_type42,
            max_mem_type42,
            min_mem_type1,
            max_mem_type1,
            glyph_name_indices,
            names,
        })
    }
}
