use crate::error::{FontError, Result};
use crate::stream::FontReader;
use crate::tables::FontTable;
use crate::tables::layout::ClassDef;

/// GDEF table - Glyph definitions
#[derive(Debug, Clone)]
pub struct GdefTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub glyph_class_def: Option<ClassDef>,
    pub mark_attach_class_def: Option<ClassDef>,
    pub attach_list_offset: Option<u16>,
    pub lig_caret_list_offset: Option<u16>,
    pub mark_glyph_sets_offset: Option<u16>,
    pub item_var_store_offset: Option<u32>,
}

/// Glyph classes from the glyph class definition table.
pub const GLYPH_CLASS_BASE: u16 = 1;
pub const GLYPH_CLASS_LIGATURE: u16 = 2;
pub const GLYPH_CLASS_MARK: u16 = 3;
pub const GLYPH_CLASS_COMPONENT: u16 = 4;

impl GdefTable {
    pub fn glyph_class(&self, glyph_id: u16) -> u16 {
        self.glyph_class_def
            .as_ref()
            .map(|def| def.class(glyph_id))
            .unwrap_or(0)
    }

    pub fn is_base(&self, glyph_id: u16) -> bool {
        self.glyph_class(glyph_id) == GLYPH_CLASS_BASE
    }

    pub fn is_ligature(&self, glyph_id: u16) -> bool {
        self.glyph_class(glyph_id) == GLYPH_CLASS_LIGATURE
    }

    pub fn is_mark(&self, glyph_id: u16) -> bool {
        self.glyph_class(glyph_id) == GLYPH_CLASS_MARK
    }

    pub fn is_component(&self, glyph_id: u16) -> bool {
        self.glyph_class(glyph_id) == GLYPH_CLASS_COMPONENT
    }
}

impl FontTable for GdefTable {
    fn from_reader(reader: &mut FontReader, _length: u32) -> Result<Self> {
        let major_version = reader.read_u16()?;
        let minor_version = reader.read_u16()?;
        if major_version != 1 {
            return Err(FontError::UnsupportedVersion {
                tag: "GDEF",
                version: ((major_version as u32) << 16) | minor_version as u32,
            });
        }

        let glyph_class_def_offset = reader.read_u16()?;
        let attach_list_offset = reader.read_u16()?;
        let lig_caret_list_offset = reader.read_u16()?;
        let mark_attach_class_def_offset = reader.read_u16()?;

        let mark_glyph_sets_offset = if minor_version >= 2 {
            let offset = reader.read_u16()?;
            (offset != 0).then_some(offset)
        } else {
            None
        };
        let item_var_store_offset = if minor_version >= 3 {
            let offset = reader.read_u32()?;
            (offset != 0).then_some(offset)
        } else {
            None
        };

        let glyph_class_def = if glyph_class_def_offset != 0 {
            reader.set_position(glyph_class_def_offset as usize)?;
            Some(ClassDef::from_reader(reader)?)
        } else {
            None
        };

        let mark_attach_class_def = if mark_attach_class_def_offset != 0 {
            reader.set_position(mark_attach_class_def_offset as usize)?;
            Some(ClassDef::from_reader(reader)?)
        } else {
            None
        };

        Ok(GdefTable {
            major_version,
            minor_version,
            glyph_class_def,
            mark_attach_class_def,
            attach_list_offset: (attach_list_offset != 0).then_some(attach_list_offset),
            lig_caret_list_offset: (lig_caret_list_offset != 0).then_some(lig_caret_list_offset),
            mark_glyph_sets_offset,
            item_var_store_offset,
        })
    }
}
