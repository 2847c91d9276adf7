use crate::error::Result;
use crate::stream::FontReader;
use crate::tables::FontTable;

/// OS/2 table - OS/2 and Windows metrics
#[derive(Debug, Clone)]
pub struct Os2Table {
    pub version: u16,
    pub x_avg_char_width: i16,
    pub us_weight_class: u16,
    pub us_width_class: u16,
    pub fs_type: u16,
    pub y_subscript_x_size: i16,
    pub y_subscript_y_size: i16,
    pub y_subscript_x_offset: i16,
    pub y_subscript_y_offset: i16,
    pub y_superscript_x_size: i16,
    pub y_superscript_y_size: i16,
    pub y_superscript_x_offset: i16,
    pub y_superscript_y_offset: i16,
    pub y_strikeout_size: i16,
    pub y_strikeout_position: i16,
    pub s_family_class: i16,
    pub panose: [u8; 10],
    pub ul_unicode_range1: u32,
    pub ul_unicode_range2: u32,
    pub ul_unicode_range3: u32,
    pub ul_unicode_range4: u32,
    pub ach_vend_id: [u8; 4],
    pub fs_selection: u16,
    pub us_first_char_index: u16,
    pub us_last_char_index: u16,
    pub s_typo_ascender: i16,
    pub s_typo_descender: i16,
    pub s_typo_line_gap: i16,
    pub us_win_ascent: u16,
    pub us_win_descent: u16,
    // Version 1+
    pub ul_code_page_range1: Option<u32>,
    pub ul_code_page_range2: Option<u32>,
    // Version 2+
    pub sx_height: Option<i16>,
    pub s_cap_height: Option<i16>,
    pub us_default_char: Option<u16>,
    pub us_break_char: Option<u16>,
    pub us_max_context: Option<u16>,
}

impl Os2Table {
    pub fn is_bold(&self) -> bool {
        self.fs_selection & 0x20 != 0 || self.us_weight_class >= 700
    }

    pub fn is_italic(&self) -> bool {
        self.fs_selection & 0x01 != 0
    }

    pub fn get_weight_string(&self) -> &'static str {
        match self.us_weight_class {
            100..=199 => "Thin",
            200..=299 => "Extra Light",
            300..=399 => "Light",
            400..=499 => "Normal",
            500..=599 => "Medium",
            600..=699 => "Semi Bold",
            700..=799 => "Bold",
            800..=899 => "Extra Bold",
            900..=999 => "Black",
            _ => "Unknown",
        }
    }
}

impl FontTable for Os2Table {
    fn from_reader(reader: &mut FontReader, _length: u32) -> Result<Self> {
        let version = reader.read_u16()?;
        let x_avg_char_width = reader.read_i16()?;
        let us_weight_class = reader.read_u16()?;
        let us_width_class = reader.read_u16()?;
        let fs_type = reader.read_u16()?;
        let y_subscript_x_size = reader.read_i16()?;
        let y_subscript_y_size = reader.read_i16()?;
        let y_subscript_x_offset = reader.read_i16()?;
        let y_subscript_y_offset = reader.read_i16()?;
        let y_superscript_x_size = reader.read_i16()?;
        let y_superscript_y_size = reader.read_i16()?;
        let y_superscript_x_offset = reader.read_i16()?;
        let y_superscript_y_offset = reader.read_i16()?;
        let y_strikeout_size = reader.read_i16()?;
        let y_strikeout_position = reader.read_i16()?;
        let s_family_class = reader.read_i16()?;

        let mut panose = [0u8; 10];
        for slot in panose.iter_mut() {
            *slot = reader.read_u8()?;
        }

        let ul_unicode_range1 = reader.read_u32()?;
        let ul_unicode_range2 = reader.read_u32()?;
        let ul_unicode_range3 = reader.read_u32()?;
        let ul_unicode_range4 = reader.read_u32()?;

        let ach_vend_id = reader.read_tag()?;

        let fs_selection = reader.read_u16()?;
        let us_first_char_index = reader.read_u16()?;
        let us_last_char_index = reader.read_u16()?;
        let s_typo_ascender = reader.read_i16()?;
        let s_typo_descender = reader.read_i16()?;
        let s_typo_line_gap = reader.read_i16()?;
        let us_win_ascent = reader.read_u16()?;
        let us_win_descent = reader.read_u16()?;

        let (mut ul_code_page_range1, mut ul_code_page_range2) = (None, None);
        if version >= 1 {
            ul_code_page_range1 = Some(reader.read_u32()?);
            ul_code_page_range2 = Some(reader.read_u32()?);
        }

        let (mut sx_height, mut s_cap_height) = (None, None);
        let (mut us_default_char, mut us_break_char, mut us_max_context) = (None, None, None);
        if version >= 2 {
            sx_height = Some(reader.read_i16()?);
            s_cap_height = Some(reader.read_i16()?);
            us_default_char = Some(reader.read_u16()?);
            us_break_char = Some(reader.read_u16()?);
            us_max_context = Some(reader.read_u16()?);
        }

        Ok(Os2Table {
            version,
            x_avg_char_width,
            us_weight_class,
            us_width_class,
            fs_type,
            y_subscript_x_size,
            y_subscript_y_size,
            y_subscript_x_offset,
            y_subscript_y_offset,
            y_superscript_x_size,
            y_superscript_y_size,
            y_superscript_x_offset,
            y_superscript_y_offset,
            y_strikeout_size,
            y_strikeout_position,
            s_family_class,
            panose,
            ul_unicode_range1,
            ul_unicode_range2,
            ul_unicode_range3,
            ul_unicode_range4,
            ach_vend_id,
            fs_selection,
            us_first_char_index,
            us_last_char_index,
            s_typo_ascender,
            s_typo_descender,
            s_typo_line_gap,
            us_win_ascent,
            us_win_descent,
            ul_code_page_range1,
            ul_code_page_range2,
            sx_height,
            s_cap_height,
            us_default_char,
            us_break_char,
            us_max_context,
        })
    }
}
