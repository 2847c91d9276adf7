use crate::error::Result;
use crate::stream::FontReader;
use crate::tables::FontTable;

/// vhea table - Vertical header
#[derive(Debug, Clone)]
pub struct VheaTable {
    pub table_version: f32,
    pub vert_typo_ascender: i16,
    pub vert_typo_descender: i16,
    pub vert_typo_line_gap: i16,
    pub advance_height_max: i16,
    pub min_top_side_bearing: i16,
    pub min_bottom_side_bearing: i16,
    pub y_max_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    pub metric_data_format: i16,
    pub number_of_v_metrics: u16,
}

impl FontTable for VheaTable {
    fn from_reader(reader: &mut FontReader, length: u32) -> Result<Self> {
        let table_version = reader.read_fixed()?;
        let vert_typo_ascender = reader.read_i16()?;
        let vert_typo_descender = reader.read_i16()?;
        let vert_typo_line_gap = reader.read_i16()?;
        let advance_height_max = reader.read_i16()?;
        let min_top_side_bearing = reader.read_i16()?;
        let min_bottom_side_bearing = reader.read_i16()?;
        let y_max_extent = reader.read_i16()?;
        let caret_slope_rise = reader.read_i16()?;
        let caret_slope_run = reader.read_i16()?;
        let caret_offset = reader.read_i16()?;

        // Four reserved words
        reader.skip(8)?;

        let metric_data_format = reader.read_i16()?;
        let number_of_v_metrics = reader.read_u16()?;

        let bytes_read = reader.position();
        if bytes_read < length as usize {
            reader.skip(length as usize - bytes_read)?;
        }

        Ok(VheaTable {
            table_version,
            vert_typo_ascender,
            vert_typo_descender,
            vert_typo_line_gap,
            advance_height_max,
            min_top_side_bearing,
            min_bottom_side_bearing,
            y_max_extent,
            caret_slope_rise,
            caret_slope_run,
            caret_offset,
            metric_data_format,
            number_of_v_metrics,
        })
    }
}
