use crate::error::{FontError, Result};
use crate::stream::FontReader;
use crate::tables::FontTable;
use crate::variation::normalize_coordinate;

/// fvar table - Font variation axes and named instances
#[derive(Debug, Clone)]
pub struct FvarTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub axes: Vec<VariationAxis>,
    pub instances: Vec<NamedInstance>,
}

#[derive(Debug, Clone)]
pub struct VariationAxis {
    pub tag: [u8; 4],
    pub min_value: f32,
    pub default_value: f32,
    pub max_value: f32,
    pub flags: u16,
    pub axis_name_id: u16,
}

impl VariationAxis {
    pub fn tag_string(&self) -> String {
        String::from_utf8_lossy(&self.tag).to_string()
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min_value, self.max_value)
    }

    /// Map a user value into [-1, +1] with the default at 0.
    pub fn normalize(&self, value: f32) -> f32 {
        normalize_coordinate(value, self.min_value, self.default_value, self.max_value)
    }
}

#[derive(Debug, Clone)]
pub struct NamedInstance {
    pub subfamily_name_id: u16,
    pub flags: u16,
    pub coordinates: Vec<f32>,
    pub postscript_name_id: Option<u16>,
}

impl FvarTable {
    pub fn axis(&self, tag: &[u8; 4]) -> Option<&VariationAxis> {
        self.axes.iter().find(|a| &a.tag == tag)
    }

    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }
}

impl FontTable for FvarTable {
    fn from_reader(reader: &mut FontReader, _length: u32) -> Result<Self> {
        let major_version = reader.read_u16()?;
        let minor_version = reader.read_u16()?;
        if major_version != 1 {
            return Err(FontError::UnsupportedVersion {
                tag: "fvar",
                version: ((major_version as u32) << 16) | minor_version as u32,
            });
        }

        let axes_array_offset = reader.read_u16()? as usize;
        reader.skip(2)?; // reserved
        let axis_count = reader.read_u16()?;
        let axis_size = reader.read_u16()? as usize;
        let instance_count = reader.read_u16()?;
        let instance_size = reader.read_u16()? as usize;

        if axis_size < 20 {
            return Err(FontError::corrupt(
                "fvar",
                format!("axis record size {axis_size} too small"),
            ));
        }

        let mut axes = Vec::with_capacity(axis_count as usize);
        for i in 0..axis_count as usize {
            reader.set_position(axes_array_offset + i * axis_size)?;
            let tag = reader.read_tag()?;
            let min_value = reader.read_fixed()?;
            let default_value = reader.read_fixed()?;
            let max_value = reader.read_fixed()?;
            let flags = reader.read_u16()?;
            let axis_name_id = reader.read_u16()?;

            if !(min_value <= default_value && default_value <= max_value) {
                return Err(FontError::corrupt(
                    "fvar",
                    format!("axis {i} range not ordered"),
                ));
            }

            axes.push(VariationAxis {
                tag,
                min_value,
                default_value,
                max_value,
                flags,
                axis_name_id,
            });
        }

        // Instances follow the axis records; postScriptNameID is present
        // when the record has room for it
        let instances_offset = axes_array_offset + axis_count as usize * axis_size;
        let base_size = 4 + axis_count as usize * 4;
        let has_postscript_name = instance_size >= base_size + 2;

        let mut instances = Vec::with_capacity(instance_count as usize);
        for i in 0..instance_count as usize {
            reader.set_position(instances_offset + i * instance_size)?;
            let subfamily_name_id = reader.read_u16()?;
            let flags = reader.read_u16()?;
            let mut coordinates = Vec::with_capacity(axis_count as usize);
            for _ in 0..axis_count {
                coordinates.push(reader.read_fixed()?);
            }
            let postscript_name_id = if has_postscript_name {
                Some(reader.read_u16()?)
            } else {
                None
            };

            instances.push(NamedInstance {
                subfamily_name_id,
                flags,
                coordinates,
                postscript_name_id,
            });
        }

        Ok(FvarTable {
            major_version,
            minor_version,
            axes,
            instances,
        })
    }
}
