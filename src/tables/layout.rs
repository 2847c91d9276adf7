use crate::error::{FontError, Result};
use crate::stream::FontReader;

/// Common OpenType layout plumbing shared by GSUB and GPOS: script and
/// feature lists parsed eagerly, lookups parsed on demand from the retained
/// table bytes.
#[derive(Debug, Clone)]
pub struct LayoutTable {
    data: Vec<u8>,
    tag: &'static str,
    pub major_version: u16,
    pub minor_version: u16,
    pub scripts: Vec<ScriptRecord>,
    pub features: Vec<FeatureRecord>,
    lookup_offsets: Vec<usize>,
    pub feature_variations_offset: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ScriptRecord {
    pub tag: [u8; 4],
    pub default_lang_sys: Option<LangSys>,
    pub lang_sys_records: Vec<LangSysRecord>,
}

#[derive(Debug, Clone)]
pub struct LangSysRecord {
    pub tag: [u8; 4],
    pub lang_sys: LangSys,
}

#[derive(Debug, Clone)]
pub struct LangSys {
    pub required_feature_index: Option<u16>,
    pub feature_indices: Vec<u16>,
}

#[derive(Debug, Clone)]
pub struct FeatureRecord {
    pub tag: [u8; 4],
    pub lookup_indices: Vec<u16>,
}

/// A lookup with its subtables left as raw offsets; interpretation is up to
/// the caller and unknown types are skipped there.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub lookup_type: u16,
    pub lookup_flag: u16,
    /// Absolute offsets into the owning table's bytes.
    pub subtable_offsets: Vec<usize>,
    pub mark_filtering_set: Option<u16>,
}

impl LayoutTable {
    pub fn from_reader(reader: &mut FontReader, tag: &'static str) -> Result<Self> {
        let major_version = reader.read_u16()?;
        let minor_version = reader.read_u16()?;
        if major_version != 1 {
            return Err(FontError::UnsupportedVersion {
                tag,
                version: ((major_version as u32) << 16) | minor_version as u32,
            });
        }

        let script_list_offset = reader.read_u16()? as usize;
        let feature_list_offset = reader.read_u16()? as usize;
        let lookup_list_offset = reader.read_u16()? as usize;
        let feature_variations_offset = if minor_version >= 1 {
            let offset = reader.read_u32()?;
            (offset != 0).then_some(offset)
        } else {
            None
        };

        let scripts = parse_script_list(reader, script_list_offset)?;
        let features = parse_feature_list(reader, feature_list_offset)?;

        reader.set_position(lookup_list_offset)?;
        let lookup_count = reader.read_u16()?;
        let mut lookup_offsets = Vec::with_capacity(lookup_count as usize);
        for _ in 0..lookup_count {
            lookup_offsets.push(lookup_list_offset + reader.read_u16()? as usize);
        }

        // Retain the table bytes for on-demand lookup parsing
        let mut full = reader.subreader(0, reader.len())?;
        let data = full.read_bytes(reader.len())?;

        Ok(LayoutTable {
            data,
            tag,
            major_version,
            minor_version,
            scripts,
            features,
            lookup_offsets,
            feature_variations_offset,
        })
    }

    pub fn lookup_count(&self) -> usize {
        self.lookup_offsets.len()
    }

    /// Raw table bytes retained for on-demand subtable parsing.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Parse one lookup on demand.
    pub fn lookup(&self, index: u16) -> Result<Lookup> {
        let offset = *self
            .lookup_offsets
            .get(index as usize)
            .ok_or_else(|| FontError::corrupt(self.tag, "lookup index out of range"))?;

        let mut reader = FontReader::from_slice(&self.data);
        reader.set_position(offset)?;

        let lookup_type = reader.read_u16()?;
        let lookup_flag = reader.read_u16()?;
        let subtable_count = reader.read_u16()?;
        let mut subtable_offsets = Vec::with_capacity(subtable_count as usize);
        for _ in 0..subtable_count {
            subtable_offsets.push(offset + reader.read_u16()? as usize);
        }
        // USE_MARK_FILTERING_SET
        let mark_filtering_set = if lookup_flag & 0x0010 != 0 {
            Some(reader.read_u16()?)
        } else {
            None
        };

        Ok(Lookup {
            lookup_type,
            lookup_flag,
            subtable_offsets,
            mark_filtering_set,
        })
    }

    /// Decode the coverage table at an absolute offset.
    pub fn coverage(&self, offset: usize) -> Result<Coverage> {
        let mut reader = FontReader::from_slice(&self.data);
        reader.set_position(offset)?;
        Coverage::from_reader(&mut reader)
    }

    /// Decode the class definition table at an absolute offset.
    pub fn class_def(&self, offset: usize) -> Result<ClassDef> {
        let mut reader = FontReader::from_slice(&self.data);
        reader.set_position(offset)?;
        ClassDef::from_reader(&mut reader)
    }
}

fn parse_script_list(reader: &mut FontReader, offset: usize) -> Result<Vec<ScriptRecord>> {
    reader.set_position(offset)?;
    let count = reader.read_u16()?;

    let mut raw = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let tag = reader.read_tag()?;
        let script_offset = reader.read_u16()? as usize;
        raw.push((tag, offset + script_offset));
    }

    let mut scripts = Vec::with_capacity(count as usize);
    for (tag, script_offset) in raw {
        reader.set_position(script_offset)?;
        let default_offset = reader.read_u16()? as usize;
        let lang_sys_count = reader.read_u16()?;
        let mut lang_raw = Vec::with_capacity(lang_sys_count as usize);
        for _ in 0..lang_sys_count {
            let lang_tag = reader.read_tag()?;
            let lang_offset = reader.read_u16()? as usize;
            lang_raw.push((lang_tag, script_offset + lang_offset));
        }

        let default_lang_sys = if default_offset != 0 {
            Some(parse_lang_sys(reader, script_offset + default_offset)?)
        } else {
            None
        };

        let mut lang_sys_records = Vec::with_capacity(lang_raw.len());
        for (lang_tag, lang_offset) in lang_raw {
            lang_sys_records.push(LangSysRecord {
                tag: lang_tag,
                lang_sys: parse_lang_sys(reader, lang_offset)?,
            });
        }

        scripts.push(ScriptRecord {
            tag,
            default_lang_sys,
            lang_sys_records,
        });
    }
    Ok(scripts)
}

fn parse_lang_sys(reader: &mut FontReader, offset: usize) -> Result<LangSys> {
    reader.set_position(offset)?;
    let _lookup_order_offset = reader.read_u16()?;
    let required = reader.read_u16()?;
    let count = reader.read_u16()?;
    let mut feature_indices = Vec::with_capacity(count as usize);
    for _ in 0..count {
        feature_indices.push(reader.read_u16()?);
    }
    Ok(LangSys {
        required_feature_index: (required != 0xFFFF).then_some(required),
        feature_indices,
    })
}

fn parse_feature_list(reader: &mut FontReader, offset: usize) -> Result<Vec<FeatureRecord>> {
    reader.set_position(offset)?;
    let count = reader.read_u16()?;

    let mut raw = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let tag = reader.read_tag()?;
        let feature_offset = reader.read_u16()? as usize;
        raw.push((tag, offset + feature_offset));
    }

    let mut features = Vec::with_capacity(count as usize);
    for (tag, feature_offset) in raw {
        reader.set_position(feature_offset)?;
        let _feature_params_offset = reader.read_u16()?;
        let lookup_count = reader.read_u16()?;
        let mut lookup_indices = Vec::with_capacity(lookup_count as usize);
        for _ in 0..lookup_count {
            lookup_indices.push(reader.read_u16()?);
        }
        features.push(FeatureRecord {
            tag,
            lookup_indices,
        });
    }
    Ok(features)
}

/// Coverage table: which glyphs a lookup subtable applies to.
#[derive(Debug, Clone)]
pub enum Coverage {
    Format1 { glyphs: Vec<u16> },
    Format2 { ranges: Vec<RangeRecord> },
}

#[derive(Debug, Clone)]
pub struct RangeRecord {
    pub start_glyph: u16,
    pub end_glyph: u16,
    pub start_coverage_index: u16,
}

impl Coverage {
    pub fn from_reader(reader: &mut FontReader) -> Result<Self> {
        let format = reader.read_u16()?;
        match format {
            1 => {
                let count = reader.read_u16()?;
                let mut glyphs = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    glyphs.push(reader.read_u16()?);
                }
                Ok(Coverage::Format1 { glyphs })
            }
            2 => {
                let count = reader.read_u16()?;
                let mut ranges = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    ranges.push(RangeRecord {
                        start_glyph: reader.read_u16()?,
                        end_glyph: reader.read_u16()?,
                        start_coverage_index: reader.read_u16()?,
                    });
                }
                Ok(Coverage::Format2 { ranges })
            }
            other => Err(FontError::corrupt(
                "GSUB",
                format!("unknown coverage format {other}"),
            )),
        }
    }

    /// Coverage index of a glyph, if covered.
    pub fn index(&self, glyph_id: u16) -> Option<u16> {
        match self {
            Coverage::Format1 { glyphs } => {
                glyphs.binary_search(&glyph_id).ok().map(|i| i as u16)
            }
            Coverage::Format2 { ranges } => {
                let idx = ranges.partition_point(|r| r.end_glyph < glyph_id);
                let range = ranges.get(idx)?;
                (range.start_glyph <= glyph_id).then(|| {
                    range.start_coverage_index + (glyph_id - range.start_glyph)
                })
            }
        }
    }
}

/// Class definition table: glyph id to class value.
#[derive(Debug, Clone)]
pub enum ClassDef {
    Format1 {
        start_glyph: u16,
        classes: Vec<u16>,
    },
    Format2 {
        ranges: Vec<ClassRangeRecord>,
    },
}

#[derive(Debug, Clone)]
pub struct ClassRangeRecord {
    pub start_glyph: u16,
    pub end_glyph: u16,
    pub class: u16,
}

impl ClassDef {
    pub fn from_reader(reader: &mut FontReader) -> Result<Self> {
        let format = reader.read_u16()?;
        match format {
            1 => {
                let start_glyph = reader.read_u16()?;
                let count = reader.read_u16()?;
                let mut classes = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    classes.push(reader.read_u16()?);
                }
                Ok(ClassDef::Format1 {
                    start_glyph,
                    classes,
                })
            }
            2 => {
                let count = reader.read_u16()?;
                let mut ranges = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    ranges.push(ClassRangeRecord {
                        start_glyph: reader.read_u16()?,
                        end_glyph: reader.read_u16()?,
                        class: reader.read_u16()?,
                    });
                }
                Ok(ClassDef::Format2 { ranges })
            }
            other => Err(FontError::corrupt(
                "GDEF",
                format!("unknown class definition format {other}"),
            )),
        }
    }

    /// Glyphs outside every range are class 0.
    pub fn class(&self, glyph_id: u16) -> u16 {
        match self {
            ClassDef::Format1 {
                start_glyph,
                classes,
            } => glyph_id
                .checked_sub(*start_glyph)
                .and_then(|i| classes.get(i as usize).copied())
                .unwrap_or(0),
            ClassDef::Format2 { ranges } => {
                let idx = ranges.partition_point(|r| r.end_glyph < glyph_id);
                ranges
                    .get(idx)
                    .filter(|r| r.start_glyph <= glyph_id)
                    .map(|r| r.class)
                    .unwrap_or(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_format1_lookup() {
        let coverage = Coverage::Format1 {
            glyphs: vec![3, 7, 10],
        };
        assert_eq!(coverage.index(3), Some(0));
        assert_eq!(coverage.index(10), Some(2));
        assert_eq!(coverage.index(5), None);
    }

    #[test]
    fn coverage_format2_lookup() {
        let coverage = Coverage::Format2 {
            ranges: vec![RangeRecord {
                start_glyph: 10,
                end_glyph: 20,
                start_coverage_index: 5,
            }],
        };
        assert_eq!(coverage.index(10), Some(5));
        assert_eq!(coverage.index(15), Some(10));
        assert_eq!(coverage.index(21), None);
    }

    #[test]
    fn class_def_defaults_to_zero() {
        let class_def = ClassDef::Format2 {
            ranges: vec![ClassRangeRecord {
                start_glyph: 5,
                end_glyph: 9,
                class: 2,
            }],
        };
        assert_eq!(class_def.class(7), 2);
        assert_eq!(class_def.class(4), 0);
        assert_eq!(class_def.class(10), 0);
    }
}
