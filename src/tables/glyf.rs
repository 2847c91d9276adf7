use crate::error::{FontError, Result};
use crate::outline::{BoundingBox, Contour, Outline, OutlinePoint, Transform};
use crate::stream::FontReader;
use super::loca::LocaTable;

// Simple glyph flags
pub const ON_CURVE_POINT: u8 = 0x01;
pub const X_SHORT_VECTOR: u8 = 0x02;
pub const Y_SHORT_VECTOR: u8 = 0x04;
pub const REPEAT_FLAG: u8 = 0x08;
pub const X_IS_SAME_OR_POSITIVE: u8 = 0x10;
pub const Y_IS_SAME_OR_POSITIVE: u8 = 0x20;

// Composite glyph flags
pub const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
pub const ARGS_ARE_XY_VALUES: u16 = 0x0002;
pub const WE_HAVE_A_SCALE: u16 = 0x0008;
pub const MORE_COMPONENTS: u16 = 0x0020;
pub const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
pub const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;
pub const WE_HAVE_INSTRUCTIONS: u16 = 0x0100;

const MAX_COMPONENT_DEPTH: usize = 16;

/// glyf table - Glyph outline data
#[derive(Debug, Clone)]
pub struct GlyfTable {
    pub glyphs: Vec<Glyph>,
}

#[derive(Debug, Clone)]
pub struct Glyph {
    pub number_of_contours: i16,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub data: GlyphData,
}

#[derive(Debug, Clone)]
pub enum GlyphData {
    Simple(SimpleGlyph),
    Composite(CompositeGlyph),
    Empty,
}

#[derive(Debug, Clone)]
pub struct SimpleGlyph {
    pub end_pts_of_contours: Vec<u16>,
    /// Hinting bytecode, retained verbatim and never executed.
    pub instructions: Vec<u8>,
    pub flags: Vec<u8>,
    pub x_coordinates: Vec<i16>,
    pub y_coordinates: Vec<i16>,
}

#[derive(Debug, Clone)]
pub struct CompositeGlyph {
    pub components: Vec<GlyphComponent>,
    pub instructions: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct GlyphComponent {
    pub flags: u16,
    pub glyph_index: u16,
    pub arg1: i16,
    pub arg2: i16,
    pub transform: Transform,
}

impl GlyphComponent {
    /// arg1/arg2 are an XY translation when `ARGS_ARE_XY_VALUES` is set,
    /// otherwise parent/child anchor point indices.
    pub fn args_are_xy_values(&self) -> bool {
        self.flags & ARGS_ARE_XY_VALUES != 0
    }
}

impl Glyph {
    pub fn is_simple(&self) -> bool {
        matches!(self.data, GlyphData::Simple(_))
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.data, GlyphData::Composite(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.data, GlyphData::Empty)
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if self.is_empty() {
            return None;
        }
        Some(BoundingBox::from_glyph(
            self.x_min, self.y_min, self.x_max, self.y_max,
        ))
    }
}

impl SimpleGlyph {
    pub fn num_points(&self) -> usize {
        self.end_pts_of_contours
            .last()
            .map(|&last| last as usize + 1)
            .unwrap_or(0)
    }

    /// Convert to the shared contour abstraction.
    pub fn outline(&self) -> Outline {
        let xs: Vec<f32> = self.x_coordinates.iter().map(|&x| x as f32).collect();
        let ys: Vec<f32> = self.y_coordinates.iter().map(|&y| y as f32).collect();
        self.outline_with_coordinates(&xs, &ys)
    }

    /// Convert with replacement coordinates (same point count), used when
    /// variation deltas have been applied.
    pub fn outline_with_coordinates(&self, xs: &[f32], ys: &[f32]) -> Outline {
        let mut contours = Vec::with_capacity(self.end_pts_of_contours.len());
        let mut start = 0usize;
        for &end in &self.end_pts_of_contours {
            let end = end as usize;
            if end < start || end >= xs.len() {
                break;
            }
            let mut points = Vec::with_capacity(end - start + 1);
            for i in start..=end {
                points.push(OutlinePoint::new(
                    xs[i],
                    ys[i],
                    self.flags[i] & ON_CURVE_POINT != 0,
                ));
            }
            contours.push(Contour { points });
            start = end + 1;
        }
        Outline { contours }
    }

    fn read(reader: &mut FontReader, num_contours: usize) -> Result<Self> {
        let mut end_pts_of_contours = Vec::with_capacity(num_contours);
        for _ in 0..num_contours {
            end_pts_of_contours.push(reader.read_u16()?);
        }

        let num_points = end_pts_of_contours
            .last()
            .map(|&last| last as usize + 1)
            .unwrap_or(0);

        // Endpoint indices must be increasing for the point count to be
        // well defined
        for pair in end_pts_of_contours.windows(2) {
            if pair[1] <= pair[0] {
                return Err(FontError::corrupt(
                    "glyf",
                    "contour endpoints not increasing",
                ));
            }
        }

        let instruction_length = reader.read_u16()?;
        let instructions = reader.read_bytes(instruction_length as usize)?;

        let mut flags = Vec::with_capacity(num_points);
        while flags.len() < num_points {
            let flag = reader.read_u8()?;
            flags.push(flag);
            if flag & REPEAT_FLAG != 0 {
                let repeat_count = reader.read_u8()? as usize;
                for _ in 0..repeat_count {
                    if flags.len() == num_points {
                        return Err(FontError::corrupt("glyf", "flag repeat overruns points"));
                    }
                    flags.push(flag);
                }
            }
        }

        let mut x_coordinates = Vec::with_capacity(num_points);
        let mut x = 0i32;
        for &flag in &flags {
            if flag & X_SHORT_VECTOR != 0 {
                let val = reader.read_u8()? as i32;
                x += if flag & X_IS_SAME_OR_POSITIVE != 0 {
                    val
                } else {
                    -val
                };
            } else if flag & X_IS_SAME_OR_POSITIVE == 0 {
                x += reader.read_i16()? as i32;
            }
            // else: x is unchanged (same as previous)
            x_coordinates.push(x as i16);
        }

        let mut y_coordinates = Vec::with_capacity(num_points);
        let mut y = 0i32;
        for &flag in &flags {
            if flag & Y_SHORT_VECTOR != 0 {
                let val = reader.read_u8()? as i32;
                y += if flag & Y_IS_SAME_OR_POSITIVE != 0 {
                    val
                } else {
                    -val
                };
            } else if flag & Y_IS_SAME_OR_POSITIVE == 0 {
                y += reader.read_i16()? as i32;
            }
            y_coordinates.push(y as i16);
        }

        Ok(SimpleGlyph {
            end_pts_of_contours,
            instructions,
            flags,
            x_coordinates,
            y_coordinates,
        })
    }
}

impl CompositeGlyph {
    fn read(reader: &mut FontReader) -> Result<Self> {
        let mut components = Vec::new();
        let mut have_instructions = false;

        loop {
            let flags = reader.read_u16()?;
            let glyph_index = reader.read_u16()?;

            let (arg1, arg2) = if flags & ARG_1_AND_2_ARE_WORDS != 0 {
                (reader.read_i16()?, reader.read_i16()?)
            } else if flags & ARGS_ARE_XY_VALUES != 0 {
                (reader.read_i8()? as i16, reader.read_i8()? as i16)
            } else {
                // Anchor point indices are unsigned
                (reader.read_u8()? as i16, reader.read_u8()? as i16)
            };

            let mut transform = Transform::default();
            if flags & WE_HAVE_A_SCALE != 0 {
                let scale = reader.read_f2dot14()?;
                transform.xx = scale;
                transform.yy = scale;
            } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
                transform.xx = reader.read_f2dot14()?;
                transform.yy = reader.read_f2dot14()?;
            } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
                transform.xx = reader.read_f2dot14()?;
                transform.yx = reader.read_f2dot14()?;
                transform.xy = reader.read_f2dot14()?;
                transform.yy = reader.read_f2dot14()?;
            }

            if flags & ARGS_ARE_XY_VALUES != 0 {
                transform.dx = arg1 as f32;
                transform.dy = arg2 as f32;
            }

            have_instructions |= flags & WE_HAVE_INSTRUCTIONS != 0;

            components.push(GlyphComponent {
                flags,
                glyph_index,
                arg1,
                arg2,
                transform,
            });

            if flags & MORE_COMPONENTS == 0 {
                break;
            }
        }

        let instructions = if have_instructions {
            let instruction_length = reader.read_u16()?;
            reader.read_bytes(instruction_length as usize)?
        } else {
            Vec::new()
        };

        Ok(CompositeGlyph {
            components,
            instructions,
        })
    }
}

impl GlyfTable {
    pub fn from_reader(
        reader: &mut FontReader,
        length: u32,
        loca: &LocaTable,
        num_glyphs: u16,
    ) -> Result<Self> {
        let mut glyphs = Vec::with_capacity(num_glyphs as usize);

        if loca.get_offset(num_glyphs as usize)? > length {
            return Err(FontError::corrupt(
                "loca",
                "final offset exceeds glyf length",
            ));
        }

        for i in 0..num_glyphs {
            let offset = loca.get_offset(i as usize)?;
            let next_offset = loca.get_offset(i as usize + 1)?;

            if offset == next_offset {
                glyphs.push(Glyph {
                    number_of_contours: 0,
                    x_min: 0,
                    y_min: 0,
                    x_max: 0,
                    y_max: 0,
                    data: GlyphData::Empty,
                });
                continue;
            }

            reader.set_position(offset as usize)?;

            let number_of_contours = reader.read_i16()?;
            let x_min = reader.read_i16()?;
            let y_min = reader.read_i16()?;
            let x_max = reader.read_i16()?;
            let y_max = reader.read_i16()?;

            let data = if number_of_contours > 0 {
                GlyphData::Simple(SimpleGlyph::read(reader, number_of_contours as usize)?)
            } else if number_of_contours == -1 {
                GlyphData::Composite(CompositeGlyph::read(reader)?)
            } else if number_of_contours == 0 {
                GlyphData::Empty
            } else {
                return Err(FontError::corrupt(
                    "glyf",
                    format!("glyph {i} has invalid contour count {number_of_contours}"),
                ));
            };

            glyphs.push(Glyph {
                number_of_contours,
                x_min,
                y_min,
                x_max,
                y_max,
                data,
            });
        }

        Ok(GlyfTable { glyphs })
    }

    pub fn num_glyphs(&self) -> u16 {
        self.glyphs.len() as u16
    }

    pub fn glyph(&self, index: u16) -> Option<&Glyph> {
        self.glyphs.get(index as usize)
    }

    /// Flatten a glyph into contours, resolving composite references
    /// recursively. Components compose left to right and transforms nest.
    pub fn outline(&self, glyph_index: u16) -> Result<Outline> {
        let mut stack = Vec::new();
        self.outline_inner(glyph_index, &mut stack)
    }

    fn outline_inner(&self, glyph_index: u16, stack: &mut Vec<u16>) -> Result<Outline> {
        if stack.contains(&glyph_index) {
            return Err(FontError::corrupt("glyf", "composite cycle"));
        }
        if stack.len() >= MAX_COMPONENT_DEPTH {
            return Err(FontError::corrupt("glyf", "composite nesting too deep"));
        }

        let glyph = self.glyph(glyph_index).ok_or_else(|| {
            FontError::corrupt("glyf", format!("glyph index {glyph_index} out of range"))
        })?;

        match &glyph.data {
            GlyphData::Empty => Ok(Outline::default()),
            GlyphData::Simple(simple) => Ok(simple.outline()),
            GlyphData::Composite(composite) => {
                stack.push(glyph_index);
                let mut outline = Outline::default();
                for component in &composite.components {
                    let mut child = self.outline_inner(component.glyph_index, stack)?;

                    if component.args_are_xy_values() {
                        child.transform(&component.transform);
                    } else {
                        // Anchor matching: translate the child so its anchor
                        // point lands on the parent's
                        let mut positioned = component.transform;
                        positioned.dx = 0.0;
                        positioned.dy = 0.0;
                        child.transform(&positioned);

                        let parent_points: Vec<OutlinePoint> = outline
                            .contours
                            .iter()
                            .flat_map(|c| c.points.iter().copied())
                            .collect();
                        let child_points: Vec<OutlinePoint> = child
                            .contours
                            .iter()
                            .flat_map(|c| c.points.iter().copied())
                            .collect();

                        let parent_anchor = parent_points
                            .get(component.arg1 as u16 as usize)
                            .copied()
                            .ok_or_else(|| {
                                FontError::corrupt("glyf", "anchor point out of range")
                            })?;
                        let child_anchor = child_points
                            .get(component.arg2 as u16 as usize)
                            .copied()
                            .ok_or_else(|| {
                                FontError::corrupt("glyf", "anchor point out of range")
                            })?;

                        let shift = Transform::translation(
                            parent_anchor.x - child_anchor.x,
                            parent_anchor.y - child_anchor.y,
                        );
                        child.transform(&shift);
                    }

                    outline.contours.append(&mut child.contours);
                }
                stack.pop();
                Ok(outline)
            }
        }
    }
}
