use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{FontError, Result};
use crate::font::Font;
use crate::outline::{Outline, Transform};
use crate::tables::avar::AvarTable;
use crate::tables::cff::CffTable;
use crate::tables::cff2::Cff2Table;
use crate::tables::cmap::CmapTable;
use crate::tables::fvar::{FvarTable, VariationAxis};
use crate::tables::gdef::GdefTable;
use crate::tables::glyf::{GlyfTable, GlyphData};
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
use crate::tables::vhea::VheaTable;
use crate::tables::vmtx::VmtxTable;
use crate::variation::NormalizedCoords;

const MAX_COMPONENT_DEPTH: usize = 16;

type CachedTable = Arc<dyn Any + Send + Sync>;

/// Lazy, memoizing table access over a parsed font image.
///
/// Each table parses at most once; results are immutable and shared. Table
/// dependencies (`glyf` needs `loca`, `head`, `maxp`; `hmtx` needs `hhea`)
/// are fetched through the registry and inherit the same guarantee. Parse
/// errors surface at the accessor that triggered them.
pub struct TableRegistry {
    font: Arc<Font>,
    cache: RwLock<HashMap<[u8; 4], CachedTable>>,
}

impl TableRegistry {
    pub fn new(font: Font) -> Self {
        Self {
            font: Arc::new(font),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    /// Raw table bytes, if the table is present.
    pub fn table(&self, tag: &[u8; 4]) -> Option<Vec<u8>> {
        self.font.get_table_data(tag)
    }

    fn get_or_parse<T: Send + Sync + 'static>(
        &self,
        tag: [u8; 4],
        parse: impl FnOnce(&Font) -> Result<T>,
    ) -> Result<Arc<T>> {
        {
            let cache = self.cache.read().unwrap();
            if let Some(hit) = cache.get(&tag) {
                return downcast(hit.clone());
            }
        }

        // Parse outside the lock; the first insert wins so every reader
        // observes the same result
        let parsed: CachedTable = Arc::new(parse(&self.font)?);
        let mut cache = self.cache.write().unwrap();
        let entry = cache.entry(tag).or_insert(parsed);
        downcast(entry.clone())
    }

    pub fn head(&self) -> Result<Arc<HeadTable>> {
        self.get_or_parse(*b"head", Font::head_table)
    }

    pub fn maxp(&self) -> Result<Arc<MaxpTable>> {
        self.get_or_parse(*b"maxp", Font::maxp_table)
    }

    pub fn cmap(&self) -> Result<Arc<CmapTable>> {
        self.get_or_parse(*b"cmap", Font::cmap_table)
    }

    pub fn name(&self) -> Result<Arc<NameTable>> {
        self.get_or_parse(*b"name", Font::name_table)
    }

    pub fn os2(&self) -> Result<Arc<Os2Table>> {
        self.get_or_parse(*b"OS/2", Font::os2_table)
    }

    pub fn post(&self) -> Result<Arc<PostTable>> {
        self.get_or_parse(*b"post", Font::post_table)
    }

    pub fn hhea(&self) -> Result<Arc<HheaTable>> {
        self.get_or_parse(*b"hhea", Font::hhea_table)
    }

    pub fn vhea(&self) -> Result<Arc<VheaTable>> {
        self.get_or_parse(*b"vhea", Font::vhea_table)
    }

    pub fn hmtx(&self) -> Result<Arc<HmtxTable>> {
        let hhea = self.hhea()?;
        let maxp = self.maxp()?;
        self.get_or_parse(*b"hmtx", |font| {
            let (mut reader, length) = font.table_reader(b"hmtx")?;
            HmtxTable::from_reader(
                &mut reader,
                length,
                maxp.num_glyphs,
                hhea.number_of_h_metrics,
            )
        })
    }

    pub fn vmtx(&self) -> Result<Arc<VmtxTable>> {
        let vhea = self.vhea()?;
        let maxp = self.maxp()?;
        self.get_or_parse(*b"vmtx", |font| {
            let (mut reader, length) = font.table_reader(b"vmtx")?;
            VmtxTable::from_reader(
                &mut reader,
                length,
                maxp.num_glyphs,
                vhea.number_of_v_metrics,
            )
        })
    }

    pub fn loca(&self) -> Result<Arc<LocaTable>> {
        let head = self.head()?;
        let maxp = self.maxp()?;
        self.get_or_parse(*b"loca", |font| {
            let (mut reader, length) = font.table_reader(b"loca")?;
            LocaTable::from_reader(
                &mut reader,
                length,
                maxp.num_glyphs as usize,
                head.is_long_loca_format(),
            )
        })
    }

    pub fn glyf(&self) -> Result<Arc<GlyfTable>> {
        let loca = self.loca()?;
        let maxp = self.maxp()?;
        self.get_or_parse(*b"glyf", |font| {
            let (mut reader, length) = font.table_reader(b"glyf")?;
            GlyfTable::from_reader(&mut reader, length, &loca, maxp.num_glyphs)
        })
    }

    pub fn cff(&self) -> Result<Arc<CffTable>> {
        self.get_or_parse(*b"CFF ", Font::cff_table)
    }

    pub fn cff2(&self) -> Result<Arc<Cff2Table>> {
        self.get_or_parse(*b"CFF2", Font::cff2_table)
    }

    pub fn fvar(&self) -> Result<Arc<FvarTable>> {
        self.get_or_parse(*b"fvar", Font::fvar_table)
    }

    pub fn avar(&self) -> Result<Arc<AvarTable>> {
        self.get_or_parse(*b"avar", Font::avar_table)
    }

    pub fn gvar(&self) -> Result<Arc<GvarTable>> {
        self.get_or_parse(*b"gvar", Font::gvar_table)
    }

    pub fn hvar(&self) -> Result<Arc<HvarTable>> {
        self.get_or_parse(*b"HVAR", Font::hvar_table)
    }

    pub fn vvar(&self) -> Result<Arc<VvarTable>> {
        self.get_or_parse(*b"VVAR", Font::vvar_table)
    }

    pub fn mvar(&self) -> Result<Arc<MvarTable>> {
        self.get_or_parse(*b"MVAR", Font::mvar_table)
    }

    pub fn gsub(&self) -> Result<Arc<GsubTable>> {
        self.get_or_parse(*b"GSUB", Font::gsub_table)
    }

    pub fn gpos(&self) -> Result<Arc<GposTable>> {
        self.get_or_parse(*b"GPOS", Font::gpos_table)
    }

    pub fn gdef(&self) -> Result<Arc<GdefTable>> {
        self.get_or_parse(*b"GDEF", Font::gdef_table)
    }

    /// Absent-table errors become `None`; real parse errors propagate.
    fn optional<T>(result: Result<Arc<T>>) -> Result<Option<Arc<T>>> {
        match result {
            Ok(table) => Ok(Some(table)),
            Err(FontError::UnknownTable(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn num_glyphs(&self) -> Result<u16> {
        Ok(self.maxp()?.num_glyphs)
    }

    /// Unified codepoint (plus optional variation selector) to glyph id
    /// lookup. Ids at or beyond `maxp.numGlyphs` are treated as unmapped.
    pub fn glyph_id(&self, codepoint: u32, variation_selector: Option<u32>) -> Result<Option<u16>> {
        let num_glyphs = self.num_glyphs()?;
        let glyph = self.cmap()?.glyph_id(codepoint, variation_selector);
        Ok(glyph.filter(|&g| g < num_glyphs))
    }

    /// The font's variation axes; empty for a static font.
    pub fn variation_axes(&self) -> Result<Vec<VariationAxis>> {
        match Self::optional(self.fvar())? {
            Some(fvar) => Ok(fvar.axes.clone()),
            None => Ok(Vec::new()),
        }
    }

    /// Normalize user coordinates (axis tag to user value) into the
    /// per-axis [-1, +1] space, applying `avar` remapping when present.
    /// Unspecified axes sit at their defaults.
    pub fn normalize_coordinates(&self, user: &[([u8; 4], f32)]) -> Result<NormalizedCoords> {
        let fvar = match Self::optional(self.fvar())? {
            Some(fvar) => fvar,
            None => return Ok(NormalizedCoords(Vec::new())),
        };

        let mut coords = Vec::with_capacity(fvar.axes.len());
        for axis in &fvar.axes {
            let value = user
                .iter()
                .find(|(tag, _)| *tag == axis.tag)
                .map(|&(_, value)| value)
                .unwrap_or(axis.default_value);
            coords.push(axis.normalize(value));
        }

        if let Some(avar) = Self::optional(self.avar())? {
            avar.remap_coordinates(&mut coords);
        }

        Ok(NormalizedCoords(coords))
    }

    /// Glyph outline, optionally at a variation coordinate. Dispatches to
    /// CFF2, CFF, or glyf/loca in that order of preference.
    pub fn outline(&self, glyph_id: u16, coords: Option<&NormalizedCoords>) -> Result<Outline> {
        let num_glyphs = self.num_glyphs()?;
        if glyph_id >= num_glyphs {
            return Err(FontError::InvariantViolation(format!(
                "glyph id {glyph_id} out of range ({num_glyphs} glyphs)"
            )));
        }

        if let Some(cff2) = Self::optional(self.cff2())? {
            let origin = NormalizedCoords(Vec::new());
            return cff2.outline(glyph_id, coords.unwrap_or(&origin));
        }
        if let Some(cff) = Self::optional(self.cff())? {
            return cff.outline(glyph_id);
        }

        let glyf = self.glyf()?;
        match coords {
            Some(coords) if !coords.is_empty() && !coords.is_default() => {
                match Self::optional(self.gvar())? {
                    Some(gvar) => {
                        let mut stack = Vec::new();
                        self.glyf_outline_varied(&glyf, &gvar, glyph_id, coords, &mut stack)
                    }
                    None => glyf.outline(glyph_id),
                }
            }
            _ => glyf.outline(glyph_id),
        }
    }

    /// TrueType outline with gvar deltas applied, composed recursively for
    /// composites (component offsets shift by their own deltas).
    fn glyf_outline_varied(
        &self,
        glyf: &GlyfTable,
        gvar: &GvarTable,
        glyph_id: u16,
        coords: &NormalizedCoords,
        stack: &mut Vec<u16>,
    ) -> Result<Outline> {
        if stack.contains(&glyph_id) {
            return Err(FontError::corrupt("glyf", "composite cycle"));
        }
        if stack.len() >= MAX_COMPONENT_DEPTH {
            return Err(FontError::corrupt("glyf", "composite nesting too deep"));
        }

        let glyph = glyf.glyph(glyph_id).ok_or_else(|| {
            FontError::corrupt("glyf", format!("glyph index {glyph_id} out of range"))
        })?;

        match &glyph.data {
            GlyphData::Empty => Ok(Outline::default()),
            GlyphData::Simple(simple) => {
                let num_points = simple.num_points();
                let mut point_coords: Vec<(f32, f32)> = (0..num_points)
                    .map(|i| {
                        (
                            simple.x_coordinates[i] as f32,
                            simple.y_coordinates[i] as f32,
                        )
                    })
                    .collect();
                // Four phantom points trail the real ones
                point_coords.extend([(0.0, 0.0); 4]);

                let deltas = gvar.glyph_deltas(
                    glyph_id,
                    coords,
                    num_points + 4,
                    &simple.end_pts_of_contours,
                    &point_coords,
                )?;

                let mut xs: Vec<f32> = point_coords[..num_points].iter().map(|p| p.0).collect();
                let mut ys: Vec<f32> = point_coords[..num_points].iter().map(|p| p.1).collect();
                if let Some(deltas) = deltas {
                    for i in 0..num_points {
                        xs[i] += deltas[i].0;
                        ys[i] += deltas[i].1;
                    }
                }
                Ok(simple.outline_with_coordinates(&xs, &ys))
            }
            GlyphData::Composite(composite) => {
                stack.push(glyph_id);

                // For composites, gvar point n is component n's offset
                let num_components = composite.components.len();
                let deltas = gvar.glyph_deltas(
                    glyph_id,
                    coords,
                    num_components + 4,
                    &[],
                    &vec![(0.0, 0.0); num_components + 4],
                )?;

                let mut outline = Outline::default();
                for (i, component) in composite.components.iter().enumerate() {
                    let mut child = self.glyf_outline_varied(
                        glyf,
                        gvar,
                        component.glyph_index,
                        coords,
                        stack,
                    )?;

                    if component.args_are_xy_values() {
                        let mut transform = component.transform;
                        if let Some(deltas) = &deltas {
                            transform.dx += deltas[i].0;
                            transform.dy += deltas[i].1;
                        }
                        child.transform(&transform);
                        outline.contours.append(&mut child.contours);
                    } else {
                        // Anchor matching is unaffected by deltas; reuse
                        // the static resolution for this component
                        let mut positioned = component.transform;
                        positioned.dx = 0.0;
                        positioned.dy = 0.0;
                        child.transform(&positioned);

                        let parent_point = outline
                            .contours
                            .iter()
                            .flat_map(|c| c.points.iter())
                            .nth(component.arg1 as u16 as usize)
                            .copied()
                            .ok_or_else(|| {
                                FontError::corrupt("glyf", "anchor point out of range")
                            })?;
                        let child_point = child
                            .contours
                            .iter()
                            .flat_map(|c| c.points.iter())
                            .nth(component.arg2 as u16 as usize)
                            .copied()
                            .ok_or_else(|| {
                                FontError::corrupt("glyf", "anchor point out of range")
                            })?;
                        let shift = Transform::translation(
                            parent_point.x - child_point.x,
                            parent_point.y - child_point.y,
                        );
                        child.transform(&shift);
                        outline.contours.append(&mut child.contours);
                    }
                }

                stack.pop();
                Ok(outline)
            }
        }
    }

    /// Advance width in font units, optionally at a variation coordinate.
    /// `HVAR` deltas win; without `HVAR`, gvar phantom-point deltas apply.
    pub fn advance_width(&self, glyph_id: u16, coords: Option<&NormalizedCoords>) -> Result<u16> {
        let base = self.hmtx()?.get_advance_width(glyph_id);

        let coords = match coords {
            Some(coords) if !coords.is_empty() && !coords.is_default() => coords,
            _ => return Ok(base),
        };

        if let Some(hvar) = Self::optional(self.hvar())? {
            let delta = hvar.advance_delta(glyph_id, coords)?;
            return Ok(apply_metric_delta(base, delta));
        }

        // Fall back to gvar phantom points for TrueType outlines
        if let (Some(gvar), Some(glyf)) =
            (Self::optional(self.gvar())?, Self::optional(self.glyf())?)
        {
            if let Some(delta) = phantom_advance_delta(&glyf, &gvar, glyph_id, coords)? {
                return Ok(apply_metric_delta(base, delta));
            }
        }

        Ok(base)
    }

    /// Vertical advance, mirroring `advance_width` with `vmtx`/`VVAR`.
    pub fn advance_height(&self, glyph_id: u16, coords: Option<&NormalizedCoords>) -> Result<u16> {
        let base = self.vmtx()?.get_advance_height(glyph_id);

        let coords = match coords {
            Some(coords) if !coords.is_empty() && !coords.is_default() => coords,
            _ => return Ok(base),
        };

        if let Some(vvar) = Self::optional(self.vvar())? {
            let delta = vvar.advance_delta(glyph_id, coords)?;
            return Ok(apply_metric_delta(base, delta));
        }
        Ok(base)
    }

    /// Delta for a global metric selector (`MVAR`); zero when absent.
    pub fn metric_delta(&self, value_tag: &[u8; 4], coords: &NormalizedCoords) -> Result<f64> {
        match Self::optional(self.mvar())? {
            Some(mvar) => mvar.metric_delta(value_tag, coords),
            None => Ok(0.0),
        }
    }

    /// Left side bearing, optionally variation-adjusted through `HVAR`.
    pub fn left_side_bearing(
        &self,
        glyph_id: u16,
        coords: Option<&NormalizedCoords>,
    ) -> Result<i16> {
        let base = self.hmtx()?.get_lsb(glyph_id);

        if let Some(coords) = coords {
            if !coords.is_empty() && !coords.is_default() {
                if let Some(hvar) = Self::optional(self.hvar())? {
                    if let Some(delta) = hvar.lsb_delta(glyph_id, coords)? {
                        return Ok((base as f64 + delta).round() as i16);
                    }
                }
            }
        }
        Ok(base)
    }
}

fn downcast<T: Send + Sync + 'static>(entry: CachedTable) -> Result<Arc<T>> {
    entry
        .downcast::<T>()
        .map_err(|_| FontError::corrupt("sfnt", "cached table has unexpected type"))
}

fn apply_metric_delta(base: u16, delta: f64) -> u16 {
    (base as f64 + delta).round().clamp(0.0, u16::MAX as f64) as u16
}

/// Advance delta from the second phantom point (the advance-width point)
/// relative to the first (the origin point).
fn phantom_advance_delta(
    glyf: &GlyfTable,
    gvar: &GvarTable,
    glyph_id: u16,
    coords: &NormalizedCoords,
) -> Result<Option<f64>> {
    let glyph = match glyf.glyph(glyph_id) {
        Some(glyph) => glyph,
        None => return Ok(None),
    };

    let (num_points, end_pts, point_coords) = match &glyph.data {
        GlyphData::Simple(simple) => {
            let n = simple.num_points();
            let mut point_coords: Vec<(f32, f32)> = (0..n)
                .map(|i| {
                    (
                        simple.x_coordinates[i] as f32,
                        simple.y_coordinates[i] as f32,
                    )
                })
                .collect();
            point_coords.extend([(0.0, 0.0); 4]);
            (n, simple.end_pts_of_contours.clone(), point_coords)
        }
        GlyphData::Composite(composite) => {
            let n = composite.components.len();
            (n, Vec::new(), vec![(0.0, 0.0); n + 4])
        }
        GlyphData::Empty => (0, Vec::new(), vec![(0.0, 0.0); 4]),
    };

    let deltas = gvar.glyph_deltas(glyph_id, coords, num_points + 4, &end_pts, &point_coords)?;
    Ok(deltas.map(|deltas| {
        let origin = deltas[num_points];
        let advance = deltas[num_points + 1];
        (advance.0 - origin.0) as f64
    }))
}
