use crate::error::{FontError, Result};
use crate::stream::FontReader;

/// vmtx table - Vertical metrics
#[derive(Debug, Clone)]
pub struct VmtxTable {
    pub v_metrics: Vec<LongVerMetric>,
    pub top_side_bearings: Vec<i16>,
}

#[derive(Debug, Clone)]
pub struct LongVerMetric {
    pub advance_height: u16,
    pub tsb: i16,
}

impl VmtxTable {
    pub fn from_reader(
        reader: &mut FontReader,
        _length: u32,
        num_glyphs: u16,
        num_v_metrics: u16,
    ) -> Result<Self> {
        if num_v_metrics > num_glyphs {
            return Err(FontError::InvariantViolation(format!(
                "vhea.numOfLongVerMetrics ({num_v_metrics}) exceeds maxp.numGlyphs ({num_glyphs})"
            )));
        }

        let mut v_metrics = Vec::with_capacity(num_v_metrics as usize);
        for _ in 0..num_v_metrics {
            v_metrics.push(LongVerMetric {
                advance_height: reader.read_u16()?,
                tsb: reader.read_i16()?,
            });
        }

        let num_tsb = (num_glyphs - num_v_metrics) as usize;
        let mut top_side_bearings = Vec::with_capacity(num_tsb);
        for _ in 0..num_tsb {
            top_side_bearings.push(reader.read_i16()?);
        }

        Ok(VmtxTable {
            v_metrics,
            top_side_bearings,
        })
    }

    pub fn get_advance_height(&self, glyph_index: u16) -> u16 {
        if (glyph_index as usize) < self.v_metrics.len() {
            self.v_metrics[glyph_index as usize].advance_height
        } else if let Some(last) = self.v_metrics.last() {
            last.advance_height
        } else {
            0
        }
    }

    pub fn get_tsb(&self, glyph_index: u16) -> i16 {
        if (glyph_index as usize) < self.v_metrics.len() {
            self.v_metrics[glyph_index as usize].tsb
        } else {
            let idx = glyph_index as usize - self.v_metrics.len();
            self.top_side_bearings.get(idx).copied().unwrap_or(0)
        }
    }
}
