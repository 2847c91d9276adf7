/// A single point on a glyph contour.
///
/// Off-curve points are quadratic controls for TrueType outlines and cubic
/// controls for CFF outlines; consumers stay source-agnostic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlinePoint {
    pub x: f32,
    pub y: f32,
    pub on_curve: bool,
}

impl OutlinePoint {
    pub fn new(x: f32, y: f32, on_curve: bool) -> Self {
        Self { x, y, on_curve }
    }
}

/// A closed loop of points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    pub points: Vec<OutlinePoint>,
}

/// A glyph outline as a list of closed contours.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    pub contours: Vec<Contour>,
}

impl Outline {
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn num_points(&self) -> usize {
        self.contours.iter().map(|c| c.points.len()).sum()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut points = self.contours.iter().flat_map(|c| c.points.iter());
        let first = points.next()?;
        let mut bbox = BoundingBox::new(first.x, first.y, first.x, first.y);
        for p in points {
            bbox.x_min = bbox.x_min.min(p.x);
            bbox.y_min = bbox.y_min.min(p.y);
            bbox.x_max = bbox.x_max.max(p.x);
            bbox.y_max = bbox.y_max.max(p.y);
        }
        Some(bbox)
    }

    pub fn transform(&mut self, transform: &Transform) {
        for contour in &mut self.contours {
            for point in &mut contour.points {
                let (x, y) = transform.apply(point.x, point.y);
                point.x = x;
                point.y = y;
            }
        }
    }
}

/// Bounding box for glyphs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn from_glyph(x_min: i16, y_min: i16, x_max: i16, y_max: i16) -> Self {
        Self {
            x_min: x_min as f32,
            y_min: y_min as f32,
            x_max: x_max as f32,
            y_max: y_max as f32,
        }
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }
}

/// 2x2 affine transform plus translation, as used by composite glyphs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub xx: f32,
    pub xy: f32,
    pub yx: f32,
    pub yy: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Transform {
    pub fn translation(dx: f32, dy: f32) -> Self {
        Self {
            dx,
            dy,
            ..Self::default()
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.xx * x + self.xy * y + self.dx,
            self.yx * x + self.yy * y + self.dy,
        )
    }

    /// Combine two transforms, `self` applied after `inner`.
    pub fn combine(&self, inner: &Transform) -> Transform {
        Transform {
            xx: self.xx * inner.xx + self.xy * inner.yx,
            xy: self.xx * inner.xy + self.xy * inner.yy,
            yx: self.yx * inner.xx + self.yy * inner.yx,
            yy: self.yx * inner.xy + self.yy * inner.yy,
            dx: self.xx * inner.dx + self.xy * inner.dy + self.dx,
            dy: self.yx * inner.dx + self.yy * inner.dy + self.dy,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            xx: 1.0,
            xy: 0.0,
            yx: 0.0,
            yy: 1.0,
            dx: 0.0,
            dy: 0.0,
        }
    }
}
