use crate::error::{FontError, Result};
use crate::outline::{Contour, Outline, OutlinePoint};
use crate::variation::{ItemVariationStore, NormalizedCoords};

use super::cff::Index;

const MAX_SUBR_DEPTH: usize = 10;
const CFF_STACK_LIMIT: usize = 48;
const CFF2_STACK_LIMIT: usize = 513;
const TRANSIENT_ARRAY_SIZE: usize = 32;

// One-byte operators
const OP_HSTEM: u8 = 1;
const OP_VSTEM: u8 = 3;
const OP_VMOVETO: u8 = 4;
const OP_RLINETO: u8 = 5;
const OP_HLINETO: u8 = 6;
const OP_VLINETO: u8 = 7;
const OP_RRCURVETO: u8 = 8;
const OP_CALLSUBR: u8 = 10;
const OP_RETURN: u8 = 11;
const OP_ESCAPE: u8 = 12;
const OP_ENDCHAR: u8 = 14;
const OP_VSINDEX: u8 = 15;
const OP_BLEND: u8 = 16;
const OP_HSTEMHM: u8 = 18;
const OP_HINTMASK: u8 = 19;
const OP_CNTRMASK: u8 = 20;
const OP_RMOVETO: u8 = 21;
const OP_HMOVETO: u8 = 22;
const OP_VSTEMHM: u8 = 23;
const OP_RCURVELINE: u8 = 24;
const OP_RLINECURVE: u8 = 25;
const OP_VVCURVETO: u8 = 26;
const OP_HHCURVETO: u8 = 27;
const OP_SHORTINT: u8 = 28;
const OP_CALLGSUBR: u8 = 29;
const OP_VHCURVETO: u8 = 30;
const OP_HVCURVETO: u8 = 31;

// Two-byte (escaped) operators
const OP2_AND: u8 = 3;
const OP2_OR: u8 = 4;
const OP2_NOT: u8 = 5;
const OP2_ABS: u8 = 9;
const OP2_ADD: u8 = 10;
const OP2_SUB: u8 = 11;
const OP2_DIV: u8 = 12;
const OP2_NEG: u8 = 14;
const OP2_EQ: u8 = 15;
const OP2_DROP: u8 = 18;
const OP2_PUT: u8 = 20;
const OP2_GET: u8 = 21;
const OP2_IFELSE: u8 = 22;
const OP2_RANDOM: u8 = 23;
const OP2_MUL: u8 = 24;
const OP2_SQRT: u8 = 26;
const OP2_DUP: u8 = 27;
const OP2_EXCH: u8 = 28;
const OP2_INDEX: u8 = 29;
const OP2_ROLL: u8 = 30;
const OP2_HFLEX: u8 = 34;
const OP2_FLEX: u8 = 35;
const OP2_HFLEX1: u8 = 36;
const OP2_FLEX1: u8 = 37;

/// Variation state for CFF2 `blend`: the store, the query coordinates, and
/// the scalars for the currently selected ItemVariationData.
pub struct BlendState<'a> {
    store: &'a ItemVariationStore,
    coords: &'a NormalizedCoords,
    scalars: Vec<f32>,
}

impl<'a> BlendState<'a> {
    /// `default_vsindex` comes from the subfont's Private DICT and is
    /// re-selected for every glyph.
    pub fn new(
        store: &'a ItemVariationStore,
        coords: &'a NormalizedCoords,
        default_vsindex: u16,
    ) -> Result<Self> {
        let scalars = store.blend_scalars(default_vsindex, coords)?;
        Ok(BlendState {
            store,
            coords,
            scalars,
        })
    }

    fn select(&mut self, vsindex: u16) -> Result<()> {
        self.scalars = self.store.blend_scalars(vsindex, self.coords)?;
        Ok(())
    }

    fn region_count(&self) -> usize {
        self.scalars.len()
    }
}

/// Type 2 charstring interpreter.
///
/// Produces the shared contour abstraction; CFF2 differences (no width, no
/// endchar, `vsindex`/`blend`) are switched by `is_cff2`.
pub struct CharstringInterpreter<'a> {
    global_subrs: &'a Index,
    local_subrs: &'a Index,
    is_cff2: bool,
    blend: Option<BlendState<'a>>,

    stack: Vec<f64>,
    transient: [f64; TRANSIENT_ARRAY_SIZE],
    num_stems: usize,
    width: Option<f64>,
    have_width: bool,

    x: f64,
    y: f64,
    contours: Vec<Contour>,
    open_contour: Option<Contour>,
}

impl<'a> CharstringInterpreter<'a> {
    pub fn new(
        global_subrs: &'a Index,
        local_subrs: &'a Index,
        is_cff2: bool,
        blend: Option<BlendState<'a>>,
    ) -> Self {
        CharstringInterpreter {
            global_subrs,
            local_subrs,
            is_cff2,
            blend,
            stack: Vec::new(),
            transient: [0.0; TRANSIENT_ARRAY_SIZE],
            num_stems: 0,
            width: None,
            have_width: false,
            x: 0.0,
            y: 0.0,
            contours: Vec::new(),
            open_contour: None,
        }
    }

    /// Execute a charstring and return the outline. The interpreter
    /// terminates on `endchar` (CFF1) or at the end of the byte string
    /// (CFF2) with an empty stack.
    pub fn run(self, charstring: &[u8]) -> Result<Outline> {
        Ok(self.run_with_width(charstring)?.0)
    }

    /// Like `run`, also yielding the optional width operand (CFF1).
    pub fn run_with_width(mut self, charstring: &[u8]) -> Result<(Outline, Option<f64>)> {
        let ended = self.execute(charstring, 0)?;
        if !self.is_cff2 && !ended {
            return Err(FontError::corrupt("CFF ", "charstring missing endchar"));
        }
        self.close_contour();
        let width = self.width;
        Ok((
            Outline {
                contours: self.contours,
            },
            width,
        ))
    }

    fn stack_limit(&self) -> usize {
        if self.is_cff2 {
            CFF2_STACK_LIMIT
        } else {
            CFF_STACK_LIMIT
        }
    }

    fn push(&mut self, value: f64) -> Result<()> {
        if self.stack.len() >= self.stack_limit() {
            return Err(FontError::corrupt("CFF ", "operand stack overflow"));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<f64> {
        self.stack
            .pop()
            .ok_or_else(|| FontError::corrupt("CFF ", "operand stack underflow"))
    }

    fn close_contour(&mut self) {
        if let Some(contour) = self.open_contour.take() {
            if !contour.points.is_empty() {
                self.contours.push(contour);
            }
        }
    }

    fn move_to(&mut self, dx: f64, dy: f64) {
        self.close_contour();
        self.x += dx;
        self.y += dy;
        self.open_contour = Some(Contour {
            points: vec![OutlinePoint::new(self.x as f32, self.y as f32, true)],
        });
    }

    fn line_to(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        let (x, y) = (self.x as f32, self.y as f32);
        self.point(x, y, true);
    }

    #[allow(clippy::too_many_arguments)]
    fn curve_to(&mut self, dx1: f64, dy1: f64, dx2: f64, dy2: f64, dx3: f64, dy3: f64) {
        let c1x = self.x + dx1;
        let c1y = self.y + dy1;
        let c2x = c1x + dx2;
        let c2y = c1y + dy2;
        self.x = c2x + dx3;
        self.y = c2y + dy3;
        let (x, y) = (self.x as f32, self.y as f32);
        self.point(c1x as f32, c1y as f32, false);
        self.point(c2x as f32, c2y as f32, false);
        self.point(x, y, true);
    }

    fn point(&mut self, x: f32, y: f32, on_curve: bool) {
        // A stray drawing operator before any moveto opens a contour at
        // the origin
        let contour = self.open_contour.get_or_insert_with(Contour::default);
        contour.points.push(OutlinePoint::new(x, y, on_curve));
    }

    fn count_stems(&mut self) -> Result<()> {
        // Stems come in pairs; an odd leading operand is the width
        if !self.is_cff2 && !self.have_width && self.stack.len() % 2 == 1 {
            self.width = Some(self.stack.remove(0));
        }
        self.have_width = true;
        self.num_stems += self.stack.len() / 2;
        self.stack.clear();
        Ok(())
    }

    fn execute(&mut self, code: &[u8], depth: usize) -> Result<bool> {
        if depth > MAX_SUBR_DEPTH {
            return Err(FontError::corrupt("CFF ", "subroutine recursion too deep"));
        }

        let mut i = 0usize;
        while i < code.len() {
            let b0 = code[i];
            i += 1;

            match b0 {
                // Operand encodings
                32..=246 => self.push(b0 as f64 - 139.0)?,
                247..=250 => {
                    let b1 = *code.get(i).ok_or_else(truncated)? as f64;
                    i += 1;
                    self.push((b0 as f64 - 247.0) * 256.0 + b1 + 108.0)?;
                }
                251..=254 => {
                    let b1 = *code.get(i).ok_or_else(truncated)? as f64;
                    i += 1;
                    self.push(-(b0 as f64 - 251.0) * 256.0 - b1 - 108.0)?;
                }
                OP_SHORTINT => {
                    if i + 2 > code.len() {
                        return Err(truncated());
                    }
                    let value = i16::from_be_bytes([code[i], code[i + 1]]);
                    i += 2;
                    self.push(value as f64)?;
                }
                255 => {
                    if i + 4 > code.len() {
                        return Err(truncated());
                    }
                    let value =
                        i32::from_be_bytes([code[i], code[i + 1], code[i + 2], code[i + 3]]);
                    i += 4;
                    self.push(value as f64 / 65536.0)?;
                }

                OP_HSTEM | OP_VSTEM | OP_HSTEMHM | OP_VSTEMHM => self.count_stems()?,

                OP_HINTMASK | OP_CNTRMASK => {
                    // Implicit vstem operands may precede the first mask
                    self.count_stems()?;
                    let mask_bytes = self.num_stems.div_ceil(8);
                    if i + mask_bytes > code.len() {
                        return Err(truncated());
                    }
                    i += mask_bytes;
                }

                OP_RMOVETO => {
                    if !self.is_cff2 && !self.have_width && self.stack.len() > 2 {
                        self.width = Some(self.stack.remove(0));
                    }
                    self.have_width = true;
                    let dy = self.pop()?;
                    let dx = self.pop()?;
                    self.stack.clear();
                    self.move_to(dx, dy);
                }
                OP_HMOVETO => {
                    if !self.is_cff2 && !self.have_width && self.stack.len() > 1 {
                        self.width = Some(self.stack.remove(0));
                    }
                    self.have_width = true;
                    let dx = self.pop()?;
                    self.stack.clear();
                    self.move_to(dx, 0.0);
                }
                OP_VMOVETO => {
                    if !self.is_cff2 && !self.have_width && self.stack.len() > 1 {
                        self.width = Some(self.stack.remove(0));
                    }
                    self.have_width = true;
                    let dy = self.pop()?;
                    self.stack.clear();
                    self.move_to(0.0, dy);
                }

                OP_RLINETO => {
                    let args = std::mem::take(&mut self.stack);
                    for pair in args.chunks_exact(2) {
                        self.line_to(pair[0], pair[1]);
                    }
                }
                OP_HLINETO => {
                    let args = std::mem::take(&mut self.stack);
                    for (j, &arg) in args.iter().enumerate() {
                        if j % 2 == 0 {
                            self.line_to(arg, 0.0);
                        } else {
                            self.line_to(0.0, arg);
                        }
                    }
                }
                OP_VLINETO => {
                    let args = std::mem::take(&mut self.stack);
                    for (j, &arg) in args.iter().enumerate() {
                        if j % 2 == 0 {
                            self.line_to(0.0, arg);
                        } else {
                            self.line_to(arg, 0.0);
                        }
                    }
                }

                OP_RRCURVETO => {
                    let args = std::mem::take(&mut self.stack);
                    for c in args.chunks_exact(6) {
                        self.curve_to(c[0], c[1], c[2], c[3], c[4], c[5]);
                    }
                }
                OP_RCURVELINE => {
                    let args = std::mem::take(&mut self.stack);
                    if args.len() < 8 {
                        return Err(FontError::corrupt("CFF ", "rcurveline needs a curve"));
                    }
                    let curve_args = (args.len() - 2) / 6 * 6;
                    for c in args[..curve_args].chunks_exact(6) {
                        self.curve_to(c[0], c[1], c[2], c[3], c[4], c[5]);
                    }
                    if args.len() >= curve_args + 2 {
                        self.line_to(args[curve_args], args[curve_args + 1]);
                    }
                }
                OP_RLINECURVE => {
                    let args = std::mem::take(&mut self.stack);
                    if args.len() < 6 {
                        return Err(FontError::corrupt("CFF ", "rlinecurve needs a curve"));
                    }
                    let line_args = args.len() - 6;
                    for pair in args[..line_args].chunks_exact(2) {
                        self.line_to(pair[0], pair[1]);
                    }
                    let c = &args[line_args..];
                    self.curve_to(c[0], c[1], c[2], c[3], c[4], c[5]);
                }
                OP_VVCURVETO => {
                    let mut args = std::mem::take(&mut self.stack);
                    let mut dx1 = 0.0;
                    if args.len() % 4 == 1 {
                        dx1 = args.remove(0);
                    }
                    for c in args.chunks_exact(4) {
                        self.curve_to(dx1, c[0], c[1], c[2], 0.0, c[3]);
                        dx1 = 0.0;
                    }
                }
                OP_HHCURVETO => {
                    let mut args = std::mem::take(&mut self.stack);
                    let mut dy1 = 0.0;
                    if args.len() % 4 == 1 {
                        dy1 = args.remove(0);
                    }
                    for c in args.chunks_exact(4) {
                        self.curve_to(c[0], dy1, c[1], c[2], c[3], 0.0);
                        dy1 = 0.0;
                    }
                }
                OP_VHCURVETO | OP_HVCURVETO => {
                    let args = std::mem::take(&mut self.stack);
                    self.alternating_curves(&args, b0 == OP_HVCURVETO)?;
                }

                OP_CALLSUBR => {
                    let index = self.pop()?;
                    let subr = resolve_subr(self.local_subrs, index)?;
                    if self.execute(&subr, depth + 1)? {
                        return Ok(true);
                    }
                }
                OP_CALLGSUBR => {
                    let index = self.pop()?;
                    let subr = resolve_subr(self.global_subrs, index)?;
                    if self.execute(&subr, depth + 1)? {
                        return Ok(true);
                    }
                }
                OP_RETURN => return Ok(false),

                OP_ENDCHAR => {
                    if self.is_cff2 {
                        return Err(FontError::corrupt("CFF2", "endchar in CFF2 charstring"));
                    }
                    if !self.have_width && (self.stack.len() == 1 || self.stack.len() == 5) {
                        self.width = Some(self.stack.remove(0));
                    }
                    self.have_width = true;
                    self.stack.clear();
                    return Ok(true);
                }

                OP_VSINDEX => {
                    if !self.is_cff2 {
                        return Err(FontError::corrupt("CFF ", "vsindex outside CFF2"));
                    }
                    let index = self.pop()? as u16;
                    self.stack.clear();
                    if let Some(blend) = self.blend.as_mut() {
                        blend.select(index)?;
                    }
                }
                OP_BLEND => {
                    if !self.is_cff2 {
                        return Err(FontError::corrupt("CFF ", "blend outside CFF2"));
                    }
                    self.apply_blend()?;
                }

                OP_ESCAPE => {
                    let b1 = *code.get(i).ok_or_else(truncated)?;
                    i += 1;
                    self.escaped_op(b1)?;
                }

                0 | 2 | 9 | 13 | 17 => {
                    return Err(FontError::corrupt(
                        "CFF ",
                        format!("reserved charstring operator {b0}"),
                    ));
                }
            }
        }

        Ok(false)
    }

    /// vhcurveto / hvcurveto: curves alternate between starting horizontal
    /// and vertical; a trailing odd argument bends the last tangent.
    fn alternating_curves(&mut self, args: &[f64], mut horizontal: bool) -> Result<()> {
        let mut rest = args;
        while rest.len() >= 4 {
            let last = rest.len() == 5;
            let c = &rest[..4];
            let d_last = if last { rest[4] } else { 0.0 };
            if horizontal {
                self.curve_to(c[0], 0.0, c[1], c[2], d_last, c[3]);
            } else {
                self.curve_to(0.0, c[0], c[1], c[2], c[3], d_last);
            }
            horizontal = !horizontal;
            rest = &rest[if last { 5 } else { 4 }..];
        }
        if !rest.is_empty() {
            return Err(FontError::corrupt("CFF ", "unbalanced curve operands"));
        }
        Ok(())
    }

    /// CFF2 blend: k base values, k * n deltas, and the count k on the
    /// stack; leaves the k blended values.
    fn apply_blend(&mut self) -> Result<()> {
        let n = {
            let blend = self
                .blend
                .as_ref()
                .ok_or_else(|| FontError::corrupt("CFF2", "blend without a variation store"))?;
            blend.region_count()
        };

        let k = self.pop()? as usize;
        let needed = k + k * n;
        if self.stack.len() < needed {
            return Err(FontError::corrupt("CFF2", "blend operand underflow"));
        }

        let scalars = self.blend.as_ref().unwrap().scalars.clone();
        let delta_start = self.stack.len() - k * n;
        let base_start = delta_start - k;
        for item in 0..k {
            let mut value = self.stack[base_start + item];
            for region in 0..n {
                let delta = self.stack[delta_start + item * n + region];
                value += delta * scalars[region] as f64;
            }
            self.stack[base_start + item] = value;
        }
        self.stack.truncate(base_start + k);
        Ok(())
    }

    fn escaped_op(&mut self, op: u8) -> Result<()> {
        match op {
            OP2_AND => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(if a != 0.0 && b != 0.0 { 1.0 } else { 0.0 })?;
            }
            OP2_OR => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(if a != 0.0 || b != 0.0 { 1.0 } else { 0.0 })?;
            }
            OP2_NOT => {
                let a = self.pop()?;
                self.push(if a == 0.0 { 1.0 } else { 0.0 })?;
            }
            OP2_ABS => {
                let a = self.pop()?;
                self.push(a.abs())?;
            }
            OP2_ADD => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(a + b)?;
            }
            OP2_SUB => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(a - b)?;
            }
            OP2_DIV => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(a / b)?;
            }
            OP2_NEG => {
                let a = self.pop()?;
                self.push(-a)?;
            }
            OP2_EQ => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(if a == b { 1.0 } else { 0.0 })?;
            }
            OP2_DROP => {
                self.pop()?;
            }
            OP2_PUT => {
                let index = self.pop()? as usize;
                let value = self.pop()?;
                if index >= TRANSIENT_ARRAY_SIZE {
                    return Err(FontError::corrupt("CFF ", "put index out of range"));
                }
                self.transient[index] = value;
            }
            OP2_GET => {
                let index = self.pop()? as usize;
                if index >= TRANSIENT_ARRAY_SIZE {
                    return Err(FontError::corrupt("CFF ", "get index out of range"));
                }
                self.push(self.transient[index])?;
            }
            OP2_IFELSE => {
                let v2 = self.pop()?;
                let v1 = self.pop()?;
                let s2 = self.pop()?;
                let s1 = self.pop()?;
                self.push(if v1 <= v2 { s1 } else { s2 })?;
            }
            OP2_RANDOM => {
                // Deterministic stand-in; any value in (0, 1] is permitted
                self.push(0.5)?;
            }
            OP2_MUL => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(a * b)?;
            }
            OP2_SQRT => {
                let a = self.pop()?;
                self.push(a.abs().sqrt())?;
            }
            OP2_DUP => {
                let a = self.pop()?;
                self.push(a)?;
                self.push(a)?;
            }
            OP2_EXCH => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(b)?;
                self.push(a)?;
            }
            OP2_INDEX => {
                let n = self.pop()?;
                let n = if n < 0.0 { 0 } else { n as usize };
                if n >= self.stack.len() {
                    return Err(FontError::corrupt("CFF ", "index out of range"));
                }
                let value = self.stack[self.stack.len() - 1 - n];
                self.push(value)?;
            }
            OP2_ROLL => {
                let j = self.pop()? as i64;
                let n = self.pop()? as usize;
                if n > self.stack.len() {
                    return Err(FontError::corrupt("CFF ", "roll count out of range"));
                }
                let start = self.stack.len() - n;
                let slice = &mut self.stack[start..];
                if n > 0 {
                    let j = j.rem_euclid(n as i64) as usize;
                    slice.rotate_right(j);
                }
            }
            OP2_HFLEX => {
                let args: Vec<f64> = self.stack.drain(..).collect();
                if args.len() != 7 {
                    return Err(FontError::corrupt("CFF ", "hflex needs 7 operands"));
                }
                self.curve_to(args[0], 0.0, args[1], args[2], args[3], 0.0);
                self.curve_to(args[4], 0.0, args[5], -args[2], args[6], 0.0);
            }
            OP2_FLEX => {
                let args: Vec<f64> = self.stack.drain(..).collect();
                if args.len() != 13 {
                    return Err(FontError::corrupt("CFF ", "flex needs 13 operands"));
                }
                self.curve_to(args[0], args[1], args[2], args[3], args[4], args[5]);
                self.curve_to(args[6], args[7], args[8], args[9], args[10], args[11]);
                // args[12] is the flex depth; outline decoding ignores it
            }
            OP2_HFLEX1 => {
                let args: Vec<f64> = self.stack.drain(..).collect();
                if args.len() != 9 {
                    return Err(FontError::corrupt("CFF ", "hflex1 needs 9 operands"));
                }
                let dy_total = args[1] + args[3] + args[7];
                self.curve_to(args[0], args[1], args[2], args[3], args[4], 0.0);
                self.curve_to(args[5], 0.0, args[6], args[7], args[8], -dy_total);
            }
            OP2_FLEX1 => {
                let args: Vec<f64> = self.stack.drain(..).collect();
                if args.len() != 11 {
                    return Err(FontError::corrupt("CFF ", "flex1 needs 11 operands"));
                }
                let dx = args[0] + args[2] + args[4] + args[6] + args[8];
                let dy = args[1] + args[3] + args[5] + args[7] + args[9];
                let start_x = self.x;
                let start_y = self.y;
                self.curve_to(args[0], args[1], args[2], args[3], args[4], args[5]);
                // d6 lands on the axis with the larger total movement; the
                // other axis returns to its pre-flex value
                let c1x = self.x + args[6];
                let c1y = self.y + args[7];
                let c2x = c1x + args[8];
                let c2y = c1y + args[9];
                let (end_x, end_y) = if dx.abs() > dy.abs() {
                    (c2x + args[10], start_y)
                } else {
                    (start_x, c2y + args[10])
                };
                self.x = end_x;
                self.y = end_y;
                self.point(c1x as f32, c1y as f32, false);
                self.point(c2x as f32, c2y as f32, false);
                self.point(end_x as f32, end_y as f32, true);
            }
            other => {
                return Err(FontError::corrupt(
                    "CFF ",
                    format!("reserved escaped operator {other}"),
                ));
            }
        }
        Ok(())
    }
}

fn truncated() -> FontError {
    FontError::corrupt("CFF ", "truncated charstring")
}

fn resolve_subr(subrs: &Index, biased_index: f64) -> Result<Vec<u8>> {
    let index = biased_index as i64 + subrs.bias() as i64;
    if index < 0 || index as usize >= subrs.len() {
        return Err(FontError::corrupt("CFF ", "subroutine index out of range"));
    }
    subrs
        .get(index as usize)
        .map(|item| item.to_vec())
        .ok_or_else(|| FontError::corrupt("CFF ", "subroutine index out of range"))
}
