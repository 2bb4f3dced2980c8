//! Content stream text interpreter.
//!
//! Walks the operators of one page and emits a positioned `text-run` item
//! per text-showing operator. Positions follow the PDF text model:
//! `Trm = Tsm × Tm × CTM`, with the text matrix advanced by glyph widths
//! after every string.

use std::collections::HashMap;

use crate::model::RawItem;
use crate::text::is_spaceless_script_char;

use super::backend::{ContentOp, FontInfo, PdfValue, DEFAULT_GLYPH_WIDTH};

/// TJ adjustment (in 1/1000 text space units) treated as a word space.
const TJ_SPACE_THRESHOLD: f64 = 200.0;

/// Affine transform `[a b 0; c d 0; e f 1]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn multiply(&self, o: &Matrix) -> Matrix {
        Matrix {
            a: self.a * o.a + self.b * o.c,
            b: self.a * o.b + self.b * o.d,
            c: self.c * o.a + self.d * o.c,
            d: self.c * o.b + self.d * o.d,
            e: self.e * o.a + self.f * o.c + o.e,
            f: self.e * o.b + self.f * o.d + o.f,
        }
    }

    /// Length of the transformed x unit vector.
    fn horizontal_scale(&self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    /// Length of the transformed y unit vector.
    fn vertical_scale(&self) -> f64 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    fn from_operands(op: &ContentOp) -> Option<Matrix> {
        Some(Matrix::new(
            op.number(0)?,
            op.number(1)?,
            op.number(2)?,
            op.number(3)?,
            op.number(4)?,
            op.number(5)?,
        ))
    }
}

/// Text state parameters (PDF 32000 §9.3).
#[derive(Debug, Clone)]
struct TextState {
    font: Option<Vec<u8>>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scaling: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

/// One piece of a text-showing operator.
enum Segment<'a> {
    Text(&'a [u8]),
    Adjust(f64),
}

/// Interprets the content stream of a single page.
pub(crate) struct TextInterpreter<'a> {
    page: usize,
    fonts: HashMap<&'a [u8], &'a FontInfo>,
    decode: &'a dyn Fn(&[u8], &[u8]) -> String,
    gs: GraphicsState,
    stack: Vec<GraphicsState>,
    tm: Matrix,
    tlm: Matrix,
    in_text: bool,
    items: Vec<RawItem>,
}

impl<'a> TextInterpreter<'a> {
    pub fn new(
        page: usize,
        fonts: &'a [FontInfo],
        decode: &'a dyn Fn(&[u8], &[u8]) -> String,
    ) -> Self {
        Self {
            page,
            fonts: fonts.iter().map(|f| (f.name.as_slice(), f)).collect(),
            decode,
            gs: GraphicsState {
                ctm: Matrix::IDENTITY,
                text: TextState::default(),
            },
            stack: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            in_text: false,
            items: Vec::new(),
        }
    }

    /// Run every operation and return the emitted items in stream order.
    pub fn run(mut self, ops: &[ContentOp]) -> Vec<RawItem> {
        for op in ops {
            self.step(op);
        }
        self.items
    }

    fn step(&mut self, op: &ContentOp) {
        match op.operator.as_str() {
            "q" => self.stack.push(self.gs.clone()),
            "Q" => {
                if let Some(gs) = self.stack.pop() {
                    self.gs = gs;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(op) {
                    self.gs.ctm = m.multiply(&self.gs.ctm);
                }
            }
            "BT" => {
                self.in_text = true;
                self.tm = Matrix::IDENTITY;
                self.tlm = Matrix::IDENTITY;
            }
            "ET" => self.in_text = false,
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    self.gs.text.font = Some(name.clone());
                }
                if let Some(size) = op.number(1) {
                    self.gs.text.font_size = size;
                }
            }
            "Tc" => self.gs.text.char_spacing = op.number(0).unwrap_or(0.0),
            "Tw" => self.gs.text.word_spacing = op.number(0).unwrap_or(0.0),
            "Tz" => self.gs.text.horizontal_scaling = op.number(0).unwrap_or(100.0) / 100.0,
            "TL" => self.gs.text.leading = op.number(0).unwrap_or(0.0),
            "Ts" => self.gs.text.rise = op.number(0).unwrap_or(0.0),
            "Td" | "TD" => {
                let tx = op.number(0).unwrap_or(0.0);
                let ty = op.number(1).unwrap_or(0.0);
                if op.operator == "TD" {
                    self.gs.text.leading = -ty;
                }
                self.move_line(tx, ty);
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(op) {
                    self.tlm = m;
                    self.tm = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show(&[Segment::Text(bytes.as_slice())]);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = op.operands.first() {
                    let segments: Vec<Segment> = arr
                        .iter()
                        .filter_map(|v| match v {
                            PdfValue::Str(bytes) => Some(Segment::Text(bytes.as_slice())),
                            other => other.as_number().map(Segment::Adjust),
                        })
                        .collect();
                    self.show(&segments);
                }
            }
            "'" => {
                self.next_line();
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show(&[Segment::Text(bytes.as_slice())]);
                }
            }
            "\"" => {
                self.gs.text.word_spacing = op.number(0).unwrap_or(0.0);
                self.gs.text.char_spacing = op.number(1).unwrap_or(0.0);
                self.next_line();
                if let Some(PdfValue::Str(bytes)) = op.operands.get(2) {
                    self.show(&[Segment::Text(bytes.as_slice())]);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.tlm = Matrix::translation(tx, ty).multiply(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self.gs.text.leading;
        self.move_line(0.0, -leading);
    }

    fn current_font(&self) -> Option<&'a FontInfo> {
        let name = self.gs.text.font.as_deref()?;
        self.fonts.get(name).copied()
    }

    /// Show a string (or a TJ array) as one text run.
    fn show(&mut self, segments: &[Segment]) {
        if !self.in_text {
            return;
        }

        let font = self.current_font();
        let ts = &self.gs.text;
        let font_key = ts.font.clone().unwrap_or_default();

        // Start position and scale, before advancing
        let scale_x = ts.font_size * ts.horizontal_scaling;
        let trm = Matrix::new(scale_x, 0.0, 0.0, ts.font_size, 0.0, ts.rise)
            .multiply(&self.tm)
            .multiply(&self.gs.ctm);
        let user = self.tm.multiply(&self.gs.ctm);
        let font_size = ts.font_size * user.vertical_scale();

        let mut text = String::new();
        let mut advance = 0.0;
        for segment in segments {
            match segment {
                Segment::Text(bytes) => {
                    text.push_str(&(self.decode)(&font_key, bytes));
                    advance += self.string_advance(font, bytes);
                }
                Segment::Adjust(n) => {
                    let ts = &self.gs.text;
                    advance -= n / 1000.0 * ts.font_size * ts.horizontal_scaling;
                    // Large negative adjustments are word spaces
                    if -n > TJ_SPACE_THRESHOLD
                        && text
                            .chars()
                            .last()
                            .map_or(false, |c| !c.is_whitespace() && !is_spaceless_script_char(c))
                    {
                        text.push(' ');
                    }
                }
            }
        }

        self.tm = Matrix::translation(advance, 0.0).multiply(&self.tm);

        if text.trim().is_empty() {
            return;
        }

        let font_name = font.map_or_else(
            || String::from_utf8_lossy(&font_key).to_string(),
            |f| f.base_font.clone(),
        );
        let width = advance * user.horizontal_scale();
        log::trace!(
            "page {}: run {:?} at ({:.1}, {:.1}) size {:.1}",
            self.page,
            text,
            trm.e,
            trm.f,
            font_size
        );
        self.items.push(RawItem::text_run(
            text,
            self.page,
            trm.e,
            trm.f,
            width.abs(),
            font_size,
            font_size,
            font_name,
        ));
    }

    /// Horizontal displacement of a string in unscaled text space.
    fn string_advance(&self, font: Option<&FontInfo>, bytes: &[u8]) -> f64 {
        let ts = &self.gs.text;
        let code_len = font.map_or(1, FontInfo::code_len);
        bytes
            .chunks(code_len)
            .map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
                let w0 = font
                    .and_then(|f| f.glyph_width(code))
                    .unwrap_or(DEFAULT_GLYPH_WIDTH)
                    / 1000.0;
                let mut spacing = ts.char_spacing;
                if code == 32 && chunk.len() == 1 {
                    spacing += ts.word_spacing;
                }
                (w0 * ts.font_size + spacing) * ts.horizontal_scaling
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::backend::decode_text_simple;
    use crate::model::{field, item_type};

    fn op(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp::new(operator, operands)
    }

    fn num(n: i64) -> PdfValue {
        PdfValue::Integer(n)
    }

    fn s(text: &str) -> PdfValue {
        PdfValue::Str(text.as_bytes().to_vec())
    }

    fn name(n: &str) -> PdfValue {
        PdfValue::Name(n.as_bytes().to_vec())
    }

    fn decode(_font: &[u8], bytes: &[u8]) -> String {
        decode_text_simple(bytes)
    }

    fn run(fonts: &[FontInfo], ops: Vec<ContentOp>) -> Vec<RawItem> {
        TextInterpreter::new(0, fonts, &decode).run(&ops)
    }

    fn number(item: &RawItem, name: &str) -> f64 {
        item.fields[name].as_f64().unwrap()
    }

    #[test]
    fn test_matrix_multiply() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Matrix::translation(10.0, 20.0);
        let m = scale.multiply(&shift);
        assert_eq!((m.a, m.d, m.e, m.f), (2.0, 2.0, 10.0, 20.0));
        let m = shift.multiply(&scale);
        assert_eq!((m.e, m.f), (20.0, 40.0));
    }

    #[test]
    fn test_single_run_position_and_width() {
        let fonts = vec![FontInfo::new(b"F1".to_vec(), "Courier").with_widths(32, vec![600.0; 95])];
        let items = run(
            &fonts,
            vec![
                op("BT", vec![]),
                op("Tf", vec![name("F1"), num(10)]),
                op("Td", vec![num(72), num(700)]),
                op("Tj", vec![s("Hello")]),
                op("ET", vec![]),
            ],
        );

        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.item_type, item_type::TEXT_RUN);
        assert_eq!(item.fields[field::STR].as_str(), Some("Hello"));
        assert_eq!(item.fields[field::FONT_NAME].as_str(), Some("Courier"));
        assert_eq!(number(item, field::X), 72.0);
        assert_eq!(number(item, field::Y), 700.0);
        assert_eq!(number(item, field::FONT_SIZE), 10.0);
        // 5 glyphs × 600/1000 × 10pt
        assert!((number(item, field::WIDTH) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_consecutive_runs_advance() {
        let items = run(
            &[],
            vec![
                op("BT", vec![]),
                op("Tf", vec![name("F1"), num(12)]),
                op("Td", vec![num(100), num(500)]),
                op("Tj", vec![s("Hel")]),
                op("Tj", vec![s("lo")]),
                op("ET", vec![]),
            ],
        );

        assert_eq!(items.len(), 2);
        // Unknown font: 0.5 em per glyph, 3 glyphs at 12pt
        assert_eq!(number(&items[1], field::X), 118.0);
        assert_eq!(number(&items[1], field::Y), 500.0);
        assert_eq!(items[1].fields[field::FONT_NAME].as_str(), Some("F1"));
    }

    #[test]
    fn test_leading_and_next_line() {
        let items = run(
            &[],
            vec![
                op("BT", vec![]),
                op("Tf", vec![name("F1"), num(12)]),
                op("TL", vec![num(14)]),
                op("Td", vec![num(72), num(700)]),
                op("Tj", vec![s("one")]),
                op("T*", vec![]),
                op("Tj", vec![s("two")]),
                op("'", vec![s("three")]),
                op("ET", vec![]),
            ],
        );

        let ys: Vec<f64> = items.iter().map(|i| number(i, field::Y)).collect();
        assert_eq!(ys, vec![700.0, 686.0, 672.0]);
        assert!(items.iter().all(|i| number(i, field::X) == 72.0));
    }

    #[test]
    fn test_tj_array_inserts_word_spaces() {
        let items = run(
            &[],
            vec![
                op("BT", vec![]),
                op("Tf", vec![name("F1"), num(10)]),
                op(
                    "TJ",
                    vec![PdfValue::Array(vec![
                        s("Hello"),
                        num(-250),
                        s("world"),
                        num(-20),
                        s("!"),
                    ])],
                ),
                op("ET", vec![]),
            ],
        );

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].fields[field::STR].as_str(), Some("Hello world!"));
        // 11 glyphs × 5pt + (250 + 20)/1000 × 10pt
        assert!((number(&items[0], field::WIDTH) - 57.7).abs() < 1e-9);
    }

    #[test]
    fn test_text_matrix_scales_font_size() {
        let items = run(
            &[],
            vec![
                op("BT", vec![]),
                op("Tf", vec![name("F1"), num(1)]),
                op("Tm", vec![num(18), num(0), num(0), num(18), num(50), num(750)]),
                op("Tj", vec![s("Title")]),
                op("ET", vec![]),
            ],
        );

        assert_eq!(number(&items[0], field::FONT_SIZE), 18.0);
        assert_eq!(number(&items[0], field::X), 50.0);
        assert_eq!(number(&items[0], field::Y), 750.0);
    }

    #[test]
    fn test_ctm_and_graphics_stack() {
        let items = run(
            &[],
            vec![
                op("q", vec![]),
                op("cm", vec![num(1), num(0), num(0), num(1), num(10), num(20)]),
                op("BT", vec![]),
                op("Td", vec![num(5), num(5)]),
                op("Tj", vec![s("inside")]),
                op("ET", vec![]),
                op("Q", vec![]),
                op("BT", vec![]),
                op("Td", vec![num(5), num(5)]),
                op("Tj", vec![s("outside")]),
                op("ET", vec![]),
            ],
        );

        assert_eq!(number(&items[0], field::X), 15.0);
        assert_eq!(number(&items[0], field::Y), 25.0);
        assert_eq!(number(&items[1], field::X), 5.0);
        assert_eq!(number(&items[1], field::Y), 5.0);
    }

    #[test]
    fn test_whitespace_and_outside_text_object_skipped() {
        let items = run(
            &[],
            vec![
                op("Tj", vec![s("orphan")]),
                op("BT", vec![]),
                op("Tj", vec![s("   ")]),
                op("ET", vec![]),
            ],
        );
        assert!(items.is_empty());
    }
}
