use std::collections::BTreeMap;

use encoding_rs::{UTF_16BE, WINDOWS_1252};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::ExtractError;
use crate::model::{PageLayout, Segment, TextSpan};

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Rectangles thinner than this are drawn rules rather than boxes.
const RULE_THICKNESS: f64 = 2.0;

fn multiply(left: &Matrix, right: &Matrix) -> Matrix {
    [
        left[0] * right[0] + left[1] * right[2],
        left[0] * right[1] + left[1] * right[3],
        left[2] * right[0] + left[3] * right[2],
        left[2] * right[1] + left[3] * right[3],
        left[4] * right[0] + left[5] * right[2] + right[4],
        left[4] * right[1] + left[5] * right[3] + right[5],
    ]
}

fn transform(matrix: &Matrix, x: f64, y: f64) -> (f64, f64) {
    (
        matrix[0] * x + matrix[2] * y + matrix[4],
        matrix[1] * x + matrix[3] * y + matrix[5],
    )
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, operand) in out.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(out)
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();

    replacement * 8 > total || control * 5 > total
}

pub(crate) fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(&bytes[2..]);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    if let Some(name) = encoding {
        let lower = name.to_ascii_lowercase();
        if lower.contains("utf16") || lower.contains("ucs2") || lower.contains("identity-h") {
            let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
            if !had_errors && !utf16.is_empty() {
                return utf16.into_owned();
            }
        }
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    let (latin, _, _) = WINDOWS_1252.decode(bytes);
    latin.into_owned()
}

fn collect_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => {
                text.push_str(&decode_pdf_bytes(encoding, bytes));
            }
            Object::Array(items) => {
                collect_text(text, encoding, items);
            }
            Object::Integer(_) | Object::Real(_) => {
                if number(operand).is_some_and(|offset| offset < -100.0) {
                    text.push(' ');
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone)]
struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    font_size: f64,
    leading: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: IDENTITY,
            line_matrix: IDENTITY,
            font_size: 12.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn translate_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.leading;
        self.translate_line(0.0, -leading);
    }
}

/// Interprets one page content stream into text spans and ruling segments.
#[derive(Debug, Default)]
struct PageInterpreter<'a> {
    encodings: BTreeMap<Vec<u8>, &'a str>,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    text: TextState,
    encoding: Option<&'a str>,
    cursor: (f64, f64),
    subpath_start: (f64, f64),
    pending: Vec<Segment>,
    // Set when text was shown and nothing has moved the pen since.
    continues_span: bool,
    layout: PageLayout,
}

impl<'a> PageInterpreter<'a> {
    fn new(encodings: BTreeMap<Vec<u8>, &'a str>) -> Self {
        Self {
            encodings,
            ctm: IDENTITY,
            ..Self::default()
        }
    }

    fn user_point(&self, x: f64, y: f64) -> (f64, f64) {
        transform(&self.ctm, x, y)
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let (ax, ay) = self.user_point(self.cursor.0, self.cursor.1);
        let (bx, by) = self.user_point(x, y);
        self.pending.push(Segment::new(ax, ay, bx, by));
        self.cursor = (x, y);
    }

    fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        if width.abs() <= RULE_THICKNESS || height.abs() <= RULE_THICKNESS {
            let (ax, ay, bx, by) = if width.abs() <= RULE_THICKNESS {
                let mid = x + width / 2.0;
                (mid, y, mid, y + height)
            } else {
                let mid = y + height / 2.0;
                (x, mid, x + width, mid)
            };
            self.cursor = (ax, ay);
            self.line_to(bx, by);
        } else {
            self.cursor = (x, y);
            self.line_to(x + width, y);
            self.line_to(x + width, y + height);
            self.line_to(x, y + height);
            self.line_to(x, y);
        }
        self.cursor = (x, y);
        self.subpath_start = (x, y);
    }

    fn show_text(&mut self, operands: &[Object]) {
        let mut text = String::new();
        collect_text(&mut text, self.encoding, operands);
        if text.is_empty() {
            return;
        }

        if self.continues_span
            && let Some(last) = self.layout.spans.last_mut()
        {
            last.text.push_str(&text);
            return;
        }

        let device = multiply(&self.text.matrix, &self.ctm);
        let (x, y) = transform(&device, 0.0, 0.0);
        let scale = (device[2] * device[2] + device[3] * device[3]).sqrt();
        self.layout.spans.push(TextSpan {
            text,
            x,
            y,
            font_size: self.text.font_size * if scale > 0.0 { scale } else { 1.0 },
        });
        self.continues_span = true;
    }

    fn execute(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.ctm_stack.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(matrix) = numbers::<6>(operands) {
                    self.ctm = multiply(&matrix, &self.ctm);
                }
            }
            "BT" => {
                self.text.matrix = IDENTITY;
                self.text.line_matrix = IDENTITY;
                self.continues_span = false;
            }
            "ET" => self.continues_span = false,
            "Tf" => {
                if let Some(font_name) = operands.first().and_then(|operand| operand.as_name().ok())
                {
                    self.encoding = self.encodings.get(font_name).copied();
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    self.text.font_size = size;
                }
            }
            "TL" => {
                if let Some([leading]) = numbers::<1>(operands) {
                    self.text.leading = leading;
                }
            }
            "Td" | "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    if operator == "TD" {
                        self.text.leading = -ty;
                    }
                    self.text.translate_line(tx, ty);
                    self.continues_span = false;
                }
            }
            "Tm" => {
                if let Some(matrix) = numbers::<6>(operands) {
                    self.text.matrix = matrix;
                    self.text.line_matrix = matrix;
                    self.continues_span = false;
                }
            }
            "T*" => {
                self.text.next_line();
                self.continues_span = false;
            }
            "Tj" | "TJ" => self.show_text(operands),
            "'" => {
                self.text.next_line();
                self.continues_span = false;
                self.show_text(operands);
            }
            "\"" => {
                self.text.next_line();
                self.continues_span = false;
                self.show_text(operands.get(2..).unwrap_or_default());
            }
            "m" => {
                if let Some([x, y]) = numbers::<2>(operands) {
                    self.cursor = (x, y);
                    self.subpath_start = (x, y);
                }
            }
            "l" => {
                if let Some([x, y]) = numbers::<2>(operands) {
                    self.line_to(x, y);
                }
            }
            "c" => {
                if let Some([_, _, _, _, x, y]) = numbers::<6>(operands) {
                    self.cursor = (x, y);
                }
            }
            "v" | "y" => {
                if let Some([_, _, x, y]) = numbers::<4>(operands) {
                    self.cursor = (x, y);
                }
            }
            "h" => {
                let (x, y) = self.subpath_start;
                self.line_to(x, y);
            }
            "re" => {
                if let Some([x, y, width, height]) = numbers::<4>(operands) {
                    self.rectangle(x, y, width, height);
                }
            }
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                self.layout.segments.append(&mut self.pending);
            }
            "n" => self.pending.clear(),
            _ => {}
        }
    }
}

fn read_page_layout(document: &Document, page_id: ObjectId) -> Result<PageLayout, ExtractError> {
    let raw_content = document.get_page_content(page_id)?;
    let content = Content::decode(&raw_content)?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut interpreter = PageInterpreter::new(encodings);
    for operation in &content.operations {
        interpreter.execute(operation.operator.as_str(), &operation.operands);
    }

    let layout = interpreter.layout;
    debug!(
        spans = layout.spans.len(),
        segments = layout.segments.len(),
        "decoded first page layout"
    );
    Ok(layout)
}

pub(crate) fn read_first_page(document: &Document) -> Result<PageLayout, ExtractError> {
    let pages = document.get_pages();
    let Some(page_id) = pages.values().next() else {
        return Err(ExtractError::FormatMismatch(
            "PDF document has no pages".to_string(),
        ));
    };
    read_page_layout(document, *page_id)
}
