//! Downloadable task reports.
//!
//! Both renderers are pure functions of the task slice; the handler fetches
//! the tasks once and picks a renderer by [`ExportFormat`].

use std::str::FromStr;

use crate::errors::{AppError, AppResult};
use crate::models::Task;

pub const CSV_HEADER: [&str; 7] = [
    "ID",
    "Title",
    "Description",
    "Priority",
    "Deadline",
    "Status",
    "Time Spent (Seconds)",
];

pub const TABLE_HEADER: [&str; 5] = ["ID", "Title", "Priority", "Status", "Time Spent"];

const MISSING_DEADLINE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "pdf" => Ok(Self::Pdf),
            _ => Err(AppError::validation(
                "Invalid format specified. Use 'csv' or 'pdf'.",
            )),
        }
    }
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn filename(self) -> &'static str {
        match self {
            Self::Csv => "tasks.csv",
            Self::Pdf => "tasks.pdf",
        }
    }

    pub fn render(self, tasks: &[Task]) -> AppResult<Vec<u8>> {
        match self {
            Self::Csv => render_csv(tasks),
            Self::Pdf => Ok(render_pdf_table(tasks)),
        }
    }
}

pub fn status_label(is_completed: bool) -> &'static str {
    if is_completed {
        "Completed"
    } else {
        "Pending"
    }
}

/// `"{hours}h {minutes}m"`, truncating leftover seconds.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
}

pub fn render_csv(tasks: &[Task]) -> AppResult<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(vec![]);

    wtr.write_record(CSV_HEADER)?;
    for task in tasks {
        wtr.write_record([
            task.id.to_string(),
            task.title.clone(),
            task.description.clone().unwrap_or_default(),
            task.priority.clone(),
            task.deadline
                .clone()
                .unwrap_or_else(|| MISSING_DEADLINE.to_string()),
            status_label(task.is_completed).to_string(),
            task.time_spent_seconds.to_string(),
        ])?;
    }

    wtr.into_inner()
        .map_err(|e| AppError::Render(e.to_string()))
}

// US Letter, in points.
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const FONT_SIZE: f32 = 10.0;
const LINE_HEIGHT: f32 = 12.0;
const CELL_PADDING: f32 = 4.0;
// Distance from a row's top edge to its first baseline.
const FIRST_BASELINE: f32 = 13.0;
// Helvetica's average glyph is roughly half an em wide.
const AVG_GLYPH_WIDTH: f32 = FONT_SIZE * 0.5;
const COLUMN_WIDTHS: [f32; 5] = [40.0, 200.0, 80.0, 90.0, 90.0];

const HEADER_FILL: &str = "0.502 0.502 0.502";
const HEADER_TEXT: &str = "0.961 0.961 0.961";
const BODY_FILL: &str = "0.961 0.961 0.863";

/// One table row with every cell already wrapped to its column.
struct LaidOutRow {
    cells: Vec<Vec<String>>,
    height: f32,
}

impl LaidOutRow {
    fn new(cells: &[String; 5]) -> Self {
        let cells: Vec<Vec<String>> = cells
            .iter()
            .zip(COLUMN_WIDTHS)
            .map(|(cell, width)| wrap_text(cell, width - 2.0 * CELL_PADDING))
            .collect();
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        Self {
            cells,
            height: lines as f32 * LINE_HEIGHT + 2.0 * CELL_PADDING,
        }
    }
}

fn table_row(task: &Task) -> [String; 5] {
    [
        task.id.to_string(),
        task.title.clone(),
        task.priority.clone(),
        status_label(task.is_completed).to_string(),
        format_duration(task.time_spent_seconds),
    ]
}

/// Renders tasks as a bordered grid over one or more US Letter pages. Long
/// cells wrap onto extra lines and the header row repeats on every page.
pub fn render_pdf_table(tasks: &[Task]) -> Vec<u8> {
    let header = LaidOutRow::new(&TABLE_HEADER.map(str::to_string));
    let rows: Vec<LaidOutRow> = tasks.iter().map(|t| LaidOutRow::new(&table_row(t))).collect();

    let body_space = PAGE_HEIGHT - 2.0 * MARGIN - header.height;
    let mut pages: Vec<String> = Vec::new();
    let mut start = 0;
    while start < rows.len() {
        let mut end = start + 1;
        let mut used = rows[start].height;
        while end < rows.len() && used + rows[end].height <= body_space {
            used += rows[end].height;
            end += 1;
        }
        pages.push(page_content(&header, &rows[start..end]));
        start = end;
    }
    if pages.is_empty() {
        pages.push(page_content(&header, &[]));
    }

    PdfDocument::new(pages).finish()
}

fn page_content(header: &LaidOutRow, rows: &[LaidOutRow]) -> String {
    let table_width: f32 = COLUMN_WIDTHS.iter().sum();
    let left = (PAGE_WIDTH - table_width) / 2.0;
    let top = PAGE_HEIGHT - MARGIN;
    let body_top = top - header.height;
    let bottom = body_top - rows.iter().map(|r| r.height).sum::<f32>();

    let mut out = String::new();

    out.push_str(&format!(
        "{HEADER_FILL} rg {left:.2} {body_top:.2} {table_width:.2} {:.2} re f\n",
        header.height
    ));
    if !rows.is_empty() {
        out.push_str(&format!(
            "{BODY_FILL} rg {left:.2} {bottom:.2} {table_width:.2} {:.2} re f\n",
            body_top - bottom
        ));
    }

    out.push_str("0 0 0 RG 1 w\n");
    let mut y = top;
    for row in std::iter::once(header).chain(rows) {
        out.push_str(&format!("{left:.2} {y:.2} m {:.2} {y:.2} l S\n", left + table_width));
        y -= row.height;
    }
    out.push_str(&format!("{left:.2} {y:.2} m {:.2} {y:.2} l S\n", left + table_width));
    let mut x = left;
    for width in COLUMN_WIDTHS.iter().chain(std::iter::once(&0.0)) {
        out.push_str(&format!("{x:.2} {top:.2} m {x:.2} {bottom:.2} l S\n"));
        x += width;
    }

    write_row(&mut out, header, left, top, "F2", HEADER_TEXT);
    let mut row_top = body_top;
    for row in rows {
        write_row(&mut out, row, left, row_top, "F1", "0 0 0");
        row_top -= row.height;
    }

    out
}

fn write_row(out: &mut String, row: &LaidOutRow, left: f32, row_top: f32, font: &str, color: &str) {
    let mut x = left;
    for (lines, width) in row.cells.iter().zip(COLUMN_WIDTHS) {
        for (i, line) in lines.iter().enumerate() {
            let baseline = row_top - FIRST_BASELINE - LINE_HEIGHT * i as f32;
            let text_width = line.chars().count() as f32 * AVG_GLYPH_WIDTH;
            let text_x = x + ((width - text_width) / 2.0).max(CELL_PADDING);
            out.push_str(&format!(
                "BT /{font} {FONT_SIZE:.0} Tf {color} rg {text_x:.2} {baseline:.2} Td ({}) Tj ET\n",
                encode_text(line)
            ));
        }
        x += width;
    }
}

/// Greedy word wrap to `width` points. Words longer than a whole line are
/// split across lines.
fn wrap_text(text: &str, width: f32) -> Vec<String> {
    let max_chars = ((width / AVG_GLYPH_WIDTH) as usize).max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            lines.push(chars.drain(..max_chars).collect());
        }
        if chars.is_empty() {
            continue;
        }

        let needed = if current_len == 0 { chars.len() } else { current_len + 1 + chars.len() };
        if needed > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(chars.iter());
        current_len += chars.len();
    }
    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// WinAnsiEncoding byte for `ch`, if the standard fonts can show it.
fn win_ansi_byte(ch: char) -> Option<u8> {
    let byte = match ch {
        ' '..='~' => ch as u8,
        '\u{A0}'..='\u{FF}' => ch as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Body of a PDF literal string in WinAnsiEncoding. Bytes above ASCII are
/// written as octal escapes so the file stays 7-bit; characters the encoding
/// lacks become `?`.
fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match win_ansi_byte(ch) {
            Some(b @ (b'\\' | b'(' | b')')) => {
                out.push('\\');
                out.push(b as char);
            }
            Some(b) if b.is_ascii() => out.push(b as char),
            Some(b) => out.push_str(&format!("\\{b:03o}")),
            None => out.push('?'),
        }
    }
    out
}

/// Minimal PDF 1.4 writer: catalog, page tree, two standard fonts, and one
/// uncompressed content stream per page. All output is ASCII, so string
/// lengths are byte offsets.
struct PdfDocument {
    pages: Vec<String>,
    out: String,
    offsets: Vec<usize>,
}

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const REGULAR_FONT_ID: usize = 3;
const BOLD_FONT_ID: usize = 4;
const FIRST_PAGE_ID: usize = 5;

impl PdfDocument {
    fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            out: String::new(),
            offsets: Vec::new(),
        }
    }

    fn page_id(index: usize) -> usize {
        FIRST_PAGE_ID + 2 * index
    }

    fn object(&mut self, id: usize, body: &str) {
        debug_assert_eq!(id, self.offsets.len() + 1);
        self.offsets.push(self.out.len());
        self.out.push_str(&format!("{id} 0 obj\n{body}\nendobj\n"));
    }

    fn finish(mut self) -> Vec<u8> {
        self.out.push_str("%PDF-1.4\n");

        self.object(CATALOG_ID, &format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>"));

        let kids: Vec<String> = (0..self.pages.len())
            .map(|i| format!("{} 0 R", Self::page_id(i)))
            .collect();
        self.object(
            PAGES_ID,
            &format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                self.pages.len()
            ),
        );
        self.object(
            REGULAR_FONT_ID,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );
        self.object(
            BOLD_FONT_ID,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
        );

        let pages = std::mem::take(&mut self.pages);
        for (i, content) in pages.iter().enumerate() {
            let page_id = Self::page_id(i);
            self.object(
                page_id,
                &format!(
                    "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
                     /Resources << /Font << /F1 {REGULAR_FONT_ID} 0 R /F2 {BOLD_FONT_ID} 0 R >> >> \
                     /Contents {} 0 R >>",
                    page_id + 1
                ),
            );
            self.object(
                page_id + 1,
                &format!(
                    "<< /Length {} >>\nstream\n{content}\nendstream",
                    content.len()
                ),
            );
        }

        let xref_offset = self.out.len();
        let size = self.offsets.len() + 1;
        self.out.push_str(&format!("xref\n0 {size}\n0000000000 65535 f \n"));
        for offset in &self.offsets {
            self.out.push_str(&format!("{offset:010} 00000 n \n"));
        }
        self.out.push_str(&format!(
            "trailer\n<< /Size {size} /Root {CATALOG_ID} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
        ));

        self.out.into_bytes()
    }
}
