use itertools::Itertools;

use super::{ReportDocument, COLUMN_COUNT};

const MM: f32 = 72.0 / 25.4;
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 14.0 * MM;
const TITLE_SIZE: f32 = 18.0;
const SUBTITLE_SIZE: f32 = 11.0;
const FIRST_TABLE_TOP: f32 = 45.0 * MM;
const NEXT_TABLE_TOP: f32 = 14.0 * MM;
const FONT_SIZE: f32 = 10.0;
const CELL_PADDING: f32 = 5.0;
const ROW_HEIGHT: f32 = FONT_SIZE * 1.15 + 2.0 * CELL_PADDING;
const LINE_WIDTH: f32 = 0.1 * MM;

const HEADER_FILL: Rgb = Rgb(22, 163, 74);
const HEADER_TEXT: Rgb = Rgb(255, 255, 255);
const BODY_TEXT: Rgb = Rgb(80, 80, 80);
const GRID_LINE: Rgb = Rgb(200, 200, 200);
const TITLE_TEXT: Rgb = Rgb(0, 0, 0);

const ELLIPSIS: &str = "...";

// object ids: 1 catalog, 2 page tree, 3-4 fonts, 5 info, then page/content pairs
const FIRST_PAGE_OBJECT: usize = 6;

// AFM advance widths for code points 32..=126, per 1000 units of em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722, 722, 667,
    611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667,
    667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500,
    222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, 975, 722, 722, 722, 722, 667,
    611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667,
    667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556,
    278, 889, 611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Rgb(u8, u8, u8);

impl Rgb {
    fn components(self) -> String {
        format!(
            "{:.3} {:.3} {:.3}",
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    fn glyph_width(self, c: char) -> u16 {
        let table = match self {
            Font::Regular => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        let code = c as u32;
        if (32..=126).contains(&code) {
            table[(code - 32) as usize]
        } else {
            556
        }
    }

    fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.glyph_width(c) as u32).sum();
        units as f32 * size / 1000.0
    }
}

// WinAnsi covers Latin-1 from 0xA0 upwards; everything else outside ASCII becomes '?'
fn escape_pdf_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            ' '..='~' => out.push(c),
            '\u{a0}'..='\u{ff}' => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

fn fit_text(text: &str, max_width: f32, font: Font, size: f32) -> String {
    if font.text_width(text, size) <= max_width {
        return text.to_string();
    }
    let mut kept: Vec<char> = text.chars().collect();
    while !kept.is_empty() {
        kept.pop();
        let candidate = format!("{}{ELLIPSIS}", kept.iter().collect::<String>());
        if font.text_width(&candidate, size) <= max_width {
            return candidate;
        }
    }
    String::new()
}

fn column_widths(doc: &ReportDocument) -> [f32; COLUMN_COUNT] {
    let mut widths = [0.0f32; COLUMN_COUNT];
    for (i, label) in doc.columns.iter().enumerate() {
        widths[i] = Font::Bold.text_width(label, FONT_SIZE) + 2.0 * CELL_PADDING;
    }
    for row in doc.rows.iter() {
        for (i, cell) in row.iter().enumerate() {
            let w = Font::Regular.text_width(cell, FONT_SIZE) + 2.0 * CELL_PADDING;
            widths[i] = widths[i].max(w);
        }
    }
    let usable = PAGE_WIDTH - 2.0 * MARGIN;
    let total: f32 = widths.iter().sum();
    if total > 0.0 {
        let scale = usable / total;
        for w in widths.iter_mut() {
            *w *= scale;
        }
    }
    widths
}

/// Content stream of one page, positioned in top-left based points.
#[derive(Default)]
struct Canvas {
    ops: String,
}

impl Canvas {
    fn text(&mut self, font: Font, size: f32, color: Rgb, x: f32, baseline: f32, text: &str) {
        self.ops.push_str(&format!(
            "BT {} rg /{} {:.2} Tf {:.2} {:.2} Td ({}) Tj ET\n",
            color.components(),
            font.resource(),
            size,
            x,
            PAGE_HEIGHT - baseline,
            escape_pdf_string(text)
        ));
    }

    fn cell(&mut self, x: f32, top: f32, width: f32, fill: Option<Rgb>) {
        let rect = format!(
            "{:.2} {:.2} {:.2} {:.2} re",
            x,
            PAGE_HEIGHT - top - ROW_HEIGHT,
            width,
            ROW_HEIGHT
        );
        match fill {
            Some(color) => {
                self.ops
                    .push_str(&format!("{} rg {} B\n", color.components(), rect));
            }
            None => self.ops.push_str(&format!("{rect} S\n")),
        }
    }

    fn row(&mut self, top: f32, widths: &[f32; COLUMN_COUNT], cells: &[String], header: bool) {
        let (font, fill, color) = if header {
            (Font::Bold, Some(HEADER_FILL), HEADER_TEXT)
        } else {
            (Font::Regular, None, BODY_TEXT)
        };
        let baseline = top + ROW_HEIGHT / 2.0 + FONT_SIZE * 0.35;
        let mut x = MARGIN;
        for (cell, width) in cells.iter().zip(widths.iter()) {
            self.cell(x, top, *width, fill);
            let fitted = fit_text(cell, width - 2.0 * CELL_PADDING, font, FONT_SIZE);
            self.text(font, FONT_SIZE, color, x + CELL_PADDING, baseline, &fitted);
            x += width;
        }
    }

    fn begin_grid(&mut self) {
        self.ops.push_str(&format!(
            "{:.2} w {} RG\n",
            LINE_WIDTH,
            GRID_LINE.components()
        ));
    }
}

fn layout_pages(doc: &ReportDocument) -> Vec<String> {
    let widths = column_widths(doc);
    let mut pages: Vec<String> = Vec::new();

    let mut canvas = Canvas::default();
    canvas.text(
        Font::Regular,
        TITLE_SIZE,
        TITLE_TEXT,
        MARGIN,
        22.0 * MM,
        &doc.title,
    );
    canvas.text(
        Font::Regular,
        SUBTITLE_SIZE,
        TITLE_TEXT,
        MARGIN,
        30.0 * MM,
        &doc.subtitle(),
    );
    canvas.text(
        Font::Regular,
        SUBTITLE_SIZE,
        TITLE_TEXT,
        MARGIN,
        36.0 * MM,
        &doc.filter_line(),
    );
    canvas.begin_grid();
    canvas.row(FIRST_TABLE_TOP, &widths, &doc.columns, true);
    let mut top = FIRST_TABLE_TOP + ROW_HEIGHT;

    for row in doc.rows.iter() {
        if top + ROW_HEIGHT > PAGE_HEIGHT - MARGIN {
            pages.push(std::mem::take(&mut canvas).ops);
            canvas.begin_grid();
            canvas.row(NEXT_TABLE_TOP, &widths, &doc.columns, true);
            top = NEXT_TABLE_TOP + ROW_HEIGHT;
        }
        canvas.row(top, &widths, row, false);
        top += ROW_HEIGHT;
    }
    pages.push(canvas.ops);
    pages
}

fn font_object(base_font: &str) -> String {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base_font} /Encoding /WinAnsiEncoding >>")
}

fn assemble(doc: &ReportDocument, pages: &[String]) -> Vec<u8> {
    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", FIRST_PAGE_OBJECT + 2 * i))
        .join(" ");

    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
        font_object("Helvetica"),
        font_object("Helvetica-Bold"),
        format!(
            "<< /Title ({}) /Producer (carbonwise) >>",
            escape_pdf_string(&doc.title)
        ),
    ];
    for (i, content) in pages.iter().enumerate() {
        let content_id = FIRST_PAGE_OBJECT + 2 * i + 1;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.2} {PAGE_HEIGHT:.2}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {content_id} 0 R >>"
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
    let mut offsets: Vec<usize> = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );
    out
}

/// A4 report: title block followed by a grid table that continues on new
/// pages, repeating the header row.
pub fn render_pdf(doc: &ReportDocument) -> Vec<u8> {
    let pages = layout_pages(doc);
    assemble(doc, &pages)
}
