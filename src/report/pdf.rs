use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use super::{ReportError, StockReport};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const LINE_HEIGHT: f32 = 6.0;

const DETAIL_COLUMNS: [(&str, f32); 6] = [
    ("Item Name", 0.0),
    ("Category", 62.0),
    ("Total Stock", 94.0),
    ("Available", 118.0),
    ("Unit", 140.0),
    ("% Available", 160.0),
];

const BREAKDOWN_COLUMNS: [(&str, f32); 3] = [
    ("Category", 0.0),
    ("Number of Items", 60.0),
    ("Total Available Stock", 110.0),
];

/// Writes text top-down and starts a new page when the cursor reaches the
/// bottom margin
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, ReportError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        self.pages += 1;
    }

    /// True when a new page was started
    fn ensure_room(&mut self, lines: usize) -> bool {
        if self.y - LINE_HEIGHT * (lines as f32) < MARGIN {
            self.new_page();
            true
        } else {
            false
        }
    }

    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(text, size, Mm(MARGIN + x), Mm(self.y), font);
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        self.ensure_room(1);
        self.text(text, size, 0.0, bold);
        self.y -= LINE_HEIGHT;
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT / 2.0;
    }

    fn row(&mut self, columns: &[(&str, f32)], cells: &[String], bold: bool) {
        for ((_, x), cell) in columns.iter().zip(cells) {
            self.text(cell, 9.0, *x, bold);
        }
        self.y -= LINE_HEIGHT;
    }

    /// Header row followed by data rows. The header is repeated at the top of
    /// every page the table spills onto.
    fn table(&mut self, columns: &[(&str, f32)], rows: &[Vec<String>]) {
        let header: Vec<String> = columns.iter().map(|(h, _)| h.to_string()).collect();
        self.ensure_room(2);
        self.row(columns, &header, true);

        for cells in rows {
            if self.ensure_room(1) {
                self.row(columns, &header, true);
            }
            self.row(columns, cells, false);
        }
    }

    fn finish(self) -> Result<Vec<u8>, ReportError> {
        Ok(self.doc.save_to_bytes()?)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Render the stock report as a paginated A4 PDF
pub fn render_pdf(report: &StockReport) -> Result<Vec<u8>, ReportError> {
    let mut pdf = PageWriter::new(&report.title)?;

    pdf.line(&report.title, 16.0, true);
    pdf.line(&format!("Generated: {}", report.generated_label()), 9.0, false);
    pdf.gap();

    pdf.line("Summary", 12.0, true);
    pdf.line(&format!("Total Items: {}", report.total_items), 10.0, false);
    pdf.line(
        &format!("Total Available Stock: {}", report.total_available_stock),
        10.0,
        false,
    );
    pdf.line(
        &format!("Low Stock Items (< 20%): {}", report.low_stock_items),
        10.0,
        false,
    );
    pdf.gap();

    pdf.line("Detailed Inventory", 12.0, true);
    let detail: Vec<Vec<String>> = report
        .items
        .iter()
        .map(|line| {
            vec![
                truncate(&line.name, 34),
                line.category.to_string(),
                line.total_stock.to_string(),
                line.available_stock.to_string(),
                truncate(&line.unit, 10),
                line.percent_label(),
            ]
        })
        .collect();
    pdf.table(&DETAIL_COLUMNS, &detail);
    pdf.gap();

    pdf.line("Category Breakdown", 12.0, true);
    let breakdown: Vec<Vec<String>> = report
        .categories
        .iter()
        .map(|c| {
            vec![
                c.category.to_string(),
                c.item_count.to_string(),
                c.available_stock.to_string(),
            ]
        })
        .collect();
    pdf.table(&BREAKDOWN_COLUMNS, &breakdown);

    tracing::debug!(title = %report.title, pages = pdf.pages, "Rendered stock report PDF");
    pdf.finish()
}
