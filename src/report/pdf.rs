use printpdf::{BuiltinFont, Mm, PdfDocument};

use super::layout::{FontWeight, ReportLayout, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, TITLE};
use super::ReportError;

fn pdf_error(e: printpdf::Error) -> ReportError {
    ReportError::Pdf(e.to_string())
}

/// Draws a finished layout with the built-in Helvetica faces.
pub fn render(layout: &ReportLayout) -> Result<Vec<u8>, ReportError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(TITLE, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Page 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    for (i, page) in layout.pages.iter().enumerate() {
        let (page_index, layer_index) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                format!("Page {}", page.number),
            )
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        for item in &page.items {
            let font = match item.weight {
                FontWeight::Regular => &regular,
                FontWeight::Bold => &bold,
            };
            // printpdf measures y from the bottom edge
            layer.use_text(
                item.text.as_str(),
                item.size,
                Mm(item.x),
                Mm(PAGE_HEIGHT_MM - item.y),
                font,
            );
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}
