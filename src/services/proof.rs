//! Proof-of-return documents
//!
//! A proof carries the handover details and a QR code pointing to the public
//! verification endpoint, so that anyone holding the paper can check it.

use printpdf::{BuiltinFont, Color, Mm, PdfDocument, PdfLayerReference, Rect, Rgb};
use qrcode::QrCode;

use crate::{
    error::{AppError, AppResult},
    models::restitution::RestitutionDetails,
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const VALUE_COLUMN: f32 = 70.0;
const LINE_HEIGHT: f32 = 8.0;
const QR_SIZE: f32 = 50.0;

pub struct ProofContext<'a> {
    pub restitution: &'a RestitutionDetails,
    /// URL encoded in the QR code
    pub verify_url: String,
}

#[derive(Debug, Clone)]
pub struct ProofDocument {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub trait ProofRenderer: Send + Sync {
    fn render(&self, context: &ProofContext<'_>) -> AppResult<ProofDocument>;
}

/// Public verification URL of a restitution
pub fn verify_url(public_base_url: &str, restitution_id: i32) -> String {
    format!(
        "{}/api/v1/restitutions/{}/verify",
        public_base_url.trim_end_matches('/'),
        restitution_id
    )
}

/// Label and value lines printed on the proof
pub fn proof_rows(r: &RestitutionDetails) -> Vec<(&'static str, String)> {
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    vec![
        ("Item", r.item_label().to_string()),
        ("Reference", text(&r.unique_code)),
        ("Returned to", text(&r.claimant_username)),
        ("Found by", text(&r.finder_username)),
        ("Police station", text(&r.station_name)),
        ("Address", text(&r.station_address)),
        ("Scheduled officer", text(&r.officer_username)),
        ("Handed over by", text(&r.performer_username)),
        (
            "Appointment",
            format!("{} {}", r.scheduled_date, r.scheduled_time.format("%H:%M")),
        ),
        (
            "Performed at",
            r.performed_at
                .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
    ]
}

/// Dark modules of the QR code as `(column, row)`, with the code width
fn qr_modules(data: &str) -> AppResult<(usize, Vec<(usize, usize)>)> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| AppError::Internal(format!("Failed to encode QR code: {}", e)))?;
    let width = code.width();

    let dark = code
        .to_colors()
        .into_iter()
        .enumerate()
        .filter(|(_, color)| *color == qrcode::Color::Dark)
        .map(|(index, _)| (index % width, index / width))
        .collect();

    Ok((width, dark))
}

fn pdf_error(e: printpdf::Error) -> AppError {
    AppError::Internal(format!("Failed to render proof: {}", e))
}

/// A4 PDF proof with the QR code drawn as vector squares
#[derive(Debug, Clone, Default)]
pub struct PdfProofRenderer;

impl PdfProofRenderer {
    /// Draw the QR code with its lower left corner at `(left, bottom)`
    fn draw_qr(layer: &PdfLayerReference, data: &str, left: f32, bottom: f32) -> AppResult<()> {
        let (width, modules) = qr_modules(data)?;
        let module = QR_SIZE / width as f32;

        layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        for (column, row) in modules {
            // QR rows run downwards, PDF ordinates upwards
            let x = left + column as f32 * module;
            let y = bottom + QR_SIZE - (row + 1) as f32 * module;
            layer.add_rect(Rect::new(Mm(x), Mm(y), Mm(x + module), Mm(y + module)));
        }
        Ok(())
    }
}

impl ProofRenderer for PdfProofRenderer {
    fn render(&self, context: &ProofContext<'_>) -> AppResult<ProofDocument> {
        let r = context.restitution;
        let title = format!("Proof of return #{}", r.id);

        let (doc, page, layer) =
            PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Proof");
        let layer = doc.get_page(page).get_layer(layer);
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;

        let mut y = PAGE_HEIGHT - MARGIN - 10.0;
        layer.use_text(title.as_str(), 20.0, Mm(MARGIN), Mm(y), &bold);
        y -= 2.0 * LINE_HEIGHT;

        for (label, value) in proof_rows(r) {
            layer.use_text(label, 11.0, Mm(MARGIN), Mm(y), &bold);
            layer.use_text(value, 11.0, Mm(VALUE_COLUMN), Mm(y), &regular);
            y -= LINE_HEIGHT;
        }

        let qr_bottom = y - LINE_HEIGHT - QR_SIZE;
        Self::draw_qr(&layer, &context.verify_url, MARGIN, qr_bottom)?;
        layer.use_text(
            format!("Verify this document at {}", context.verify_url),
            9.0,
            Mm(MARGIN),
            Mm(qr_bottom - LINE_HEIGHT),
            &regular,
        );

        Ok(ProofDocument {
            filename: format!("restitution-{}.pdf", r.id),
            content_type: "application/pdf".to_string(),
            bytes: doc.save_to_bytes().map_err(pdf_error)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{enums::RestitutionStatus, restitution::fixtures};

    #[test]
    fn test_verify_url() {
        assert_eq!(
            verify_url("https://lostfound.example.org/", 12),
            "https://lostfound.example.org/api/v1/restitutions/12/verify"
        );
    }

    #[test]
    fn test_render_proof() {
        let restitution = fixtures::details(RestitutionStatus::Done);
        let context = ProofContext {
            restitution: &restitution,
            verify_url: verify_url("http://localhost:8080", restitution.id),
        };

        let doc = PdfProofRenderer.render(&context).unwrap();

        assert_eq!(doc.filename, "restitution-12.pdf");
        assert_eq!(doc.content_type, "application/pdf");
        assert!(doc.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_proof_rows() {
        let restitution = fixtures::details(RestitutionStatus::Done);
        let rows = proof_rows(&restitution);

        assert_eq!(rows.len(), 10);
        assert!(rows.contains(&("Reference", "OBJ-7K2M9QXA".to_string())));
    }

    #[test]
    fn test_proof_rows_without_item() {
        let mut restitution = fixtures::details(RestitutionStatus::Done);
        restitution.item_name = None;
        restitution.unique_code = None;

        let rows = proof_rows(&restitution);
        assert_eq!(rows[0], ("Item", "Unknown item".to_string()));
        assert_eq!(rows[1], ("Reference", "-".to_string()));
    }

    #[test]
    fn test_qr_modules_fit_the_code() {
        let (width, modules) = qr_modules("http://localhost:8080/api/v1/restitutions/12/verify").unwrap();

        assert!(width >= 21);
        assert!(!modules.is_empty());
        assert!(modules.iter().all(|(column, row)| *column < width && *row < width));
        // Finder pattern corner
        assert!(modules.contains(&(0, 0)));
    }
}
