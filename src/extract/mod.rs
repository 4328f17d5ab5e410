use std::io::Write;
use std::path::Path;

use log::{ info, warn };
use pdf_oxide::PdfDocument;

use crate::error::ChatError;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";

/// Maps an upload's extension to its MIME type. Only pdf, docx and txt are accepted.
pub fn mime_for_path(path: &Path) -> Result<&'static str, ChatError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => Ok(MIME_PDF),
        "docx" => Ok(MIME_DOCX),
        "txt" => Ok(MIME_TEXT),
        _ =>
            Err(
                ChatError::Extraction(
                    format!("Unsupported file type '{}' (expected pdf, docx or txt)", path.display())
                )
            ),
    }
}

/// Decodes an uploaded file. PDFs go through the PDF reader; everything else is
/// decoded as text.
pub fn read_file(data: &[u8], mime_type: &str) -> Result<String, ChatError> {
    if mime_type == MIME_PDF {
        read_pdf(data)
    } else {
        Ok(decode_text(data))
    }
}

fn decode_text(data: &[u8]) -> String {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    match std::str::from_utf8(data) {
        Ok(text) => text.to_string(),
        Err(e) => {
            warn!("Upload is not valid UTF-8 ({}), replacing undecodable bytes", e);
            String::from_utf8_lossy(data).into_owned()
        }
    }
}

fn read_pdf(data: &[u8]) -> Result<String, ChatError> {
    let mut temp_file = tempfile::NamedTempFile
        ::new()
        .map_err(|e| ChatError::Extraction(format!("failed to create temp file: {}", e)))?;
    temp_file
        .write_all(data)
        .map_err(|e| ChatError::Extraction(format!("failed to write temp file: {}", e)))?;

    let doc = PdfDocument::open(temp_file.path()).map_err(|e|
        ChatError::Extraction(format!("Error reading PDF: {}", e))
    )?;
    let page_count = doc
        .page_count()
        .map_err(|e| ChatError::Extraction(format!("failed to read page count: {}", e)))?;

    let text = join_pages((0..page_count).map(|i| doc.extract_text(i)))?;
    info!("Extracted {} characters from {} PDF page(s)", text.chars().count(), page_count);

    Ok(text)
}

/// Joins page texts with newlines. Pages that fail are logged and skipped; a
/// document where every page fails is an error.
fn join_pages<E: std::fmt::Display>(
    pages: impl Iterator<Item = Result<String, E>>
) -> Result<String, ChatError> {
    let mut text = String::new();
    let mut total = 0;
    let mut failed = 0;
    for (page_index, page) in pages.enumerate() {
        total += 1;
        let page_text = match page {
            Ok(page_text) => page_text,
            Err(e) => {
                warn!("Skipping PDF page {}: {}", page_index + 1, e);
                failed += 1;
                continue;
            }
        };
        text.push_str(&page_text);
        if !page_text.ends_with('\n') {
            text.push('\n');
        }
    }

    if total > 0 && failed == total {
        return Err(
            ChatError::Extraction(format!("no text could be read from any of {} PDF page(s)", total))
        );
    }
    Ok(text)
}
