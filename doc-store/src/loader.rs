//! Document loaders: raw bytes of a supported format → plain UTF-8 text.
//!
//! Text, markdown and JSON are decoded in place. PDF and DOCX extraction is
//! CPU-bound and goes through [`extract_text_async`], which runs on the blocking pool.

use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{Result, StoreError};

/// Upper bound for `word/document.xml` inside a DOCX archive.
const MAX_XML_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// Elements whose text never reaches the rendered page.
const HIDDEN_HTML: [&str; 4] = ["script", "style", "noscript", "template"];

/// Supported input formats, resolved from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Text,
    Markdown,
    Json,
    Pdf,
    Html,
    Docx,
}

impl DocumentFormat {
    /// Resolves the format from a filename extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" => Ok(Self::Text),
            "md" | "markdown" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "pdf" => Ok(Self::Pdf),
            "html" | "htm" => Ok(Self::Html),
            "docx" => Ok(Self::Docx),
            "" => Err(StoreError::UnsupportedFormat("<none>".into())),
            other => Err(StoreError::UnsupportedFormat(format!(".{other}"))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Markdown => "md",
            Self::Json => "json",
            Self::Pdf => "pdf",
            Self::Html => "html",
            Self::Docx => "docx",
        }
    }

    /// Formats whose extraction should run off the async executor.
    pub fn is_cpu_bound(self) -> bool {
        matches!(self, Self::Pdf | Self::Docx)
    }
}

/// Extracts plain text from `bytes`. `filename` is only used for error messages.
pub fn extract_text(filename: &str, format: DocumentFormat, bytes: &[u8]) -> Result<String> {
    let fail = |reason: String| StoreError::Extraction {
        filename: filename.to_string(),
        reason,
    };

    let text = match format {
        DocumentFormat::Text | DocumentFormat::Markdown => decode_utf8(bytes),
        DocumentFormat::Json => {
            let value: serde_json::Value =
                serde_json::from_slice(bytes).map_err(|e| fail(format!("invalid JSON: {e}")))?;
            serde_json::to_string_pretty(&value).map_err(|e| fail(e.to_string()))?
        }
        DocumentFormat::Html => extract_html(&decode_utf8(bytes)),
        DocumentFormat::Pdf => extract_pdf(bytes).map_err(fail)?,
        DocumentFormat::Docx => extract_docx(bytes).map_err(fail)?,
    };

    debug!(filename, ?format, chars = text.chars().count(), "text extracted");
    Ok(text)
}

/// Same as [`extract_text`], moving PDF/DOCX work to `spawn_blocking`.
pub async fn extract_text_async(
    filename: String,
    format: DocumentFormat,
    bytes: Vec<u8>,
) -> Result<String> {
    if format.is_cpu_bound() {
        tokio::task::spawn_blocking(move || extract_text(&filename, format, &bytes)).await?
    } else {
        extract_text(&filename, format, &bytes)
    }
}

/// pdf-extract panics on some malformed files; a panic counts as a failed extraction.
fn extract_pdf(bytes: &[u8]) -> std::result::Result<String, String> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown cause".into());
            warn!(%reason, "pdf parser panicked");
            Err(format!("malformed PDF: {reason}"))
        }
    }
}

fn decode_utf8(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Visible text nodes, one trimmed non-empty line each.
fn extract_html(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut lines = Vec::new();
    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_HTML.contains(&e.name()))
        });
        if hidden {
            continue;
        }
        let line = text.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    lines.join("\n")
}

fn extract_docx(bytes: &[u8]) -> std::result::Result<String, String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| "word/document.xml not found".to_string())?;

    let mut xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| e.to_string())?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err("word/document.xml exceeds size limit".into());
    }
    docx_body_text(&xml)
}

/// Walks WordprocessingML: `w:t` runs are text, paragraphs end lines, cells are tab-separated.
fn docx_body_text(xml: &[u8]) -> std::result::Result<String, String> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(t)) if in_text => {
                let s = t.unescape().map_err(|e| e.to_string())?;
                out.push_str(&s);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                b"tc" => out.push('\t'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn format_from_extension() {
        assert_eq!(DocumentFormat::from_filename("Guide.MD").unwrap(), DocumentFormat::Markdown);
        assert_eq!(DocumentFormat::from_filename("a.htm").unwrap(), DocumentFormat::Html);
        assert!(matches!(
            DocumentFormat::from_filename("photo.png"),
            Err(StoreError::UnsupportedFormat(e)) if e == ".png"
        ));
        assert!(DocumentFormat::from_filename("README").is_err());
    }

    #[test]
    fn json_is_pretty_printed_and_validated() {
        let out = extract_text("x.json", DocumentFormat::Json, br#"{"a":[1,2]}"#).unwrap();
        assert!(out.contains("\"a\": ["));
        let err = extract_text("x.json", DocumentFormat::Json, b"{nope").unwrap_err();
        assert!(matches!(err, StoreError::Extraction { .. }));
    }

    #[test]
    fn html_skips_scripts_and_styles() {
        let html = r#"<html><head><title>Shop</title><style>.a{}</style></head>
            <body><h1>Checkout</h1><script>var x = 1;</script>
            <p>Apply a <b>discount</b> code.</p></body></html>"#;
        let out = extract_text("p.html", DocumentFormat::Html, html.as_bytes()).unwrap();
        assert!(out.contains("Shop"));
        assert!(out.contains("Checkout"));
        assert!(out.contains("discount"));
        assert!(!out.contains("var x"));
        assert!(!out.contains(".a{}"));
    }

    #[test]
    fn text_strips_bom() {
        let out = extract_text("a.txt", DocumentFormat::Text, b"\xEF\xBB\xBFhello").unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn docx_paragraphs_become_lines() {
        let xml = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Login page</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Email </w:t></w:r><w:r><w:t>&amp; password</w:t></w:r></w:p>
</w:body></w:document>"#;
        let mut bytes = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut bytes));
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        let out = extract_text("brief.docx", DocumentFormat::Docx, &bytes).unwrap();
        assert_eq!(out, "Login page\nEmail & password");
    }

    #[tokio::test]
    async fn broken_pdf_is_extraction_error_off_the_executor() {
        let bytes = b"%PDF-1.7\n1 0 obj << /Type /Catalog /Pages 9 0 R >>\nendobj\ntrailer << /Root 1 0 R /Size 99 >>\nstartxref\n4096\n%%EOF".to_vec();
        let err = extract_text_async("broken.pdf".into(), DocumentFormat::Pdf, bytes)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Extraction { filename, .. } if filename == "broken.pdf"));
    }

    #[test]
    fn docx_without_body_is_extraction_error() {
        let err = extract_text("bad.docx", DocumentFormat::Docx, b"not a zip").unwrap_err();
        assert!(matches!(err, StoreError::Extraction { filename, .. } if filename == "bad.docx"));
    }
}
