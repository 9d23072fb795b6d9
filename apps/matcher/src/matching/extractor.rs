//! Document extraction: raw bytes of a declared format -> plain text.
//!
//! PDF pages go through `pdf-extract`, DOCX through `zip` + `quick-xml`
//! (WordprocessingML `word/document.xml`), TXT is strict UTF-8.

use std::io::{Cursor, Read};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::matching::error::MatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Txt,
    Docx,
}

impl DocumentFormat {
    /// Resolves the format from a file name's extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Result<Self, MatchError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        match extension.as_str() {
            ".pdf" => Ok(DocumentFormat::Pdf),
            ".txt" => Ok(DocumentFormat::Txt),
            ".docx" => Ok(DocumentFormat::Docx),
            _ => Err(MatchError::UnsupportedFormat(extension)),
        }
    }
}

/// Plain text of one uploaded file. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub raw_text: String,
    pub format: DocumentFormat,
}

/// A boundary-supplied file: declared name plus its bytes.
#[derive(Debug, Clone, Copy)]
pub struct DocumentSource<'a> {
    pub file_name: &'a str,
    pub bytes: &'a [u8],
}

impl<'a> DocumentSource<'a> {
    pub fn new(file_name: &'a str, bytes: &'a [u8]) -> Self {
        Self { file_name, bytes }
    }
}

/// Extracts text from `source` as `format`, normally the result of
/// [`DocumentFormat::from_file_name`] on the same source.
pub fn extract_document(
    source: DocumentSource<'_>,
    format: DocumentFormat,
) -> Result<Document, MatchError> {
    let raw_text = match format {
        DocumentFormat::Pdf => extract_pdf(source)?,
        DocumentFormat::Txt => extract_txt(source)?,
        DocumentFormat::Docx => extract_docx(source)?,
    };
    debug!(
        "Extracted {} chars from {} ({:?})",
        raw_text.len(),
        source.file_name,
        format
    );
    Ok(Document { raw_text, format })
}

fn extract_txt(source: DocumentSource<'_>) -> Result<String, MatchError> {
    String::from_utf8(source.bytes.to_vec()).map_err(|e| MatchError::extraction(source.file_name, e))
}

fn extract_pdf(source: DocumentSource<'_>) -> Result<String, MatchError> {
    // pdf-extract can panic on malformed content streams; treat that as a corrupt file.
    let pages = catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(source.bytes)
    }))
    .map_err(|_| {
        warn!("PDF parser panicked on {}", source.file_name);
        MatchError::extraction(source.file_name, "PDF parser aborted on malformed content")
    })?
    .map_err(|e| MatchError::extraction(source.file_name, e))?;

    Ok(pages.join("\n"))
}

fn extract_docx(source: DocumentSource<'_>) -> Result<String, MatchError> {
    let mut archive = ZipArchive::new(Cursor::new(source.bytes))
        .map_err(|e| MatchError::extraction(source.file_name, e))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| MatchError::extraction(source.file_name, e))?
        .read_to_string(&mut xml)
        .map_err(|e| MatchError::extraction(source.file_name, e))?;

    let paragraphs = docx_paragraphs(&xml).map_err(|e| MatchError::extraction(source.file_name, e))?;
    Ok(paragraphs
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Paragraph texts of a WordprocessingML body in document order.
/// Tabs and breaks inside a paragraph become `\t` and `\n`.
fn docx_paragraphs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    // Text boxes nest paragraphs inside paragraphs.
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(ref e) => {
                if let Some(current) = open.last_mut() {
                    match e.local_name().as_ref() {
                        b"tab" => current.push('\t'),
                        b"br" | b"cr" => current.push('\n'),
                        _ => {}
                    }
                }
            }
            Event::Text(ref e) if in_text => {
                if let Some(current) = open.last_mut() {
                    current.push_str(&e.unescape()?);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(done) = open.pop() {
                        paragraphs.push(done);
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    fn extract(file_name: &str, bytes: &[u8]) -> Result<Document, MatchError> {
        let format = DocumentFormat::from_file_name(file_name)?;
        extract_document(DocumentSource::new(file_name, bytes), format)
    }

    /// Builds a PDF with one page per entry; `None` gives a page with an
    /// empty content stream. Text is set in Helvetica 12pt at (72, 720).
    fn make_pdf(pages: &[Option<&str>]) -> Vec<u8> {
        let page_count = pages.len();
        let kids: Vec<String> = (0..page_count)
            .map(|i| format!("{} 0 R", 4 + 2 * i))
            .collect();
        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {page_count} /MediaBox [0 0 612 792] >>",
                kids.join(" ")
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];
        for (i, text) in pages.iter().enumerate() {
            let content = text
                .map(|t| format!("BT /F1 12 Tf 72 720 Td ({t}) Tj ET"))
                .unwrap_or_default();
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                5 + 2 * i
            ));
            objects.push(format!(
                "<< /Length {} >>\nstream\n{content}\nendstream",
                content.len()
            ));
        }

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }
        let xref_at = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        pdf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
                objects.len() + 1
            )
            .as_bytes(),
        );
        pdf
    }

    /// Builds a minimal DOCX archive around the given `<w:body>` content.
    pub(crate) fn make_docx(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_file_name("cv.PDF").unwrap(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_file_name("jd.txt").unwrap(), DocumentFormat::Txt);
        assert_eq!(
            DocumentFormat::from_file_name("my.resume.docx").unwrap(),
            DocumentFormat::Docx
        );
    }

    #[test]
    fn test_rtf_is_unsupported() {
        match DocumentFormat::from_file_name("resume.rtf") {
            Err(MatchError::UnsupportedFormat(ext)) => assert_eq!(ext, ".rtf"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_extension_is_unsupported() {
        assert!(matches!(
            extract("resume", b"text"),
            Err(MatchError::UnsupportedFormat(ext)) if ext.is_empty()
        ));
    }

    #[test]
    fn test_txt_is_read_verbatim() {
        let doc = extract("jd.txt", "Rust engineer\n5 years".as_bytes()).unwrap();
        assert_eq!(doc.raw_text, "Rust engineer\n5 years");
        assert_eq!(doc.format, DocumentFormat::Txt);
    }

    #[test]
    fn test_txt_invalid_utf8_is_extraction_error() {
        let err = extract("jd.txt", &[0xff, 0xfe, 0xfd]).unwrap_err();
        match err {
            MatchError::Extraction { path, .. } => assert_eq!(path, "jd.txt"),
            other => panic!("expected Extraction, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_pdf_is_extraction_error() {
        let truncated = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R";
        let err = extract("resume.pdf", truncated).unwrap_err();
        assert!(matches!(err, MatchError::Extraction { .. }), "got {err:?}");
    }

    #[test]
    fn test_pdf_pages_are_newline_joined() {
        let bytes = make_pdf(&[Some("Senior Rust Engineer"), None, Some("Kubernetes since 2019")]);
        let doc = extract("resume.pdf", &bytes).unwrap();
        assert_eq!(doc.format, DocumentFormat::Pdf);

        // Each page starts on a fresh line; the blank page adds nothing but
        // its separator.
        let pages: Vec<&str> = doc.raw_text.split('\n').collect();
        assert_eq!(
            doc.raw_text,
            "\n\nSenior Rust Engineer\n\n\n\nKubernetes since 2019",
            "pages: {pages:?}"
        );
    }

    #[test]
    fn test_pdf_without_text_is_empty_not_an_error() {
        let doc = extract("blank.pdf", &make_pdf(&[None, None])).unwrap();
        assert_eq!(doc.raw_text, "\n");
    }

    #[test]
    fn test_docx_joins_non_empty_paragraphs() {
        let bytes = make_docx(
            r#"<w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>
<w:p></w:p>
<w:p><w:r><w:t xml:space="preserve">Rust </w:t></w:r><w:r><w:t>&amp; Go</w:t></w:r></w:p>
<w:p><w:r><w:t>A</w:t><w:tab/><w:t>B</w:t></w:r></w:p>"#,
        );
        let doc = extract("cv.docx", &bytes).unwrap();
        assert_eq!(doc.raw_text, "Jane Doe\nRust & Go\nA\tB");
        assert_eq!(doc.format, DocumentFormat::Docx);
    }

    #[test]
    fn test_docx_without_document_part_is_extraction_error() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract("cv.docx", &bytes).unwrap_err();
        assert!(matches!(err, MatchError::Extraction { .. }));
    }

    #[test]
    fn test_non_zip_docx_is_extraction_error() {
        let err = extract("cv.docx", b"not a zip").unwrap_err();
        assert!(matches!(err, MatchError::Extraction { .. }));
    }
}
