//! Source resolution and document loading.

use crate::chunker::{chunk_text, CHUNK_OVERLAP, CHUNK_SIZE};
use crate::types::{Chunk, Metadata};
use chrono::Utc;
use docqa_core::{AppError, AppResult, Settings};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Used when neither an override nor a configured path is given.
pub const DEFAULT_SOURCE_FILE: &str = "document.pdf";

/// Kind of source file, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    PlainText,
}

impl SourceFormat {
    /// `.txt` and `.md` are plain text; everything else is treated as PDF.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .as_deref()
        {
            Some("txt") | Some("md") => Self::PlainText,
            _ => Self::Pdf,
        }
    }
}

/// Resolve the document to ingest.
///
/// Uses `override_path`, else the configured source path, else
/// `document.pdf`. A leading `~` is expanded and relative paths are joined
/// onto the working directory.
///
/// # Errors
/// `SourceNotFound` when the resolved file does not exist.
pub fn resolve_source_path(
    settings: &Settings,
    override_path: Option<&Path>,
) -> AppResult<PathBuf> {
    let raw = override_path
        .map(Path::to_path_buf)
        .or_else(|| settings.source_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_FILE));

    let expanded = expand_home(&raw);
    let path = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()?.join(expanded)
    };

    if !path.is_file() {
        return Err(AppError::SourceNotFound(path));
    }

    tracing::debug!("Resolved source document {:?}", path);
    Ok(path)
}

fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Extracted text of one PDF page, or of a whole plain-text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// Zero-based page number; `None` for plain-text sources
    pub page: Option<usize>,
    pub text: String,
}

/// Extract a document's text, one entry per PDF page.
pub fn extract_pages(path: &Path) -> AppResult<Vec<PageText>> {
    match SourceFormat::from_path(path) {
        SourceFormat::PlainText => Ok(vec![PageText {
            page: None,
            text: std::fs::read_to_string(path)?,
        }]),
        SourceFormat::Pdf => {
            let bytes = std::fs::read(path)?;
            let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| {
                AppError::Document(format!("PDF extraction failed for {:?}: {}", path, e))
            })?;

            Ok(pages
                .into_iter()
                .enumerate()
                .map(|(page, text)| PageText {
                    page: Some(page),
                    text,
                })
                .collect())
        }
    }
}

/// Load a document and split it into chunks.
///
/// PDF pages are chunked independently, so no chunk spans a page break.
///
/// # Errors
/// `EmptyDocument` when no non-blank chunk results.
pub fn load_documents(path: &Path) -> AppResult<Vec<Chunk>> {
    let pages = extract_pages(path)?;
    let chunks = chunks_from_pages(path, &pages);

    if chunks.is_empty() {
        return Err(AppError::EmptyDocument(path.to_path_buf()));
    }

    tracing::info!(
        "Loaded {} chunks from {} page(s) of {:?}",
        chunks.len(),
        pages.len(),
        path
    );
    Ok(chunks)
}

/// Chunk every page and attach the standard metadata for `source`.
///
/// `chunk_index` runs across the whole document; `start_char` is relative
/// to the chunk's page.
pub fn chunks_from_pages(source: &Path, pages: &[PageText]) -> Vec<Chunk> {
    let ingested_at = Utc::now().to_rfc3339();
    let source_str = source.to_string_lossy().to_string();
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let total_pages = pages.iter().filter(|p| p.page.is_some()).count();

    let mut chunks = Vec::new();
    for page in pages {
        for window in chunk_text(&page.text, CHUNK_SIZE, CHUNK_OVERLAP) {
            let mut metadata = Metadata::new();
            metadata.insert("source".to_string(), json!(source_str));
            metadata.insert("file_name".to_string(), json!(file_name));
            if let Some(number) = page.page {
                metadata.insert("page".to_string(), json!(number));
                metadata.insert("total_pages".to_string(), json!(total_pages));
            }
            metadata.insert("chunk_index".to_string(), json!(chunks.len()));
            metadata.insert("start_char".to_string(), json!(window.start_char));
            metadata.insert("content_hash".to_string(), json!(content_hash(&window.text)));
            metadata.insert("ingested_at".to_string(), json!(ingested_at));
            chunks.push(Chunk::new(window.text, metadata));
        }
    }
    chunks
}

/// Hex SHA-256 of `text`.
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_source_format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("a.pdf")), SourceFormat::Pdf);
        assert_eq!(SourceFormat::from_path(Path::new("a.MD")), SourceFormat::PlainText);
        assert_eq!(SourceFormat::from_path(Path::new("a.txt")), SourceFormat::PlainText);
        assert_eq!(SourceFormat::from_path(Path::new("noext")), SourceFormat::Pdf);
    }

    #[test]
    fn test_override_wins_over_settings() {
        let temp = TempDir::new().unwrap();
        let chosen = temp.path().join("chosen.txt");
        std::fs::write(&chosen, "content").unwrap();

        let settings = Settings {
            source_path: Some(temp.path().join("configured.txt")),
            ..Settings::default()
        };

        let resolved = resolve_source_path(&settings, Some(&chosen)).unwrap();
        assert_eq!(resolved, chosen);
    }

    #[test]
    fn test_configured_path_used_without_override() {
        let temp = TempDir::new().unwrap();
        let configured = temp.path().join("configured.txt");
        std::fs::write(&configured, "content").unwrap();

        let settings = Settings {
            source_path: Some(configured.clone()),
            ..Settings::default()
        };

        assert_eq!(resolve_source_path(&settings, None).unwrap(), configured);
    }

    #[test]
    fn test_missing_source_is_source_not_found() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.pdf");

        match resolve_source_path(&Settings::default(), Some(&missing)) {
            Err(AppError::SourceNotFound(path)) => assert_eq!(path, missing),
            other => panic!("Expected SourceNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_load_text_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        std::fs::write(&path, "word ".repeat(500)).unwrap();

        let chunks = load_documents(&path).unwrap();
        assert_eq!(chunks.len(), 3);

        let first = &chunks[0];
        assert_eq!(first.metadata["file_name"], "notes.txt");
        assert_eq!(first.metadata["chunk_index"], 0);
        assert_eq!(first.metadata["start_char"], 0);
        assert_eq!(first.metadata["content_hash"], content_hash(&first.text));
        assert!(first.metadata.contains_key("ingested_at"));
        assert!(!first.metadata.contains_key("page"));
        assert_eq!(chunks[1].metadata["start_char"], 850);
    }

    /// Minimal PDF with one Helvetica text line per page.
    fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
        let kids: Vec<String> = (0..pages.len())
            .map(|i| format!("{} 0 R", 4 + 2 * i))
            .collect();

        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                pages.len()
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];
        for (i, text) in pages.iter().enumerate() {
            let content_id = 5 + 2 * i;
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                content_id
            ));
            let stream = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                stream.len(),
                stream
            ));
        }

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, object) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, object).as_bytes());
        }

        let xref_start = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_start
            )
            .as_bytes(),
        );
        out
    }

    #[test]
    fn test_pdf_pages_are_chunked_separately() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("manual.pdf");
        std::fs::write(
            &path,
            pdf_with_pages(&["Warranty lasts two years", "Returns need a receipt"]),
        )
        .unwrap();

        let chunks = load_documents(&path).unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.contains("Warranty"));
        assert!(!chunks[0].text.contains("receipt"));
        assert!(chunks[1].text.contains("receipt"));
        assert_eq!(chunks[0].metadata["page"], 0);
        assert_eq!(chunks[1].metadata["page"], 1);
        assert_eq!(chunks[1].metadata["total_pages"], 2);
        assert_eq!(chunks[1].metadata["chunk_index"], 1);
        assert_eq!(chunks[1].metadata["start_char"], 0);
        assert_eq!(chunks[1].metadata["file_name"], "manual.pdf");
    }

    #[test]
    fn test_chunk_index_runs_across_pages() {
        let pages = vec![
            PageText {
                page: Some(0),
                text: "a".repeat(1200),
            },
            PageText {
                page: Some(1),
                text: "   ".to_string(),
            },
            PageText {
                page: Some(2),
                text: "tail page".to_string(),
            },
        ];

        let chunks = chunks_from_pages(Path::new("/data/doc.pdf"), &pages);

        let indexes: Vec<_> = chunks.iter().map(|c| c.metadata["chunk_index"].clone()).collect();
        assert_eq!(indexes, vec![json!(0), json!(1), json!(2)]);
        assert_eq!(chunks[2].metadata["page"], 2);
        assert_eq!(chunks[2].metadata["total_pages"], 3);
        assert_eq!(chunks[1].metadata["start_char"], 850);
    }

    #[test]
    fn test_blank_document_is_empty_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blank.md");
        std::fs::write(&path, "   \n\n  ").unwrap();

        assert!(matches!(
            load_documents(&path),
            Err(AppError::EmptyDocument(_))
        ));
    }

    #[test]
    fn test_invalid_pdf_is_document_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        assert!(matches!(load_documents(&path), Err(AppError::Document(_))));
    }

    #[test]
    fn test_content_hash_is_hex_sha256() {
        assert_eq!(
            content_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
