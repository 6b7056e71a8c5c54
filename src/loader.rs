//! Document loading for selected rustdoc HTML files
//!
//! Each selected file is run through HTML text extraction to produce zero
//! or more text documents. Extraction for distinct files is independent
//! and runs concurrently; a single extraction failure fails the whole
//! load, since a partially built corpus is never indexed.

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt, TryStreamExt};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};

/// Number of files extracted concurrently
const EXTRACT_CONCURRENCY: usize = 8;

/// CSS selector for the main content area in rustdoc HTML
const MAIN_CONTENT_SELECTOR: &str = "section#main-content.content";

/// One text document extracted from a documentation file
///
/// The identifier is the source file's path relative to the crate's
/// documentation root: stable, human-readable, and unique per file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
}

/// Load text documents for every selected file
///
/// `selection` holds paths relative to `crate_docs_dir`. Every produced
/// document's identifier is set to that relative path, replacing whatever
/// identifier extraction assigned. Cross-file ordering of the result is
/// not significant.
pub async fn load_documents(
    crate_docs_dir: &Path,
    selection: &[PathBuf],
) -> Result<Vec<Document>> {
    let per_file: Vec<Vec<Document>> = stream::iter(selection.iter().cloned())
        .map(|rel_path| {
            let file_path = crate_docs_dir.join(&rel_path);
            async move {
                let mut documents = tokio::task::spawn_blocking(move || extract_file(&file_path))
                    .await
                    .map_err(|e| ServerError::extraction(format!("extraction task failed: {e}")))??;

                // Identifiers from extraction are replaced with the
                // root-relative source path.
                let id = rel_path.to_string_lossy().into_owned();
                for doc in &mut documents {
                    doc.id = id.clone();
                }
                Ok::<_, ServerError>(documents)
            }
        })
        .buffer_unordered(EXTRACT_CONCURRENCY)
        .try_collect()
        .await?;

    let documents: Vec<Document> = per_file.into_iter().flatten().collect();

    tracing::info!(documents = documents.len(), files = selection.len(), "loaded corpus");
    Ok(documents)
}

/// Extract text documents from one HTML file
///
/// Black-box extraction step: parses the file and pulls the text of the
/// rustdoc main content section. Produces zero documents when the section
/// is absent or empty.
fn extract_file(path: &Path) -> Result<Vec<Document>> {
    let html = std::fs::read_to_string(path)?;
    let selector = Selector::parse(MAIN_CONTENT_SELECTOR)
        .map_err(|e| ServerError::extraction(e.to_string()))?;

    let parsed = Html::parse_document(&html);
    let mut documents = Vec::new();

    for element in parsed.select(&selector) {
        let text: String = element
            .text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<&str>>()
            .join("\n");

        if !text.is_empty() {
            documents.push(Document {
                // Placeholder identifier; the loader assigns the final one.
                id: path.to_string_lossy().into_owned(),
                content: text,
            });
        }
    }

    Ok(documents)
}
