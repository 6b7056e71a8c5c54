//! Semantic index over a crate's documentation
//!
//! The index is built once per process and is read-only afterwards. Its
//! on-disk form is a set of three co-located artifacts inside the
//! per-crate storage location:
//!
//! - `vector_store.bin` — embedding vectors, bincode
//! - `doc_store.json` — the raw text documents
//! - `index_store.json` — manifest tying the two together
//!
//! All three must be present for a reload; a missing artifact invalidates
//! the whole set and triggers a rebuild. Artifacts that are present but
//! mutually inconsistent are a fatal startup error: a corrupt index is
//! never served and never silently rebuilt over.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::corpus::select_corpus;
use crate::error::{Result, ServerError};
use crate::loader::{Document, load_documents};
use crate::provider::Provider;

/// Persisted embedding vectors, parallel to the document store
pub const VECTOR_STORE_FILE: &str = "vector_store.bin";
/// Persisted text documents
pub const DOC_STORE_FILE: &str = "doc_store.json";
/// Persisted index manifest
pub const INDEX_STORE_FILE: &str = "index_store.json";

/// Documents larger than this are skipped at embedding time; they exceed
/// the embedding model's input budget (roughly 8k tokens).
const MAX_EMBED_BYTES: usize = 32_000;

/// Manifest describing the persisted index
#[derive(Debug, Serialize, Deserialize)]
struct IndexManifest {
    crate_name: String,
    embedding_model: String,
    dimension: usize,
    /// Document identifiers in store order
    document_ids: Vec<String>,
}

/// In-memory semantic index, ready to answer queries
///
/// `documents` and `vectors` are parallel: `vectors[i]` is the embedding
/// of `documents[i]`.
pub struct SemanticIndex {
    crate_name: String,
    documents: Vec<Document>,
    vectors: Vec<(String, Vec<f32>)>,
    provider: Arc<dyn Provider>,
}

impl SemanticIndex {
    /// Produce a ready-to-query index, reusing persisted state when valid
    ///
    /// Check: all three artifacts present in the crate's storage location
    /// means Load, otherwise Rebuild. Any failure on either path aborts
    /// startup.
    pub async fn open(config: &Config, provider: Arc<dyn Provider>) -> Result<Self> {
        let index_dir = config.index_dir();
        let complete = [VECTOR_STORE_FILE, DOC_STORE_FILE, INDEX_STORE_FILE]
            .iter()
            .all(|name| index_dir.join(name).is_file());

        if complete {
            tracing::info!("loading persisted index from {}", index_dir.display());
            Self::load(config, provider, &index_dir)
        } else {
            tracing::info!("no persisted index at {}, rebuilding", index_dir.display());
            Self::rebuild(config, provider, &index_dir).await
        }
    }

    /// Reconstruct the index from the three persisted artifacts
    ///
    /// No documents are re-loaded and no provider calls occur.
    fn load(config: &Config, provider: Arc<dyn Provider>, index_dir: &Path) -> Result<Self> {
        let manifest: IndexManifest =
            serde_json::from_slice(&std::fs::read(index_dir.join(INDEX_STORE_FILE))?)?;
        let documents: Vec<Document> =
            serde_json::from_slice(&std::fs::read(index_dir.join(DOC_STORE_FILE))?)?;
        let vectors: Vec<(String, Vec<f32>)> =
            bincode::deserialize(&std::fs::read(index_dir.join(VECTOR_STORE_FILE))?)?;

        if manifest.crate_name != config.crate_name {
            return Err(ServerError::corrupt(format!(
                "index belongs to crate '{}', expected '{}'",
                manifest.crate_name, config.crate_name
            )));
        }
        // Question embeddings must come from the same model the stored
        // vectors were built with, or similarity scores are meaningless.
        if manifest.embedding_model != config.embedding_model {
            return Err(ServerError::corrupt(format!(
                "index was built with embedding model '{}', configured model is '{}'",
                manifest.embedding_model, config.embedding_model
            )));
        }
        if manifest.document_ids.len() != documents.len()
            || manifest.document_ids.len() != vectors.len()
        {
            return Err(ServerError::corrupt(format!(
                "artifact sizes disagree: manifest {}, docs {}, vectors {}",
                manifest.document_ids.len(),
                documents.len(),
                vectors.len()
            )));
        }
        for ((id, doc), (vec_id, vector)) in manifest
            .document_ids
            .iter()
            .zip(&documents)
            .zip(&vectors)
        {
            if id != &doc.id || id != vec_id {
                return Err(ServerError::corrupt(format!(
                    "identifier mismatch across artifacts: '{id}' vs '{}' vs '{vec_id}'",
                    doc.id
                )));
            }
            if vector.len() != manifest.dimension {
                return Err(ServerError::DimensionMismatch {
                    expected: manifest.dimension,
                    actual: vector.len(),
                });
            }
        }

        tracing::info!(documents = documents.len(), "index loaded from disk");
        Ok(Self {
            crate_name: config.crate_name.clone(),
            documents,
            vectors,
            provider,
        })
    }

    /// Build the index from the documentation tree and persist it
    async fn rebuild(config: &Config, provider: Arc<dyn Provider>, index_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(index_dir)?;
        clear_stale_files(index_dir)?;

        let crate_docs_dir = config.crate_docs_dir();
        if !crate_docs_dir.is_dir() {
            return Err(ServerError::config(format!(
                "documentation for '{}' not found at {}",
                config.crate_name,
                crate_docs_dir.display()
            )));
        }

        let selection = select_corpus(&crate_docs_dir, config.all_files)?;
        let loaded = load_documents(&crate_docs_dir, &selection).await?;

        let mut documents = Vec::with_capacity(loaded.len());
        let mut vectors = Vec::with_capacity(loaded.len());
        for doc in loaded {
            if doc.content.len() > MAX_EMBED_BYTES {
                tracing::warn!(
                    id = %doc.id,
                    bytes = doc.content.len(),
                    "skipping document over embedding input budget"
                );
                continue;
            }
            let vector = provider.embed(&doc.content).await?;
            vectors.push((doc.id.clone(), vector));
            documents.push(doc);
        }

        let dimension = vectors.first().map(|(_, v)| v.len()).unwrap_or(0);
        for (id, vector) in &vectors {
            if vector.len() != dimension {
                return Err(ServerError::Provider(format!(
                    "provider returned inconsistent dimensions for '{id}'"
                )));
            }
        }

        let manifest = IndexManifest {
            crate_name: config.crate_name.clone(),
            embedding_model: config.embedding_model.clone(),
            dimension,
            document_ids: documents.iter().map(|d| d.id.clone()).collect(),
        };
        persist(index_dir, &manifest, &documents, &vectors)?;

        tracing::info!(
            documents = documents.len(),
            dimension,
            "index rebuilt and persisted to {}",
            index_dir.display()
        );
        Ok(Self {
            crate_name: config.crate_name.clone(),
            documents,
            vectors,
            provider,
        })
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the index holds no documents
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Identifier of the most relevant document for a question, if any
    ///
    /// Cosine argmax over the stored vectors.
    pub async fn retrieve(&self, question: &str) -> Result<Option<&Document>> {
        if self.documents.is_empty() {
            return Ok(None);
        }

        let question_vector = self.provider.embed(question).await?;

        let mut best: Option<(usize, f32)> = None;
        for (i, (_, vector)) in self.vectors.iter().enumerate() {
            let score = cosine_similarity(&question_vector, vector);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((i, score));
            }
        }

        Ok(best.map(|(i, _)| &self.documents[i]))
    }

    /// Answer a question from the most relevant documentation passage
    ///
    /// Retrieval followed by grounded answer generation. The index is not
    /// mutated; failures are returned to the caller and never retried.
    pub async fn query(&self, question: &str) -> Result<String> {
        let Some(doc) = self.retrieve(question).await? else {
            return Ok("Could not find any relevant document context.".to_string());
        };
        tracing::debug!(id = %doc.id, "best matching document");

        let system = format!(
            "You are an expert assistant for the Rust crate '{}'. \
             Answer the user's question based *only* on the provided context. \
             If the context does not contain the answer, say so. \
             Do not make up information. Be concise.",
            self.crate_name
        );
        let user = format!(
            "Context:\n---\n{}\n---\n\nQuestion: {}",
            doc.content, question
        );

        self.provider.answer(&system, &user).await
    }
}

/// Remove leftover files from the storage location, keeping the directory
fn clear_stale_files(index_dir: &Path) -> Result<()> {
    for entry in std::fs::read_dir(index_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Write the three artifacts as a unit
///
/// Each artifact is written to a temporary name in the same directory and
/// renamed into place only after all writes succeeded.
fn persist(
    index_dir: &Path,
    manifest: &IndexManifest,
    documents: &[Document],
    vectors: &[(String, Vec<f32>)],
) -> Result<()> {
    let staged = [
        (VECTOR_STORE_FILE, bincode::serialize(vectors)?),
        (DOC_STORE_FILE, serde_json::to_vec_pretty(documents)?),
        (INDEX_STORE_FILE, serde_json::to_vec_pretty(manifest)?),
    ];

    for (name, bytes) in &staged {
        std::fs::write(index_dir.join(format!("{name}.tmp")), bytes)?;
    }
    for (name, _) in &staged {
        std::fs::rename(
            index_dir.join(format!("{name}.tmp")),
            index_dir.join(name),
        )?;
    }
    Ok(())
}

/// Cosine similarity between two vectors
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
