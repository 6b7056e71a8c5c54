//! Server configuration
//!
//! Startup parameters come from two places: the CLI (documentation root,
//! library name, all-files switch) and the environment (provider
//! credentials, model names, data directory override).

use std::env;
use std::path::PathBuf;

use crate::error::{Result, ServerError};

/// Server configuration, fixed for the lifetime of the process
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory containing one subdirectory per crate's rustdoc HTML
    pub docs_root: PathBuf,
    /// Name of the single crate this instance serves
    pub crate_name: String,
    /// Index every candidate file instead of collapsing duplicate groups
    pub all_files: bool,
    /// Directory holding per-crate persisted index artifacts
    pub data_dir: PathBuf,
    /// Embedding model name
    pub embedding_model: String,
    /// Chat completion model name
    pub llm_model: String,
    /// Optional OpenAI-compatible API base URL
    pub api_base: Option<String>,
}

impl Config {
    /// Build the configuration from CLI arguments plus environment variables
    ///
    /// Supported environment variables:
    /// - OPENAI_API_KEY: provider credentials (required)
    /// - OPENAI_API_BASE: alternative OpenAI-compatible endpoint
    /// - EMBEDDING_MODEL: embedding model (default: text-embedding-3-small)
    /// - LLM_MODEL: completion model (default: gpt-4o-mini)
    /// - DATA_DIR: index storage directory (default: platform data dir)
    pub fn from_env(docs_root: PathBuf, crate_name: String, all_files: bool) -> Result<Self> {
        if env::var("OPENAI_API_KEY").is_err() {
            return Err(ServerError::MissingEnvVar("OPENAI_API_KEY".to_string()));
        }

        if crate_name.trim().is_empty() {
            return Err(ServerError::config("crate name must not be empty"));
        }

        let data_dir = match env::var("DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_data_dir(),
        };

        Ok(Self {
            docs_root,
            crate_name,
            all_files,
            data_dir,
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            api_base: env::var("OPENAI_API_BASE").ok(),
        })
    }

    /// Directory containing this crate's documentation tree
    pub fn crate_docs_dir(&self) -> PathBuf {
        self.docs_root.join(&self.crate_name)
    }

    /// Storage location for this crate's persisted index artifacts
    ///
    /// Keyed by crate name alone; one location per served identity.
    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join(&self.crate_name)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    if let Some(dirs) = directories::ProjectDirs::from("com", "rustdocs-mcp", "rustdocs-mcp") {
        dirs.data_dir().to_path_buf()
    } else {
        // Fallback to current directory
        PathBuf::from("./data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            docs_root: PathBuf::from("/tmp/doc"),
            crate_name: "serde".to_string(),
            all_files: false,
            data_dir: PathBuf::from("/tmp/data"),
            embedding_model: "text-embedding-3-small".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            api_base: None,
        }
    }

    #[test]
    fn test_crate_docs_dir() {
        let config = test_config();
        assert_eq!(config.crate_docs_dir(), PathBuf::from("/tmp/doc/serde"));
    }

    #[test]
    fn test_index_dir_keyed_by_crate() {
        let config = test_config();
        assert_eq!(config.index_dir(), PathBuf::from("/tmp/data/serde"));
    }
}
