//! Shared fixtures: a deterministic fake provider and a rustdoc-like tree

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rustdocs_mcp::config::Config;
use rustdocs_mcp::error::Result;
use rustdocs_mcp::provider::Provider;
use tempfile::TempDir;

/// Deterministic provider that counts its calls
///
/// Embeddings are a fixed-dimension bag-of-bytes profile, so similar texts
/// land close together and retrieval is reproducible. Answers echo the
/// user prompt, so two responses are equal exactly when the same passage
/// was retrieved for the same question.
#[derive(Default)]
pub struct FakeProvider {
    pub embed_calls: AtomicUsize,
    pub answer_calls: AtomicUsize,
}

#[async_trait]
impl Provider for FakeProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        let mut vector = vec![0.0f32; 8];
        for byte in text.bytes() {
            vector[(byte % 8) as usize] += 1.0;
        }
        Ok(vector)
    }

    async fn answer(&self, _system: &str, user: &str) -> Result<String> {
        self.answer_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("echo[{user}]"))
    }
}

/// Test environment: a docs tree for crate `mylib` plus an index data dir
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub docs_root: PathBuf,
    pub data_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let docs_root = temp_dir.path().join("doc");
        let data_dir = temp_dir.path().join("data");

        let mylib = docs_root.join("mylib");
        fs::create_dir_all(mylib.join("sub")).unwrap();
        fs::write(mylib.join("index.html"), page("mylib landing page")).unwrap();
        fs::write(mylib.join("foo.html"), page("Short re-export stub for Foo.")).unwrap();
        fs::write(
            mylib.join("sub/foo.html"),
            page(
                "Struct Foo. The canonical documentation page for Foo, \
                 with fields, methods and examples. Much longer than the stub.",
            ),
        )
        .unwrap();
        fs::write(mylib.join("bar.html"), page("Unique page for bar.")).unwrap();

        Self {
            temp_dir,
            docs_root,
            data_dir,
        }
    }

    pub fn config(&self) -> Config {
        Config {
            docs_root: self.docs_root.clone(),
            crate_name: "mylib".to_string(),
            all_files: false,
            data_dir: self.data_dir.clone(),
            embedding_model: "fake-embed".to_string(),
            llm_model: "fake-llm".to_string(),
            api_base: None,
        }
    }

    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("mylib")
    }
}

/// Minimal rustdoc-shaped page whose main content is `body`
pub fn page(body: &str) -> String {
    format!(
        "<html><body><section id=\"main-content\" class=\"content\"><p>{body}</p></section></body></html>"
    )
}
