//! rustdocs-mcp - Question answering over one crate's rustdoc HTML
//!
//! Library modules for the MCP server

pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod loader;
pub mod provider;
pub mod server;
