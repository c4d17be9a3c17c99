//! # Type Context - Minimal Type Declarations for Code Generation
//!
//! Given a function signature inside a source file, type-context collects the
//! declarations a code-generation model needs to write that function: the
//! owning type, parameter and return types, and one nested level of member
//! types, each rendered together with the impl blocks written for it.
//!
//! ## Overview
//!
//! Symbol resolution is delegated to a [`provider::SymbolProvider`]. Two
//! in-process providers are built on tree-sitter: Rust (trait/impl model)
//! and Java (class model). The driver in [`context`] is language-agnostic.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐
//! │ ContextMcpServer │   │  type-context    │
//! │  (rmcp, stdio)   │   │  CLI (clap)      │
//! └────────┬─────────┘   └────────┬─────────┘
//!          └───────────┬──────────┘
//!             ┌────────▼────────┐
//!             │  ContextClient  │  (timeout, rayon batch)
//!             └────────┬────────┘
//!             ┌────────▼────────┐
//!             │ extract_context │  (visited set, accumulator)
//!             └────────┬────────┘
//!             ┌────────▼────────┐
//!             │ SymbolProvider  │  (Rust / Java, tree-sitter)
//!             └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`context`]: extraction driver, forest builder and context accumulator
//! - [`provider`]: symbol provider trait and the tree-sitter backends
//! - [`client`]: async library client and batch helper
//! - [`mcp_server`]: MCP protocol server implementation with tools and prompts
//! - [`indexer`]: workspace file walking and language detection
//! - [`config`]: configuration management with environment variable support
//! - [`types`]: request/response types with JSON schema
//! - [`error`]: error types
//! - [`paths`]: path normalization utilities
//!
//! ## Usage Example
//!
//! ```no_run
//! use type_context::{ContextClient, ExtractRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ContextClient::new()?;
//!     let request = ExtractRequest::new(".", "src/model.rs", "pub fn area(&self) -> f64");
//!     println!("{}", client.extract(request).await?.context);
//!     Ok(())
//! }
//! ```

/// Async library client with batch extraction
pub mod client;

/// Configuration management with environment variable overrides
pub mod config;

/// Type-context extraction driver, forest builder and accumulator
pub mod context;

/// Error types and utilities
pub mod error;

/// Glob pattern matching for excluded paths
pub mod glob_utils;

/// Workspace file walking and language detection
pub mod indexer;

/// MCP server implementation with tools and prompts
pub mod mcp_server;

/// Path normalization and utility functions
pub mod paths;

/// Symbol providers answering declaration and definition queries
pub mod provider;

/// Request/response types with JSON schema definitions
pub mod types;

pub use client::ContextClient;
pub use config::Config;
pub use context::{ExtractOptions, Extraction, extract_context};
pub use error::{ContextError, ProviderError};
pub use types::{BatchExtractResult, ExtractRequest, ExtractResponse};
