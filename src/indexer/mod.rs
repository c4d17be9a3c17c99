//! Source discovery for the workspace index
//!
//! Walks a workspace root, detects source languages and loads file contents
//! for the symbol providers to parse.

mod file_info;
mod file_walker;
mod language;

pub use file_info::FileInfo;
pub use file_walker::FileWalker;
pub use language::SourceLanguage;
