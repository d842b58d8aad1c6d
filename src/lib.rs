//! Format-aware search engine: extracts text units from documents,
//! spreadsheets, presentations, PDFs, email and nested archives, and matches
//! search terms against them with precise in-unit offsets.
//!
//! The library surface is [`search`]: give it a path, terms, and a
//! [`SearchOptions`], get back located [`MatchedLine`] records. Everything
//! else (walking directories, merging parallel results, rendering) belongs
//! to the caller; the binary in this crate is one such caller.

pub mod cancel;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod extractors;
pub mod locator;
pub mod matcher;
pub mod options;
pub mod walker;

pub use cancel::CancelToken;
pub use dispatch::{extractor_for, search, ExtractorKind};
pub use error::{DocgrepError, Result};
pub use matcher::{MatchedLine, Matcher, WindowStyle};
pub use options::SearchOptions;
pub use walker::{matches_extensions, searchable_files, WalkOptions};
