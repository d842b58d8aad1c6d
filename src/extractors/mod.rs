//! Per-format content extractors.
//!
//! Each module turns one family of file formats into text units and feeds
//! them through the matcher. The archive extractor instead re-enters the
//! dispatcher for every extracted member.

pub mod archive;
pub mod docx;
pub mod email;
pub mod odf;
pub mod pdf;
pub mod pptx;
pub mod text;
pub mod xlsx;
