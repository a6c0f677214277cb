//! Trace line parsing.
//!
//! This module handles:
//! - Reassembling complete lines from chunked tracer output
//! - Recognising swap-file paging lines
//! - Extracting per-process paging events

pub mod event;
pub mod fs_usage;
pub mod lines;

// Re-export main types
pub use event::{Direction, PagingEvent};
pub use fs_usage::{parse_hex_bytes, parse_line, try_parse_line};
pub use lines::LineReassembler;
