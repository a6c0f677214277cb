//! Structured paging events extracted from trace lines.

/// Which paging operation a trace line reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Page read back from the swap file
    In,
    /// Page written out to the swap file
    Out,
}

/// A single swap-in or swap-out transfer for one process
///
/// Only `parse_line` builds these from trace text; tests and callers
/// that already hold structured data use `PagingEvent::new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingEvent {
    pub direction: Direction,

    /// Size of the transfer in bytes
    pub byte_count: u64,

    /// Command name with the trailing `.pid` removed
    pub process_key: String,

    pub process_id: u32,
}

impl PagingEvent {
    pub fn new(
        direction: Direction,
        byte_count: u64,
        process_key: impl Into<String>,
        process_id: u32,
    ) -> Self {
        Self {
            direction,
            byte_count,
            process_key: process_key.into(),
            process_id,
        }
    }
}
