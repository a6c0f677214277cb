//! Parser for `fs_usage -w` output lines.
//!
//! A paging line looks roughly like:
//!
//! ```text
//! 12:00:01.123  PgIn[A]  D=0x0012ab00  B=0x4000  /dev/disk1s4  /private/var/vm/swapfile0  0.000120 W Safari.4711
//! ```
//!
//! Column positions drift between macOS releases, so apart from the
//! operation tag in column 1 everything is found by a forward scan over
//! flagged tokens.

use super::event::{Direction, PagingEvent};
use crate::utils::config::{
    BYTES_PREFIX, DESCRIPTOR_DELIMITER, PAGE_IN_TAG, PAGE_OUT_TAG, SWAPFILE_MARKER,
};
use crate::utils::error::ParseError;
use log::{trace, warn};

/// Parse one trace line into a paging event
///
/// **Public** - main entry point for the parser
///
/// Irrelevant lines are dropped silently. Lines that look like swap paging
/// but can't be decoded are logged at warn level and dropped.
pub fn parse_line(line: &str) -> Option<PagingEvent> {
    match try_parse_line(line) {
        Ok(event) => event,
        Err(e) => {
            warn!("Discarding trace line: {}", e);
            None
        }
    }
}

/// Parse one trace line, reporting ambiguous lines as errors
///
/// # Returns
/// * `Ok(Some(event))` - swap paging line
/// * `Ok(None)` - anything else the tracer prints
///
/// # Errors
/// * `ParseError::MissingDelimiter` - no `W` column before the process descriptor
/// * `ParseError::InvalidProcessId` - descriptor has no numeric `.pid` suffix
pub fn try_parse_line(line: &str) -> Result<Option<PagingEvent>, ParseError> {
    let columns: Vec<&str> = line.split_whitespace().collect();

    if columns.len() < 3 || !is_paging_tag(columns[1]) {
        return Ok(None);
    }

    if !line.contains(SWAPFILE_MARKER) {
        trace!("Skipping non-swapfile paging: {}", line);
        return Ok(None);
    }

    let delimiter = columns
        .iter()
        .position(|c| *c == DESCRIPTOR_DELIMITER)
        .ok_or_else(|| ParseError::MissingDelimiter(line.to_string()))?;

    // The descriptor may itself contain spaces
    let descriptor = columns[delimiter + 1..].join(" ");
    let (process_key, process_id) = split_descriptor(&descriptor)?;

    let mut direction = Direction::In;
    let mut byte_count = 0;

    for column in &columns {
        // PgOut does not start with PgIn, so the order of checks is irrelevant
        if column.starts_with(PAGE_IN_TAG) {
            direction = Direction::In;
        } else if column.starts_with(PAGE_OUT_TAG) {
            direction = Direction::Out;
        }

        if let Some(hex) = column.strip_prefix(BYTES_PREFIX) {
            byte_count = parse_hex_bytes(hex);
        }
    }

    Ok(Some(PagingEvent {
        direction,
        byte_count,
        process_key,
        process_id,
    }))
}

/// Decode the value of a `B=` column
///
/// Accepts an optional `0x` prefix and reads the leading hex digits.
/// Anything undecodable counts as zero bytes rather than dropping the event.
pub fn parse_hex_bytes(value: &str) -> u64 {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    let end = digits
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(digits.len());

    u64::from_str_radix(&digits[..end], 16).unwrap_or(0)
}

fn is_paging_tag(column: &str) -> bool {
    column.starts_with(PAGE_IN_TAG) || column.starts_with(PAGE_OUT_TAG)
}

/// Split `command.name.pid` into `("command.name", pid)`
///
/// **Private** - internal helper for try_parse_line
fn split_descriptor(descriptor: &str) -> Result<(String, u32), ParseError> {
    let Some((command, pid)) = descriptor.rsplit_once('.') else {
        return Err(ParseError::InvalidProcessId(descriptor.to_string()));
    };

    let pid = pid
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidProcessId(descriptor.to_string()))?;

    Ok((command.to_string(), pid))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWAP_IN: &str = "12:00:01.123  PgIn[A]  D=0x0012ab00  B=0x4000  /dev/disk1s4  /private/var/vm/swapfile0  0.000120 W Safari.4711";

    #[test]
    fn test_parse_swap_in_line() {
        let event = parse_line(SWAP_IN).unwrap();
        assert_eq!(event.direction, Direction::In);
        assert_eq!(event.byte_count, 0x4000);
        assert_eq!(event.process_key, "Safari");
        assert_eq!(event.process_id, 4711);
    }

    #[test]
    fn test_parse_requires_swapfile() {
        let line = "12:00:01.123  PgIn[A]  B=0x4000  /Applications/Safari.app  0.000120 W Safari.4711";
        assert_eq!(parse_line(line), None);
    }

    #[test]
    fn test_missing_delimiter_is_error() {
        let line = "12:00:01.123  PgOut  B=0x4000  /private/var/vm/swapfile0  0.000120  Safari.4711";
        assert!(matches!(
            try_parse_line(line),
            Err(ParseError::MissingDelimiter(_))
        ));
        assert_eq!(parse_line(line), None);
    }

    #[test]
    fn test_descriptor_without_pid() {
        let line = "t  PgOut  B=0x10  /private/var/vm/swapfile0 W kernel_task";
        assert!(matches!(
            try_parse_line(line),
            Err(ParseError::InvalidProcessId(_))
        ));

        let line = "t  PgOut  B=0x10  /private/var/vm/swapfile0 W kernel.task";
        assert!(matches!(
            try_parse_line(line),
            Err(ParseError::InvalidProcessId(_))
        ));
    }

    #[test]
    fn test_descriptor_with_spaces_and_dots() {
        let line = "t  PgOut  B=0x1000  /private/var/vm/swapfile1 W Google Chrome Helper.app.812";
        let event = parse_line(line).unwrap();
        assert_eq!(event.direction, Direction::Out);
        assert_eq!(event.process_key, "Google Chrome Helper.app");
        assert_eq!(event.process_id, 812);
    }

    #[test]
    fn test_parse_hex_bytes() {
        assert_eq!(parse_hex_bytes("FF"), 255);
        assert_eq!(parse_hex_bytes("0x1000"), 4096);
        assert_eq!(parse_hex_bytes("0X1a"), 26);
        assert_eq!(parse_hex_bytes("1Azz"), 26);
        assert_eq!(parse_hex_bytes(""), 0);
        assert_eq!(parse_hex_bytes("zz"), 0);
        assert_eq!(parse_hex_bytes("1FFFFFFFFFFFFFFFF"), 0);
    }

    #[test]
    fn test_bad_byte_count_keeps_event() {
        let line = "t  PgIn  B=nothex  /private/var/vm/swapfile0 W foo.1";
        let event = parse_line(line).unwrap();
        assert_eq!(event.byte_count, 0);
    }

    #[test]
    fn test_last_direction_flag_wins() {
        let line = "t  PgIn  PgOut  B=0x10  /private/var/vm/swapfile0 W foo.1";
        assert_eq!(parse_line(line).unwrap().direction, Direction::Out);

        let line = "t  PgOut  PgIn  B=0x10  /private/var/vm/swapfile0 W foo.1";
        assert_eq!(parse_line(line).unwrap().direction, Direction::In);
    }

    #[test]
    fn test_short_or_untagged_lines() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("PgIn /VM/swapfile"), None);
        assert_eq!(parse_line("t RdData /private/var/vm/swapfile0 W foo.1"), None);
    }
}
