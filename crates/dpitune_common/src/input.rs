//! Operator input parsing
//!
//! Settings and domains arrive as line-oriented lists; blank lines are
//! noise from the upstream strategy repositories and are dropped. Port and
//! selection parsing back the two interactive prompts.

use crate::errors::TuneError;

/// Default proxy listening port when the operator's input is unusable.
pub const DEFAULT_PORT: u16 = 8080;

/// Lowest port we will bind the proxy to (privileged ports excluded).
pub const MIN_PORT: u16 = 1024;

/// Split a line-oriented list, trimming entries and dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the operator's port choice. Non-numeric input or a port outside
/// `[1024, 65535]` falls back to [`DEFAULT_PORT`] rather than failing.
pub fn parse_port(input: &str) -> u16 {
    match input.trim().parse::<u16>() {
        Ok(port) if port >= MIN_PORT => port,
        _ => DEFAULT_PORT,
    }
}

/// Parse the operator's selection as an index into the ranked list.
/// Unlike the port prompt this is fatal on bad input: installing a
/// configuration the operator did not pick is worse than stopping.
pub fn parse_selection(input: &str, len: usize) -> Result<usize, TuneError> {
    let trimmed = input.trim();
    match trimmed.parse::<usize>() {
        Ok(index) if index < len => Ok(index),
        _ => Err(TuneError::InvalidSelection {
            input: trimmed.to_string(),
            len,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_drops_blank_lines() {
        let parsed = parse_list("x.com\n\n  \ny.com\n");
        assert_eq!(parsed, vec!["x.com", "y.com"]);
    }

    #[test]
    fn list_trims_entries() {
        let parsed = parse_list("  --split 2  \n--disorder\n");
        assert_eq!(parsed, vec!["--split 2", "--disorder"]);
    }

    #[test]
    fn port_accepts_valid_range() {
        assert_eq!(parse_port("1080"), 1080);
        assert_eq!(parse_port("65535"), 65535);
        assert_eq!(parse_port(" 9090 "), 9090);
    }

    #[test]
    fn port_falls_back_on_bad_input() {
        // non-numeric and privileged ports both fall back
        assert_eq!(parse_port("abc"), DEFAULT_PORT);
        assert_eq!(parse_port("80"), DEFAULT_PORT);
        assert_eq!(parse_port(""), DEFAULT_PORT);
        assert_eq!(parse_port("70000"), DEFAULT_PORT);
        assert_eq!(parse_port("-1"), DEFAULT_PORT);
    }

    #[test]
    fn selection_accepts_in_range_index() {
        assert_eq!(parse_selection("0", 3).unwrap(), 0);
        assert_eq!(parse_selection(" 2 ", 3).unwrap(), 2);
    }

    #[test]
    fn selection_rejects_out_of_range() {
        // index equal to the list length is already out of range
        assert!(parse_selection("3", 3).is_err());
        assert!(parse_selection("10", 3).is_err());
    }

    #[test]
    fn selection_rejects_non_numeric() {
        assert!(parse_selection("first", 3).is_err());
        assert!(parse_selection("-1", 3).is_err());
        assert!(parse_selection("", 3).is_err());
    }
}
