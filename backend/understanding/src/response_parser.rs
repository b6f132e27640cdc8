//! Turn the oracle's free-form reply into raw `[field, value]` entries.

use once_cell::sync::Lazy;
use regex::Regex;
use scaleslip_core::{RawEntry, SlipError};

use crate::literal::parse_list_prefix;

/// First `[[ ... ]]`-shaped span in the reply; whitespace and newlines allowed.
static LIST_OF_LISTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[\s*\[.*?\]\s*\]").unwrap());

/// Locate the embedded list of pairs in `reply` and parse it.
///
/// Commentary before and after the list is ignored. Every failure, including
/// syntax errors inside the list, becomes [`SlipError::ParseFailure`].
pub fn parse_response(reply: &str) -> Result<Vec<RawEntry>, SlipError> {
    let found = LIST_OF_LISTS_RE
        .find(reply)
        .ok_or_else(|| SlipError::parse("No list found in model output.", reply))?;

    let (entries, _) = parse_list_prefix(&reply[found.start()..])
        .map_err(|e| SlipError::parse(e.to_string(), reply))?;
    Ok(entries)
}
