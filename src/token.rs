//! Session token codec
//!
//! A token is the pipe-delimited triple `"<segment>|<offset>|<identifier>"`,
//! e.g. `"4|314|pablo667"`. The codec is pure string work: bounds and
//! identity checks against the store are the session manager's job.
//!
//! Identifiers must not contain the delimiter; escaping is the caller's
//! responsibility before the identifier reaches this module.

use crate::error::{Error, Result};
use crate::store::SlotRef;

/// Field separator within a token
pub const DELIMITER: char = '|';

/// Build the client-held token for a slot and its identifier
pub fn encode(slot: SlotRef, identifier: &str) -> String {
    format!("{}{}{}{}{}", slot.segment, DELIMITER, slot.offset, DELIMITER, identifier)
}

/// Split a token back into its slot reference and identifier
///
/// Fails with [`Error::MalformedToken`] unless the token has exactly three
/// fields and the first two parse as non-negative integers.
pub fn decode(token: &str) -> Result<(SlotRef, &str)> {
    let parts: Vec<&str> = token.split(DELIMITER).collect();
    if parts.len() != 3 {
        return Err(Error::MalformedToken(format!(
            "expected 3 fields, got {}",
            parts.len()
        )));
    }
    let segment = parse_index(parts[0])?;
    let offset = parse_index(parts[1])?;
    Ok((SlotRef::new(segment, offset), parts[2]))
}

fn parse_index(field: &str) -> Result<usize> {
    field
        .parse()
        .map_err(|_| Error::MalformedToken(format!("{:?} is not a slot index", field)))
}
