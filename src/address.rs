//! Sender extraction from raw `From` headers.

use crate::decode::decode_header;

/// Split a raw `From` value into display name and lower-cased address.
///
/// `"Jane Doe" <JANE@Example.com>` yields `("Jane Doe", "jane@example.com")`.
/// A bare address derives its display name from the local part. Either way
/// the name goes through the header decoder, since display names carry
/// RFC 2047 encoded words at least as often as subjects do. Empty input
/// yields two empty strings.
pub fn parse_sender(raw: &str) -> (String, String) {
    let raw = raw.trim();
    if raw.is_empty() {
        return (String::new(), String::new());
    }

    if let (Some(open), Some(close)) = (raw.rfind('<'), raw.rfind('>')) {
        if open < close {
            let address = raw[open + 1..close].trim().to_lowercase();
            let name = decode_header(raw[..open].trim().trim_matches(['"', '\'']));
            return (name, address);
        }
    }

    let local = raw.split('@').next().unwrap_or_default();
    let name = decode_header(local);
    (name, raw.to_lowercase())
}
