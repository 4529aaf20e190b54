//! RFC 2047 header decoding.
//!
//! Subjects and display names arrive as `=?charset?enc?payload?=` encoded
//! words, often split across several segments with mixed charsets. Each
//! segment is decoded with its declared charset and the pieces are joined
//! with single spaces. Nothing in here ever fails: unknown charsets fall
//! back to a lossy UTF-8 read, invalid bytes become replacement characters,
//! and structurally broken tokens are kept as literal text, so one mangled
//! header never costs a scan a message.

use tracing::warn;

/// Decode a raw header value into display text.
///
/// Plain runs and decoded encoded-words are concatenated with single-space
/// separators; folding whitespace inside plain runs is collapsed. Empty
/// input yields an empty string.
pub fn decode_header(raw: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut plain = String::new();
    let mut rest = raw;

    while let Some(start) = rest.find("=?") {
        let (before, tail) = rest.split_at(start);
        plain.push_str(before);
        match take_encoded_word(tail) {
            Some((decoded, remainder)) => {
                flush_plain(&mut plain, &mut parts);
                parts.push(decoded);
                rest = remainder;
            }
            None => {
                // Not a well-formed encoded word; keep the marker literally.
                plain.push_str("=?");
                rest = &tail[2..];
            }
        }
    }
    plain.push_str(rest);
    flush_plain(&mut plain, &mut parts);

    parts.join(" ")
}

/// Push the collapsed plain-text run, if any, and reset the accumulator.
fn flush_plain(plain: &mut String, parts: &mut Vec<String>) {
    let collapsed = plain.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        parts.push(collapsed);
    }
    plain.clear();
}

/// Parse one `=?charset?enc?payload?=` token at the start of `input`,
/// returning the decoded text and the remainder after the closing `?=`.
fn take_encoded_word(input: &str) -> Option<(String, &str)> {
    let body = input.strip_prefix("=?")?;
    let (charset, body) = body.split_once('?')?;
    let (encoding, body) = body.split_once('?')?;
    let (payload, remainder) = body.split_once("?=")?;

    let bytes = match encoding {
        "B" | "b" => base64_decode(payload)?,
        "Q" | "q" => q_decode(payload),
        _ => return None,
    };
    Some((decode_charset(&bytes, charset), remainder))
}

/// Decode `bytes` with the labelled charset, lossily.
fn decode_charset(bytes: &[u8], charset: &str) -> String {
    match encoding_rs::Encoding::for_label(charset.trim().as_bytes()) {
        Some(encoding) => {
            let (text, _, had_errors) = encoding.decode(bytes);
            if had_errors {
                warn!("invalid bytes in {charset} header segment, substituted");
            }
            text.into_owned()
        }
        None => {
            warn!("unknown charset label {charset:?} in header, decoding as UTF-8");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

fn base64_value(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Decode base64, tolerating padding and embedded whitespace.
/// Returns `None` on any byte outside the alphabet.
fn base64_decode(input: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() / 4 * 3);
    let mut buffer = 0u32;
    let mut bits = 0u8;
    for &byte in input.as_bytes() {
        if byte == b'=' || byte.is_ascii_whitespace() {
            continue;
        }
        buffer = (buffer << 6) | u32::from(base64_value(byte)?);
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
    }
    Some(out)
}

/// Q-encoding: `_` is a space, `=XX` a hex-escaped byte, the rest literal.
fn q_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < bytes.len() => {
                let hex = &input[i + 1..i + 3];
                match u8::from_str_radix(hex, 16) {
                    Ok(value) => {
                        out.push(value);
                        i += 3;
                    }
                    Err(_) => {
                        out.push(b'=');
                        i += 1;
                    }
                }
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    out
}
