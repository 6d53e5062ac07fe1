//! Data-anchoring messages carried by transaction outputs.
//!
//! The codec itself is external ([`PayloadCodec`]); this module only decides
//! whether a transaction carries a message and how it is presented.

use serde::{Deserialize, Serialize};

use scash_core::traits::PayloadCodec;
use scash_core::types::PayloadOutput;

/// Default preview length in characters.
pub const DEFAULT_PREVIEW_LEN: usize = 50;

/// A message recovered from a transaction's outputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadMessage {
    /// Plain text, markup and control characters removed.
    pub content: String,
    /// Every addressed output is a payload address (no payment attached).
    pub is_pure_message: bool,
    /// The sender is the wallet's own address.
    pub is_from_self: bool,
}

/// Extract the message carried by `outputs`, if any.
///
/// Returns `None` when there are no outputs, none of them pays a payload
/// address, or the codec cannot decode them.
pub fn parse_payload_message(
    codec: &dyn PayloadCodec,
    outputs: &[PayloadOutput],
    sender: &str,
    own: &str,
) -> Option<PayloadMessage> {
    let addressed = || outputs.iter().filter(|o| !o.address.is_empty());

    if !addressed().any(|o| codec.is_payload_address(&o.address)) {
        return None;
    }

    let Some(raw) = codec.decode(outputs) else {
        tracing::debug!(outputs = outputs.len(), "payload outputs did not decode");
        return None;
    };

    Some(PayloadMessage {
        content: sanitize_text(&raw),
        is_pure_message: addressed().all(|o| codec.is_payload_address(&o.address)),
        is_from_self: sender.eq_ignore_ascii_case(own),
    })
}

/// Reduce decoded text to plain text.
///
/// Markup tags (`<b>`, `</script>`, `<!-- -->`) are dropped along with every
/// control character except newline and tab. A `<` that does not open a tag
/// is kept.
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let tail = &rest[c.len_utf8()..];
        if c == '<' {
            let opens_tag = tail
                .chars()
                .next()
                .is_some_and(|n| n.is_ascii_alphabetic() || n == '/' || n == '!');
            // An unclosed tag is kept as text.
            if let Some(end) = tail.find('>').filter(|_| opens_tag) {
                rest = &tail[end + 1..];
                continue;
            }
        }
        if !c.is_control() || c == '\n' || c == '\t' {
            out.push(c);
        }
        rest = tail;
    }
    out
}

/// Truncate `text` to `max` characters, appending `...` when shortened.
pub fn payload_preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Total value locked into data outputs, in satoshis.
pub fn data_cost(outputs: &[PayloadOutput]) -> u64 {
    outputs.iter().map(|o| o.value).sum()
}
