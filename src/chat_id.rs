//! Deterministic, order-independent identity for a two-party conversation.

use uuid::Uuid;

/// Separator between the two participant ids. `_` never appears in a
/// canonical hyphenated UUID, so the key parses back unambiguously.
const SEPARATOR: char = '_';

/// `chat_id_for(a, b) == chat_id_for(b, a)`: the two canonical UUID strings
/// are sorted lexicographically and joined.
pub fn chat_id_for(a: Uuid, b: Uuid) -> String {
    let a = a.to_string();
    let b = b.to_string();
    if a <= b {
        format!("{a}{SEPARATOR}{b}")
    } else {
        format!("{b}{SEPARATOR}{a}")
    }
}

/// Parse the two participants back out of a chat id.
pub fn participants(chat_id: &str) -> Option<(Uuid, Uuid)> {
    let (lo, hi) = chat_id.split_once(SEPARATOR)?;
    Some((Uuid::parse_str(lo).ok()?, Uuid::parse_str(hi).ok()?))
}

/// Resolve the other party of a conversation relative to `me`.
pub fn other_party(chat_id: &str, me: Uuid) -> Option<Uuid> {
    let (lo, hi) = participants(chat_id)?;
    if lo == me {
        Some(hi)
    } else if hi == me {
        Some(lo)
    } else {
        None
    }
}
