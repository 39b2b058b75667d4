//! Truncated-JSON recovery.
//!
//! When the model stops at its token ceiling the JSON it was writing is left
//! open. This pass restores syntactic balance only: it closes a dangling
//! string, then every open array, then every open object. Nothing is
//! validated beyond that, so a document cut after a comma or a key stays
//! unparsable and is reported as unrecoverable.
//!
//! Closers are always emitted as all `]` first, then all `}`. That is only
//! right when the arrays are the innermost open scopes; a cut inside an object
//! that sits in an array gets its closers in the wrong order and recovery
//! returns `None`.

use serde_json::Value;

/// Appends the closers a truncated JSON text is missing.
pub fn close_truncated_json(text: &str) -> String {
    let mut open_braces: usize = 0;
    let mut open_brackets: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => open_braces += 1,
            '}' => open_braces = open_braces.saturating_sub(1),
            '[' => open_brackets += 1,
            ']' => open_brackets = open_brackets.saturating_sub(1),
            _ => {}
        }
    }

    let mut repaired = String::with_capacity(text.len() + open_brackets + open_braces + 1);
    repaired.push_str(text);
    if in_string {
        repaired.push('"');
    }
    repaired.extend(std::iter::repeat(']').take(open_brackets));
    repaired.extend(std::iter::repeat('}').take(open_braces));
    repaired
}

/// Closes and re-parses a truncated JSON text.
/// Returns `None` when the repaired text still is not valid JSON.
pub fn recover_truncated_json(text: &str) -> Option<Value> {
    serde_json::from_str(&close_truncated_json(text)).ok()
}
