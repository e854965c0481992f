//! Shared helpers for unit tests.

use crate::session::Session;

/// Feed every char of `text` through the session's input hook, as if the
/// user typed it.
pub fn type_str(session: &mut Session, text: &str) {
    for ch in text.chars() {
        session.on_before_input(ch).expect("input");
    }
}
