//! Note text sanitization.
//!
//! Notes are copied out of untrusted audit documents and rendered by the
//! flowchart UI. They must be plain, single-line, printable text: escape
//! sequences and control characters are dropped, and line breaks and tabs
//! fold into single spaces.

use std::borrow::Cow;
use std::iter::Peekable;

/// ASCII escape character that starts ANSI sequences.
const ESC: char = '\x1b';
/// ASCII bell character that can terminate OSC sequences.
const BEL: char = '\x07';

/// Sanitize text for use as a single-line node note.
///
/// Strips:
/// - ANSI escape sequences (CSI, OSC, etc.)
/// - C0 and C1 control characters and DEL
/// - Bidirectional formatting controls (embeddings, overrides, isolates, marks)
///
/// Folds every whitespace run (including `\n`, `\t`, `\r`) into one space and
/// trims both ends.
///
/// Returns `Cow::Borrowed` when the input is already clean.
///
/// # Examples
///
/// ```
/// use gradmap_types::sanitize_note_text;
///
/// assert_eq!(sanitize_note_text("CPSC 120 (A.1)"), "CPSC 120 (A.1)");
/// assert_eq!(sanitize_note_text(" Waived\n\tby\x1b[31m dept "), "Waived by dept");
/// ```
#[must_use]
pub fn sanitize_note_text(input: &str) -> Cow<'_, str> {
    if !needs_sanitization(input) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len());
    let mut pending_space = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ESC {
            skip_escape_sequence(&mut chars);
        } else if c.is_whitespace() {
            pending_space = !result.is_empty();
        } else if is_control(c) {
            if c == '\u{009b}' {
                skip_csi_params(&mut chars);
            }
        } else if !is_bidi_control(c) {
            if pending_space {
                result.push(' ');
                pending_space = false;
            }
            result.push(c);
        }
    }

    Cow::Owned(result)
}

fn needs_sanitization(input: &str) -> bool {
    if input.starts_with(char::is_whitespace) || input.ends_with(char::is_whitespace) {
        return true;
    }
    let mut previous_space = false;
    for c in input.chars() {
        if c == ESC || c == BEL || is_control(c) || is_bidi_control(c) {
            return true;
        }
        if c.is_whitespace() {
            if c != ' ' || previous_space {
                return true;
            }
            previous_space = true;
        } else {
            previous_space = false;
        }
    }
    false
}

/// C0 (0x00-0x1F), DEL, or C1 (0x80-0x9F).
fn is_control(c: char) -> bool {
    c <= '\x1f' || c == '\x7f' || ('\u{0080}'..='\u{009f}').contains(&c)
}

/// Characters that reorder rendered text without being visible.
fn is_bidi_control(c: char) -> bool {
    matches!(
        c,
        '\u{061c}' | '\u{200e}' | '\u{200f}' | '\u{202a}'..='\u{202e}' | '\u{2066}'..='\u{2069}'
    )
}

/// Skip an escape sequence starting after ESC.
fn skip_escape_sequence<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    let Some(&next) = chars.peek() else {
        return;
    };

    match next {
        '[' => {
            chars.next();
            skip_csi_params(chars);
        }
        ']' => {
            chars.next();
            skip_osc_sequence(chars);
        }
        'P' | '^' | '_' => {
            chars.next();
            skip_until_st(chars);
        }
        '(' | ')' | '*' | '+' | '#' | ' ' => {
            chars.next();
            chars.next();
        }
        _ => {}
    }
}

/// Skip CSI parameters until final byte (0x40-0x7E).
fn skip_csi_params<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    while let Some(&c) = chars.peek() {
        if ('\x40'..='\x7e').contains(&c) {
            chars.next();
            return;
        } else if ('\x20'..='\x3f').contains(&c) {
            chars.next();
        } else {
            return;
        }
    }
}

/// Skip OSC sequence until BEL or ST (ESC \).
fn skip_osc_sequence<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    while let Some(c) = chars.next() {
        if c == BEL {
            return;
        }
        if c == ESC && chars.peek() == Some(&'\\') {
            chars.next();
            return;
        }
    }
}

/// Skip until ST (string terminator: ESC \) for DCS/PM/APC sequences.
fn skip_until_st<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    while let Some(c) = chars.next() {
        if c == ESC && chars.peek() == Some(&'\\') {
            chars.next();
            return;
        }
    }
}
