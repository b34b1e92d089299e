//! Character classes and keyword tables shared by the parser and the writer.
//!
//! Identifiers follow the XML `Name` production without `:` and `.`, so
//! that `key:value` and `$a.b` stay unambiguous.

use phf::phf_map;

/// Reserved words that parse as something other than text.
pub static KEYWORDS: phf::Map<&'static str, bool> = phf_map! {
    "true" => true,
    "false" => false,
};

/// The boolean a bare word denotes, if it is a keyword.
#[inline]
pub fn keyword(word: &str) -> Option<bool> {
    KEYWORDS.get(word).copied()
}

#[inline]
pub fn is_ident_start(c: char) -> bool {
    matches!(c,
        'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

#[inline]
pub fn is_ident_char(c: char) -> bool {
    is_ident_start(c)
        || matches!(c,
            '-' | '0'..='9'
            | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

/// Whether `text` can be written as a bare identifier.
pub fn is_ident(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => chars.all(is_ident_char),
        _ => false,
    }
}

/// Whether `text` round-trips as bare (unquoted) text.
#[inline]
pub fn is_bare_text(text: &str) -> bool {
    is_ident(text) && keyword(text).is_none()
}

/// Intra-line whitespace.
#[inline]
pub fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

#[inline]
pub fn is_newline(c: char) -> bool {
    c == '\n' || c == '\r'
}

#[inline]
pub fn is_whitespace(c: char) -> bool {
    is_space(c) || is_newline(c)
}

/// Item separators inside a block.
#[inline]
pub fn is_separator(c: char) -> bool {
    c == ',' || c == ';' || is_newline(c)
}

#[inline]
pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Chars of the standard base-64 alphabet, padding included.
#[inline]
pub fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='
}

/// Chars that must be backslash-escaped inside markup text.
#[inline]
pub fn is_markup_special(c: char) -> bool {
    matches!(c, '\\' | '[' | ']' | '{' | '}' | '@')
}
