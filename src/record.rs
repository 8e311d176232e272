//! The bookmark record wire format
//!
//! One record per line: `<docpath> = <pageno>`, where the separator is
//! exactly the three bytes `" = "`. There is no escaping; a docpath that
//! contains the separator sequence or an embedded newline is unsupported.

/// Separator between the docpath and the page number.
pub const SEPARATOR: &str = " = ";

/// Returns the value portion of `line` when it is the record for `docpath`.
///
/// A line matches when it starts with `docpath` immediately followed by the
/// separator. The returned slice is everything after the separator, with its
/// trailing newline still attached if the line had one.
pub fn match_record<'a>(line: &'a str, docpath: &str) -> Option<&'a str> {
    line.strip_prefix(docpath)?.strip_prefix(SEPARATOR)
}

/// Formats a record line, newline-terminated.
pub fn format_record(docpath: &str, pageno: i32) -> String {
    format!("{}{}{}\n", docpath, SEPARATOR, pageno)
}

/// Parses the value portion of a record into a page number.
///
/// Returns `None` for anything that is not a base-10 integer in
/// `1..=i32::MAX`. Values outside that range (zero, negative, or wider than
/// 32 bits) mean the record is treated as absent, never clamped.
pub fn parse_pageno(value: &str) -> Option<i32> {
    let pageno: i64 = value.trim().parse().ok()?;
    if pageno < 1 || pageno > i64::from(i32::MAX) {
        return None;
    }
    Some(pageno as i32)
}
