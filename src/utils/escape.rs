use quick_xml::escape::{escape, partial_escape};
use std::borrow::Cow;

/// Escape text content (`&`, `<`, `>`); quotes are left alone.
#[inline]
pub(crate) fn escape_text(raw: &str) -> Cow<'_, str> {
    partial_escape(raw)
}

/// Escape a value placed inside a double-quoted attribute.
#[inline]
pub(crate) fn escape_attribute(raw: &str) -> Cow<'_, str> {
    escape(raw)
}
