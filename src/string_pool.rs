//! The string pool (`ResStringPool`) chunk.
//!
//! A pool stores every string once, either as UTF-8 or UTF-16, plus optional style runs that
//! mark up sub-ranges of a string with tag names (which are themselves pool strings).
//! Styled strings are rendered back into an HTML-like form: `Hello <b>world</b>`.

use crate::err::{ArscError, Result};
use crate::utils::bytes;
use crate::utils::{ByteCursor, decode_cesu8, escape_attribute, escape_text};

use log::{debug, trace, warn};

const STRING_POOL_HEADER: u32 = 0x001C_0001;
const UTF8_FLAG: u32 = 0x0000_0100;
const STYLE_END: u32 = 0xFFFF_FFFF;

/// One styled range inside a string. Offsets are UTF-16 code-unit indices, `end` inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSpan {
    pub tag: String,
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Default, Clone)]
pub struct StringPool {
    string_offsets: Vec<u32>,
    strings: Vec<u8>,
    style_offsets: Vec<u32>,
    styles: Vec<u32>,
    is_utf8: bool,
}

impl StringPool {
    /// Read a string pool chunk at the cursor position, leaving the cursor at the end of the
    /// chunk. A single leading null chunk word is tolerated.
    pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> Result<StringPool> {
        let mut start = cursor.pos();
        let mut header = cursor.u32_named("string pool header")?;
        if header == 0 {
            trace!("Offset `0x{start:08x}`: skipping null chunk before string pool");
            start = cursor.pos();
            header = cursor.u32_named("string pool header")?;
        }

        if header != STRING_POOL_HEADER {
            return Err(ArscError::InvalidStringPoolHeader {
                found: header,
                offset: start as u64,
            });
        }

        let chunk_size = cursor.u32_named("string pool size")? as usize;
        let string_count = cursor.u32_named("string count")? as usize;
        let style_count = cursor.u32_named("style count")? as usize;
        let flags = cursor.u32_named("string pool flags")?;
        let strings_start = cursor.u32_named("strings start")? as usize;
        let styles_start = cursor.u32_named("styles start")? as usize;

        let string_offsets = cursor.u32_vec(string_count, "string offsets")?;
        let style_offsets = cursor.u32_vec(style_count, "style offsets")?;

        let buf = cursor.buf();
        let strings = if string_count == 0 {
            Vec::new()
        } else {
            let strings_end = if styles_start == 0 {
                chunk_size
            } else {
                styles_start
            };
            let len = strings_end.saturating_sub(strings_start);
            bytes::slice_r(buf, start + strings_start, len, "string data")?.to_vec()
        };

        let styles = if style_count == 0 || styles_start == 0 {
            Vec::new()
        } else {
            let len = chunk_size.saturating_sub(styles_start);
            if len % 4 != 0 {
                debug!("string pool styles end with {} unaligned bytes", len % 4);
            }
            bytes::read_u32_vec_le_r(buf, start + styles_start, len / 4, "style data")?
        };

        cursor.set_pos(start + chunk_size, "end of string pool")?;

        trace!(
            "string pool: {} strings, {} styles, utf8: {}",
            string_count,
            style_count,
            flags & UTF8_FLAG != 0
        );

        Ok(StringPool {
            string_offsets,
            strings,
            style_offsets,
            styles,
            is_utf8: flags & UTF8_FLAG != 0,
        })
    }

    pub fn len(&self) -> usize {
        self.string_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.string_offsets.is_empty()
    }

    pub fn is_utf8(&self) -> bool {
        self.is_utf8
    }

    /// Decode the raw (unstyled) string at `index`.
    ///
    /// Returns `None` for an out-of-range index or undecodable data; the latter is logged.
    pub fn get_string(&self, index: usize) -> Option<String> {
        let offset = *self.string_offsets.get(index)? as usize;

        let decoded = if self.is_utf8 {
            self.decode_utf8_at(offset)
        } else {
            self.decode_utf16_at(offset)
        };

        if decoded.is_none() {
            warn!("failed to decode string at index {index} (offset {offset})");
        }
        decoded
    }

    fn decode_utf8_at(&self, offset: usize) -> Option<String> {
        // The UTF-16 length comes first and is not needed.
        let (_, skip) = utf8_length(&self.strings, offset)?;
        let (len, width) = utf8_length(&self.strings, offset + skip)?;
        let data = bytes::slice(&self.strings, offset + skip + width, len)?;

        match std::str::from_utf8(data) {
            Ok(s) => Some(s.to_owned()),
            Err(_) => decode_cesu8(data),
        }
    }

    fn decode_utf16_at(&self, offset: usize) -> Option<String> {
        let (len, width) = utf16_length(&self.strings, offset)?;
        let units = bytes::read_u16_vec_le_r(&self.strings, offset + width, len, "string data").ok()?;
        String::from_utf16(&units).ok()
    }

    /// The style runs attached to the string at `index`.
    ///
    /// A run whose word count is zero or not a multiple of three is treated as unstyled.
    pub fn style_spans(&self, index: usize) -> Vec<StyleSpan> {
        let Some(&offset) = self.style_offsets.get(index) else {
            return Vec::new();
        };

        let first = offset as usize / 4;
        let words: Vec<u32> = self
            .styles
            .iter()
            .skip(first)
            .take_while(|&&w| w != STYLE_END)
            .copied()
            .collect();

        if words.is_empty() || words.len() % 3 != 0 {
            return Vec::new();
        }

        words
            .chunks_exact(3)
            .filter_map(|triplet| {
                let tag = self.get_string(triplet[0] as usize)?;
                Some(StyleSpan {
                    tag,
                    start: triplet[1],
                    end: triplet[2],
                })
            })
            .collect()
    }

    /// Decode the string at `index` with its style runs re-inserted as tags.
    ///
    /// Text is XML-escaped, the inserted tags are not.
    pub fn get_styled_string(&self, index: usize) -> Option<String> {
        let raw = self.get_string(index)?;
        let spans = self.style_spans(index);
        if spans.is_empty() {
            return Some(escape_text(&raw).into_owned());
        }
        Some(render_styled(&raw, spans))
    }

    /// Index of the first string equal to `needle`.
    pub fn find(&self, needle: &str) -> Option<usize> {
        (0..self.len()).find(|&i| self.get_string(i).as_deref() == Some(needle))
    }
}

fn utf8_length(buf: &[u8], offset: usize) -> Option<(usize, usize)> {
    let first = bytes::read_u8(buf, offset)?;
    if first & 0x80 != 0 {
        let second = bytes::read_u8(buf, offset + 1)?;
        Some(((usize::from(first & 0x7F) << 8) | usize::from(second), 2))
    } else {
        Some((usize::from(first), 1))
    }
}

fn utf16_length(buf: &[u8], offset: usize) -> Option<(usize, usize)> {
    let first = bytes::read_u16_le(buf, offset)?;
    if first & 0x8000 != 0 {
        let second = bytes::read_u16_le(buf, offset + 2)?;
        Some(((usize::from(first & 0x7FFF) << 16) | usize::from(second), 4))
    } else {
        Some((usize::from(first), 2))
    }
}

struct Styled<'a> {
    units: &'a [u16],
    written: usize,
    out: String,
}

impl Styled<'_> {
    fn text_until(&mut self, end: usize) {
        let end = end.min(self.units.len());
        if end > self.written {
            let text = String::from_utf16_lossy(&self.units[self.written..end]);
            self.out.push_str(&escape_text(&text));
            self.written = end;
        }
    }

    fn open(&mut self, tag: &str) {
        let mut parts = tag.split(';');
        self.out.push('<');
        self.out.push_str(parts.next().unwrap_or_default());
        for attr in parts.filter(|a| !a.is_empty()) {
            self.out.push(' ');
            match attr.split_once('=') {
                Some((key, value)) => {
                    self.out.push_str(key);
                    self.out.push_str("=\"");
                    self.out.push_str(&escape_attribute(value));
                    self.out.push('"');
                }
                None => self.out.push_str(attr),
            }
        }
        self.out.push('>');
    }

    fn close(&mut self, tag: &str) {
        self.out.push_str("</");
        self.out.push_str(tag.split(';').next().unwrap_or_default());
        self.out.push('>');
    }
}

fn render_styled(raw: &str, mut spans: Vec<StyleSpan>) -> String {
    let units: Vec<u16> = raw.encode_utf16().collect();
    let len = units.len();

    spans.retain(|span| {
        let keep = span.start <= span.end && (span.end as usize) < len;
        if !keep {
            debug!(
                "dropping style span <{}> [{}, {}] outside of a {} unit string",
                span.tag, span.start, span.end, len
            );
        }
        keep
    });
    // Outer spans first when two start at the same position.
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut styled = Styled {
        units: &units,
        written: 0,
        out: String::with_capacity(raw.len() + spans.len() * 8),
    };
    let mut open: Vec<(usize, &str)> = Vec::new();

    for span in &spans {
        let start = span.start as usize;
        while let Some(&(end, tag)) = open.last() {
            if end >= start {
                break;
            }
            styled.text_until(end + 1);
            styled.close(tag);
            open.pop();
        }

        styled.text_until(start);
        styled.open(&span.tag);
        // Overlapping spans are clamped into their parent so tags stay balanced.
        let end = match open.last() {
            Some(&(parent_end, _)) => (span.end as usize).min(parent_end),
            None => span.end as usize,
        };
        open.push((end, span.tag.as_str()));
    }

    while let Some((end, tag)) = open.pop() {
        styled.text_until(end + 1);
        styled.close(tag);
    }
    styled.text_until(len);

    styled.out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn utf8_entry(s: &str) -> Vec<u8> {
        utf8_raw_entry(s.as_bytes(), s.encode_utf16().count())
    }

    pub(crate) fn utf8_raw_entry(data: &[u8], char_len: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for len in [char_len, data.len()] {
            if len > 0x7F {
                out.push(0x80 | (len >> 8) as u8);
                out.push(len as u8);
            } else {
                out.push(len as u8);
            }
        }
        out.extend_from_slice(data);
        out.push(0);
        out
    }

    pub(crate) fn utf16_entry(s: &str) -> Vec<u8> {
        let units: Vec<u16> = s.encode_utf16().collect();
        let mut out = Vec::new();
        if units.len() > 0x7FFF {
            out.extend_from_slice(&((0x8000 | (units.len() >> 16)) as u16).to_le_bytes());
            out.extend_from_slice(&(units.len() as u16).to_le_bytes());
        } else {
            out.extend_from_slice(&(units.len() as u16).to_le_bytes());
        }
        for unit in units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out.extend_from_slice(&[0, 0]);
        out
    }

    /// Build a string pool chunk from encoded entries and per-string style triplets.
    pub(crate) fn pool_chunk(entries: &[Vec<u8>], styles: &[Vec<[u32; 3]>], utf8: bool) -> Vec<u8> {
        let mut data = Vec::new();
        let mut offsets = Vec::new();
        for entry in entries {
            offsets.push(data.len() as u32);
            data.extend_from_slice(entry);
        }
        while data.len() % 4 != 0 {
            data.push(0);
        }

        let mut style_data: Vec<u32> = Vec::new();
        let mut style_offsets = Vec::new();
        for spans in styles {
            style_offsets.push((style_data.len() * 4) as u32);
            for span in spans {
                style_data.extend_from_slice(span);
            }
            style_data.push(STYLE_END);
        }
        if !styles.is_empty() {
            style_data.extend_from_slice(&[STYLE_END, STYLE_END]);
        }

        let strings_start = 28 + 4 * offsets.len() + 4 * style_offsets.len();
        let styles_start = if styles.is_empty() {
            0
        } else {
            strings_start + data.len()
        };
        let chunk_size = strings_start + data.len() + style_data.len() * 4;

        let mut out = Vec::new();
        out.extend_from_slice(&0x0001u16.to_le_bytes()); // type
        out.extend_from_slice(&0x001Cu16.to_le_bytes()); // header size
        out.extend_from_slice(&(chunk_size as u32).to_le_bytes());
        out.extend_from_slice(&(offsets.len() as u32).to_le_bytes());
        out.extend_from_slice(&(style_offsets.len() as u32).to_le_bytes());
        out.extend_from_slice(&(if utf8 { UTF8_FLAG } else { 0 }).to_le_bytes());
        out.extend_from_slice(&(strings_start as u32).to_le_bytes());
        out.extend_from_slice(&(styles_start as u32).to_le_bytes());
        for offset in offsets.iter().chain(style_offsets.iter()) {
            out.extend_from_slice(&offset.to_le_bytes());
        }
        out.extend_from_slice(&data);
        for word in style_data {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out
    }

    fn read_pool(chunk: &[u8]) -> StringPool {
        let mut cursor = ByteCursor::new(chunk);
        let pool = StringPool::read(&mut cursor).unwrap();
        assert_eq!(cursor.pos(), chunk.len());
        pool
    }

    #[test]
    fn test_utf16_pool_round_trips() {
        let words = ["hello", "wörld", "", "\u{1F600} emoji"];
        let entries: Vec<Vec<u8>> = words.iter().map(|w| utf16_entry(w)).collect();
        let pool = read_pool(&pool_chunk(&entries, &[], false));

        assert!(!pool.is_utf8());
        assert_eq!(pool.len(), 4);
        for (i, word) in words.iter().enumerate() {
            assert_eq!(pool.get_string(i).as_deref(), Some(*word));
        }
        assert_eq!(pool.get_string(4), None);
    }

    #[test]
    fn test_utf16_length_past_the_data_is_none() {
        // Declares 16 code units, holds one.
        let entries = vec![vec![0x10, 0x00, b'a', 0x00], utf16_entry("ok")];
        let pool = read_pool(&pool_chunk(&entries, &[], false));

        assert_eq!(pool.get_string(0), None);
        assert_eq!(pool.get_string(1).as_deref(), Some("ok"));
    }

    #[test]
    fn test_utf8_pool_with_long_string() {
        let long = "x".repeat(300);
        let entries = vec![utf8_entry("short"), utf8_entry(&long)];
        let pool = read_pool(&pool_chunk(&entries, &[], true));

        assert!(pool.is_utf8());
        assert_eq!(pool.get_string(0).as_deref(), Some("short"));
        assert_eq!(pool.get_string(1).as_deref(), Some(long.as_str()));
    }

    #[test]
    fn test_utf8_pool_falls_back_to_cesu8() {
        let cesu = [b'a', 0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80];
        let entries = vec![utf8_raw_entry(&cesu, 3)];
        let pool = read_pool(&pool_chunk(&entries, &[], true));

        assert_eq!(pool.get_string(0).as_deref(), Some("a\u{1F600}"));
    }

    #[test]
    fn test_undecodable_string_is_none() {
        let entries = vec![utf8_raw_entry(&[0xFF, 0xFE], 2), utf8_entry("ok")];
        let pool = read_pool(&pool_chunk(&entries, &[], true));

        assert_eq!(pool.get_string(0), None);
        assert_eq!(pool.get_string(1).as_deref(), Some("ok"));
    }

    #[test]
    fn test_leading_null_chunk_is_skipped() {
        let mut chunk = vec![0, 0, 0, 0];
        chunk.extend(pool_chunk(&[utf8_entry("a")], &[], true));
        let pool = read_pool(&chunk);
        assert_eq!(pool.get_string(0).as_deref(), Some("a"));
    }

    #[test]
    fn test_bad_header_is_an_error() {
        let mut chunk = pool_chunk(&[utf8_entry("a")], &[], true);
        chunk[2] = 0x20;
        let mut cursor = ByteCursor::new(&chunk);
        assert!(matches!(
            StringPool::read(&mut cursor),
            Err(ArscError::InvalidStringPoolHeader { offset: 0, .. })
        ));
    }

    #[test]
    fn test_styled_string_renders_tags() {
        let entries = vec![
            utf8_entry("Hello world & you"),
            utf8_entry("b"),
            utf8_entry("a;href=http://x.y/?a=1&b=2"),
            utf8_entry("plain <text>"),
        ];
        let styles = vec![vec![[1, 6, 10], [2, 14, 16]], vec![], vec![], vec![]];
        let pool = read_pool(&pool_chunk(&entries, &styles, true));

        assert_eq!(
            pool.get_styled_string(0).as_deref(),
            Some("Hello <b>world</b> &amp; <a href=\"http://x.y/?a=1&amp;b=2\">you</a>")
        );
        assert_eq!(
            pool.get_styled_string(3).as_deref(),
            Some("plain &lt;text&gt;")
        );
    }

    #[test]
    fn test_nested_spans_close_in_order() {
        let entries = vec![utf8_entry("abcdef"), utf8_entry("b"), utf8_entry("i")];
        let styles = vec![vec![[1, 0, 5], [2, 2, 3]]];
        let pool = read_pool(&pool_chunk(&entries, &styles, true));

        assert_eq!(
            pool.get_styled_string(0).as_deref(),
            Some("<b>ab<i>cd</i>ef</b>")
        );
    }

    #[test]
    fn test_span_past_the_end_is_dropped() {
        let entries = vec![utf8_entry("abc"), utf8_entry("b")];
        let styles = vec![vec![[1, 1, 10]]];
        let pool = read_pool(&pool_chunk(&entries, &styles, true));

        assert_eq!(pool.get_styled_string(0).as_deref(), Some("abc"));
    }

    #[test]
    fn test_malformed_style_run_is_ignored() {
        let entries = vec![utf8_entry("abc"), utf8_entry("b")];
        let styles = vec![vec![[1, 0, 1]]];
        let mut chunk = pool_chunk(&entries, &styles, true);
        // Overwrite the span's end word with the terminator: two words left.
        let len = chunk.len();
        chunk[len - 16..len - 12].copy_from_slice(&STYLE_END.to_le_bytes());
        let pool = read_pool(&chunk);

        assert!(pool.style_spans(0).is_empty());
        assert_eq!(pool.get_styled_string(0).as_deref(), Some("abc"));
    }

    #[test]
    fn test_find_scans_linearly() {
        let entries = vec![utf8_entry("attr"), utf8_entry("string"), utf8_entry("attr")];
        let pool = read_pool(&pool_chunk(&entries, &[], true));

        assert_eq!(pool.find("attr"), Some(0));
        assert_eq!(pool.find("string"), Some(1));
        assert_eq!(pool.find("missing"), None);
    }
}
