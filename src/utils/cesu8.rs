//! Fallback decoder for CESU-8 / "modified UTF-8".
//!
//! Some resource compilers write supplementary characters as two separately encoded UTF-16
//! surrogates (3 bytes each) and NUL as `C0 80`. Both are rejected by `str::from_utf8`.

/// Decode CESU-8 bytes, returning `None` if the input is malformed even under CESU-8 rules.
pub(crate) fn decode_cesu8(bytes: &[u8]) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b0 = bytes[i];
        if b0 < 0x80 {
            units.push(u16::from(b0));
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = continuation(bytes, i + 1)?;
            units.push((u16::from(b0 & 0x1F) << 6) | b1);
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            let b1 = continuation(bytes, i + 1)?;
            let b2 = continuation(bytes, i + 2)?;
            units.push((u16::from(b0 & 0x0F) << 12) | (b1 << 6) | b2);
            i += 3;
        } else if b0 & 0xF8 == 0xF0 {
            // Regular 4 byte UTF-8 sequences do show up mixed into CESU-8 data.
            let b1 = u32::from(continuation(bytes, i + 1)?);
            let b2 = u32::from(continuation(bytes, i + 2)?);
            let b3 = u32::from(continuation(bytes, i + 3)?);
            let cp = (u32::from(b0 & 0x07) << 18) | (b1 << 12) | (b2 << 6) | b3;
            let mut buf = [0u16; 2];
            units.extend_from_slice(char::from_u32(cp)?.encode_utf16(&mut buf));
            i += 4;
        } else {
            return None;
        }
    }

    String::from_utf16(&units).ok()
}

fn continuation(bytes: &[u8], idx: usize) -> Option<u16> {
    match bytes.get(idx) {
        Some(&b) if b & 0xC0 == 0x80 => Some(u16::from(b & 0x3F)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surrogate_pair_encoded_separately() {
        // U+1F600 as CESU-8: D83D DE00, each surrogate as a 3 byte sequence.
        let bytes = [0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80];
        assert!(std::str::from_utf8(&bytes).is_err());
        assert_eq!(decode_cesu8(&bytes).unwrap(), "\u{1F600}");
    }

    #[test]
    fn test_modified_utf8_nul() {
        assert_eq!(decode_cesu8(&[b'a', 0xC0, 0x80, b'b']).unwrap(), "a\0b");
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(decode_cesu8(&[0xFF, 0x41]), None);
        assert_eq!(decode_cesu8(&[0xE2, 0x82]), None);
        // Unpaired high surrogate.
        assert_eq!(decode_cesu8(&[0xED, 0xA0, 0xBD]), None);
    }
}
