pub(crate) mod byte_cursor;
pub(crate) mod bytes;
mod cesu8;
mod escape;
mod utf16;

pub(crate) use self::byte_cursor::ByteCursor;
pub(crate) use self::cesu8::decode_cesu8;
pub(crate) use self::escape::{escape_attribute, escape_text};
pub(crate) use self::utf16::{decode_utf16_units_z, decode_utf16le_bytes_z};
