use std::fmt;

/// Package id assumed for ids whose package byte is zero.
pub const DEFAULT_PACKAGE_ID: u8 = 2;

/// A 32-bit resource identifier, `0xPPTTEEEE` (package, type, entry).
///
/// The raw value is kept as-is; a zero package byte is only remapped when asking for the
/// package. Equality and ordering are by raw value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ResourceId(u32);

impl ResourceId {
    pub const NULL: ResourceId = ResourceId(0);

    pub const fn new(raw: u32) -> Self {
        ResourceId(raw)
    }

    pub const fn from_parts(package: u8, type_id: u8, entry: u16) -> Self {
        ResourceId(((package as u32) << 24) | ((type_id as u32) << 16) | entry as u32)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Package byte with `0` reported as [`DEFAULT_PACKAGE_ID`].
    pub fn package_id(self) -> u8 {
        match (self.0 >> 24) as u8 {
            0 => DEFAULT_PACKAGE_ID,
            id => id,
        }
    }

    pub fn type_id(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn entry_id(self) -> u16 {
        self.0 as u16
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for ResourceId {
    fn from(raw: u32) -> Self {
        ResourceId(raw)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId(0x{:08x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts_compose_into_raw_id() {
        let id = ResourceId::from_parts(0x7f, 0x04, 0x0002);
        assert_eq!(id.raw(), 0x7f04_0002);
        assert_eq!(id.package_id(), 0x7f);
        assert_eq!(id.type_id(), 0x04);
        assert_eq!(id.entry_id(), 0x0002);
        assert_eq!(id.to_string(), "0x7f040002");
    }

    #[test]
    fn test_zero_package_is_reported_as_two() {
        let id = ResourceId::new(0x0001_0003);
        assert_eq!(id.package_id(), DEFAULT_PACKAGE_ID);
        assert_eq!(id.raw(), 0x0001_0003);
        assert_ne!(id, ResourceId::new(0x0201_0003));
    }
}
