//! Decoded resource values.
//!
//! A record's value is either a single scalar (`Res_value`) or a bag: a parent reference plus
//! a list of keyed scalars, interpreted according to the resource type that owns it.

mod attr;
mod factory;
mod render;

pub use self::attr::{AttrBag, AttrFormat, AttrMember, AttrMembers, EnumMembers, FlagsMembers};
pub use self::factory::{bag_value, scalar_value, string_value};
pub(crate) use self::factory::{decode_scalar, read_value};
pub use self::render::{complex_to_float, format_dimension, format_fraction};

use crate::model::ResourceId;

pub const TYPE_NULL: u8 = 0x00;
pub const TYPE_REFERENCE: u8 = 0x01;
pub const TYPE_ATTRIBUTE: u8 = 0x02;
pub const TYPE_STRING: u8 = 0x03;
pub const TYPE_FLOAT: u8 = 0x04;
pub const TYPE_DIMENSION: u8 = 0x05;
pub const TYPE_FRACTION: u8 = 0x06;
pub const TYPE_DYNAMIC_REFERENCE: u8 = 0x07;
pub const TYPE_DYNAMIC_ATTRIBUTE: u8 = 0x08;
pub const TYPE_INT_DEC: u8 = 0x10;
pub const TYPE_INT_HEX: u8 = 0x11;
pub const TYPE_INT_BOOLEAN: u8 = 0x12;
pub const TYPE_INT_COLOR_ARGB8: u8 = 0x1c;
pub const TYPE_INT_COLOR_RGB8: u8 = 0x1d;
pub const TYPE_INT_COLOR_ARGB4: u8 = 0x1e;
pub const TYPE_INT_COLOR_RGB4: u8 = 0x1f;
pub const TYPE_FIRST_INT: u8 = 0x10;
pub const TYPE_LAST_INT: u8 = 0x1f;

pub const DATA_NULL_UNDEFINED: u32 = 0;
pub const DATA_NULL_EMPTY: u32 = 1;

pub const BAG_KEY_ATTR_TYPE: u32 = 0x0100_0000;
pub const BAG_KEY_ATTR_MIN: u32 = 0x0100_0001;
pub const BAG_KEY_ATTR_MAX: u32 = 0x0100_0002;
pub const BAG_KEY_ATTR_L10N: u32 = 0x0100_0003;
pub const BAG_KEY_PLURALS_START: u32 = 0x0100_0004;
pub const BAG_KEY_PLURALS_END: u32 = 0x0100_0009;
pub const BAG_KEY_ARRAY_START: u32 = 0x0200_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullKind {
    Undefined,
    Empty,
}

/// A reference to another resource (`@`) or a theme attribute (`?`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    pub id: ResourceId,
    pub theme: bool,
    pub dynamic: bool,
}

impl Reference {
    pub fn new(id: ResourceId) -> Self {
        Reference {
            id,
            theme: false,
            dynamic: false,
        }
    }

    /// `@null`; its target is never resolved.
    pub fn null() -> Self {
        Self::new(ResourceId::NULL)
    }

    pub fn is_null(&self) -> bool {
        self.id.is_null()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntFormat {
    Dec,
    Hex,
    /// Any other tag in the integer range, kept verbatim.
    Other(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    Argb8,
    Rgb8,
    Argb4,
    Rgb4,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null(NullKind),
    Reference(Reference),
    String(String),
    /// A string pointing into the package, e.g. `res/drawable/icon.png`.
    File(String),
    Float(f32),
    /// Complex-encoded dimension (value + unit).
    Dimension(u32),
    /// Complex-encoded fraction (value + `%`/`%p`).
    Fraction(u32),
    Bool(bool),
    Color { data: u32, format: ColorFormat },
    Int { data: i32, format: IntFormat },
}

impl ScalarValue {
    /// Integer view of the value, for values that carry one.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            ScalarValue::Int { data, .. } => Some(*data),
            ScalarValue::Color { data, .. } => Some(*data as i32),
            ScalarValue::Bool(b) => Some(i32::from(*b)),
            ScalarValue::Reference(r) => Some(r.id.raw() as i32),
            ScalarValue::Dimension(data) | ScalarValue::Fraction(data) => Some(*data as i32),
            ScalarValue::Float(f) => Some(f.to_bits() as i32),
            ScalarValue::Null(_) | ScalarValue::String(_) | ScalarValue::File(_) => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            ScalarValue::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) | ScalarValue::File(s) => Some(s),
            _ => None,
        }
    }
}

/// Plural quantities in storage order (`key - BAG_KEY_PLURALS_START`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Other,
    Zero,
    One,
    Two,
    Few,
    Many,
}

impl Quantity {
    pub const ALL: [Quantity; 6] = [
        Quantity::Other,
        Quantity::Zero,
        Quantity::One,
        Quantity::Two,
        Quantity::Few,
        Quantity::Many,
    ];

    pub fn from_key(key: u32) -> Option<Quantity> {
        let idx = key.checked_sub(BAG_KEY_PLURALS_START)?;
        Self::ALL.get(idx as usize).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quantity::Other => "other",
            Quantity::Zero => "zero",
            Quantity::One => "one",
            Quantity::Two => "two",
            Quantity::Few => "few",
            Quantity::Many => "many",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BagKind {
    /// A bag with no items, or of a type with no special interpretation.
    Empty,
    Array(Vec<ScalarValue>),
    Plurals([Option<ScalarValue>; 6]),
    /// `(attribute, value)` pairs.
    Style(Vec<(ResourceId, ScalarValue)>),
    Attr(AttrBag),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BagValue {
    pub parent: Reference,
    pub kind: BagKind,
}

impl BagValue {
    pub fn plural(&self, quantity: Quantity) -> Option<&ScalarValue> {
        match &self.kind {
            BagKind::Plurals(slots) => slots[quantity as usize].as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(ScalarValue),
    Bag(BagValue),
}

impl Value {
    pub fn null_reference() -> Self {
        Value::Scalar(ScalarValue::Reference(Reference::null()))
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Bag(_) => None,
        }
    }

    pub fn as_bag(&self) -> Option<&BagValue> {
        match self {
            Value::Bag(b) => Some(b),
            Value::Scalar(_) => None,
        }
    }
}

impl From<ScalarValue> for Value {
    fn from(value: ScalarValue) -> Self {
        Value::Scalar(value)
    }
}
