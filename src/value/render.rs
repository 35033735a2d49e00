use crate::value::{IntFormat, NullKind, ScalarValue};

use std::fmt;

const COMPLEX_UNIT_MASK: u32 = 0x0F;
const COMPLEX_RADIX_SHIFT: u32 = 4;
const COMPLEX_RADIX_MASK: u32 = 0x03;
const COMPLEX_MANTISSA_MASK: u32 = 0xFFFF_FF00;

const RADIX_MULTS: [f32; 4] = [
    1.0 / 256.0,
    1.0 / 32_768.0,
    1.0 / 8_388_608.0,
    1.0 / 2_147_483_648.0,
];

const DIMENSION_UNITS: [&str; 6] = ["px", "dip", "sp", "pt", "in", "mm"];
const FRACTION_UNITS: [&str; 2] = ["%", "%p"];

/// Decode the value part of a complex (dimension or fraction) word.
pub fn complex_to_float(complex: u32) -> f32 {
    let mantissa = (complex & COMPLEX_MANTISSA_MASK) as i32 as f32;
    let radix = (complex >> COMPLEX_RADIX_SHIFT) & COMPLEX_RADIX_MASK;
    mantissa * RADIX_MULTS[radix as usize]
}

pub fn format_dimension(complex: u32) -> String {
    let value = format_float(complex_to_float(complex));
    match DIMENSION_UNITS.get((complex & COMPLEX_UNIT_MASK) as usize) {
        Some(unit) => format!("{value}{unit}"),
        None => value,
    }
}

pub fn format_fraction(complex: u32) -> String {
    let value = format_float(complex_to_float(complex) * 100.0);
    match FRACTION_UNITS.get((complex & COMPLEX_UNIT_MASK) as usize) {
        Some(unit) => format!("{value}{unit}"),
        None => value,
    }
}

/// Floats always carry a fractional part (`16.0`, not `16`).
fn format_float(value: f32) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e7 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null(NullKind::Undefined) => write!(f, "@null"),
            ScalarValue::Null(NullKind::Empty) => write!(f, "@empty"),
            ScalarValue::Reference(r) if r.is_null() => write!(f, "@null"),
            ScalarValue::Reference(r) => {
                write!(f, "{}{}", if r.theme { '?' } else { '@' }, r.id)
            }
            ScalarValue::String(s) | ScalarValue::File(s) => write!(f, "{s}"),
            ScalarValue::Float(v) => write!(f, "{}", format_float(*v)),
            ScalarValue::Dimension(c) => write!(f, "{}", format_dimension(*c)),
            ScalarValue::Fraction(c) => write!(f, "{}", format_fraction(*c)),
            ScalarValue::Bool(b) => write!(f, "{b}"),
            ScalarValue::Color { data, .. } => write!(f, "#{data:08x}"),
            ScalarValue::Int {
                data,
                format: IntFormat::Hex,
            } => write!(f, "0x{data:x}"),
            ScalarValue::Int { data, .. } => write!(f, "{data}"),
        }
    }
}
