use crate::err::{ArscError, Result};
use crate::model::{Package, ResourceId};
use crate::string_pool::StringPool;
use crate::utils::ByteCursor;
use crate::value::*;

use log::{trace, warn};

/// Build a scalar from a `(type, data)` pair.
///
/// Returns `None` for tags outside the known set. [`TYPE_STRING`] is also `None` here, since
/// string values need the table's string pool (see [`string_value`]).
pub fn scalar_value(data_type: u8, data: u32) -> Option<ScalarValue> {
    let reference = |theme: bool, dynamic: bool| {
        ScalarValue::Reference(Reference {
            id: ResourceId::new(data),
            theme,
            dynamic,
        })
    };

    let value = match data_type {
        TYPE_NULL => match data {
            DATA_NULL_UNDEFINED => ScalarValue::Null(NullKind::Undefined),
            DATA_NULL_EMPTY => ScalarValue::Null(NullKind::Empty),
            _ => ScalarValue::Reference(Reference::null()),
        },
        TYPE_REFERENCE => reference(false, false),
        TYPE_ATTRIBUTE => reference(true, false),
        TYPE_DYNAMIC_REFERENCE => reference(false, true),
        TYPE_DYNAMIC_ATTRIBUTE => reference(true, true),
        TYPE_FLOAT => ScalarValue::Float(f32::from_bits(data)),
        TYPE_DIMENSION => ScalarValue::Dimension(data),
        TYPE_FRACTION => ScalarValue::Fraction(data),
        TYPE_INT_BOOLEAN => ScalarValue::Bool(data != 0),
        TYPE_INT_COLOR_ARGB8 => color(data, ColorFormat::Argb8),
        TYPE_INT_COLOR_RGB8 => color(data, ColorFormat::Rgb8),
        TYPE_INT_COLOR_ARGB4 => color(data, ColorFormat::Argb4),
        TYPE_INT_COLOR_RGB4 => color(data, ColorFormat::Rgb4),
        TYPE_INT_DEC => int(data, IntFormat::Dec),
        TYPE_INT_HEX => int(data, IntFormat::Hex),
        TYPE_FIRST_INT..=TYPE_LAST_INT => int(data, IntFormat::Other(data_type)),
        _ => return None,
    };
    Some(value)
}

fn color(data: u32, format: ColorFormat) -> ScalarValue {
    ScalarValue::Color { data, format }
}

fn int(data: u32, format: IntFormat) -> ScalarValue {
    ScalarValue::Int {
        data: data as i32,
        format,
    }
}

/// Build a string-typed scalar. Paths into the package become [`ScalarValue::File`]; a string
/// that could not be read from the pool becomes an empty file value.
pub fn string_value(value: Option<String>) -> ScalarValue {
    match value {
        None => ScalarValue::File(String::new()),
        Some(s) if s.starts_with("res/") || s.starts_with("r/") || s.starts_with("R/") => {
            ScalarValue::File(s)
        }
        Some(s) => ScalarValue::String(s),
    }
}

pub(crate) fn decode_scalar(
    data_type: u8,
    data: u32,
    strings: &StringPool,
    offset: u64,
) -> Result<ScalarValue> {
    if data_type == TYPE_STRING {
        return Ok(string_value(strings.get_styled_string(data as usize)));
    }
    scalar_value(data_type, data).ok_or(ArscError::UnknownValueType { data_type, offset })
}

/// Read one 8 byte `Res_value` at the cursor.
pub(crate) fn read_value(cursor: &mut ByteCursor<'_>, strings: &StringPool) -> Result<ScalarValue> {
    let offset = cursor.position();
    let size = cursor.u16_named("value size")?;
    let reserved = cursor.u8_named("value reserved")?;
    if size != 8 || reserved != 0 {
        return Err(ArscError::InvalidValueHeader {
            size,
            reserved,
            offset,
        });
    }

    let data_type = cursor.u8_named("value type")?;
    let data = cursor.u32_named("value data")?;
    decode_scalar(data_type, data, strings, offset)
}

/// Interpret the items of a complex entry according to the type that owns it.
///
/// Enum and flags members of an attr are registered on `package` as synthesized ids.
pub fn bag_value(
    parent: u32,
    items: Vec<(u32, ScalarValue)>,
    type_name: &str,
    package: &mut Package,
) -> Result<Value> {
    let parent = Reference::new(ResourceId::new(parent));
    let items: Vec<(u32, ScalarValue)> = items
        .into_iter()
        .map(|(key, value)| match value {
            ScalarValue::File(path) => (key, ScalarValue::String(path)),
            other => (key, other),
        })
        .collect();

    let Some(&(key, _)) = items.first() else {
        let kind = if type_name == "attr" {
            BagKind::Attr(AttrBag::placeholder())
        } else {
            BagKind::Empty
        };
        return Ok(Value::Bag(BagValue { parent, kind }));
    };

    let kind = if key == BAG_KEY_ATTR_TYPE {
        BagKind::Attr(attr_bag(items, package)?)
    } else if type_name == "array" || key == BAG_KEY_ARRAY_START || key == 0 {
        BagKind::Array(items.into_iter().map(|(_, value)| value).collect())
    } else if type_name == "plurals" || (BAG_KEY_PLURALS_START..=BAG_KEY_PLURALS_END).contains(&key)
    {
        plurals(items)
    } else if type_name == "style" {
        BagKind::Style(
            items
                .into_iter()
                .map(|(key, value)| (ResourceId::new(key), value))
                .collect(),
        )
    } else if type_name == "attr" {
        BagKind::Attr(AttrBag::placeholder())
    } else {
        return Err(ArscError::UnsupportedBagType {
            type_name: type_name.to_owned(),
        });
    };

    Ok(Value::Bag(BagValue { parent, kind }))
}

fn plurals(items: Vec<(u32, ScalarValue)>) -> BagKind {
    let mut slots: [Option<ScalarValue>; 6] = Default::default();
    for (key, value) in items {
        match Quantity::from_key(key) {
            Some(quantity) => slots[quantity as usize] = Some(value),
            None => warn!("ignoring plurals item with unknown quantity key 0x{key:08x}"),
        }
    }
    BagKind::Plurals(slots)
}

fn int_item(value: &ScalarValue, what: &str) -> i32 {
    value.as_int().unwrap_or_else(|| {
        warn!("attr {what} is not an integer ({value:?}), using 0");
        0
    })
}

fn attr_bag(items: Vec<(u32, ScalarValue)>, package: &mut Package) -> Result<AttrBag> {
    let mut items = items.into_iter();
    let type_word = match items.next() {
        Some((_, value)) => int_item(&value, "type") as u32,
        None => 0,
    };

    let mut attr = AttrBag {
        format: AttrFormat::from_bits_retain(type_word),
        min: None,
        max: None,
        l10n: None,
        members: AttrMembers::Plain,
    };

    let mut members = Vec::new();
    for (key, value) in items {
        if members.is_empty() {
            match key {
                BAG_KEY_ATTR_MIN => {
                    attr.min = Some(int_item(&value, "min"));
                    continue;
                }
                BAG_KEY_ATTR_MAX => {
                    attr.max = Some(int_item(&value, "max"));
                    continue;
                }
                BAG_KEY_ATTR_L10N => {
                    attr.l10n = Some(int_item(&value, "l10n"));
                    continue;
                }
                _ => {}
            }
        }

        let id = ResourceId::new(key);
        package.add_synthesized(id);
        members.push(AttrMember {
            id,
            value: int_item(&value, "member"),
        });
    }

    if members.is_empty() {
        return Ok(attr);
    }

    trace!("attr with {} members, type 0x{type_word:08x}", members.len());
    attr.members = match type_word & 0x00FF_0000 {
        0x0001_0000 => AttrMembers::Enum(EnumMembers::new(members)),
        0x0002_0000 => AttrMembers::Flags(FlagsMembers::new(members)),
        _ => return Err(ArscError::UnsupportedAttrKind { kind: type_word }),
    };
    Ok(attr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn int_dec(v: i32) -> ScalarValue {
        ScalarValue::Int {
            data: v,
            format: IntFormat::Dec,
        }
    }

    fn package() -> Package {
        Package::new(0x7f, "com.example".to_owned())
    }

    #[test]
    fn test_scalar_tags() {
        assert_eq!(
            scalar_value(TYPE_NULL, 0),
            Some(ScalarValue::Null(NullKind::Undefined))
        );
        assert_eq!(
            scalar_value(TYPE_NULL, 1),
            Some(ScalarValue::Null(NullKind::Empty))
        );
        assert_eq!(scalar_value(TYPE_INT_BOOLEAN, 0xFFFF_FFFF), Some(ScalarValue::Bool(true)));
        assert_eq!(scalar_value(TYPE_INT_DEC, 0xFFFF_FFFF), Some(int_dec(-1)));
        assert_eq!(
            scalar_value(TYPE_INT_COLOR_RGB8, 0xFF00FF),
            Some(ScalarValue::Color {
                data: 0xFF00FF,
                format: ColorFormat::Rgb8
            })
        );
        assert_eq!(
            scalar_value(TYPE_ATTRIBUTE, 0x0101_0000),
            Some(ScalarValue::Reference(Reference {
                id: ResourceId::new(0x0101_0000),
                theme: true,
                dynamic: false
            }))
        );
        assert_eq!(scalar_value(TYPE_FLOAT, 1.5f32.to_bits()), Some(ScalarValue::Float(1.5)));
        assert_eq!(scalar_value(0x09, 0), None);
        assert_eq!(scalar_value(0x20, 0), None);
    }

    #[test]
    fn test_string_values_recognise_files() {
        assert_eq!(
            string_value(Some("res/drawable/icon.png".into())),
            ScalarValue::File("res/drawable/icon.png".into())
        );
        assert_eq!(
            string_value(Some("R/a.xml".into())),
            ScalarValue::File("R/a.xml".into())
        );
        assert_eq!(
            string_value(Some("resources".into())),
            ScalarValue::String("resources".into())
        );
        assert_eq!(string_value(None), ScalarValue::File(String::new()));
    }

    #[test]
    fn test_unknown_value_type_is_an_error() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&8u16.to_le_bytes()); // size
        buf.push(0); // reserved
        buf.push(0x42); // type
        buf.extend_from_slice(&7u32.to_le_bytes()); // data

        let mut cursor = ByteCursor::new(&buf);
        let err = read_value(&mut cursor, &StringPool::default()).unwrap_err();
        assert!(matches!(
            err,
            ArscError::UnknownValueType {
                data_type: 0x42,
                offset: 0
            }
        ));
    }

    #[test]
    fn test_array_bag_ignores_keys() {
        let mut pkg = package();
        let items = vec![(0x0200_0000, int_dec(1)), (0x0200_0001, int_dec(2))];
        let value = bag_value(0, items, "array", &mut pkg).unwrap();

        let bag = value.as_bag().unwrap();
        assert_eq!(bag.kind, BagKind::Array(vec![int_dec(1), int_dec(2)]));
        assert!(bag.parent.is_null());
    }

    #[test]
    fn test_plurals_by_key_range() {
        let mut pkg = package();
        let items = vec![
            (0x0100_0006, ScalarValue::String("one item".into())),
            (0x0100_0004, ScalarValue::String("many items".into())),
        ];
        let value = bag_value(0, items, "something", &mut pkg).unwrap();
        let bag = value.as_bag().unwrap();

        assert_eq!(
            bag.plural(Quantity::One),
            Some(&ScalarValue::String("one item".into()))
        );
        assert_eq!(
            bag.plural(Quantity::Other),
            Some(&ScalarValue::String("many items".into()))
        );
        assert_eq!(bag.plural(Quantity::Few), None);
    }

    #[test]
    fn test_style_bag_keeps_file_values_as_strings() {
        let mut pkg = package();
        let items = vec![(0x0101_0098, ScalarValue::File("res/x.png".into()))];
        let value = bag_value(0x7f0b_0001, items, "style", &mut pkg).unwrap();
        let bag = value.as_bag().unwrap();

        assert_eq!(bag.parent.id, ResourceId::new(0x7f0b_0001));
        assert_eq!(
            bag.kind,
            BagKind::Style(vec![(
                ResourceId::new(0x0101_0098),
                ScalarValue::String("res/x.png".into())
            )])
        );
    }

    #[test]
    fn test_attr_with_flags_registers_synthesized_ids() {
        let mut pkg = package();
        let items = vec![
            (BAG_KEY_ATTR_TYPE, int_dec(0x0002_0000)),
            (BAG_KEY_ATTR_MIN, int_dec(0)),
            (0x7f05_0000, int_dec(1)),
            (0x7f05_0001, int_dec(2)),
        ];
        let value = bag_value(0, items, "attr", &mut pkg).unwrap();

        let BagKind::Attr(attr) = &value.as_bag().unwrap().kind else {
            panic!("expected an attr bag");
        };
        assert_eq!(attr.min, Some(0));
        assert!(matches!(attr.members, AttrMembers::Flags(_)));
        assert!(pkg.is_synthesized(ResourceId::new(0x7f05_0000)));
        assert!(pkg.is_synthesized(ResourceId::new(0x7f05_0001)));
    }

    #[test]
    fn test_attr_without_members_is_plain() {
        let mut pkg = package();
        let items = vec![(BAG_KEY_ATTR_TYPE, int_dec(0x04))];
        let value = bag_value(0, items, "attr", &mut pkg).unwrap();

        let BagKind::Attr(attr) = &value.as_bag().unwrap().kind else {
            panic!("expected an attr bag");
        };
        assert_eq!(attr.format, AttrFormat::INTEGER);
        assert_eq!(attr.members, AttrMembers::Plain);
    }

    #[test]
    fn test_bag_dispatch_edges() {
        let mut pkg = package();
        let empty = bag_value(0, vec![], "string", &mut pkg).unwrap();
        assert_eq!(empty.as_bag().unwrap().kind, BagKind::Empty);

        let bare_attr = bag_value(0, vec![], "attr", &mut pkg).unwrap();
        assert_eq!(
            bare_attr.as_bag().unwrap().kind,
            BagKind::Attr(AttrBag::placeholder())
        );

        let err = bag_value(0, vec![(0x7f01_0000, int_dec(1))], "color", &mut pkg).unwrap_err();
        assert!(matches!(err, ArscError::UnsupportedBagType { type_name } if type_name == "color"));
    }
}
