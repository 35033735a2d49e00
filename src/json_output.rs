//! JSON summary of a decoded table.

use crate::model::{Package, ResourceId, ResourceSpec, ResourceTable};
use crate::value::{AttrBag, AttrMember, AttrMembers, BagKind, BagValue, IntFormat, Quantity};
use crate::value::{Reference, ScalarValue, Value};

use serde_json::{Map, Value as JsonValue, json};

/// Describe every package of `table`. Values are included only when `include_values` is set.
pub fn table_to_json(table: &ResourceTable, include_values: bool) -> JsonValue {
    let packages: Vec<JsonValue> = table
        .packages()
        .map(|package| package_to_json(table, package, include_values))
        .collect();

    json!({
        "shared_library": table.is_shared_library(),
        "sparse_resources": table.sparse_resources(),
        "packages": packages,
    })
}

fn package_to_json(table: &ResourceTable, package: &Package, include_values: bool) -> JsonValue {
    let configs: Vec<String> = package
        .configs()
        .iter()
        .map(|instance| instance.config().to_string())
        .collect();

    let types: Vec<JsonValue> = package
        .type_specs()
        .iter()
        .map(|type_spec| {
            let specs: Vec<JsonValue> = type_spec
                .specs()
                .iter()
                .map(|idx| spec_to_json(table, package, package.spec_at(*idx), include_values))
                .collect();
            json!({
                "id": type_spec.id(),
                "name": type_spec.name(),
                "entry_count": type_spec.entry_count(),
                "specs": specs,
            })
        })
        .collect();

    json!({
        "id": format!("0x{:02x}", package.id()),
        "name": package.name(),
        "main": table.is_main(package.id()),
        "configs": configs,
        "types": types,
    })
}

fn spec_to_json(
    table: &ResourceTable,
    package: &Package,
    spec: &ResourceSpec,
    include_values: bool,
) -> JsonValue {
    let mut out = Map::new();
    out.insert("id".to_owned(), json!(spec.id().to_string()));
    out.insert("name".to_owned(), json!(spec.name()));
    if spec.is_dummy() {
        out.insert("dummy".to_owned(), json!(true));
    }

    if include_values {
        let mut values = Map::new();
        for record in spec.records().iter().map(|r| package.record(*r)) {
            let config = package.config(record.config()).config().to_string();
            values.insert(config, value_to_json(table, record.value()));
        }
        out.insert("values".to_owned(), JsonValue::Object(values));
    }
    JsonValue::Object(out)
}

pub fn value_to_json(table: &ResourceTable, value: &Value) -> JsonValue {
    match value {
        Value::Scalar(scalar) => scalar_to_json(table, scalar),
        Value::Bag(bag) => bag_to_json(table, bag),
    }
}

fn scalar_to_json(table: &ResourceTable, value: &ScalarValue) -> JsonValue {
    match value {
        ScalarValue::Reference(reference) => json!(table.reference_name(reference)),
        ScalarValue::String(s) | ScalarValue::File(s) => json!(s),
        ScalarValue::Bool(b) => json!(b),
        ScalarValue::Int {
            data,
            format: IntFormat::Dec,
        } => json!(data),
        other => json!(other.to_string()),
    }
}

fn bag_to_json(table: &ResourceTable, bag: &BagValue) -> JsonValue {
    let mut out = Map::new();
    if !bag.parent.is_null() {
        out.insert(
            "parent".to_owned(),
            json!(table.reference_name(&bag.parent)),
        );
    }

    match &bag.kind {
        BagKind::Empty => {}
        BagKind::Array(items) => {
            let items: Vec<JsonValue> = items.iter().map(|v| scalar_to_json(table, v)).collect();
            out.insert("array".to_owned(), JsonValue::Array(items));
        }
        BagKind::Plurals(_) => {
            let mut plurals = Map::new();
            for quantity in Quantity::ALL {
                if let Some(item) = bag.plural(quantity) {
                    plurals.insert(quantity.as_str().to_owned(), scalar_to_json(table, item));
                }
            }
            out.insert("plurals".to_owned(), JsonValue::Object(plurals));
        }
        BagKind::Style(items) => {
            let items: Vec<JsonValue> = items
                .iter()
                .map(|(attr, value)| {
                    let name = table.reference_name(&Reference::new(*attr));
                    json!({
                        "name": name.trim_start_matches('@'),
                        "value": style_item_to_json(table, *attr, value),
                    })
                })
                .collect();
            out.insert("style".to_owned(), JsonValue::Array(items));
        }
        BagKind::Attr(attr) => {
            out.insert("attr".to_owned(), attr_to_json(table, attr));
        }
    }
    JsonValue::Object(out)
}

// Style items holding enum or flags values render through their attr's member names.
fn style_item_to_json(
    table: &ResourceTable,
    attr: ResourceId,
    value: &ScalarValue,
) -> JsonValue {
    let rendered = match table.default_value(attr) {
        Some(Value::Bag(BagValue {
            kind: BagKind::Attr(definition),
            ..
        })) => definition.render_value(table, value),
        _ => None,
    };
    match rendered {
        Some(names) => json!(names),
        None => scalar_to_json(table, value),
    }
}

fn attr_to_json(table: &ResourceTable, attr: &AttrBag) -> JsonValue {
    let mut out = Map::new();
    out.insert("format".to_owned(), json!(attr.format.to_string()));
    for (key, bound) in [("min", attr.min), ("max", attr.max), ("l10n", attr.l10n)] {
        if let Some(bound) = bound {
            out.insert(key.to_owned(), json!(bound));
        }
    }

    match &attr.members {
        AttrMembers::Plain => {}
        AttrMembers::Enum(e) => {
            out.insert("enum".to_owned(), members_to_json(table, e.members().iter()));
        }
        AttrMembers::Flags(f) => {
            out.insert("flags".to_owned(), members_to_json(table, f.members()));
        }
    }
    JsonValue::Object(out)
}

fn members_to_json<'a>(
    table: &ResourceTable,
    members: impl Iterator<Item = &'a AttrMember>,
) -> JsonValue {
    members
        .map(|member| {
            let name = table
                .spec(member.id)
                .map(|spec| spec.name().to_owned())
                .unwrap_or_else(|| "@null".to_owned());
            json!({ "name": name, "value": member.value })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigDescriptor;
    use pretty_assertions::assert_eq;

    fn table() -> ResourceTable {
        let mut pkg = Package::new(0x7f, "com.example".to_owned());
        let ts = pkg.add_type_spec(0x01, "string".to_owned(), 2);
        let config = pkg.get_or_create_config(ConfigDescriptor::new());
        let hello = pkg
            .add_spec(ts, ResourceId::new(0x7f01_0000), "hello".to_owned(), false)
            .unwrap();
        pkg.add_record(
            hello,
            config,
            Value::Scalar(ScalarValue::String("hi".to_owned())),
            false,
        )
        .unwrap();
        let alias = pkg
            .add_spec(ts, ResourceId::new(0x7f01_0001), "alias".to_owned(), false)
            .unwrap();
        pkg.add_record(
            alias,
            config,
            Value::Scalar(ScalarValue::Reference(Reference::new(ResourceId::new(
                0x7f01_0000,
            )))),
            false,
        )
        .unwrap();

        let mut table = ResourceTable::new();
        table.add_package(pkg, true).unwrap();
        table
    }

    #[test]
    fn test_summary_without_values() {
        let json = table_to_json(&table(), false);
        assert_eq!(
            json,
            json!({
                "shared_library": false,
                "sparse_resources": false,
                "packages": [{
                    "id": "0x7f",
                    "name": "com.example",
                    "main": true,
                    "configs": ["[DEFAULT]"],
                    "types": [{
                        "id": 1,
                        "name": "string",
                        "entry_count": 2,
                        "specs": [
                            { "id": "0x7f010000", "name": "hello" },
                            { "id": "0x7f010001", "name": "alias" },
                        ],
                    }],
                }],
            })
        );
    }

    #[test]
    fn test_values_resolve_references() {
        let json = table_to_json(&table(), true);
        let specs = &json["packages"][0]["types"][0]["specs"];
        assert_eq!(specs[0]["values"]["[DEFAULT]"], json!("hi"));
        assert_eq!(specs[1]["values"]["[DEFAULT]"], json!("@string/hello"));
    }
}
