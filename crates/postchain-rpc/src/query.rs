//! JSON bodies for `POST query/<brid>`.

use postchain_gtv::Gtv;
use serde_json::{Map, Value};

/// JSON form of a query argument. Byte arrays travel as hex strings.
pub fn to_json(value: &Gtv) -> Value {
    match value {
        Gtv::Null => Value::Null,
        Gtv::Integer(v) => Value::from(*v),
        Gtv::Bytes(v) => Value::String(hex::encode(v)),
        Gtv::Text(v) => Value::String(v.clone()),
        Gtv::List(items) => Value::Array(items.iter().map(to_json).collect()),
        Gtv::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
    }
}

/// `{"type": name, <arg>: <value>, ...}` in argument order.
pub fn query_body(name: &str, args: &[(&str, Gtv)]) -> Value {
    let mut body = Map::new();
    body.insert("type".into(), Value::String(name.to_string()));
    for (key, value) in args {
        body.insert((*key).to_string(), to_json(value));
    }
    Value::Object(body)
}
