use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Types that can be requested as a strict `json_schema` response format.
///
/// Strict mode wants every object closed (`additionalProperties: false`),
/// every property listed in `required` (nullable ones included) and no
/// `$ref` indirection, so the generated schema is rewritten accordingly.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    fn strict_schema() -> Value {
        let root = serde_json::to_value(schema_for!(Self)).unwrap_or_default();
        let definitions = root
            .get("definitions")
            .cloned()
            .unwrap_or(Value::Object(Map::new()));

        let mut schema = resolve(root, &definitions);
        if let Value::Object(map) = &mut schema {
            map.remove("definitions");
            map.remove("$schema");
        }
        schema
    }

    fn schema_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn resolve(value: Value, definitions: &Value) -> Value {
    match value {
        Value::Object(mut map) => {
            if let Some(Value::String(path)) = map.get("$ref") {
                if let Some(def) = path
                    .strip_prefix("#/definitions/")
                    .and_then(|name| definitions.get(name))
                {
                    return resolve(def.clone(), definitions);
                }
            }

            // schemars wraps documented refs as a single-element allOf
            if let Some(Value::Array(all_of)) = map.get("allOf") {
                if all_of.len() == 1 {
                    let inner = all_of[0].clone();
                    return resolve(inner, definitions);
                }
            }

            if map.get("type").and_then(Value::as_str) == Some("object") {
                close_object(&mut map);
            }

            Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, resolve(v, definitions)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| resolve(item, definitions))
                .collect(),
        ),
        other => other,
    }
}

fn close_object(map: &mut Map<String, Value>) {
    map.insert("additionalProperties".to_string(), Value::Bool(false));
    let required: Vec<Value> = map
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().map(Value::String).collect())
        .unwrap_or_default();
    map.insert("required".to_string(), Value::Array(required));
}
