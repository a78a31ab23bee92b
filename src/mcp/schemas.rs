//! JSON schema builders for MCP tools.

use crate::processing::SearchSettings;
use serde_json::{Map, Value, json};

/// Build the schema describing the `search` tool input.
pub(crate) fn search_input_schema(settings: &SearchSettings) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "query_text".into(),
        string_schema("Natural language question to embed and search with"),
    );

    let mut top_k_schema = Map::new();
    top_k_schema.insert("type".into(), Value::String("integer".into()));
    top_k_schema.insert(
        "description".into(),
        Value::String("Number of chunks to return; larger values are clamped".into()),
    );
    top_k_schema.insert("minimum".into(), Value::Number(1.into()));
    top_k_schema.insert(
        "default".into(),
        Value::Number(serde_json::Number::from(settings.default_top_k as u64)),
    );
    top_k_schema.insert(
        "maximum".into(),
        Value::Number(serde_json::Number::from(settings.max_top_k as u64)),
    );
    properties.insert("top_k".into(), Value::Object(top_k_schema));

    let mut scalar_types = Map::new();
    scalar_types.insert(
        "type".into(),
        Value::Array(
            ["string", "number", "integer", "boolean"]
                .into_iter()
                .map(|kind| Value::String(kind.into()))
                .collect(),
        ),
    );
    let mut filters_schema = Map::new();
    filters_schema.insert("type".into(), Value::String("object".into()));
    filters_schema.insert(
        "description".into(),
        Value::String(
            "Exact-match metadata constraints combined with AND, e.g. {\"source_file\": \"guide.pdf\"}"
                .into(),
        ),
    );
    filters_schema.insert("additionalProperties".into(), Value::Object(scalar_types));
    properties.insert("filters".into(), Value::Object(filters_schema));

    let mut schema = finalize_object_schema(properties, &["query_text"]);
    schema.insert(
        "examples".into(),
        Value::Array(vec![
            json!({ "query_text": "how long should a toddler nap" }),
            json!({
                "query_text": "bedtime routine",
                "top_k": 5,
                "filters": { "source_file": "sleep-guide.pdf" }
            }),
        ]),
    );
    schema
}

/// Schema representing an empty object (used for parameterless tools).
pub(crate) fn empty_object_schema() -> Map<String, Value> {
    finalize_object_schema(Map::new(), &[])
}

fn string_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("string".into()));
    schema.insert("description".into(), Value::String(description.into()));
    Value::Object(schema)
}

fn finalize_object_schema(properties: Map<String, Value>, required: &[&str]) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert(
            "required".into(),
            Value::Array(
                required
                    .iter()
                    .map(|&key| Value::String(key.into()))
                    .collect(),
            ),
        );
    }
    schema.insert("additionalProperties".into(), Value::Bool(false));
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectors::IndexRef;

    #[test]
    fn search_schema_reflects_limits() {
        let schema = search_input_schema(&SearchSettings {
            index: IndexRef::new("b", "i"),
            default_top_k: 3,
            max_top_k: 30,
        });

        assert_eq!(schema["required"], json!(["query_text"]));
        assert_eq!(schema["properties"]["top_k"]["default"], json!(3));
        assert_eq!(schema["properties"]["top_k"]["maximum"], json!(30));
        assert_eq!(schema["properties"]["filters"]["type"], json!("object"));
    }
}
