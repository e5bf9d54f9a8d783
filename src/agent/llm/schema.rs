//! Tool-schema helpers shared by the provider adapters.

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::tools::ToolDefinition;

/// Normalize one parameter schema.
///
/// Anything that is not an object with a string `type` degrades to a plain
/// string parameter, keeping the description when one is present.
pub(crate) fn property_schema(value: &Value) -> Value {
    match value {
        Value::Object(map) if map.get("type").map_or(false, Value::is_string) => value.clone(),
        Value::Object(map) => match map.get("description") {
            Some(desc @ Value::String(_)) => json!({"type": "string", "description": desc}),
            _ => json!({"type": "string"}),
        },
        _ => json!({"type": "string"}),
    }
}

/// JSON-Schema `object` for a tool's parameters, as Anthropic and OpenAI take it.
pub(crate) fn object_schema(tool: &ToolDefinition) -> Value {
    let properties: Map<String, Value> = tool
        .parameters
        .iter()
        .map(|(name, schema)| (name.clone(), property_schema(schema)))
        .collect();
    with_required(json!({"type": "object", "properties": properties}), tool)
}

/// Gemini's OpenAPI subset: only `type` and `description` survive per field.
pub(crate) fn gemini_schema(tool: &ToolDefinition) -> Value {
    let properties: Map<String, Value> = tool
        .parameters
        .iter()
        .map(|(name, schema)| {
            let schema = property_schema(schema);
            let mut field = Map::new();
            if let Some(t) = schema.get("type") {
                field.insert("type".to_string(), t.clone());
            }
            if let Some(d) = schema.get("description") {
                field.insert("description".to_string(), d.clone());
            }
            (name.clone(), Value::Object(field))
        })
        .collect();
    with_required(json!({"type": "object", "properties": properties}), tool)
}

fn with_required(mut schema: Value, tool: &ToolDefinition) -> Value {
    if !tool.required.is_empty() {
        schema["required"] = json!(tool.required);
    }
    schema
}

/// Identifier for a tool call whose backend supplied none.
pub(crate) fn synthesize_call_id() -> String {
    format!("call_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> ToolDefinition {
        let mut parameters = Map::new();
        parameters.insert(
            "path".to_string(),
            json!({"type": "string", "description": "File path"}),
        );
        parameters.insert("weird".to_string(), json!(42));
        parameters.insert("untyped".to_string(), json!({"description": "No type"}));
        ToolDefinition {
            name: "read_file".to_string(),
            description: "Read a file".to_string(),
            parameters,
            required: vec!["path".to_string()],
        }
    }

    #[test]
    fn test_object_schema_preserves_known_shapes() {
        let schema = object_schema(&tool());
        assert_eq!(schema["type"], "object");
        assert_eq!(
            schema["properties"]["path"],
            json!({"type": "string", "description": "File path"})
        );
        assert_eq!(schema["required"], json!(["path"]));
    }

    #[test]
    fn test_unknown_shapes_degrade_to_string() {
        let schema = object_schema(&tool());
        assert_eq!(schema["properties"]["weird"], json!({"type": "string"}));
        assert_eq!(
            schema["properties"]["untyped"],
            json!({"type": "string", "description": "No type"})
        );
    }

    #[test]
    fn test_gemini_schema_keeps_type_and_description() {
        let mut def = tool();
        def.parameters.insert(
            "mode".to_string(),
            json!({"type": "string", "description": "Mode", "additionalProperties": false}),
        );
        let schema = gemini_schema(&def);
        assert_eq!(
            schema["properties"]["mode"],
            json!({"type": "string", "description": "Mode"})
        );
        assert_eq!(schema["required"], json!(["path"]));
    }

    #[test]
    fn test_required_omitted_when_empty() {
        let mut def = tool();
        def.required.clear();
        assert!(object_schema(&def).get("required").is_none());
    }

    #[test]
    fn test_synthesized_ids_are_unique() {
        let a = synthesize_call_id();
        let b = synthesize_call_id();
        assert!(a.starts_with("call_"));
        assert_ne!(a, b);
    }
}
