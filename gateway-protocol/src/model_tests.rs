//! Unit tests for the wire types

#[cfg(test)]
mod tests {
    use super::super::model::*;
    use serde_json::json;

    fn add_numbers() -> Tool {
        Tool {
            name: "add_numbers".to_string(),
            description: "Add two numbers".to_string(),
            input_schema: InputSchema::object()
                .with_property("number1", PropertySpec::new("number", "first number"), true)
                .with_property("number2", PropertySpec::new("number", "second number"), true),
        }
    }

    #[test]
    fn test_tool_uses_camel_case_schema_key() {
        let value = serde_json::to_value(add_numbers()).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("input_schema").is_none());
        assert_eq!(value["inputSchema"]["type"], "object");
        assert_eq!(value["inputSchema"]["properties"]["number1"]["type"], "number");
        assert_eq!(value["inputSchema"]["required"], json!(["number1", "number2"]));
    }

    #[test]
    fn test_schema_defaults_when_fields_missing() {
        let schema: InputSchema = serde_json::from_value(json!({"type": "object"})).unwrap();
        assert!(schema.properties.is_empty());
        assert!(schema.required.is_empty());

        let property: PropertySpec = serde_json::from_value(json!({"type": "string"})).unwrap();
        assert_eq!(property.description, "");
    }

    #[test]
    fn test_with_property_does_not_duplicate_required() {
        let schema = InputSchema::object()
            .with_property("a", PropertySpec::new("string", ""), true)
            .with_property("a", PropertySpec::new("number", ""), true);
        assert_eq!(schema.required, vec!["a"]);
        assert_eq!(schema.properties["a"].kind, "number");
    }

    #[test]
    fn test_success_envelope_shape() {
        let response = CallToolResponse::success("🤖 result = 40");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "result": {
                    "content": [{"type": "text", "text": "🤖 result = 40"}],
                    "isError": false
                }
            })
        );
        assert!(!response.is_error());
        assert_eq!(response.text(), Some("🤖 result = 40"));
    }

    #[test]
    fn test_error_envelope_shape() {
        let response = CallToolResponse::error("Invalid JSON payload");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["result"]["isError"], true);
        assert_eq!(value["result"]["content"][0]["type"], "text");
        assert_eq!(value["result"]["content"][0]["text"], "Invalid JSON payload");
    }

    #[test]
    fn test_envelope_field_order() {
        let serialized = serde_json::to_string(&CallToolResponse::success("ok")).unwrap();
        assert_eq!(
            serialized,
            r#"{"result":{"content":[{"type":"text","text":"ok"}],"isError":false}}"#
        );
    }

    #[test]
    fn test_call_request_arguments_default_to_null() {
        let request: CallToolRequest = serde_json::from_value(json!({"name": "say_hello"})).unwrap();
        assert_eq!(request.name, "say_hello");
        assert!(request.arguments.is_null());
    }

    #[test]
    fn test_list_response_round_trip_keeps_order() {
        let mut second = add_numbers();
        second.name = "say_hello".to_string();
        let response = ListToolsResponse::new(vec![second, add_numbers()]);

        let bytes = serde_json::to_vec(&response).unwrap();
        let parsed: ListToolsResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.result.tools[0].name, "say_hello");
        assert_eq!(parsed.result.tools[1].name, "add_numbers");
    }
}
