use crate::errors::ToolError;
use crate::utils::suggest::suggest;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_MAP: Lazy<HashMap<String, ToolDef>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .cloned()
        .map(|tool| (tool.name.clone(), tool))
        .collect()
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tool in TOOL_CATALOG.iter() {
        if let Ok(schema) = JSONSchema::compile(&tool.input_schema) {
            map.insert(tool.name.clone(), schema);
        }
    }
    map
});

const TRACE_FIELDS: &[&str] = &["trace_id", "span_id", "parent_span_id"];

pub fn tool_catalog() -> &'static Vec<ToolDef> {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_MAP.get(name)
}

pub fn list_tools() -> Vec<ToolDef> {
    TOOL_CATALOG
        .iter()
        .map(|tool| ToolDef {
            name: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: strip_trace_fields(&tool.input_schema),
        })
        .collect()
}

pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), ToolError> {
    let Some(tool) = tool_by_name(tool_name) else {
        return Ok(());
    };
    let Some(schema) = TOOL_VALIDATORS.get(tool_name) else {
        return Ok(());
    };
    if let Err(errors) = schema.validate(args) {
        return Err(format_schema_errors(tool, args, errors));
    }
    Ok(())
}

fn schema_property_names(tool: &ToolDef) -> Vec<String> {
    tool.input_schema
        .get("properties")
        .and_then(|v| v.as_object())
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}

fn format_schema_errors(
    tool: &ToolDef,
    args: &Value,
    errors: jsonschema::ErrorIterator,
) -> ToolError {
    let mut rendered = Vec::new();
    let mut did_you_means = Vec::new();

    for err in errors.take(10) {
        let instance_path = if err.instance_path.to_string().is_empty() {
            "(root)".to_string()
        } else {
            err.instance_path.to_string()
        };
        match &err.kind {
            jsonschema::error::ValidationErrorKind::AdditionalProperties { unexpected } => {
                for unknown in unexpected {
                    rendered.push(format!("{}: unknown field '{}'", instance_path, unknown));
                    let known = schema_property_names(tool);
                    let suggestions = suggest(unknown, &known, 3);
                    if !suggestions.is_empty() {
                        did_you_means
                            .push(format!("field '{}': {}", unknown, suggestions.join(", ")));
                    }
                }
            }
            jsonschema::error::ValidationErrorKind::Enum { options } => {
                let allowed: Vec<String> = options
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .map(|v| {
                                v.as_str()
                                    .map(|s| s.to_string())
                                    .unwrap_or_else(|| v.to_string())
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                rendered.push(format!(
                    "{}: expected one of {}",
                    instance_path,
                    allowed.join(", ")
                ));
                let received = instance_value(args, &err.instance_path.to_string());
                if let Some(received) = received.as_str() {
                    let suggestions = suggest(received, &allowed, 1);
                    if !suggestions.is_empty() {
                        did_you_means
                            .push(format!("{}: {}", instance_path, suggestions.join(", ")));
                    }
                }
            }
            jsonschema::error::ValidationErrorKind::Required { property } => {
                let prop = property
                    .as_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| property.to_string());
                rendered.push(format!(
                    "{}: missing required field '{}'",
                    instance_path, prop
                ));
            }
            _ => {
                rendered.push(format!("{}: {}", instance_path, err));
            }
        }
    }

    let mut lines = vec![format!("Invalid arguments for {}", tool.name)];
    lines.extend(rendered.iter().map(|line| format!("- {}", line)));
    let mut error = ToolError::invalid_argument(lines.join("\n"));
    if !did_you_means.is_empty() {
        error = error.with_hint(format!("Did you mean: {}", did_you_means.join(" | ")));
    }
    error
}

fn instance_value(root: &Value, instance_path: &str) -> Value {
    let mut current = root;
    for segment in instance_path.trim_start_matches('/').split('/') {
        if segment.is_empty() {
            continue;
        }
        if let Some(obj) = current.as_object() {
            current = obj.get(segment).unwrap_or(&Value::Null);
        } else if let Some(arr) = current.as_array() {
            let idx = segment.parse::<usize>().unwrap_or(0);
            current = arr.get(idx).unwrap_or(&Value::Null);
        }
    }
    current.clone()
}

fn strip_trace_fields(schema: &Value) -> Value {
    let Some(obj) = schema.as_object() else {
        return schema.clone();
    };
    let mut out = obj.clone();
    if let Some(props) = out.get_mut("properties").and_then(|v| v.as_object_mut()) {
        for field in TRACE_FIELDS {
            props.remove(*field);
        }
    }
    if let Some(required) = out.get_mut("required").and_then(|v| v.as_array_mut()) {
        required.retain(|v| {
            v.as_str()
                .map(|s| !TRACE_FIELDS.contains(&s))
                .unwrap_or(true)
        });
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_contains_search_jobs() {
        assert!(tool_by_name("search_jobs").is_some());
        assert!(tool_by_name("search_resumes").is_none());
    }

    #[test]
    fn listed_schema_hides_trace_fields() {
        let tools = list_tools();
        let search = tools.iter().find(|t| t.name == "search_jobs").unwrap();
        let props = search.input_schema["properties"].as_object().unwrap();
        assert!(!props.contains_key("trace_id"));
        assert!(props.contains_key("role"));
    }

    #[test]
    fn valid_args_pass() {
        let args = json!({"role": "rust developer", "num_jobs": 5, "platform": "linkedin"});
        assert!(validate_tool_args("search_jobs", &args).is_ok());
    }

    #[test]
    fn missing_role_is_reported() {
        let err = validate_tool_args("search_jobs", &json!({})).unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
        assert!(err.message.contains("role"));
    }

    #[test]
    fn unknown_field_gets_suggestion() {
        let err =
            validate_tool_args("search_jobs", &json!({"role": "dev", "citi": "Berlin"}))
                .unwrap_err();
        assert!(err.hint.unwrap().contains("city"));
    }

    #[test]
    fn platform_enum_typo_gets_suggestion() {
        let err = validate_tool_args(
            "search_jobs",
            &json!({"role": "dev", "platform": "linkdin"}),
        )
        .unwrap_err();
        assert!(err.hint.unwrap().contains("linkedin"));
    }
}
