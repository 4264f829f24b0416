use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::utils::suggest::suggest;
use serde_json::Value;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: Value) -> Result<Value, ToolError>;
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    pub async fn execute(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        let started_at = chrono::Utc::now().timestamp_millis();

        let Some(handler) = self.handlers.get(tool) else {
            let candidates = self.tool_names();
            let suggestions = suggest(tool, &candidates, 3);
            let hint = if suggestions.is_empty() {
                "Call tools/list for the available tools".to_string()
            } else {
                format!("Did you mean: {}", suggestions.join(", "))
            };
            return Err(
                ToolError::invalid_argument(format!("Unknown tool: {}", tool)).with_hint(hint)
            );
        };

        let trace_id = string_arg(&args, "trace_id")
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let span_id =
            string_arg(&args, "span_id").unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let parent_span_id = string_arg(&args, "parent_span_id");

        let mut handler_args = args;
        if let Value::Object(map) = &mut handler_args {
            map.remove("trace_id");
            map.remove("span_id");
            map.remove("parent_span_id");
        }

        self.logger.debug(
            tool,
            Some(&serde_json::json!({"trace_id": trace_id, "span_id": span_id})),
        );

        let result = handler.handle(handler_args).await?;

        Ok(serde_json::json!({
            "ok": true,
            "result": result,
            "meta": {
                "tool": tool,
                "trace_id": trace_id,
                "span_id": span_id,
                "parent_span_id": parent_span_id,
                "duration_ms": chrono::Utc::now().timestamp_millis() - started_at,
            },
        }))
    }
}

fn string_arg(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}
