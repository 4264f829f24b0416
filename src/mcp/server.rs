use crate::app::App;
use crate::errors::{ErrorCode, McpError, ToolError};
use crate::mcp::catalog::{list_tools, validate_tool_args};
use crate::mcp::prompts::{prompt_catalog, render_prompt};
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

const PROTOCOL_VERSION: &str = "2025-06-18";
const SERVER_NAME: &str = "jobmesh";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn error_envelope(error: &ToolError) -> Value {
    let mut body = serde_json::json!({
        "code": error.code.clone(),
        "message": error.message.clone(),
    });
    if let Some(hint) = &error.hint {
        body["hint"] = Value::String(hint.clone());
    }
    if let Some(details) = &error.details {
        body["details"] = details.clone();
    }
    serde_json::json!({ "ok": false, "error": body })
}

fn tool_content(envelope: &Value, is_error: bool) -> Value {
    serde_json::json!({
        "content": [
            {
                "type": "text",
                "text": serde_json::to_string(envelope).unwrap_or_else(|_| "{}".to_string()),
            }
        ],
        "isError": is_error,
    })
}

pub struct McpServer {
    app: Arc<App>,
}

impl McpServer {
    pub fn new() -> Result<Self, ToolError> {
        let app = App::initialize()?;
        Ok(Self { app: Arc::new(app) })
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {"listChanged": false},
                "prompts": {"listChanged": false},
            },
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
        })
    }

    fn handle_tools_list(&self) -> Value {
        serde_json::json!({ "tools": list_tools() })
    }

    async fn handle_tools_call(&self, name: &str, args: Value) -> Value {
        if let Err(err) = validate_tool_args(name, &args) {
            self.app.logger.warn(
                "tool arguments rejected",
                Some(&serde_json::json!({"tool": name, "code": err.code.clone()})),
            );
            return tool_content(&error_envelope(&err), true);
        }
        match self.app.tool_executor.execute(name, args).await {
            Ok(payload) => tool_content(&payload, false),
            Err(err) => {
                self.app.logger.error(
                    "tool call failed",
                    Some(&serde_json::json!({"tool": name, "code": err.code.clone()})),
                );
                tool_content(&error_envelope(&err), true)
            }
        }
    }

    fn handle_prompts_list(&self) -> Value {
        let prompts: Vec<Value> = prompt_catalog()
            .iter()
            .map(|prompt| {
                serde_json::json!({
                    "name": prompt.name,
                    "description": prompt.description,
                    "arguments": prompt.arguments,
                })
            })
            .collect();
        serde_json::json!({ "prompts": prompts })
    }

    fn handle_prompts_get(&self, params: &Value) -> Result<Value, McpError> {
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::invalid_params("Missing prompt name"))?;
        let args = params.get("arguments").cloned().unwrap_or(Value::Null);
        let rendered =
            render_prompt(name, &args).map_err(|err| McpError::invalid_params(err.message))?;
        Ok(serde_json::json!({
            "description": rendered.description,
            "messages": [
                {
                    "role": "user",
                    "content": {"type": "text", "text": rendered.text},
                }
            ],
        }))
    }

    async fn dispatch(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        match request.method.as_str() {
            "notifications/initialized" => request
                .id
                .map(|id| JsonRpcResponse::success(id, serde_json::json!({}))),
            _ if request.method.starts_with("notifications/") && request.id.is_none() => None,
            "initialize" => request
                .id
                .map(|id| JsonRpcResponse::success(id, self.handle_initialize())),
            "ping" => request
                .id
                .map(|id| JsonRpcResponse::success(id, serde_json::json!({}))),
            "tools/list" => request
                .id
                .map(|id| JsonRpcResponse::success(id, self.handle_tools_list())),
            "tools/call" => {
                let id = request.id?;
                let params = request.params.as_object().cloned().unwrap_or_default();
                let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
                if name.is_empty() {
                    return Some(JsonRpcResponse::failure(
                        id,
                        &McpError::invalid_params("Missing tool name"),
                    ));
                }
                let args = params.get("arguments").cloned().unwrap_or(Value::Null);
                let result = self.handle_tools_call(name, args).await;
                Some(JsonRpcResponse::success(id, result))
            }
            "prompts/list" => request
                .id
                .map(|id| JsonRpcResponse::success(id, self.handle_prompts_list())),
            "prompts/get" => {
                let id = request.id?;
                Some(match self.handle_prompts_get(&request.params) {
                    Ok(result) => JsonRpcResponse::success(id, result),
                    Err(err) => JsonRpcResponse::failure(id, &err),
                })
            }
            method => request
                .id
                .map(|id| JsonRpcResponse::failure(id, &McpError::method_not_found(method))),
        }
    }

    pub async fn run_stdio(&self) -> Result<(), ToolError> {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin).lines();
        let mut writer = BufWriter::new(stdout);

        while let Some(line) = reader
            .next_line()
            .await
            .map_err(|err| ToolError::internal(err.to_string()))?
        {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(trimmed) {
                Ok(request) => request,
                Err(_) => {
                    let error = McpError::new(ErrorCode::ParseError, "Parse error");
                    let response = JsonRpcResponse::failure(Value::Null, &error);
                    write_response(&mut writer, &response).await?;
                    continue;
                }
            };

            if let Some(response) = self.dispatch(request).await {
                write_response(&mut writer, &response).await?;
            }
        }

        Ok(())
    }
}

async fn write_response(
    writer: &mut BufWriter<tokio::io::Stdout>,
    response: &JsonRpcResponse,
) -> Result<(), ToolError> {
    let payload = serde_json::to_string(response).unwrap_or_default();
    writer.write_all(payload.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

pub async fn run_stdio() -> Result<(), ToolError> {
    let server = McpServer::new()?;
    server.run_stdio().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_carries_stable_code() {
        let err = ToolError::rate_limited("Upstream rate limited the request (status 429)");
        let envelope = error_envelope(&err);
        assert_eq!(envelope["ok"], false);
        assert_eq!(envelope["error"]["code"], "UPSTREAM_RATE_LIMITED");
        assert!(envelope["error"]["message"].as_str().is_some());
    }

    #[test]
    fn tool_content_flags_errors() {
        let envelope = error_envelope(&ToolError::invalid_argument("role must not be empty"));
        let content = tool_content(&envelope, true);
        assert_eq!(content["isError"], true);
        let text = content["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("INVALID_ARGUMENT"));
    }
}
