use crate::errors::ToolError;
use crate::services::jsearch::{JSearchClient, SearchQuery};
use crate::services::logger::Logger;
use crate::services::normalize::normalize;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub struct SearchManager {
    logger: Logger,
    validation: Validation,
    client: JSearchClient,
    tool_timeout_ms: u64,
}

impl SearchManager {
    pub fn new(logger: &Logger, client: JSearchClient, tool_timeout_ms: u64) -> Self {
        Self {
            logger: logger.child("search"),
            validation: Validation::new(),
            client,
            tool_timeout_ms,
        }
    }

    fn parse_query(&self, args: &Value) -> Result<SearchQuery, ToolError> {
        let role = self
            .validation
            .ensure_string(args.get("role").unwrap_or(&Value::Null), "role", true)?;
        let city = self.validation.ensure_optional_string(args.get("city"), "city")?;
        let country = self
            .validation
            .ensure_optional_string(args.get("country"), "country")?;
        let platform = self
            .validation
            .ensure_optional_string(args.get("platform"), "platform")?;
        let num_jobs = self
            .validation
            .ensure_optional_integer(args.get("num_jobs"), "num_jobs")?;
        SearchQuery::new(&role, city, country, platform, num_jobs)
    }

    async fn run_search(&self, query: &SearchQuery) -> Result<Value, ToolError> {
        let raw = self.client.search(query).await?;
        let result = normalize(&raw, query);
        if result.skipped > 0 {
            self.logger.warn(
                "listings skipped during normalization",
                Some(&serde_json::json!({"skipped": result.skipped})),
            );
        }
        self.logger.info(
            "search complete",
            Some(&serde_json::json!({
                "requested": result.requested,
                "returned": result.returned,
                "truncated": result.truncated,
            })),
        );
        serde_json::to_value(&result).map_err(|err| ToolError::internal(err.to_string()))
    }
}

#[async_trait]
impl ToolHandler for SearchManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        let query = self.parse_query(&args)?;
        let deadline = Duration::from_millis(self.tool_timeout_ms);
        match tokio::time::timeout(deadline, self.run_search(&query)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ToolError::cancelled(format!(
                "Search aborted after {} ms",
                self.tool_timeout_ms
            ))
            .with_details(serde_json::json!({"timeout_ms": self.tool_timeout_ms}))),
        }
    }
}
