use crate::errors::ToolError;
use crate::managers::search::SearchManager;
use crate::mcp::catalog::tool_catalog;
use crate::services::config::AppConfig;
use crate::services::jsearch::JSearchClient;
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub config: &'static AppConfig,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(
        handlers: &HashMap<String, Arc<dyn ToolHandler>>,
    ) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint("Every tool in tool_catalog.json must have a handler")
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    pub fn initialize() -> Result<Self, ToolError> {
        let logger = Logger::new("jobmesh");
        let config = AppConfig::resolve()?;
        if config.api_key.is_none() {
            logger.warn(
                "RAPIDAPI_KEY is not set; authenticated searches will fail until it is provided",
                None,
            );
        }

        let client = JSearchClient::from_config(&logger, config)?;
        let search_manager = Arc::new(SearchManager::new(
            &logger,
            client,
            config.tool_timeout_ms,
        ));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert("search_jobs".to_string(), search_manager);

        Self::validate_tool_wiring(&handlers)?;

        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));

        Ok(Self {
            logger,
            config,
            tool_executor,
        })
    }
}
