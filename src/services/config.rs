use crate::constants::{network, search};
use crate::errors::ToolError;
use once_cell::sync::OnceCell;
use url::Url;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub api_host: String,
    pub http_timeout_ms: u64,
    pub tool_timeout_ms: u64,
}

static CONFIG: OnceCell<AppConfig> = OnceCell::new();

impl AppConfig {
    pub fn resolve() -> Result<&'static AppConfig, ToolError> {
        CONFIG.get_or_try_init(AppConfig::from_env)
    }

    pub fn from_env() -> Result<AppConfig, ToolError> {
        let api_key = std::env::var("RAPIDAPI_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let api_host = std::env::var("RAPIDAPI_HOST")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| search::DEFAULT_HOST.to_string());
        validate_host(&api_host)?;

        Ok(AppConfig {
            api_key,
            api_host,
            http_timeout_ms: env_u64("JOBMESH_HTTP_TIMEOUT_MS", network::TIMEOUT_API_REQUEST_MS),
            tool_timeout_ms: env_u64(
                "JOBMESH_TOOL_TIMEOUT_MS",
                network::TIMEOUT_MCP_TOOL_CALL_MS,
            ),
        })
    }
}

fn validate_host(host: &str) -> Result<(), ToolError> {
    let looks_plain = !host.contains('/') && !host.contains(':') && !host.contains(' ');
    let parses = Url::parse(&format!("https://{}", host))
        .map(|url| url.host_str() == Some(host))
        .unwrap_or(false);
    if looks_plain && parses {
        return Ok(());
    }
    Err(ToolError::config(format!(
        "RAPIDAPI_HOST is not a valid host name: {}",
        host
    ))
    .with_hint(format!("Expected a bare host like {}", search::DEFAULT_HOST)))
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_host() {
        assert!(validate_host("jsearch.p.rapidapi.com").is_ok());
    }

    #[test]
    fn rejects_host_with_scheme_or_path() {
        assert!(validate_host("https://jsearch.p.rapidapi.com").is_err());
        assert!(validate_host("jsearch.p.rapidapi.com/search").is_err());
        assert!(validate_host("host name with spaces").is_err());
    }
}
