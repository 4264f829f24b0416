use crate::constants::{retry as retry_constants, search};
use crate::errors::ToolError;
use crate::services::config::AppConfig;
use crate::services::logger::Logger;
use crate::utils::suggest::suggest;
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const PLATFORMS: &[&str] = &["linkedin", "indeed", "glassdoor"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub role: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub platform: Option<String>,
    pub requested: usize,
    pub num_results: usize,
}

impl SearchQuery {
    pub fn new(
        role: &str,
        city: Option<String>,
        country: Option<String>,
        platform: Option<String>,
        num_results: Option<i64>,
    ) -> Result<Self, ToolError> {
        let role = role.trim();
        if role.is_empty() {
            return Err(ToolError::invalid_argument("role must not be empty"));
        }

        let platform = match platform {
            None => None,
            Some(raw) => {
                let normalized = raw.trim().to_lowercase();
                if normalized.is_empty() {
                    None
                } else if PLATFORMS.contains(&normalized.as_str()) {
                    Some(normalized)
                } else {
                    let candidates: Vec<String> =
                        PLATFORMS.iter().map(|p| p.to_string()).collect();
                    let mut err = ToolError::invalid_argument(format!(
                        "platform must be one of {}",
                        PLATFORMS.join(", ")
                    ));
                    let suggestions = suggest(&normalized, &candidates, 1);
                    if let Some(candidate) = suggestions.first() {
                        err = err.with_hint(format!("Did you mean: {}", candidate));
                    }
                    return Err(err);
                }
            }
        };

        let requested = num_results
            .unwrap_or(search::DEFAULT_RESULTS as i64)
            .max(1) as usize;
        let num_results = requested.min(search::MAX_RESULTS);

        Ok(Self {
            role: role.to_string(),
            city: city.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            country: country
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            platform,
            requested,
            num_results,
        })
    }

    pub fn capped(&self) -> bool {
        self.requested > self.num_results
    }

    pub fn query_text(&self) -> String {
        let mut text = self.role.clone();
        let location = match (self.city.as_deref(), self.country.as_deref()) {
            (Some(city), Some(country)) => Some(format!("{}, {}", city, country)),
            (Some(city), None) => Some(city.to_string()),
            (None, Some(country)) => Some(country.to_string()),
            (None, None) => None,
        };
        if let Some(location) = location {
            text.push_str(" in ");
            text.push_str(&location);
        }
        if let Some(platform) = self.platform.as_deref() {
            text.push_str(" via ");
            text.push_str(platform);
        }
        text
    }

    pub fn pages_needed(&self) -> usize {
        self.num_results.div_ceil(search::RESULTS_PER_PAGE)
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequestSpec {
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub timeout_ms: u64,
}

pub fn build_request(
    query: &SearchQuery,
    endpoint: &Url,
    api_key: Option<&str>,
    host: &str,
    timeout_ms: u64,
) -> HttpRequestSpec {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("query", &query.query_text())
        .append_pair("page", "1")
        .append_pair("num_pages", &query.pages_needed().to_string());

    let mut headers = vec![("X-RapidAPI-Host".to_string(), host.to_string())];
    if let Some(key) = api_key {
        headers.push(("X-RapidAPI-Key".to_string(), key.to_string()));
    }

    HttpRequestSpec {
        url,
        headers,
        timeout_ms,
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: f64,
    pub status_codes: Vec<u16>,
    pub respect_retry_after: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::MAX_ATTEMPTS,
            base_delay_ms: retry_constants::BASE_DELAY_MS,
            max_delay_ms: retry_constants::MAX_DELAY_MS,
            jitter: retry_constants::JITTER,
            status_codes: retry_constants::STATUS_CODES.to_vec(),
            respect_retry_after: true,
        }
    }
}

impl RetryPolicy {
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.status_codes.contains(&status)
    }

    pub fn delay_for_attempt(&self, attempt: usize, retry_after_ms: Option<u64>) -> u64 {
        let factor: f64 = 2.0;
        let mut delay =
            (self.base_delay_ms as f64) * factor.powi(attempt.saturating_sub(1) as i32);
        if delay > self.max_delay_ms as f64 {
            delay = self.max_delay_ms as f64;
        }
        if self.jitter > 0.0 {
            let delta = delay * self.jitter;
            delay = delay - delta + rand::random::<f64>() * delta * 2.0;
        }
        if self.respect_retry_after {
            if let Some(hinted) = retry_after_ms {
                if hinted as f64 > delay {
                    delay = hinted as f64;
                }
            }
        }
        delay.max(0.0) as u64
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

enum Attempt {
    Done(RawResponse),
    Retry {
        status: Option<u16>,
        retry_after_ms: Option<u64>,
        error: ToolError,
    },
}

pub struct JSearchClient {
    logger: Logger,
    http: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
    host: String,
    policy: RetryPolicy,
    timeout_ms: u64,
}

impl JSearchClient {
    pub fn new(
        logger: &Logger,
        endpoint: Url,
        api_key: Option<String>,
        host: String,
        policy: RetryPolicy,
        timeout_ms: u64,
    ) -> Self {
        Self {
            logger: logger.child("jsearch"),
            http: reqwest::Client::new(),
            endpoint,
            api_key,
            host,
            policy,
            timeout_ms,
        }
    }

    pub fn from_config(logger: &Logger, config: &AppConfig) -> Result<Self, ToolError> {
        let endpoint = Url::parse(&format!(
            "https://{}{}",
            config.api_host,
            search::SEARCH_PATH
        ))
        .map_err(|err| {
            ToolError::config(format!("Cannot build upstream endpoint: {}", err))
        })?;
        Ok(Self::new(
            logger,
            endpoint,
            config.api_key.clone(),
            config.api_host.clone(),
            RetryPolicy::default(),
            config.http_timeout_ms,
        ))
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<RawResponse, ToolError> {
        let spec = build_request(
            query,
            &self.endpoint,
            self.api_key.as_deref(),
            &self.host,
            self.timeout_ms,
        );
        self.execute(&spec).await
    }

    pub async fn execute(&self, spec: &HttpRequestSpec) -> Result<RawResponse, ToolError> {
        let mut attempt = 0;
        let mut last_error: Option<ToolError> = None;

        while attempt < self.policy.max_attempts {
            attempt += 1;
            match self.attempt_once(spec).await? {
                Attempt::Done(raw) => return Ok(raw),
                Attempt::Retry {
                    status,
                    retry_after_ms,
                    error,
                } => {
                    last_error = Some(error);
                    if attempt >= self.policy.max_attempts {
                        break;
                    }
                    let delay = self.policy.delay_for_attempt(attempt, retry_after_ms);
                    self.logger.warn(
                        "upstream retry",
                        Some(&serde_json::json!({
                            "attempt": attempt,
                            "status": status,
                            "delay_ms": delay,
                        })),
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
        }

        let attempts = attempt;
        Err(last_error
            .unwrap_or_else(|| ToolError::unavailable("Upstream request failed"))
            .with_details(serde_json::json!({ "attempts": attempts })))
    }

    async fn attempt_once(&self, spec: &HttpRequestSpec) -> Result<Attempt, ToolError> {
        let mut req = self
            .http
            .get(spec.url.clone())
            .timeout(Duration::from_millis(spec.timeout_ms));
        for (name, value) in &spec.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let response = match req.send().await {
            Ok(response) => response,
            Err(err) => {
                let error = if err.is_timeout() {
                    ToolError::unavailable("Upstream request timed out")
                } else {
                    ToolError::unavailable("Upstream is unreachable")
                };
                return Ok(Attempt::Retry {
                    status: None,
                    retry_after_ms: None,
                    error,
                });
            }
        };

        let status = response.status().as_u16();

        if response.status().is_success() {
            let bytes = match response.bytes().await {
                Ok(bytes) => bytes,
                Err(_) => {
                    return Ok(Attempt::Retry {
                        status: Some(status),
                        retry_after_ms: None,
                        error: ToolError::unavailable("Upstream connection dropped mid-body"),
                    });
                }
            };
            return match serde_json::from_slice::<Value>(&bytes) {
                Ok(body) => Ok(Attempt::Done(RawResponse { status, body })),
                Err(_) => Err(ToolError::malformed(
                    "Upstream returned a response that is not valid JSON",
                )),
            };
        }

        if self.policy.should_retry_status(status) {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|seconds| seconds * 1_000);
            let error = if status == 429 {
                ToolError::rate_limited("Upstream rate limited the request (status 429)")
            } else {
                ToolError::unavailable(format!("Upstream is unavailable (status {})", status))
            };
            return Ok(Attempt::Retry {
                status: Some(status),
                retry_after_ms,
                error,
            });
        }

        if status == 401 || status == 403 {
            if self.api_key.is_none() {
                return Err(ToolError::missing_credential(
                    "Upstream requires an API key for this search",
                )
                .with_hint("Set RAPIDAPI_KEY in the environment or .env"));
            }
            return Err(ToolError::unauthorized(format!(
                "Upstream rejected the configured credentials (status {})",
                status
            )));
        }

        Err(ToolError::bad_request(format!(
            "Upstream rejected the request (status {})",
            status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(role: &str) -> SearchQuery {
        SearchQuery::new(role, None, None, None, None).unwrap()
    }

    #[test]
    fn rejects_blank_role() {
        let err = SearchQuery::new("   ", None, None, None, None).unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
    }

    #[test]
    fn clamps_num_results_to_bounds() {
        let low = SearchQuery::new("dev", None, None, None, Some(0)).unwrap();
        assert_eq!(low.num_results, 1);
        assert!(!low.capped());

        let high = SearchQuery::new("dev", None, None, None, Some(10_000)).unwrap();
        assert_eq!(high.num_results, search::MAX_RESULTS);
        assert_eq!(high.requested, 10_000);
        assert!(high.capped());
    }

    #[test]
    fn defaults_num_results() {
        assert_eq!(query("dev").num_results, search::DEFAULT_RESULTS);
    }

    #[test]
    fn composes_query_text_without_stray_separators() {
        let full = SearchQuery::new(
            "rust developer",
            Some("Berlin".to_string()),
            Some("Germany".to_string()),
            Some("linkedin".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(
            full.query_text(),
            "rust developer in Berlin, Germany via linkedin"
        );

        let country_only =
            SearchQuery::new("rust developer", None, Some("Germany".to_string()), None, None)
                .unwrap();
        assert_eq!(country_only.query_text(), "rust developer in Germany");

        assert_eq!(query("rust developer").query_text(), "rust developer");
    }

    #[test]
    fn platform_empty_string_means_no_filter() {
        let q = SearchQuery::new("dev", None, None, Some("".to_string()), None).unwrap();
        assert_eq!(q.platform, None);
        assert!(!q.query_text().contains("via"));
    }

    #[test]
    fn unknown_platform_is_rejected_with_suggestion() {
        let err =
            SearchQuery::new("dev", None, None, Some("linkedn".to_string()), None).unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
        assert!(err.hint.unwrap().contains("linkedin"));
    }

    #[test]
    fn build_request_encodes_query_and_headers() {
        let endpoint = Url::parse("https://jsearch.p.rapidapi.com/search").unwrap();
        let q = SearchQuery::new(
            "C++ & embedded",
            Some("São Paulo".to_string()),
            None,
            None,
            Some(15),
        )
        .unwrap();
        let spec = build_request(
            &q,
            &endpoint,
            Some("secret"),
            "jsearch.p.rapidapi.com",
            15_000,
        );
        let serialized = spec.url.as_str();
        assert!(!serialized.contains("C++ &"));
        assert!(serialized.contains("num_pages=2"));
        assert!(serialized.contains("page=1"));
        assert!(spec
            .headers
            .iter()
            .any(|(name, value)| name == "X-RapidAPI-Key" && value == "secret"));
        assert!(spec
            .headers
            .iter()
            .any(|(name, _)| name == "X-RapidAPI-Host"));
    }

    #[test]
    fn build_request_omits_key_header_when_unset() {
        let endpoint = Url::parse("https://jsearch.p.rapidapi.com/search").unwrap();
        let spec = build_request(&query("dev"), &endpoint, None, "jsearch.p.rapidapi.com", 1);
        assert!(!spec.headers.iter().any(|(name, _)| name == "X-RapidAPI-Key"));
    }

    #[test]
    fn delays_grow_monotonically_across_attempts() {
        let policy = RetryPolicy::default();
        let mut previous = 0;
        for attempt in 1..=3 {
            let delay = policy.delay_for_attempt(attempt, None);
            assert!(delay > previous, "attempt {} delay {} <= {}", attempt, delay, previous);
            previous = delay;
        }
    }

    #[test]
    fn delay_respects_bounds_with_jitter() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let delay = policy.delay_for_attempt(1, None) as f64;
            let base = policy.base_delay_ms as f64;
            assert!(delay >= base * (1.0 - policy.jitter) - 1.0);
            assert!(delay <= base * (1.0 + policy.jitter) + 1.0);
        }
    }

    #[test]
    fn retry_after_wins_when_larger() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for_attempt(1, Some(30_000)), 30_000);
        assert_eq!(policy.delay_for_attempt(1, Some(1)), policy.base_delay_ms);
    }

    #[test]
    fn retryable_status_table() {
        let policy = RetryPolicy::default();
        for status in [408u16, 429, 500, 502, 503, 504] {
            assert!(policy.should_retry_status(status), "{}", status);
        }
        for status in [200u16, 400, 401, 403, 404, 422] {
            assert!(!policy.should_retry_status(status), "{}", status);
        }
    }
}
