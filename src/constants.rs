pub mod network {
    pub const TIMEOUT_API_REQUEST_MS: u64 = 15_000;
    pub const TIMEOUT_MCP_TOOL_CALL_MS: u64 = 55_000;
}

pub mod retry {
    pub const MAX_ATTEMPTS: usize = 3;
    pub const BASE_DELAY_MS: u64 = 250;
    pub const MAX_DELAY_MS: u64 = 5_000;
    pub const JITTER: f64 = 0.2;
    pub const STATUS_CODES: &[u16] = &[408, 429, 500, 502, 503, 504];
}

pub mod search {
    pub const MAX_RESULTS: usize = 20;
    pub const DEFAULT_RESULTS: usize = 5;
    pub const RESULTS_PER_PAGE: usize = 10;
    pub const SNIPPET_MAX_CHARS: usize = 400;
    pub const DEFAULT_HOST: &str = "jsearch.p.rapidapi.com";
    pub const SEARCH_PATH: &str = "/search";
}
