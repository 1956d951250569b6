/// API key and search-engine id for the structured search fallback.
#[derive(Clone, PartialEq, Eq)]
pub struct CustomSearchCredentials {
    pub api_key: String,
    pub engine_id: String,
}

impl std::fmt::Debug for CustomSearchCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomSearchCredentials")
            .field("api_key", &"[redacted]")
            .field("engine_id", &self.engine_id)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub search_url: String,
    pub custom_search_url: String,
    pub custom_search: Option<CustomSearchCredentials>,
    pub proxy_list_url: String,
    pub proxy_refresh: bool,
    pub search_attempts: u32,
    pub search_delay_min_ms: u64,
    pub search_delay_max_ms: u64,
    pub fetch_attempts: u32,
    pub row_pacing_ms: u64,
    pub search_query_suffix: String,
    pub profile_url_marker: String,
    pub sheets_api_url: String,
    pub drive_api_url: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("search_url", &self.search_url)
            .field("custom_search_url", &self.custom_search_url)
            .field("custom_search", &self.custom_search)
            .field("proxy_list_url", &self.proxy_list_url)
            .field("proxy_refresh", &self.proxy_refresh)
            .field("search_attempts", &self.search_attempts)
            .field("search_delay_min_ms", &self.search_delay_min_ms)
            .field("search_delay_max_ms", &self.search_delay_max_ms)
            .field("fetch_attempts", &self.fetch_attempts)
            .field("row_pacing_ms", &self.row_pacing_ms)
            .field("search_query_suffix", &self.search_query_suffix)
            .field("profile_url_marker", &self.profile_url_marker)
            .field("sheets_api_url", &self.sheets_api_url)
            .field("drive_api_url", &self.drive_api_url)
            .finish()
    }
}
