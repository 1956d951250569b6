use crate::app_config::{AppConfig, CustomSearchCredentials};
use crate::ConfigError;

const DEFAULT_PROXY_LIST_URL: &str =
    "https://proxylist.geonode.com/api/proxy-list?limit=500&page=1&sort_by=lastChecked&sort_type=desc";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or a paired variable is missing.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or a paired variable is missing.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_flag(&or_default(var, default)).ok_or_else(|| {
            invalid(
                var,
                "expected one of true/false/1/0/yes/no/on/off".to_string(),
            )
        })
    };

    let log_level = or_default("COENRICH_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("COENRICH_REQUEST_TIMEOUT_SECS", "30")?;

    let search_url = or_default("COENRICH_SEARCH_URL", "https://www.google.com/search");
    let custom_search_url = or_default(
        "COENRICH_CUSTOM_SEARCH_URL",
        "https://www.googleapis.com/customsearch/v1",
    );
    let custom_search = match (
        lookup("GOOGLE_CUSTOM_SEARCH_API_KEY").ok(),
        lookup("GOOGLE_CUSTOM_SEARCH_CX").ok(),
    ) {
        (Some(api_key), Some(engine_id)) => Some(CustomSearchCredentials { api_key, engine_id }),
        (None, None) => None,
        (Some(_), None) => {
            return Err(ConfigError::MissingEnvVar(
                "GOOGLE_CUSTOM_SEARCH_CX".to_string(),
            ))
        }
        (None, Some(_)) => {
            return Err(ConfigError::MissingEnvVar(
                "GOOGLE_CUSTOM_SEARCH_API_KEY".to_string(),
            ))
        }
    };

    let proxy_list_url = or_default("COENRICH_PROXY_LIST_URL", DEFAULT_PROXY_LIST_URL);
    let proxy_refresh = parse_bool("COENRICH_PROXY_REFRESH", "true")?;

    let search_attempts = parse_u32("COENRICH_SEARCH_ATTEMPTS", "3")?;
    let search_delay_min_ms = parse_u64("COENRICH_SEARCH_DELAY_MIN_MS", "5000")?;
    let search_delay_max_ms = parse_u64("COENRICH_SEARCH_DELAY_MAX_MS", "10000")?;
    if search_delay_min_ms > search_delay_max_ms {
        return Err(invalid(
            "COENRICH_SEARCH_DELAY_MIN_MS",
            format!("{search_delay_min_ms} exceeds COENRICH_SEARCH_DELAY_MAX_MS ({search_delay_max_ms})"),
        ));
    }

    let fetch_attempts = parse_u32("COENRICH_FETCH_ATTEMPTS", "1")?;
    if fetch_attempts == 0 {
        return Err(invalid(
            "COENRICH_FETCH_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }

    let row_pacing_ms = parse_u64("COENRICH_ROW_PACING_MS", "10000")?;

    let search_query_suffix = or_default(
        "COENRICH_SEARCH_QUERY_SUFFIX",
        "company linkedin profile url",
    );
    let profile_url_marker = or_default("COENRICH_PROFILE_URL_MARKER", "linkedin.com/company");
    if profile_url_marker.trim().is_empty() {
        return Err(invalid(
            "COENRICH_PROFILE_URL_MARKER",
            "must not be empty".to_string(),
        ));
    }

    let sheets_api_url = or_default("COENRICH_SHEETS_API_URL", "https://sheets.googleapis.com");
    let drive_api_url = or_default("COENRICH_DRIVE_API_URL", "https://www.googleapis.com");

    Ok(AppConfig {
        log_level,
        request_timeout_secs,
        search_url,
        custom_search_url,
        custom_search,
        proxy_list_url,
        proxy_refresh,
        search_attempts,
        search_delay_min_ms,
        search_delay_max_ms,
        fetch_attempts,
        row_pacing_ms,
        search_query_suffix,
        profile_url_marker,
        sheets_api_url,
        drive_api_url,
    })
}

/// Parse a boolean-ish flag. Unrecognized values yield `None`.
fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
