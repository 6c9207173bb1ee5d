use crate::app_config::{ActorIds, AppConfig, BrowserSettings, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; tests and callers that
/// manage their own environment use it directly.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; the lookup is injected so parsing can be tested
/// with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Err(_) => Ok(default),
            Ok(raw) => parse_flag(&raw)
                .ok_or_else(|| invalid(var, format!("expected true/false, got '{raw}'"))),
        }
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let env = parse_environment(&or_default("PROSPECTOR_ENV", "development"));
    let bind_addr = parse_addr("PROSPECTOR_BIND_ADDR", "0.0.0.0:3001")?;
    let log_level = or_default("PROSPECTOR_LOG_LEVEL", "info");
    let settings_path = PathBuf::from(or_default(
        "PROSPECTOR_SETTINGS_PATH",
        "./data/settings.json",
    ));
    let prospects_path = PathBuf::from(or_default(
        "PROSPECTOR_PROSPECTS_PATH",
        "./data/prospects.json",
    ));

    let browser_defaults = BrowserSettings::default();
    let browser = BrowserSettings {
        headless: parse_bool("PROSPECTOR_BROWSER_HEADLESS", browser_defaults.headless)?,
        no_sandbox: parse_bool("PROSPECTOR_BROWSER_NO_SANDBOX", browser_defaults.no_sandbox)?,
        chrome_path: optional("PROSPECTOR_CHROME_PATH").map(PathBuf::from),
        navigation_timeout_secs: parse_u64("PROSPECTOR_NAVIGATION_TIMEOUT_SECS", "30")?,
        settle_delay_ms: parse_u64("PROSPECTOR_SETTLE_DELAY_MS", "1500")?,
        search_base_url: or_default(
            "PROSPECTOR_SEARCH_BASE_URL",
            &browser_defaults.search_base_url,
        ),
        search_results: parse_usize("PROSPECTOR_SEARCH_RESULTS", "10")?,
    };

    let apify_base_url = or_default(
        "PROSPECTOR_APIFY_BASE_URL",
        crate::app_config::DEFAULT_APIFY_BASE_URL,
    );
    let apify_request_timeout_secs = parse_u64("PROSPECTOR_APIFY_REQUEST_TIMEOUT_SECS", "60")?;
    let apify_run_timeout_secs = parse_u64("PROSPECTOR_APIFY_RUN_TIMEOUT_SECS", "300")?;
    let apify_max_retries = parse_u32("PROSPECTOR_APIFY_MAX_RETRIES", "2")?;
    let apify_backoff_base_ms = parse_u64("PROSPECTOR_APIFY_BACKOFF_BASE_MS", "500")?;

    let actor_defaults = ActorIds::default();
    let actors = ActorIds {
        profile: optional("PROSPECTOR_ACTOR_PROFILE").unwrap_or(actor_defaults.profile),
        website: optional("PROSPECTOR_ACTOR_WEBSITE").unwrap_or(actor_defaults.website),
        contacts: optional("PROSPECTOR_ACTOR_CONTACTS").unwrap_or(actor_defaults.contacts),
        search: optional("PROSPECTOR_ACTOR_SEARCH").unwrap_or(actor_defaults.search),
        places: optional("PROSPECTOR_ACTOR_PLACES").unwrap_or(actor_defaults.places),
    };

    let rate_limit_per_minute = parse_usize("PROSPECTOR_RATE_LIMIT_PER_MINUTE", "30")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        settings_path,
        prospects_path,
        browser,
        apify_base_url,
        apify_request_timeout_secs,
        apify_run_timeout_secs,
        apify_max_retries,
        apify_backoff_base_ms,
        actors,
        rate_limit_per_minute,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
