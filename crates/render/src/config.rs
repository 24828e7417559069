use std::time::Duration;

/// Text-to-image endpoint configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Full URL of the generation endpoint. `None` disables rendering.
    pub api_url: Option<String>,
    /// Bearer token sent with every request.
    pub api_key: Option<String>,
    /// Model identifier passed through to the endpoint.
    pub model: String,
    pub width: u32,
    pub height: u32,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            model: "flux-schnell".to_string(),
            width: 1024,
            height: 768,
            timeout: Duration::from_secs(60),
        }
    }
}

impl RenderConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default        |
    /// |------------------------|----------------|
    /// | `DIAGRAM_API_URL`      | unset          |
    /// | `DIAGRAM_API_KEY`      | unset          |
    /// | `DIAGRAM_MODEL`        | `flux-schnell` |
    /// | `DIAGRAM_WIDTH`        | `1024`         |
    /// | `DIAGRAM_HEIGHT`       | `768`          |
    /// | `DIAGRAM_TIMEOUT_SECS` | `60`           |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let non_empty = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            api_url: non_empty("DIAGRAM_API_URL"),
            api_key: non_empty("DIAGRAM_API_KEY"),
            model: non_empty("DIAGRAM_MODEL").unwrap_or(defaults.model),
            width: parse_or("DIAGRAM_WIDTH", defaults.width),
            height: parse_or("DIAGRAM_HEIGHT", defaults.height),
            timeout: Duration::from_secs(parse_or(
                "DIAGRAM_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )),
        }
    }
}

/// Parse an env var, falling back (with a warning) when it is unset or invalid.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
