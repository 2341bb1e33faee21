/// Endpoints the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the classification service; `/classify` is appended.
    pub classify_url: String,
    /// Base URL of the versioned issue API.
    pub api_url: String,
    /// URL of the live snapshot WebSocket.
    pub ws_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            classify_url: "http://localhost:5000/api".into(),
            api_url: "http://localhost:3000/api/v1".into(),
            ws_url: "ws://localhost:3000/api/v1/ws".into(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var        | Default                          |
    /// |----------------|----------------------------------|
    /// | `CLASSIFY_URL` | `http://localhost:5000/api`      |
    /// | `API_URL`      | `http://localhost:3000/api/v1`   |
    /// | `WS_URL`       | `ws://localhost:3000/api/v1/ws`  |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str, default: String| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };
        Self {
            classify_url: var("CLASSIFY_URL", defaults.classify_url),
            api_url: var("API_URL", defaults.api_url),
            ws_url: var("WS_URL", defaults.ws_url),
        }
    }

    /// All three endpoints of a single campus-api server at `base_url`
    /// (e.g. `http://127.0.0.1:3000`).
    pub fn for_server(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        Self {
            classify_url: format!("{base}/api"),
            api_url: format!("{base}/api/v1"),
            ws_url: format!("{ws_base}/api/v1/ws"),
        }
    }
}
