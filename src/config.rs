// Application configuration, loaded from environment variables and CLI flags.

use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (SQLite connection string).
    pub database_url: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared token the transport gateway authenticates with. When unset,
    /// the API runs open (local development).
    pub gateway_token: Option<String>,
    /// Chat id receiving invariant-violation reports. When unset, reports
    /// are only logged.
    pub operator_chat_id: Option<i64>,
    /// Time budget for a single store operation, in milliseconds.
    pub store_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:hogfarm.db?mode=rwc`)
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `GATEWAY_TOKEN` - bearer token required from the gateway
    /// - `OPERATOR_CHAT_ID` - chat id for invariant reports
    /// - `STORE_TIMEOUT_MS` - store operation budget (default: 5000)
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    /// - `--database-url <URL>` - Override the database URL
    /// - `--token <TOKEN>` - Override the gateway token
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();

        let database_url = Self::parse_cli_value(&args, "--database-url")
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| "sqlite:hogfarm.db?mode=rwc".to_string());

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(&args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
            .unwrap_or(3000);

        let gateway_token = Self::parse_cli_value(&args, "--token")
            .or_else(|| std::env::var("GATEWAY_TOKEN").ok())
            .filter(|t| !t.is_empty());

        let operator_chat_id = std::env::var("OPERATOR_CHAT_ID")
            .ok()
            .and_then(|v| v.parse().ok());

        let store_timeout_ms = std::env::var("STORE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        Config {
            database_url,
            port,
            gateway_token,
            operator_chat_id,
            store_timeout_ms,
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}
