use clap::Parser;
use std::time::Duration;

/// Server configuration, from command-line flags with environment fallbacks
#[derive(Debug, Clone, Parser)]
#[command(name = "growth-mindset")]
#[command(about = "Growth Mindset App: goals, reflections, tags and spreadsheet tools")]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "GROWTH_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port for the HTTP server
    #[arg(short, long, env = "GROWTH_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Seconds a session may stay idle before it is dropped
    #[arg(long, env = "GROWTH_SESSION_TTL_SECS", default_value_t = 24 * 60 * 60)]
    pub session_ttl_secs: u64,

    /// Largest accepted upload, in megabytes
    #[arg(long, env = "GROWTH_MAX_UPLOAD_MB", default_value_t = 200)]
    pub max_upload_mb: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            session_ttl_secs: 24 * 60 * 60,
            max_upload_mb: 200,
        }
    }
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
