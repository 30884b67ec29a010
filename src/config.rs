use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

/// Optional config file picked up from the working directory.
const DEFAULT_CONFIG_FILE: &str = "ledger-chat.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Base URL of the accounting backend
    #[arg(long, env = "BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Escape reply text before formatting
    #[arg(long, env = "ESCAPE_MARKUP")]
    pub escape_markup: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub widget: WidgetConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Directory served under `/static`.
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub chat_path: String,
    pub schema_path: String,
    /// Request timeout in seconds; 0 waits forever.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            chat_path: "/api/chat/accounting".to_string(),
            schema_path: "/api/accounting/schema".to_string(),
            timeout_secs: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetConfig {
    /// Mode the selector starts in.
    pub initial_mode: String,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct RenderConfig {
    /// HTML-escape reply text before formatting markers are applied.
    pub escape_markup: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let backend = BackendConfig::default();
        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.static_dir", "static")?
            .set_default("backend.base_url", backend.base_url)?
            .set_default("backend.chat_path", backend.chat_path)?
            .set_default("backend.schema_path", backend.schema_path)?
            .set_default("backend.timeout_secs", backend.timeout_secs)?
            .set_default("widget.initial_mode", "accounting")?
            .set_default("render.escape_markup", false)?;

        // Explicit file must exist; the cwd fallback is optional.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::new(path, FileFormat::Yaml)),
            None => builder
                .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false)),
        };

        // E.g. LEDGER_CHAT__SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("LEDGER_CHAT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        // Priority: CLI flag > CLI env var > prefixed env > config file > defaults.
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(url) = cli.backend_url {
            builder = builder.set_override("backend.base_url", url)?;
        }
        if let Some(escape) = cli.escape_markup {
            builder = builder.set_override("render.escape_markup", escape)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }

    /// Address the page server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
