use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::Context;
use clap::{Parser, ValueEnum};

pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama2:7b";

/// Command-line arguments for the relay.
#[derive(Parser, Debug, Clone)]
#[command(name = "insight_relay")]
#[command(about = "Relays text to a local Ollama server and extracts numbered insights")]
#[command(version)]
pub struct CliArgs {
    /// Port to listen on (falls back to the PORT env var, then 8081)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Interface to bind
    #[arg(long, default_value = "0.0.0.0", env = "BIND_HOST")]
    pub host: IpAddr,

    /// Base URL of the inference service
    #[arg(long, default_value = DEFAULT_OLLAMA_URL, env = "OLLAMA_URL")]
    pub ollama_url: String,

    /// Model to pull at startup and generate with
    #[arg(long, default_value = DEFAULT_MODEL, env = "MODEL_NAME")]
    pub model: String,

    /// Shape of the /extract/insights response
    #[arg(long, value_enum, default_value = "insights", env = "RESPONSE_MODE")]
    pub response_mode: ResponseMode,

    /// Sampling temperature (defaults depend on the response mode)
    #[arg(long, env = "TEMPERATURE")]
    pub temperature: Option<f64>,

    /// Nucleus sampling parameter
    #[arg(long, default_value_t = 0.9, env = "TOP_P")]
    pub top_p: f64,

    /// Ask the inference service to stream fragments
    #[arg(long, env = "OLLAMA_STREAM")]
    pub stream: bool,

    /// Upper bound on a single inference call, 0 disables it
    #[arg(long, default_value_t = 300, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResponseMode {
    /// Return the aggregated model output untouched
    Raw,
    /// Parse the output into `id: text` records
    Insights,
}

impl ResponseMode {
    pub fn default_temperature(self) -> f64 {
        match self {
            ResponseMode::Raw => 0.3,
            ResponseMode::Insights => 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub stream: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub ollama_url: String,
    pub model: String,
    pub response_mode: ResponseMode,
    pub sampling: SamplingOptions,
    pub request_timeout: Option<Duration>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    pub fn from_args(args: CliArgs) -> anyhow::Result<Self> {
        let port = resolve_port(args.port, env::var("PORT").ok().as_deref());
        let listen_addr = SocketAddr::new(args.host, port);

        let ollama_url = args.ollama_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&ollama_url)
            .with_context(|| format!("invalid inference service url: {ollama_url}"))?;

        let sampling = SamplingOptions {
            temperature: args
                .temperature
                .unwrap_or_else(|| args.response_mode.default_temperature()),
            top_p: args.top_p,
            stream: args.stream,
        };

        let request_timeout =
            (args.request_timeout_secs > 0).then(|| Duration::from_secs(args.request_timeout_secs));

        Ok(Self {
            listen_addr,
            ollama_url,
            model: args.model,
            response_mode: args.response_mode,
            sampling,
            request_timeout,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let response_mode = ResponseMode::Insights;
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            response_mode,
            sampling: SamplingOptions {
                temperature: response_mode.default_temperature(),
                top_p: 0.9,
                stream: false,
            },
            request_timeout: Some(Duration::from_secs(300)),
        }
    }
}

/// Flag first, then the `PORT` environment value, then [`DEFAULT_PORT`].
/// A zero flag counts as unset.
pub fn resolve_port(flag: Option<u16>, env_value: Option<&str>) -> u16 {
    if let Some(port) = flag.filter(|p| *p != 0) {
        return port;
    }

    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => match raw.parse::<u16>() {
            Ok(port) => port,
            Err(err) => {
                tracing::warn!(value = raw, %err, "invalid PORT environment variable, using default port");
                DEFAULT_PORT
            }
        },
        None => DEFAULT_PORT,
    }
}
