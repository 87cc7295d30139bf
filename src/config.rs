use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use url::Url;

use crate::metrics::Endpoint;

/// Port assumed for a node entry written without one.
pub const DEFAULT_NODE_PORT: u16 = 8108;

const DEFAULT_METRICS_URL: &str = "{protocol}://{host}:{port}/metrics.json";
const DEFAULT_STATS_URL: &str = "{protocol}://{host}:{port}/stats.json";
const DEFAULT_DEBUG_URL: &str = "{protocol}://{host}:{port}/debug";
const COLLECTIONS_URL: &str = "{protocol}://{host}:{port}/collections";

// ─── Command line ────────────────────────────────────────────────

/// Typesense Prometheus exporter (on-demand fetch).
///
/// Every flag falls back to its environment variable, then to the default.
#[derive(Parser, Debug, Clone)]
#[command(name = "typesense-exporter", version, about, long_about = None)]
pub struct Cli {
    /// Typesense API key sent as X-TYPESENSE-API-KEY.
    #[arg(long, env = "TYPESENSE_API_KEY", default_value = "", hide_env_values = true)]
    pub typesense_api_key: String,

    /// URL template for /metrics.json ({protocol}, {host}, {port} are substituted per node).
    #[arg(long, env = "TYPESENSE_METRICS_URL", default_value = DEFAULT_METRICS_URL)]
    pub typesense_metrics_url: String,

    /// URL template for /stats.json.
    #[arg(long, env = "TYPESENSE_STATS_URL", default_value = DEFAULT_STATS_URL)]
    pub typesense_stats_url: String,

    /// URL template for /debug.
    #[arg(long, env = "TYPESENSE_DEBUG_URL", default_value = DEFAULT_DEBUG_URL)]
    pub typesense_debug_url: String,

    /// Comma-separated host:port list of Typesense nodes.
    #[arg(long, env = "TYPESENSE_NODES", default_value = "localhost:8108")]
    pub typesense_nodes: String,

    /// Scheme used to reach the nodes.
    #[arg(long, env = "TYPESENSE_PROTOCOL", value_enum, default_value_t = Protocol::Https)]
    pub typesense_protocol: Protocol,

    /// Verify upstream TLS certificates. Off by default: self-signed
    /// certificates are the norm for Typesense deployments. From the
    /// environment, `false`, `no`, `off`, `0` and empty disable it; any
    /// other value (`True`, `1`, `yes`) enables it.
    #[arg(
        long,
        env = "VERIFY_SSL",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub verify: bool,

    /// Total per-request timeout against a node, in seconds.
    #[arg(long, env = "TYPESENSE_TIMEOUT_SECS", default_value_t = 5)]
    pub timeout_secs: u64,

    /// Connect timeout against a node, in seconds.
    #[arg(long, env = "TYPESENSE_CONNECT_TIMEOUT_SECS", default_value_t = 2)]
    pub connect_timeout_secs: u64,

    /// Address the /metrics listener binds to.
    #[arg(long, env = "EXPORTER_LISTEN_ADDRESS", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub listen_address: IpAddr,

    /// Port on which to expose the /metrics endpoint.
    #[arg(long, env = "EXPORTER_PORT", default_value_t = 8000)]
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no Typesense nodes configured")]
    NoNodes,

    #[error("invalid node entry {entry:?}: {reason}")]
    InvalidNode { entry: String, reason: &'static str },

    #[error("{endpoint} URL {url:?} is invalid: {source}")]
    InvalidUrl {
        endpoint: Endpoint,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{endpoint} URL {url:?} must use http or https")]
    UnsupportedScheme { endpoint: Endpoint, url: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

// ─── Validated configuration ─────────────────────────────────────

/// One cluster member, addressed by host and port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A resolved (node, endpoint) pair, scraped once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub node: Node,
    pub endpoint: Endpoint,
    pub url: Url,
}

/// API key wrapper that keeps the secret out of logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_empty() { "ApiKey(<empty>)" } else { "ApiKey(<redacted>)" })
    }
}

/// Process-wide settings. Built once at startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: ApiKey,
    pub nodes: Vec<Node>,
    /// Node order first, then [`Endpoint::ALL`] order.
    pub targets: Vec<Target>,
    pub verify_tls: bool,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub listen: SocketAddr,
}

impl TryFrom<Cli> for Config {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("timeout-secs"));
        }
        if cli.connect_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("connect-timeout-secs"));
        }

        let nodes = parse_nodes(&cli.typesense_nodes)?;

        let mut targets = Vec::with_capacity(nodes.len() * Endpoint::ALL.len());
        for node in &nodes {
            for endpoint in Endpoint::ALL {
                let template = match endpoint {
                    Endpoint::Metrics => cli.typesense_metrics_url.as_str(),
                    Endpoint::Stats => cli.typesense_stats_url.as_str(),
                    Endpoint::Debug => cli.typesense_debug_url.as_str(),
                    Endpoint::Collections => COLLECTIONS_URL,
                };
                let url = resolve_url(template, node, cli.typesense_protocol, endpoint)?;
                targets.push(Target {
                    node: node.clone(),
                    endpoint,
                    url,
                });
            }
        }

        Ok(Self {
            api_key: ApiKey::new(cli.typesense_api_key),
            nodes,
            targets,
            verify_tls: cli.verify,
            timeout: Duration::from_secs(cli.timeout_secs),
            connect_timeout: Duration::from_secs(cli.connect_timeout_secs),
            listen: SocketAddr::new(cli.listen_address, cli.port),
        })
    }
}

// ─── Helpers ─────────────────────────────────────────────────────

/// Parses `"host1:8108, host2"` into nodes. Blank entries are ignored and
/// a missing port defaults to [`DEFAULT_NODE_PORT`].
pub fn parse_nodes(raw: &str) -> Result<Vec<Node>, ConfigError> {
    let mut nodes = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (host, port) = match entry.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| ConfigError::InvalidNode {
                    entry: entry.to_owned(),
                    reason: "port is not a number in 1-65535",
                })?;
                (host, port)
            }
            None => (entry, DEFAULT_NODE_PORT),
        };
        if host.is_empty() {
            return Err(ConfigError::InvalidNode {
                entry: entry.to_owned(),
                reason: "host is empty",
            });
        }
        if port == 0 {
            return Err(ConfigError::InvalidNode {
                entry: entry.to_owned(),
                reason: "port is not a number in 1-65535",
            });
        }
        nodes.push(Node {
            host: host.to_owned(),
            port,
        });
    }

    if nodes.is_empty() {
        return Err(ConfigError::NoNodes);
    }
    Ok(nodes)
}

fn resolve_url(
    template: &str,
    node: &Node,
    protocol: Protocol,
    endpoint: Endpoint,
) -> Result<Url, ConfigError> {
    let raw = template
        .replace("{protocol}", protocol.as_str())
        .replace("{host}", &node.host)
        .replace("{port}", &node.port.to_string());

    let url = Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl {
        endpoint,
        url: raw.clone(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::UnsupportedScheme { endpoint, url: raw }),
    }
}
