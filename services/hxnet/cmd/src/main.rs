//! Probe binary for the hxnet client core.
//!
//! Loads the client configuration, issues a single request in the requested
//! trust tier and prints the parsed wire document, or the typed error.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use hxnet_session::{Client, Params, RequestTier};
use hxnet_wire::Document;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod logging;

use config::ClientConfig;
use logging::ProbeLogFormatter;

/// Request tier selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Tier {
    Raw,
    Cmd,
    Session,
}

impl From<Tier> for RequestTier {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Raw => RequestTier::Raw,
            Tier::Cmd => RequestTier::Cmd,
            Tier::Session => RequestTier::Session,
        }
    }
}

/// Issue one signed request against the game server
#[derive(Parser, Debug)]
#[command(name = "hxnet", version, about = "Game-server protocol probe")]
struct Args {
    /// Configuration file path
    #[arg(long, default_value = "hxnet.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Request tier
    #[arg(long, value_enum, default_value = "session")]
    tier: Tier,

    /// Query parameter as key=value (repeatable, order is kept)
    #[arg(long = "param", short = 'p')]
    params: Vec<String>,

    /// Form body parameter as key=value; any body turns the request into a POST
    #[arg(long = "body", short = 'b')]
    body: Vec<String>,

    /// Override the timeout from the configuration, e.g. 10s
    #[arg(long)]
    timeout: Option<humantime::Duration>,
}

fn parse_pairs(pairs: &[String]) -> anyhow::Result<Params> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .with_context(|| format!("expected key=value, got {:?}", pair))
        })
        .collect()
}

fn print_document(doc: &Document) {
    for (i, section) in doc.sections().enumerate() {
        for (j, record) in section.iter().enumerate() {
            println!("[{}][{}] {}", i, j, record.join(" | "));
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::new("warn")
        .add_directive(format!("hxnet={}", args.log_level).parse()?)
        .add_directive(format!("hxnet_wire={}", args.log_level).parse()?)
        .add_directive(format!("hxnet_topology={}", args.log_level).parse()?)
        .add_directive(format!("hxnet_session={}", args.log_level).parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .event_format(ProbeLogFormatter::new("hxnet"))
        .init();

    info!("Starting hxnet probe v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ClientConfig::load_from_file(&args.config)?;
    if let Some(timeout) = args.timeout {
        config.timeout = timeout.into();
    }
    if config.salt.is_empty() && !matches!(args.tier, Tier::Raw) {
        bail!("signed tiers need a salt (client.salt or HXNET_SALT)");
    }

    let mut params = parse_pairs(&args.params)?;
    if !config.version.is_empty() && params.get("app_version").is_none() {
        params.push("app_version", &config.version);
    }
    let body = parse_pairs(&args.body)?;

    let client = Client::connect(&config.transport(), config.path.clone(), config.salt.clone())?;
    if let Some(session_id) = &config.session_id {
        client.set_session(session_id.clone()).await;
    }

    let tier = RequestTier::from(args.tier);
    let result = if body.is_empty() {
        client.call(tier, &params).await
    } else {
        client.post(tier, &params, &body).await
    };

    match result {
        Ok(doc) => {
            print_document(&doc);
            Ok(())
        }
        Err(e) => {
            error!("Request failed: {}", e);
            eprintln!("{}: {}", e.kind(), e.description());
            std::process::exit(1);
        }
    }
}
