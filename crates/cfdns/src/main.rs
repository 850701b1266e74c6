// # cfdns - Cloudflare DNS command-line tool
//
// Thin integration layer over cfdns-core. All record and DDNS logic lives in
// the core crate; this binary only:
// 1. Parses flags and environment variables
// 2. Initializes logging and the runtime
// 3. Wires the Cloudflare provider and the HTTP IP source
// 4. Runs one action and maps the outcome to an exit code
//
// ## Usage
//
// ```bash
// export CFDNS_API_TOKEN=your_token
//
// cfdns add home.example.com 203.0.113.7 --proxied
// cfdns update home.example.com 203.0.113.8
// cfdns delete home.example.com
// cfdns ddns home.example.com --interval 300
// ```
//
// `ddns` runs until SIGINT or SIGTERM, then stops the session and exits.
//
// ## Environment
//
// - `CFDNS_API_TOKEN`: Cloudflare API token (required)
// - `CFDNS_API_BASE`: Cloudflare API base URL
// - `CFDNS_IP_SERVICE_URL`: Public IP service URL (`ddns` only)
// - `CFDNS_POLL_INTERVAL`: Seconds between public IP checks (`ddns` only)
// - `CFDNS_LOG_LEVEL`: trace, debug, info, warn, error

use anyhow::{Context, Result};
use cfdns_core::config::{DEFAULT_API_BASE, DEFAULT_IP_FIELD, DEFAULT_IP_SERVICE_URL};
use cfdns_core::{
    ApiToken, IpSourceConfig, ProviderConfig, ReconcilerEvent, SessionConfig, domain, records,
    start_ddns_session, stop_session,
};
use cfdns_ip_http::HttpIpSource;
use cfdns_provider_cloudflare::CloudflareProvider;
use clap::{Parser, Subcommand};
use std::net::Ipv4Addr;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Success (or clean shutdown for `ddns`)
/// - 1: Usage or configuration error
/// - 2: Runtime error (API, network)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CfdnsExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<CfdnsExitCode> for ExitCode {
    fn from(code: CfdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Manage Cloudflare DNS A records and keep one in sync with the public IP
#[derive(Parser, Debug)]
#[command(name = "cfdns", version, about)]
struct Cli {
    /// Cloudflare API token
    #[arg(long, env = "CFDNS_API_TOKEN", hide_env_values = true)]
    token: String,

    /// Cloudflare API base URL
    #[arg(long, env = "CFDNS_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Log level
    #[arg(long, env = "CFDNS_LOG_LEVEL", default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Create an A record
    Add {
        /// Fully-qualified record name
        fqdn: String,
        /// IPv4 address to point the record at
        ip: Ipv4Addr,
        /// Proxy traffic through Cloudflare
        #[arg(long)]
        proxied: bool,
    },

    /// Replace an existing A record's address and proxied flag
    Update {
        /// Fully-qualified record name
        fqdn: String,
        /// IPv4 address to point the record at
        ip: Ipv4Addr,
        /// Proxy traffic through Cloudflare
        #[arg(long)]
        proxied: bool,
    },

    /// Delete a record
    Delete {
        /// Fully-qualified record name
        fqdn: String,
    },

    /// Keep an A record pointed at this host's public IP
    Ddns {
        /// Fully-qualified record name
        fqdn: String,
        /// Proxy traffic through Cloudflare
        #[arg(long)]
        proxied: bool,
        /// Seconds between public IP checks
        #[arg(
            long,
            env = "CFDNS_POLL_INTERVAL",
            default_value_t = 120,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval: u64,
        /// Public IP service returning a JSON object
        #[arg(long, env = "CFDNS_IP_SERVICE_URL", default_value = DEFAULT_IP_SERVICE_URL)]
        ip_service_url: String,
        /// JSON field holding the address
        #[arg(long, default_value = DEFAULT_IP_FIELD)]
        ip_field: String,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too
            let _ = e.print();
            return if e.use_stderr() {
                CfdnsExitCode::ConfigError.into()
            } else {
                CfdnsExitCode::Success.into()
            };
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CfdnsExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CfdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(run(cli));

    match result {
        Ok(()) => CfdnsExitCode::Success.into(),
        Err(e) => {
            error!("{:#}", e);
            exit_code_for(&e).into()
        }
    }
}

/// Map a failure to its exit code
fn exit_code_for(err: &anyhow::Error) -> CfdnsExitCode {
    match err.downcast_ref::<cfdns_core::Error>() {
        Some(cfdns_core::Error::Config(_)) | Some(cfdns_core::Error::InvalidInput(_)) => {
            CfdnsExitCode::ConfigError
        }
        _ => CfdnsExitCode::RuntimeError,
    }
}

/// Run the selected action
async fn run(cli: Cli) -> Result<()> {
    let token = ApiToken::new(cli.token)?;
    let provider = CloudflareProvider::new(&ProviderConfig {
        api_base: cli.api_base,
        ..ProviderConfig::default()
    })?;

    match cli.command {
        Command::Add { fqdn, ip, proxied } => {
            let zone_id = records::resolve_zone_id(&provider, &fqdn, &token).await?;
            let record_id =
                records::add_record(&provider, &zone_id, &fqdn, ip, proxied, &token).await?;
            info!("Record {} added (id: {})", fqdn, record_id);
        }
        Command::Update { fqdn, ip, proxied } => {
            let zone_id = records::resolve_zone_id(&provider, &fqdn, &token).await?;
            let record_id =
                records::update_record(&provider, &zone_id, &fqdn, ip, proxied, &token).await?;
            info!("Record {} updated (id: {})", fqdn, record_id);
        }
        Command::Delete { fqdn } => {
            let zone_id = records::resolve_zone_id(&provider, &fqdn, &token).await?;
            let record_id = records::delete_record(&provider, &zone_id, &fqdn, &token).await?;
            info!("Record {} deleted (id: {})", fqdn, record_id);
        }
        Command::Ddns {
            fqdn,
            proxied,
            interval,
            ip_service_url,
            ip_field,
        } => {
            // Reject a bad name before any network call
            let fqdn = domain::record_name(&fqdn)?;
            let ip_source = HttpIpSource::new(&IpSourceConfig {
                url: ip_service_url,
                field: ip_field,
                ..IpSourceConfig::default()
            })?;
            info!("Public IP source: {}", ip_source.url());
            let zone_id = records::resolve_zone_id(&provider, &fqdn, &token).await?;
            let config = SessionConfig::new(zone_id, fqdn)
                .with_proxied(proxied)
                .with_poll_interval_secs(interval);

            run_ddns(provider, ip_source, config, token).await?;
        }
    }

    Ok(())
}

/// Run a DDNS session until a shutdown signal arrives
async fn run_ddns(
    provider: CloudflareProvider,
    ip_source: HttpIpSource,
    config: SessionConfig,
    token: ApiToken,
) -> Result<()> {
    let (handle, mut events) =
        start_ddns_session(Arc::new(provider), Arc::new(ip_source), config, token)
            .await
            .context("Failed to start DDNS session")?;

    let state = handle.state();
    info!(
        "DDNS session running for {} (current IP: {})",
        handle.record_name(),
        state
            .last_applied_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "-".to_string())
    );

    // The reconciler logs each transition itself; events are kept at debug
    let event_logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);

    stop_session(handle).await?;
    // The sender is gone once the session task has exited
    let _ = event_logger.await;

    info!("DDNS session stopped");
    Ok(())
}

fn log_event(event: &ReconcilerEvent) {
    match event {
        ReconcilerEvent::UpdateSucceeded {
            record_name,
            new_ip,
            ..
        } => debug!("Event: {} now points at {}", record_name, new_ip),
        other => debug!("Event: {:?}", other),
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// The name of the signal received
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(received)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for CTRL-C")?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        let mut argv = vec!["cfdns", "--token", "test-token"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let cli = parse(&["add", "sub.example.com", "1.2.3.4", "--proxied"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Add {
                fqdn: "sub.example.com".to_string(),
                ip: Ipv4Addr::new(1, 2, 3, 4),
                proxied: true,
            }
        );
        assert_eq!(cli.log_level, Level::INFO);
    }

    #[test]
    fn test_parse_update_defaults_unproxied() {
        let cli = parse(&["update", "sub.example.com", "5.6.7.8"]).unwrap();
        assert!(matches!(cli.command, Command::Update { proxied: false, .. }));
    }

    #[test]
    fn test_parse_delete() {
        let cli = parse(&["delete", "sub.example.com"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Delete {
                fqdn: "sub.example.com".to_string()
            }
        );
    }

    #[test]
    fn test_parse_ddns() {
        let cli = parse(&["--log-level", "debug", "ddns", "sub.example.com", "--interval", "300"])
            .unwrap();
        assert_eq!(cli.log_level, Level::DEBUG);
        match cli.command {
            Command::Ddns {
                interval,
                ip_field,
                proxied,
                ..
            } => {
                assert_eq!(interval, 300);
                assert_eq!(ip_field, DEFAULT_IP_FIELD);
                assert!(!proxied);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_ipv4_address() {
        assert!(parse(&["add", "sub.example.com", "not-an-ip"]).is_err());
        assert!(parse(&["add", "sub.example.com", "2001:db8::1"]).is_err());
    }

    #[test]
    fn test_rejects_zero_interval() {
        assert!(parse(&["ddns", "sub.example.com", "--interval", "0"]).is_err());
    }

    #[test]
    fn test_requires_subcommand() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let config = anyhow::Error::from(cfdns_core::Error::config("bad"));
        assert_eq!(exit_code_for(&config), CfdnsExitCode::ConfigError);

        let input = anyhow::Error::from(cfdns_core::Error::invalid_input("bad..name"));
        assert_eq!(exit_code_for(&input), CfdnsExitCode::ConfigError);

        let api = anyhow::Error::from(cfdns_core::Error::provider(403, "denied"));
        assert_eq!(exit_code_for(&api), CfdnsExitCode::RuntimeError);

        let other = anyhow::anyhow!("unexpected");
        assert_eq!(exit_code_for(&other), CfdnsExitCode::RuntimeError);
    }
}
