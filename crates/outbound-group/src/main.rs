//! outbound-group: dry-run resolver for proxy-group configuration.
//!
//! Loads endpoints, providers and group records, resolves every group and
//! prints the load report as JSON.

mod config;

use config::ResolverConfig;
use outbound_group::loader::{LoadPass, OnError};

fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args: Vec<String> = std::env::args().collect();
    let config_path = config_path_arg(&args)
        .or_else(|| std::env::var("OUTBOUND_GROUP_CONFIG").ok())
        .unwrap_or_else(|| "outbound-group.toml".to_string());

    let skip_invalid = args.iter().any(|a| a == "--skip-invalid");

    // Load configuration
    let mut config = ResolverConfig::load(&config_path)?;

    // CLI overrides take precedence over TOML and env vars
    if skip_invalid {
        config.loader.on_error = OnError::Skip;
    }

    // Build the tokio runtime first: the tonic gRPC exporter needs a reactor context
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let tracing_guard = outbound_tracing::init_tracing(&config.tracing);

        tracing::info!(
            config_path = %config_path,
            proxies = config.proxies.len(),
            providers = config.proxy_providers.len(),
            groups = config.proxy_groups.len(),
            on_error = ?config.loader.on_error,
            otlp = tracing_guard.exporting(),
            "Starting outbound-group"
        );

        run(config)
    })
}

fn run(config: ResolverConfig) -> anyhow::Result<()> {
    let mut proxies = config.endpoint_registry();
    let mut providers = config.provider_registry()?;

    let outcome = LoadPass::new(&mut proxies, &mut providers)
        .on_error(config.loader.on_error)
        .run(&config.proxy_groups)?;

    println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    Ok(())
}

/// `--config PATH`, else the first argument that is not a flag.
fn config_path_arg(args: &[String]) -> Option<String> {
    args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1).cloned())
        .or_else(|| args.iter().skip(1).find(|a| !a.starts_with('-')).cloned())
}
