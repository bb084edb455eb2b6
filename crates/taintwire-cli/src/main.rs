//! taintwire CLI — thin driver over the scenario registry.
//!
//! Runs the standard carrier matrix (optionally filtered) and prints the
//! aggregate report, as a table or as JSON. Exits non-zero when any
//! attempted scenario did not pass, so the report is scriptable.

use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use taintwire_harness::registry::ScenarioRegistry;
use taintwire_types::carrier::CarrierKind;

#[derive(Parser, Debug)]
#[command(
    name = "taintwire",
    version,
    about = "Exercise every HNP taint carrier and report propagation results"
)]
struct Args {
    /// Emit the report as JSON instead of the plain table.
    #[arg(long)]
    json: bool,

    /// Only run scenarios for the given carrier kind (repeatable).
    /// Kinds: direct, request_scoped_context, process_global_store,
    /// async_handoff, metadata_bridge, broadcast_channel.
    #[arg(long = "carrier", value_name = "KIND")]
    carriers: Vec<CarrierKind>,

    /// Bounded wait for concurrency-crossing carriers, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut registry = ScenarioRegistry::standard()
        .with_handoff_timeout(Duration::from_millis(args.timeout_ms));
    if !args.carriers.is_empty() {
        registry.retain_kinds(&args.carriers);
    }

    let report = registry.run_all().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}
