//! Linksim CLI
//!
//! Runs the client/queue/server harness under a configurable link and
//! prints the run report.

use clap::Parser;
use linksim_simulation::LinkConfig;
use linksim_simulator::{Harness, HarnessConfig};
use linksim_test_helpers::TrafficConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linksim")]
#[command(about = "Deterministic bottleneck-link simulator")]
#[command(version)]
struct Cli {
    /// Link bandwidth in bytes per second
    #[arg(short = 'b', long, default_value_t = 1e6)]
    bandwidth: f64,

    /// Propagation delay (e.g. "100ms")
    #[arg(short = 'd', long, default_value = "100ms")]
    delay: humantime::Duration,

    /// Queue depth as seconds of bandwidth (e.g. "100ms")
    #[arg(short = 'q', long, default_value = "100ms")]
    queue_depth: humantime::Duration,

    /// Simulated duration (e.g. "50s", "5m")
    #[arg(long, default_value = "50s")]
    duration: humantime::Duration,

    /// Seed for deterministic payload generation
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Payload bytes per data frame
    #[arg(long, default_value_t = 1200)]
    frame_size: usize,

    /// Data frames per paced batch
    #[arg(long, default_value_t = 10)]
    batch: usize,

    /// Interval between batches (e.g. "10ms")
    #[arg(long, default_value = "10ms")]
    pace: humantime::Duration,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let link = LinkConfig::default()
        .with_bandwidth(cli.bandwidth)
        .with_prop_delay(cli.delay.into())
        .with_queue_depth(cli.queue_depth.into());
    let traffic = TrafficConfig::default()
        .with_frame_payload_len(cli.frame_size)
        .with_batch_frames(cli.batch)
        .with_pace(cli.pace.into());
    let config = HarnessConfig::default()
        .with_link(link)
        .with_traffic(traffic)
        .with_horizon(cli.duration.into())
        .with_seed(cli.seed);

    let report = Harness::new(config)?.run();
    print!("{}", report.summary());

    Ok(())
}
