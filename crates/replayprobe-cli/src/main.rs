//! replayprobe binary.
//!
//! Loads a captured frame corpus, connects to a decoder and runs the standard
//! replay attacks against it, logging every raw outcome.
//!
//! # Usage
//!
//! ```bash
//! # Decoder bridged to TCP, corpus in ./frames.json
//! replayprobe 127.0.0.1:2000
//!
//! # Explicit corpus and a slower device
//! replayprobe tcp://decoder.local:2000 --frames captures/frames.json --read-timeout 15
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use replayprobe_client::ConnectionConfig;
use replayprobe_core::{AttackRegistry, Corpus, TracingReporter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Decoder anti-replay probe
#[derive(Parser, Debug)]
#[command(name = "replayprobe")]
#[command(about = "Replay captured frames against a decoder and report what it accepts")]
#[command(version)]
struct Args {
    /// Decoder endpoint (host:port or tcp://host:port)
    endpoint: String,

    /// Captured frame corpus (JSON)
    #[arg(long, default_value = "frames.json")]
    frames: PathBuf,

    /// Per-read timeout in seconds
    #[arg(long, default_value_t = 5)]
    read_timeout: u64,

    /// Per-write timeout in seconds
    #[arg(long, default_value_t = 5)]
    write_timeout: u64,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = 5)]
    connect_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            read_timeout: Duration::from_secs(self.read_timeout),
            write_timeout: Duration::from_secs(self.write_timeout),
            connect_timeout: Duration::from_secs(self.connect_timeout),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    // Corpus errors surface before the device is contacted.
    let corpus = Corpus::load(&args.frames)?;
    tracing::info!(
        path = %args.frames.display(),
        channels = corpus.channels().count(),
        frames = corpus.len(),
        "corpus ready"
    );

    let mut decoder = replayprobe_client::open(&args.endpoint, args.connection_config()).await?;

    let registry = AttackRegistry::standard();
    let mut reporter = TracingReporter::new();
    replayprobe_core::run(&registry, &mut decoder, &corpus, &mut reporter).await;

    tracing::info!(attacks = registry.len(), "run complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_alone_is_enough() {
        let args = Args::try_parse_from(["replayprobe", "127.0.0.1:2000"]).expect("parse");

        assert_eq!(args.endpoint, "127.0.0.1:2000");
        assert_eq!(args.frames, PathBuf::from("frames.json"));
        assert_eq!(args.log_level, "info");
        assert_eq!(args.connection_config(), ConnectionConfig::default());
    }

    #[test]
    fn timeouts_map_onto_connection_config() {
        let args = Args::try_parse_from([
            "replayprobe",
            "tcp://decoder:2000",
            "--frames",
            "captures.json",
            "--read-timeout",
            "12",
            "--write-timeout",
            "3",
        ])
        .expect("parse");

        let config = args.connection_config();
        assert_eq!(config.read_timeout, Duration::from_secs(12));
        assert_eq!(config.write_timeout, Duration::from_secs(3));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(args.frames, PathBuf::from("captures.json"));
    }

    #[test]
    fn endpoint_is_required() {
        assert!(Args::try_parse_from(["replayprobe"]).is_err());
    }
}
