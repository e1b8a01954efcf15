mod commands;
mod error;
mod report;
mod runner;

use clap::{Parser, Subcommand};
use framegate_common::config::Config;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "framegate",
    version,
    about = "Motion-gated object detection and smart video compression"
)]
struct Args {
    /// TOML configuration file. Missing file means built-in defaults.
    #[arg(long, env = "FRAMEGATE_CONFIG", default_value = "framegate.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the motion-gated pipeline over a video and print its statistics
    Gate {
        video: PathBuf,
        /// Write a JSON report here
        #[arg(long)]
        report: Option<PathBuf>,
        /// Encode the annotated frames to this video file
        #[arg(long)]
        annotated_out: Option<PathBuf>,
    },

    /// Run the gated and always-detect pipelines and compare their cost
    Compare {
        video: PathBuf,
        #[arg(long)]
        report: Option<PathBuf>,
        /// Encode the gated pass's annotated frames to this video file
        #[arg(long)]
        annotated_out: Option<PathBuf>,
    },

    /// Keep keyframes and detection hits, drop the rest
    Compress {
        video: PathBuf,
        output: PathBuf,
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let loaded = match Config::load_if_present(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", args.config.display());
            std::process::exit(1);
        }
    };
    let config_missing = loaded.is_none();
    let config = loaded.unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    if config_missing {
        warn!(
            path = %args.config.display(),
            "config file not found, using defaults"
        );
    }
    info!(
        detector = config.detector.endpoint,
        confidence = config.detector.confidence,
        pixel_threshold = config.motion.pixel_threshold,
        blur_kernel = config.motion.blur_kernel,
        codec = config.compression.codec,
        "starting framegate"
    );

    if !tokio::task::spawn_blocking(framegate_pipeline::check_ffmpeg_available)
        .await
        .unwrap_or(false)
    {
        error!("ffmpeg is required to decode video");
        std::process::exit(1);
    }

    let outcome = match args.command {
        Command::Gate {
            video,
            report,
            annotated_out,
        } => commands::gate(&config, video, report, annotated_out).await,
        Command::Compare {
            video,
            report,
            annotated_out,
        } => commands::compare(&config, video, report, annotated_out).await,
        Command::Compress {
            video,
            output,
            report,
        } => commands::compress(&config, video, output, report).await,
    };

    if let Err(e) = outcome {
        error!(error = %e, "command failed");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compress_with_report() {
        let args = Args::try_parse_from([
            "framegate",
            "--config",
            "custom.toml",
            "compress",
            "in.mp4",
            "out.mp4",
            "--report",
            "r.json",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("custom.toml"));
        match args.command {
            Command::Compress {
                video,
                output,
                report,
            } => {
                assert_eq!(video, PathBuf::from("in.mp4"));
                assert_eq!(output, PathBuf::from("out.mp4"));
                assert_eq!(report, Some(PathBuf::from("r.json")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn gate_flags_are_optional() {
        let args = Args::try_parse_from(["framegate", "gate", "clip.mp4"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Gate {
                report: None,
                annotated_out: None,
                ..
            }
        ));
    }

    #[test]
    fn compress_requires_output() {
        assert!(Args::try_parse_from(["framegate", "compress", "in.mp4"]).is_err());
    }
}
