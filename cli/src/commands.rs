use framegate_common::config::{CompressionConfig, Config};
use framegate_common::VideoSource;
use framegate_pipeline::{
    compare as compare_passes, BaselinePipeline, CompressionResult, FfmpegEncoder, FrameSink,
    HttpDetector, ProcessingResult, ProcessingSummary, SmartCompressor, SpeedupMetrics,
    TwoStagePipeline,
};
use framegate_source::FfmpegSource;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::CliError;
use crate::report::{Report, ReportBody};
use crate::runner::run_pass;

pub async fn gate(
    config: &Config,
    video: PathBuf,
    report: Option<PathBuf>,
    annotated_out: Option<PathBuf>,
) -> Result<(), CliError> {
    let result = two_stage_pass(config, video.clone()).await?;
    let summary = result.summary();
    print_processing(&summary);

    if let Some(out) = annotated_out {
        write_annotated(result, out, config.compression.clone()).await?;
    }
    if let Some(path) = report {
        Report::new(&video, ReportBody::Gate { two_stage: summary }).write(&path)?;
    }
    Ok(())
}

pub async fn compare(
    config: &Config,
    video: PathBuf,
    report: Option<PathBuf>,
    annotated_out: Option<PathBuf>,
) -> Result<(), CliError> {
    let two_stage = two_stage_pass(config, video.clone()).await?;
    print_processing(&two_stage.summary());
    if two_stage.cancelled {
        warn!("two-stage pass was cancelled, skipping baseline");
        return Ok(());
    }

    let mut pipeline = BaselinePipeline::from_config(config).with_annotation(false);
    let detector_config = config.detector.clone();
    let path = video.clone();
    let baseline = run_pass("baseline", move |control| {
        let mut source = FfmpegSource::open(&path)?;
        let mut detector = HttpDetector::new(&detector_config)?;
        Ok(pipeline.run(&mut source, &mut detector, control)?)
    })
    .await?;
    print_processing(&baseline.summary());

    let metrics = compare_passes(&two_stage, &baseline);
    print_speedup(&metrics);

    let two_stage_summary = two_stage.summary();
    if let Some(out) = annotated_out {
        write_annotated(two_stage, out, config.compression.clone()).await?;
    }
    if let Some(path) = report {
        Report::new(
            &video,
            ReportBody::Compare {
                two_stage: two_stage_summary,
                baseline: baseline.summary(),
                speedup: metrics,
            },
        )
        .write(&path)?;
    }
    Ok(())
}

pub async fn compress(
    config: &Config,
    video: PathBuf,
    output: PathBuf,
    report: Option<PathBuf>,
) -> Result<(), CliError> {
    let mut compressor = SmartCompressor::from_config(config);
    let detector_config = config.detector.clone();
    let compression_config = config.compression.clone();
    let path = video.clone();

    let result = run_pass("compress", move |control| {
        let mut source = FfmpegSource::open(&path)?;
        let mut detector = HttpDetector::new(&detector_config)?;
        let fps = source.info().fps;
        let mut encoder = FfmpegEncoder::new(output, fps, &compression_config);
        Ok(compressor.run(&mut source, &mut detector, &mut encoder, control)?)
    })
    .await?;
    print_compression(&result);

    if let Some(path) = report {
        Report::new(
            &video,
            ReportBody::Compress {
                compression: result.summary(),
            },
        )
        .write(&path)?;
    }
    Ok(())
}

async fn two_stage_pass(config: &Config, video: PathBuf) -> Result<ProcessingResult, CliError> {
    let mut pipeline = TwoStagePipeline::from_config(config);
    let detector_config = config.detector.clone();
    run_pass("two-stage", move |control| {
        let mut source = FfmpegSource::open(&video)?;
        let mut detector = HttpDetector::new(&detector_config)?;
        Ok(pipeline.run(&mut source, &mut detector, control)?)
    })
    .await
}

/// Encode the annotated frames of a pass at the source fps.
async fn write_annotated(
    result: ProcessingResult,
    out: PathBuf,
    compression: CompressionConfig,
) -> Result<(), CliError> {
    tokio::task::spawn_blocking(move || encode_frames(&result, &out, &compression)).await?
}

fn encode_frames(
    result: &ProcessingResult,
    out: &Path,
    compression: &CompressionConfig,
) -> Result<(), CliError> {
    let mut encoder = FfmpegEncoder::new(out, result.fps, compression);
    for frame in result.annotated_frames() {
        encoder.write_frame(frame)?;
    }
    encoder.finish()?;
    info!(
        frames = encoder.frame_count(),
        output = %out.display(),
        "annotated video written"
    );
    Ok(())
}

fn print_processing(summary: &ProcessingSummary) {
    println!("{} pass", summary.kind.as_str());
    println!(
        "  frames processed:     {} / {}",
        summary.frames_processed, summary.total_frames
    );
    if let Some(moving) = summary.frames_with_motion {
        println!("  frames with motion:   {moving}");
    }
    println!("  detector invocations: {}", summary.detector_invocations);
    println!("  detections:           {}", summary.total_detections);
    println!(
        "  total time:           {:.2}s ({:.1} ms/frame)",
        summary.total_time_secs, summary.avg_frame_ms
    );
    if summary.cancelled {
        println!("  (cancelled)");
    }
}

fn print_speedup(metrics: &SpeedupMetrics) {
    println!("speedup");
    println!("  two-stage time:       {:.2}s", metrics.two_stage_time);
    println!("  baseline time:        {:.2}s", metrics.baseline_time);
    println!(
        "  speedup:              {:.2}x ({:.1}%)",
        metrics.speedup, metrics.speedup_percent
    );
    println!("  time saved:           {:.2}s", metrics.time_saved);
    println!("  frames skipped:       {}", metrics.frames_skipped);
    println!(
        "  detector reduction:   {:.1}%",
        metrics.detector_reduction_percent
    );
}

fn print_compression(result: &CompressionResult) {
    let summary = result.summary();
    println!("compression");
    println!(
        "  frames kept:          {} / {} ({} keyframes, {} detections)",
        summary.kept_count, summary.original_frame_count, summary.keyframes, summary.detections
    );
    println!(
        "  ratio:                {:.4} ({:.1}% smaller)",
        summary.compression_ratio, summary.compression_percent
    );
    println!(
        "  size:                 {} -> {} bytes",
        summary.original_size_bytes, summary.compressed_size_bytes
    );
    if let Some(path) = &summary.output.path {
        println!("  output:               {}", path.display());
    }
    if summary.cancelled {
        println!("  (cancelled)");
    }
}
