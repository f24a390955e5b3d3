//! Batch processing: dispatch with progress, artifact writing and streaming reports.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use blitz_core::{
    BatchItem, DiscoveredFile, JobReport, OutputWriter, ProcessingStats, ReportFormat,
};

use super::{ProcessArgs, ProcessContext};

type ReportWriter = OutputWriter<Box<dyn Write>>;

/// Run every file through the dispatcher, writing artifacts and reports as jobs finish.
pub async fn process_batch(
    ctx: ProcessContext,
    args: &ProcessArgs,
    files: Vec<DiscoveredFile>,
) -> anyhow::Result<()> {
    let total = files.len() as u64;
    let progress = create_progress_bar(total)?;
    let start_time = Instant::now();

    let mut writer = open_report(args.report.as_deref(), &ctx)?;
    let stream = ctx.report_format.is_streaming();
    // JSON array output needs every record before it can be written.
    let mut collected: Vec<JobReport> = Vec::new();
    let mut stats = ProcessingStats::default();

    let output_paths = ctx.namer.assign(&files);
    let mut results = ctx.dispatcher.run_batch(files, ctx.settings.clone());
    while let Some(item) = results.recv().await {
        let output_path = output_paths
            .get(item.index)
            .cloned()
            .unwrap_or_else(|| ctx.namer.path_for(&item.file, item.index));
        let report = finish_job(output_path, item).await;
        stats.record(&report);

        match writer.as_mut() {
            Some(w) if stream => progress.suspend(|| w.write(&report))?,
            Some(_) => collected.push(report),
            None => {}
        }

        progress.inc(1);
        let elapsed = start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            let processed = stats.succeeded + stats.failed;
            progress.set_message(format!("{:.1} img/sec", processed as f64 / elapsed));
        }
    }

    if let Some(mut w) = writer {
        if !stream {
            w.write_all(&collected)?;
        }
        w.flush()?;
        if let Some(path) = &args.report {
            tracing::info!("Report written to {:?}", path);
        }
    }

    let elapsed = start_time.elapsed().as_secs_f64();
    stats.total_seconds = elapsed;
    stats.images_per_second = if elapsed > 0.0 {
        stats.succeeded as f64 / elapsed
    } else {
        0.0
    };

    progress.finish_and_clear();
    print_summary(&stats);

    Ok(())
}

/// Where the report goes: the `--report` file, stdout for JSONL, or nowhere.
fn open_report(
    path: Option<&Path>,
    ctx: &ProcessContext,
) -> anyhow::Result<Option<ReportWriter>> {
    let pretty = ctx.config.output.pretty;
    let sink: Box<dyn Write> = match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Box::new(BufWriter::new(File::create(path)?))
        }
        None if ctx.report_format == ReportFormat::JsonLines => Box::new(std::io::stdout()),
        None => {
            tracing::debug!("No --report given; JSON report skipped");
            return Ok(None);
        }
    };
    Ok(Some(OutputWriter::new(sink, ctx.report_format, pretty)))
}

/// Save a finished job's artifact to `output_path` and build its report record.
async fn finish_job(output_path: PathBuf, item: BatchItem) -> JobReport {
    let BatchItem { file, result, .. } = item;

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            tracing::error!("Failed: {:?} - {}", file.path, e);
            return JobReport::failure(&file.path, file.size, &e);
        }
    };

    match write_artifact(&output_path, &output.artifact.bytes).await {
        Ok(()) => {
            tracing::debug!("Wrote {:?}", output_path);
            JobReport::success(&file.path, Some(output_path), file.size, &output)
        }
        Err(e) => {
            tracing::error!("Failed to write {:?}: {}", output_path, e);
            JobReport::failure(&file.path, file.size, &e)
        }
    }
}

async fn write_artifact(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> anyhow::Result<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    Ok(pb)
}

/// Print a formatted summary table after batch processing.
fn print_summary(stats: &ProcessingStats) {
    let total = stats.succeeded + stats.failed;

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", stats.succeeded);
    if stats.failed > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed);
    }
    if stats.bypassed > 0 {
        eprintln!("    Bypassed:     {:>8}", stats.bypassed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", total);
    eprintln!("    Duration:     {:>7.1}s", stats.total_seconds);
    eprintln!("    Rate:         {:>7.1} img/sec", stats.images_per_second);
    eprintln!("    Saved:        {:>7.1} MB", stats.mb_saved());
    eprintln!("  ====================================");
}
