use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "av1d")]
#[command(about = "AV1 Re-encoding Daemon", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true)
        .init();

    info!("AV1 Re-encoding Daemon v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    info!("loading configuration");
    let config = match av1d_daemon::config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("failed to load configuration: {}", e);
            return Err(e);
        }
    };

    info!(roots = ?config.library_roots, "library roots");
    info!(
        min_bytes = config.min_bytes,
        min_gb = config.min_bytes as f64 / 1_073_741_824.0,
        "minimum file size"
    );
    info!(max_size_ratio = config.max_size_ratio, "size gate ratio");
    info!(scan_interval_sec = config.scan_interval_sec, "scan interval");
    info!(job_state_dir = ?config.job_state_dir, "job state directory");
    info!(write_why_sidecars = config.write_why_sidecars, "why sidecars enabled");

    info!("checking ffmpeg version");
    match av1d_daemon::startup::check_ffmpeg_version(&config.ffmpeg_bin) {
        Ok(version) => {
            info!(
                major = version.major,
                minor = version.minor,
                patch = version.patch,
                "ffmpeg version accepted"
            );
        }
        Err(e) => {
            error!("ffmpeg version check failed: {}", e);
            return Err(e);
        }
    }

    info!("checking hardware encoder availability");
    if let Err(e) = av1d_daemon::startup::check_hardware_encoder_available(&config.ffmpeg_bin) {
        error!("hardware encoder check failed: {}", e);
        return Err(e);
    }

    info!("startup validation complete, starting daemon main loop");

    if let Err(e) = av1d_daemon::run_daemon_loop(config).await {
        error!("daemon loop error: {}", e);
        return Err(e);
    }

    Ok(())
}
