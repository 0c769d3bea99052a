//! Pose Replay - drive a URDF robot from recorded detector output
//!
//! Landmark frames are fed through the playground on their own timeline
//! while the sampler records the joint table every period. The trajectory
//! is optionally exported, then replayed on the player timer.

use anyhow::{bail, Context, Result};
use clap::Parser;
use playground::{init_logging, Playground, PlaygroundConfig, Profile};
use pose_capture::{JsonLinesSource, LandmarkSource};
use session_recorder::CaptureSurface;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::time::{interval, sleep_until};
use tracing::{info, warn};

/// Offline surface: always ready, produces no media
struct HeadlessSurface;

impl CaptureSurface for HeadlessSurface {
    fn is_ready(&self) -> bool {
        true
    }

    fn supports(&self, mime_type: &str) -> bool {
        mime_type == "video/webm"
    }
}

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// URDF robot description
    urdf: PathBuf,

    /// Directory holding the meshes the URDF references
    mesh_dir: PathBuf,

    /// Detector output, one JSON frame per line
    landmarks: PathBuf,

    /// Write the recorded session here
    #[arg(long)]
    session_out: Option<PathBuf>,

    /// TOML configuration layered over the profile
    #[arg(long, env = "PLAYGROUND_CONFIG")]
    config: Option<PathBuf>,

    /// Preset to start from: standard, seated, steady, detailed
    #[arg(long, default_value_t = Profile::Standard)]
    profile: Profile,

    /// Landmark timeline speed-up (2.0 feeds frames twice as fast)
    #[arg(long, default_value_t = 1.0)]
    speed: f64,
}

fn read_mesh_dir(dir: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let mut uploads = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        uploads.push((name, std::fs::read(&path)?));
    }
    Ok(uploads)
}

/// Feed every frame at its timestamp; returns (mapped, total)
async fn feed_landmarks(
    playground: &mut Playground,
    source: &mut impl LandmarkSource,
    speed: f64,
) -> Result<(usize, usize)> {
    let start = tokio::time::Instant::now();
    let mut first_ts = None;
    let mut mapped = 0;
    let mut total = 0;

    loop {
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => return Err(playground.report_capture_error(e).into()),
        };
        total += 1;

        let origin = *first_ts.get_or_insert(frame.timestamp_ms);
        let offset = Duration::from_millis(frame.timestamp_ms.saturating_sub(origin)).div_f64(speed);
        tokio::select! {
            _ = sleep_until(start + offset) => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted after {} frames", total);
                break;
            }
        }

        if playground.on_landmarks(&frame, Instant::now()).await.is_some() {
            mapped += 1;
        }
    }
    Ok((mapped, total))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = PlaygroundConfig::load_profile(args.profile, args.config.as_deref())?;
    init_logging(&config.log_level);

    info!("=== Pose Replay v{} ({} profile) ===", env!("CARGO_PKG_VERSION"), args.profile);
    if !(args.speed.is_finite() && args.speed > 0.0) {
        bail!("--speed must be a positive number, got {}", args.speed);
    }
    let period = config.recorder.sample_period();
    let mut playground = Playground::new(config)?;

    let urdf_name = args
        .urdf
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let urdf_text = std::fs::read_to_string(&args.urdf)
        .with_context(|| format!("reading {}", args.urdf.display()))?;
    playground.select_urdf(&urdf_name, urdf_text)?;
    playground.select_mesh_files(read_mesh_dir(&args.mesh_dir)?)?;
    playground.load_robot().await?;
    info!("{}", playground.status());

    let mut source = match JsonLinesSource::open(&args.landmarks) {
        Ok(source) => source,
        Err(e) => return Err(playground.report_capture_error(e).into()),
    };

    playground.start_recording(&HeadlessSurface).await?;
    let fed = feed_landmarks(&mut playground, &mut source, args.speed).await;
    playground.stop_recording().await?;
    let (mapped, total) = fed?;

    let recorded = playground.recorded_frames().await.len();
    info!(
        "Mapped {} of {} frames ({} dropped, body tracked in {:.0}%), recorded {} samples",
        mapped,
        total,
        playground.throttle().dropped(),
        playground.tracking_ratio() * 100.0,
        recorded
    );

    if let Some(out) = &args.session_out {
        let bytes = playground.export_session().await?;
        std::fs::write(out, &bytes).with_context(|| format!("writing {}", out.display()))?;
        info!("Session written to {} ({} bytes)", out.display(), bytes.len());
    }

    if recorded == 0 {
        bail!("no frames recorded from {}", args.landmarks.display());
    }

    // Real-time replay on the player task; Ctrl-C stops it early
    playground.replay_motion().await?;
    playground.spawn_playback();
    let mut ticker = interval(period);
    while playground.is_playing() {
        tokio::select! {
            _ = ticker.tick() => {
                playground.sync_model().await;
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping replay");
                break;
            }
        }
    }
    let played = playground.stop_playback().await;
    info!("Replayed {} frames", played);

    if let Some(report) = playground.sync_model().await {
        info!("Final pose: {} joints applied, {} unknown", report.applied, report.unknown);
    }

    Ok(())
}
