// Entry point: builds a session from config + recording and drives frame queries.
mod cli;
mod export;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use phaseflow::config::AppConfig;
use phaseflow::core::synthetic::{SyntheticKind, SyntheticSpec};
use phaseflow::{ElectrodeGrid, FrameSequencer, PipelineError, Recording, Session};

use cli::{Args, Command};
use export::png::FrameRenderer;
use export::writer::{FrameJob, PngOutput, index_file_name};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn load_recording(args: &Args, grid: &ElectrodeGrid) -> Result<Recording, Box<dyn Error>> {
    if let Some(path) = &args.input {
        return export::wav::load_recording(Path::new(path));
    }
    let kind: SyntheticKind = args.synthetic.map(Into::into).unwrap_or(SyntheticKind::Traveling);
    let spec = SyntheticSpec {
        sample_rate: args.sample_rate,
        frames: args.frames,
        ..SyntheticSpec::default()
    };
    info!(?kind, frames = spec.frames, sample_rate = spec.sample_rate, "synthetic recording");
    Ok(kind.generate(grid, &spec)?)
}

fn report_config_error(config_path: &str, err: PipelineError) -> PipelineError {
    if err.is_configuration() {
        error!(config = config_path, "{err}");
    }
    err
}

fn print_info(seq: &FrameSequencer) {
    let session = seq.session();
    let rec = session.recording();
    let grid = session.grid();
    let config = session.config();
    println!(
        "recording: {} channels, {} frames @ {} Hz ({:.3} s)",
        rec.channel_count(),
        rec.frame_count(),
        rec.sample_rate(),
        rec.duration_sec()
    );
    println!(
        "grid: {}x{} pitch {} (extent {:?})",
        grid.columns(),
        grid.rows(),
        grid.pitch(),
        grid.extent()
    );
    println!(
        "field: {}x{} kernel {} mode {:?} epsilon {}",
        config.field.width,
        config.field.height,
        config.field.smoothing_kernel,
        config.field.mode,
        config.epsilon
    );
    for (i, band) in config.bands.iter().enumerate() {
        let map = config.colormaps.get(i).map(|m| m.to_string()).unwrap_or_default();
        println!("band {i}: {band} {map}");
    }
}

fn renderer_for(cfg: &AppConfig, seq: &FrameSequencer) -> FrameRenderer {
    let config = seq.session().config();
    FrameRenderer::new(cfg.render.clone(), &config.colormaps, seq.session().grid().extent())
}

fn run_frame(cfg: &AppConfig, seq: &FrameSequencer, index: f64, out_dir: &Path) -> Result<(), Box<dyn Error>> {
    std::fs::create_dir_all(out_dir)?;
    let set = seq.compute_frame(index)?;
    let renderer = renderer_for(cfg, seq);
    for (band, frame) in set.frames.iter().enumerate() {
        let path = out_dir.join(index_file_name(index, band));
        renderer.render(frame, band, &path)?;
        info!(
            index,
            t0 = set.t0,
            band = %frame.band,
            max_speed = frame.velocity.max_speed(),
            mean_speed = frame.velocity.mean_speed(),
            path = %path.display(),
            "frame written"
        );
    }
    Ok(())
}

fn run_export(
    cfg: &AppConfig,
    seq: &FrameSequencer,
    indices: impl Iterator<Item = f64>,
    out_dir: PathBuf,
    stop_flag: &AtomicBool,
) -> Result<(), Box<dyn Error>> {
    std::fs::create_dir_all(&out_dir)?;
    let (tx, rx) = crossbeam_channel::bounded::<FrameJob>(cfg.export.queue_depth.max(1));
    let writer = PngOutput::run(rx, renderer_for(cfg, seq), out_dir.clone());

    let mut sent = 0usize;
    for (i, index) in indices.enumerate() {
        if stop_flag.load(Ordering::SeqCst) {
            warn!(frames = sent, "export interrupted");
            break;
        }
        let set = seq.compute_frame(index)?;
        if tx.send(FrameJob { seq: i + 1, set }).is_err() {
            // Writer exited early; its error is reported by join below.
            break;
        }
        sent += 1;
    }
    drop(tx);

    let written = writer
        .join()
        .map_err(|_| "frame writer thread panicked")??;
    info!(frames = sent, files = written, out_dir = %out_dir.display(), "export finished");
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let args = Args::parse();

    let cfg = AppConfig::load_or_default(&args.config);
    let grid = cfg
        .grid
        .build()
        .map_err(|e| report_config_error(&args.config, e))?;
    let pipeline = cfg.pipeline().map_err(|e| report_config_error(&args.config, e))?;
    let recording = load_recording(&args, &grid)?;
    let seq = Session::new(recording, grid, pipeline)
        .and_then(FrameSequencer::new)
        .map_err(|e| report_config_error(&args.config, e))?;

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_for_ctrlc = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_for_ctrlc.store(true, Ordering::SeqCst);
    })?;

    match args.command {
        Command::Info => print_info(&seq),
        Command::Frame { index, out_dir } => {
            let out_dir = PathBuf::from(out_dir.unwrap_or_else(|| cfg.export.out_dir.clone()));
            run_frame(&cfg, &seq, index, &out_dir)?;
        }
        Command::Export {
            start,
            end,
            step,
            out_dir,
        } => {
            let end = end.unwrap_or(seq.session().frame_count() as f64);
            let step = step.unwrap_or(cfg.export.step);
            let indices = seq.frame_indices(start, end, step)?;
            info!(start, end, step, frames = indices.len(), "exporting");
            let out_dir = PathBuf::from(out_dir.unwrap_or_else(|| cfg.export.out_dir.clone()));
            run_export(&cfg, &seq, indices, out_dir, &stop_flag)?;
        }
    }
    Ok(())
}
