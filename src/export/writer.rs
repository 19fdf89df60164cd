use std::path::PathBuf;

use crossbeam_channel::Receiver;
use tracing::{debug, error};

use phaseflow::FrameSet;

use super::png::FrameRenderer;

/// One computed frame queued for writing, with its position in the export.
pub struct FrameJob {
    pub seq: usize,
    pub set: FrameSet,
}

pub fn frame_file_name(seq: usize, band: usize) -> String {
    format!("frame_{seq:05}_band{band}.png")
}

/// Name for a single queried frame, keyed by its (possibly fractional) index.
pub fn index_file_name(index: f64, band: usize) -> String {
    format!("index_{index}_band{band}.png")
}

/// Background PNG writer; the renderer is moved into the writer thread.
pub struct PngOutput;

impl PngOutput {
    /// Writes every band of every received frame until the sender hangs up.
    /// Returns the number of PNG files written, or the first failure.
    pub fn run(
        rx: Receiver<FrameJob>,
        renderer: FrameRenderer,
        out_dir: PathBuf,
    ) -> std::thread::JoinHandle<Result<usize, String>> {
        std::thread::spawn(move || {
            let mut written = 0usize;
            while let Ok(job) = rx.recv() {
                for (band, frame) in job.set.frames.iter().enumerate() {
                    let path = out_dir.join(frame_file_name(job.seq, band));
                    if let Err(err) = renderer.render(frame, band, &path) {
                        error!(path = %path.display(), "failed to write frame: {err}");
                        return Err(format!("{}: {err}", path.display()));
                    }
                    written += 1;
                }
                debug!(seq = job.seq, index = job.set.index, "frame written");
            }
            Ok(written)
        })
    }
}
