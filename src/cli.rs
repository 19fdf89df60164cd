use clap::{Parser, Subcommand, ValueEnum};

use phaseflow::core::synthetic::SyntheticKind;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML
    #[arg(long, default_value = "phaseflow.toml")]
    pub config: String,

    /// Multichannel WAV recording, one channel per electrode
    #[arg(long, conflicts_with = "synthetic")]
    pub input: Option<String>,

    /// Generate a synthetic recording instead of reading one (default: traveling)
    #[arg(long, value_enum)]
    pub synthetic: Option<SyntheticArg>,

    /// Synthetic recording length in samples
    #[arg(long, default_value_t = 1000)]
    pub frames: usize,

    /// Synthetic recording sample rate in Hz
    #[arg(long, default_value_t = 1000.0)]
    pub sample_rate: f64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print recording, grid and band summary
    Info,
    /// Compute one (possibly fractional) frame and write one PNG per band
    Frame {
        #[arg(value_name = "INDEX")]
        index: f64,
        /// Output directory (overrides config)
        #[arg(long)]
        out_dir: Option<String>,
    },
    /// Write PNGs for a monotone frame sequence
    Export {
        #[arg(long, default_value_t = 1.0)]
        start: f64,
        /// Last frame (default: last sample)
        #[arg(long)]
        end: Option<f64>,
        /// Frame step (overrides config)
        #[arg(long)]
        step: Option<f64>,
        /// Output directory (overrides config)
        #[arg(long)]
        out_dir: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticArg {
    InPhase,
    Traveling,
    Noise,
}

impl From<SyntheticArg> for SyntheticKind {
    fn from(arg: SyntheticArg) -> Self {
        match arg {
            SyntheticArg::InPhase => SyntheticKind::InPhase,
            SyntheticArg::Traveling => SyntheticKind::Traveling,
            SyntheticArg::Noise => SyntheticKind::Noise,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_export_with_synthetic_source() {
        let args = Args::parse_from([
            "phaseflow",
            "--synthetic",
            "in-phase",
            "--frames",
            "200",
            "export",
            "--end",
            "50",
            "--step",
            "0.5",
        ]);
        assert_eq!(args.synthetic, Some(SyntheticArg::InPhase));
        assert_eq!(args.frames, 200);
        match args.command {
            Command::Export { start, end, step, .. } => {
                assert_eq!(start, 1.0);
                assert_eq!(end, Some(50.0));
                assert_eq!(step, Some(0.5));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn input_conflicts_with_synthetic() {
        let res = Args::try_parse_from([
            "phaseflow",
            "--input",
            "rec.wav",
            "--synthetic",
            "noise",
            "info",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn frame_accepts_fractional_index() {
        let args = Args::parse_from(["phaseflow", "frame", "12.5"]);
        assert!(matches!(args.command, Command::Frame { index, .. } if index == 12.5));
    }
}
