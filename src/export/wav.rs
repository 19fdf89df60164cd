use std::error::Error;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use tracing::info;

use phaseflow::Recording;

/// Read a multichannel WAV; WAV channel `c` becomes electrode channel `c`.
/// Integer samples are scaled to `[-1, 1)`.
pub fn load_recording(path: &Path) -> Result<Recording, Box<dyn Error>> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let interleaved: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let recording = Recording::from_interleaved(
        f64::from(spec.sample_rate),
        usize::from(spec.channels),
        &interleaved,
    )?;
    info!(
        path = %path.display(),
        channels = recording.channel_count(),
        frames = recording.frame_count(),
        sample_rate = recording.sample_rate(),
        "loaded recording"
    );
    Ok(recording)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn unique_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "phaseflow_wav_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn reads_interleaved_int_channels() {
        let path = unique_path("int.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 1000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for i in 0..10_i16 {
            writer.write_sample(i * 100).unwrap();
            writer.write_sample(-i * 100).unwrap();
        }
        writer.finalize().unwrap();

        let rec = load_recording(&path).unwrap();
        assert_eq!(rec.channel_count(), 2);
        assert_eq!(rec.frame_count(), 10);
        assert_eq!(rec.sample_rate(), 1000.0);
        assert_eq!(rec.channel(0)[3], 300.0 / 32768.0);
        assert_eq!(rec.channel(1)[3], -300.0 / 32768.0);

        let _ = std::fs::remove_file(&path);
    }
}
