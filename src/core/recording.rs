//! Multichannel recording held fully in memory.

use crate::core::error::PipelineError;
use crate::core::timebase::Timebase;

/// `channel_count` equal-length time series sampled at `timebase.fs`.
/// Immutable after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Recording {
    timebase: Timebase,
    samples: Vec<Vec<f64>>,
}

impl Recording {
    /// Validates sample rate, emptiness and equal channel lengths.
    pub fn new(sample_rate: f64, samples: Vec<Vec<f64>>) -> Result<Self, PipelineError> {
        let timebase = Timebase::new(sample_rate)?;
        let expected = match samples.first() {
            Some(ch) if !ch.is_empty() => ch.len(),
            _ => return Err(PipelineError::EmptyRecording),
        };
        for (channel, series) in samples.iter().enumerate() {
            if series.len() != expected {
                return Err(PipelineError::RaggedRecording {
                    channel,
                    expected,
                    found: series.len(),
                });
            }
        }
        Ok(Self { timebase, samples })
    }

    /// Build from interleaved frames (`[t0c0, t0c1, ..., t1c0, ...]`), as WAV readers deliver.
    pub fn from_interleaved(
        sample_rate: f64,
        channel_count: usize,
        interleaved: &[f64],
    ) -> Result<Self, PipelineError> {
        if channel_count == 0 || interleaved.len() < channel_count {
            return Err(PipelineError::EmptyRecording);
        }
        let frames = interleaved.len() / channel_count;
        let partial = interleaved.len() % channel_count;
        if partial != 0 {
            // Channels from `partial` on are one sample short of channel 0.
            return Err(PipelineError::RaggedRecording {
                channel: partial,
                expected: frames + 1,
                found: frames,
            });
        }
        let mut samples = vec![Vec::with_capacity(frames); channel_count];
        for frame in interleaved.chunks_exact(channel_count) {
            for (ch, &v) in frame.iter().enumerate() {
                samples[ch].push(v);
            }
        }
        Self::new(sample_rate, samples)
    }

    #[inline]
    pub fn timebase(&self) -> Timebase {
        self.timebase
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.timebase.fs
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.samples[0].len()
    }

    #[inline]
    pub fn channel(&self, ch: usize) -> &[f64] {
        &self.samples[ch]
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f64]> {
        self.samples.iter().map(Vec::as_slice)
    }

    /// Duration in seconds from the first to the last sample.
    pub fn duration_sec(&self) -> f64 {
        self.timebase.index_to_sec(self.frame_count() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_channels() {
        let err = Recording::new(1000.0, vec![vec![0.0; 10], vec![0.0; 9]]).unwrap_err();
        assert_eq!(
            err,
            PipelineError::RaggedRecording {
                channel: 1,
                expected: 10,
                found: 9
            }
        );
    }

    #[test]
    fn rejects_empty_and_bad_rate() {
        assert_eq!(
            Recording::new(1000.0, vec![]).unwrap_err(),
            PipelineError::EmptyRecording
        );
        assert_eq!(
            Recording::new(1000.0, vec![vec![]]).unwrap_err(),
            PipelineError::EmptyRecording
        );
        assert!(matches!(
            Recording::new(0.0, vec![vec![1.0]]).unwrap_err(),
            PipelineError::InvalidSampleRate(_)
        ));
    }

    #[test]
    fn deinterleaves_frames() {
        let rec = Recording::from_interleaved(100.0, 2, &[1.0, -1.0, 2.0, -2.0, 3.0, -3.0]).unwrap();
        assert_eq!(rec.channel_count(), 2);
        assert_eq!(rec.frame_count(), 3);
        assert_eq!(rec.channel(0), &[1.0, 2.0, 3.0]);
        assert_eq!(rec.channel(1), &[-1.0, -2.0, -3.0]);
        assert!((rec.duration_sec() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn rejects_trailing_partial_frame() {
        let err = Recording::from_interleaved(100.0, 3, &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap_err();
        assert_eq!(
            err,
            PipelineError::RaggedRecording {
                channel: 2,
                expected: 2,
                found: 1
            }
        );
    }
}
