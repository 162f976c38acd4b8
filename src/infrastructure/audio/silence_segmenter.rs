use crate::application::ports::{SegmentError, Segmenter};
use crate::domain::{Chunk, NormalizedAudio, TimeRange};

use super::wav::encode_wav_mono16;

#[derive(Debug, Clone, Copy)]
pub struct SegmenterConfig {
    /// Chunk duration ceiling `D`.
    pub max_chunk_ms: u64,
    /// Amplitude must stay below `silence_threshold` at least this long to
    /// count as a pause.
    pub min_silence_ms: u64,
    pub silence_threshold: f32,
    /// How far back from the duration ceiling a pause may be used as a cut.
    pub lookback_ms: u64,
    /// Overlap appended past each cut so words clipped at the edge appear
    /// whole in the next provider request; deduplicated at aggregation.
    pub boundary_guard_ms: u64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_chunk_ms: 10 * 60 * 1000,
            min_silence_ms: 600,
            silence_threshold: 0.015,
            lookback_ms: 20_000,
            boundary_guard_ms: 300,
        }
    }
}

/// Cuts the stream on natural pauses: silence intervals become candidate
/// cut points, and each chunk ends at the candidate closest to its duration
/// ceiling. Coverage wins over word safety; with no pause in reach the cut
/// is forced at the ceiling.
pub struct SilenceSegmenter {
    config: SegmenterConfig,
}

impl SilenceSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Sample indices of pause midpoints, ascending.
    fn silence_cut_points(&self, audio: &NormalizedAudio) -> Vec<usize> {
        let min_silence = ms_to_samples(self.config.min_silence_ms, audio.sample_rate).max(1);
        let mut cut_points = Vec::new();
        let mut run_start: Option<usize> = None;

        for (i, &sample) in audio.samples.iter().enumerate() {
            if sample.abs() < self.config.silence_threshold {
                run_start.get_or_insert(i);
            } else if let Some(start) = run_start.take() {
                if i - start >= min_silence {
                    cut_points.push(start + (i - start) / 2);
                }
            }
        }
        if let Some(start) = run_start {
            let end = audio.samples.len();
            if end - start >= min_silence {
                cut_points.push(start + (end - start) / 2);
            }
        }
        cut_points
    }

    /// Chunk end positions in samples; the final entry is the stream length.
    fn chunk_ends(&self, total: usize, sample_rate: u32, cut_points: &[usize]) -> Vec<usize> {
        let max_chunk = ms_to_samples(self.config.max_chunk_ms, sample_rate).max(1);
        let lookback = ms_to_samples(self.config.lookback_ms, sample_rate);

        let mut ends = Vec::new();
        let mut start = 0usize;
        while total - start > max_chunk {
            let ceiling = start + max_chunk;
            let window_low = ceiling.saturating_sub(lookback).max(start + 1);
            // Closest candidate below the ceiling; forced cut otherwise.
            let end = cut_points
                .iter()
                .copied()
                .filter(|&cp| cp >= window_low && cp <= ceiling)
                .next_back()
                .unwrap_or(ceiling);
            ends.push(end);
            start = end;
        }
        ends.push(total);
        ends
    }
}

impl Segmenter for SilenceSegmenter {
    fn segment(&self, audio: &NormalizedAudio) -> Result<Vec<Chunk>, SegmentError> {
        if audio.is_empty() || audio.duration_ms() == 0 {
            return Err(SegmentError::EmptyMedia);
        }

        let cut_points = self.silence_cut_points(audio);
        let ends = self.chunk_ends(audio.samples.len(), audio.sample_rate, &cut_points);
        let guard = ms_to_samples(self.config.boundary_guard_ms, audio.sample_rate);

        let mut chunks = Vec::with_capacity(ends.len());
        let mut start = 0usize;
        for (index, &end) in ends.iter().enumerate() {
            let last = index == ends.len() - 1;
            let payload_end = if last {
                end
            } else {
                (end + guard).min(audio.samples.len())
            };
            let payload = encode_wav_mono16(&audio.samples[start..payload_end], audio.sample_rate)
                .map_err(|e| SegmentError::Encode(e.to_string()))?;
            let range = TimeRange::new(
                samples_to_ms(start, audio.sample_rate),
                samples_to_ms(end, audio.sample_rate),
            );
            chunks.push(Chunk::new(index, range, payload));
            start = end;
        }

        tracing::debug!(
            chunks = chunks.len(),
            pauses = cut_points.len(),
            duration_ms = audio.duration_ms(),
            "Audio segmented on silence boundaries"
        );
        Ok(chunks)
    }
}

fn ms_to_samples(ms: u64, sample_rate: u32) -> usize {
    ((ms * sample_rate as u64) / 1000) as usize
}

fn samples_to_ms(samples: usize, sample_rate: u32) -> u64 {
    (samples as u64 * 1000) / sample_rate as u64
}
