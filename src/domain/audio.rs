/// Decoded audio as a single mono PCM stream, the segmenter's input.
#[derive(Debug, Clone)]
pub struct NormalizedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl NormalizedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
