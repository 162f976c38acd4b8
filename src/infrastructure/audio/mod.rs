mod media_normalizer;
mod silence_segmenter;
pub mod wav;

pub use media_normalizer::{SymphoniaNormalizer, TARGET_SAMPLE_RATE};
pub use silence_segmenter::{SegmenterConfig, SilenceSegmenter};
