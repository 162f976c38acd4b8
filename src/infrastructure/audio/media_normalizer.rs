use std::io::Cursor;

use async_trait::async_trait;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{MediaNormalizer, NormalizeError};
use crate::domain::NormalizedAudio;

pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Decodes any supported container to 16 kHz mono f32 PCM. Decoding is CPU
/// bound and runs on the blocking pool so the runtime keeps scheduling
/// chunk work for other jobs.
pub struct SymphoniaNormalizer;

impl SymphoniaNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SymphoniaNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaNormalizer for SymphoniaNormalizer {
    async fn normalize(
        &self,
        data: &[u8],
        container: &str,
    ) -> Result<NormalizedAudio, NormalizeError> {
        let data = data.to_vec();
        let container = container.to_string();
        tokio::task::spawn_blocking(move || decode_to_mono_pcm(data, &container))
            .await
            .map_err(|e| NormalizeError::Decode(format!("decode task failed: {}", e)))?
    }
}

fn decode_to_mono_pcm(data: Vec<u8>, container: &str) -> Result<NormalizedAudio, NormalizeError> {
    let stream = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let mut hint = Hint::new();
    if !container.is_empty() {
        hint.with_extension(container);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| NormalizeError::Decode(format!("probe: {}", e)))?;
    let mut format = probed.format;

    let track = format.default_track().ok_or(NormalizeError::NoAudioTrack)?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| NormalizeError::Decode("unknown sample rate".to_string()))?;
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| NormalizeError::Decode(format!("codec: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(NormalizeError::Decode(format!("packet: {}", e))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                tracing::warn!(error = %e, "Skipping corrupt audio frame");
                continue;
            }
            Err(e) => return Err(NormalizeError::Decode(format!("decode: {}", e))),
        };

        let spec = *decoded.spec();
        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }
        let mut buffer = SampleBuffer::<f32>::new(frames as u64, spec);
        buffer.copy_interleaved_ref(decoded);

        if channels > 1 {
            samples.extend(
                buffer
                    .samples()
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        } else {
            samples.extend_from_slice(buffer.samples());
        }
    }

    if samples.is_empty() {
        return Err(NormalizeError::Decode("no audio samples decoded".to_string()));
    }

    if source_rate != TARGET_SAMPLE_RATE {
        samples = resample(samples, source_rate, TARGET_SAMPLE_RATE)?;
    }

    let audio = NormalizedAudio::new(samples, TARGET_SAMPLE_RATE);
    tracing::debug!(
        samples = audio.samples.len(),
        duration_ms = audio.duration_ms(),
        container = %container,
        "Audio normalized to 16kHz mono PCM"
    );
    Ok(audio)
}

fn resample(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Result<Vec<f32>, NormalizeError> {
    use rubato::{FftFixedIn, Resampler};

    const CHUNK: usize = 2048;

    let mut resampler = FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, CHUNK, 4, 1)
        .map_err(|e| NormalizeError::Decode(format!("resampler init: {}", e)))?;

    let expected = (samples.len() as f64 * to_rate as f64 / from_rate as f64) as usize;
    let mut output = Vec::with_capacity(expected + CHUNK);

    for chunk in samples.chunks(CHUNK) {
        let frame = if chunk.len() == CHUNK {
            chunk.to_vec()
        } else {
            let mut padded = chunk.to_vec();
            padded.resize(CHUNK, 0.0);
            padded
        };
        let resampled = resampler
            .process(&[frame], None)
            .map_err(|e| NormalizeError::Decode(format!("resample: {}", e)))?;
        if let Some(channel) = resampled.into_iter().next() {
            output.extend(channel);
        }
    }

    output.truncate(expected);
    Ok(output)
}
