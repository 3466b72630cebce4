//! Audio decoding (symphonia) and resampling (rubato).

use std::io::Cursor;

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::domain::{DecodedAudio, DomainError};
use crate::ports::AudioDecoder;

const RESAMPLE_CHUNK: usize = 1024;

/// Decoder for WAV, MP3, AAC/M4A, FLAC and Ogg Vorbis via symphonia.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }

    fn hint_for(mime_type: &str) -> Hint {
        let mut hint = Hint::new();
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        let extension = match essence.as_str() {
            "audio/wav" | "audio/wave" | "audio/x-wav" | "audio/vnd.wave" => Some("wav"),
            "audio/mpeg" | "audio/mp3" => Some("mp3"),
            "audio/m4a" | "audio/mp4" | "audio/x-m4a" | "audio/aac" => Some("m4a"),
            "audio/flac" | "audio/x-flac" => Some("flac"),
            "audio/ogg" | "audio/vorbis" => Some("ogg"),
            _ => None,
        };
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }
        hint.mime_type(&essence);
        hint
    }
}

fn decode_error(context: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::TranscriptionFailed(format!("{}: {}", context, err))
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, bytes: &[u8], mime_type: &str) -> Result<DecodedAudio, DomainError> {
        let cursor = Cursor::new(bytes.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &Self::hint_for(mime_type),
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| decode_error("probe failed", e))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| DomainError::TranscriptionFailed("no audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params.sample_rate.ok_or_else(|| {
            DomainError::TranscriptionFailed("unknown sample rate".to_string())
        })?;
        let mut channel_count = codec_params.channels.map_or(1, |c| c.count());

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| decode_error("codec init failed", e))?;

        let mut channels: Vec<Vec<f32>> = vec![Vec::new(); channel_count];

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(decode_error("packet read", e)),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                // Corrupt frame; skip it like a media player would.
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!(error = e, "Skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(decode_error("decode", e)),
            };

            let spec = *decoded.spec();
            if spec.channels.count() != channel_count {
                channel_count = spec.channels.count();
                channels.resize(channel_count, Vec::new());
            }

            let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);

            for frame in sample_buf.samples().chunks(channel_count) {
                for (channel, &sample) in channels.iter_mut().zip(frame) {
                    channel.push(sample);
                }
            }
        }

        debug!(
            channels = channel_count,
            sample_rate = sample_rate,
            frames = channels.first().map_or(0, Vec::len),
            "Audio decoded"
        );

        Ok(DecodedAudio::new(channels, sample_rate))
    }
}

/// Resample every channel from `from_rate` to `to_rate`.
pub fn resample_channels(
    channels: &[Vec<f32>],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<Vec<f32>>, DomainError> {
    if from_rate == to_rate || channels.is_empty() {
        return Ok(channels.to_vec());
    }
    if from_rate == 0 {
        return Err(DomainError::TranscriptionFailed(
            "source sample rate is zero".to_string(),
        ));
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let frames = channels.iter().map(Vec::len).min().unwrap_or(0);

    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 2.0, params, RESAMPLE_CHUNK, channels.len())
            .map_err(|e| decode_error("resampler init", e))?;

    let capacity = (frames as f64 * ratio) as usize + RESAMPLE_CHUNK;
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(capacity); channels.len()];

    let mut offset = 0;
    while offset < frames {
        let end = (offset + RESAMPLE_CHUNK).min(frames);
        let input: Vec<Vec<f32>> = channels
            .iter()
            .map(|c| {
                let mut chunk = c[offset..end].to_vec();
                // Pad last chunk with zeros
                chunk.resize(RESAMPLE_CHUNK, 0.0);
                chunk
            })
            .collect();

        let resampled = resampler
            .process(&input, None)
            .map_err(|e| decode_error("resample", e))?;

        for (out, chunk) in output.iter_mut().zip(resampled) {
            out.extend_from_slice(&chunk);
        }
        offset = end;
    }

    // Drop the tail produced by zero padding.
    let expected = (frames as f64 * ratio).round() as usize;
    for out in &mut output {
        out.truncate(expected);
    }

    Ok(output)
}
