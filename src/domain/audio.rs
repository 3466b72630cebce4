use zeroize::Zeroize;

/// Sample rate the speech model expects, in Hz.
pub const MODEL_SAMPLE_RATE: u32 = 16_000;

/// Audio uploaded with a request. Bytes are zeroed on drop.
#[derive(Debug, Zeroize)]
#[zeroize(drop)]
pub struct AudioClip {
    bytes: Vec<u8>,
    mime_type: String,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Planar decoder output at the source sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// One sample vector per channel, all of equal length.
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Collapse to a single channel by averaging each frame across channels.
    pub fn downmix(self) -> Waveform {
        let sample_rate = self.sample_rate;
        let frames = self.frames();
        let count = self.channels.len();

        let samples = match count {
            0 => Vec::new(),
            1 => self.channels.into_iter().next().unwrap_or_default(),
            _ => (0..frames)
                .map(|i| self.channels.iter().map(|c| c[i]).sum::<f32>() / count as f32)
                .collect(),
        };

        Waveform {
            samples,
            sample_rate,
        }
    }
}

/// Single-channel f32 waveform in [-1, 1], ready for the speech model.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_averages_channels() {
        let decoded = DecodedAudio::new(vec![vec![1.0, 0.5, -1.0], vec![0.0, 0.5, 1.0]], 44_100);
        let mono = decoded.downmix();

        assert_eq!(mono.sample_rate, 44_100);
        assert_eq!(mono.samples, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_downmix_mono_is_untouched() {
        let decoded = DecodedAudio::new(vec![vec![0.25, -0.25]], MODEL_SAMPLE_RATE);
        assert_eq!(decoded.downmix().samples, vec![0.25, -0.25]);
    }

    #[test]
    fn test_decoded_audio_empty() {
        assert!(DecodedAudio::new(Vec::new(), MODEL_SAMPLE_RATE).is_empty());
        assert!(DecodedAudio::new(vec![Vec::new(), Vec::new()], MODEL_SAMPLE_RATE).is_empty());
    }

    #[test]
    fn test_waveform_duration() {
        let waveform = Waveform {
            samples: vec![0.0; 16_000],
            sample_rate: MODEL_SAMPLE_RATE,
        };
        assert!((waveform.duration_secs() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_audio_clip_accessors() {
        let clip = AudioClip::new(vec![1, 2, 3], "audio/wav");
        assert_eq!(clip.bytes(), &[1, 2, 3]);
        assert_eq!(clip.mime_type(), "audio/wav");
        assert!(!clip.is_empty());
    }
}
