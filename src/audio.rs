//! The audio path: a pure tone sampled at a selectable rate and quantized with
//! [`StepQuantizer`] into the signed 16-bit range.
//!
//! The tone is generated directly at the target rate, so lowering the rate
//! below twice the tone frequency aliases exactly like the reference signal.
//! The peak amplitude is half of full scale ([`PEAK_AMPLITUDE`]) so every
//! quantized value fits in `i16`. Wrapping the result into a playable container
//! is left to the caller.

use ndarray::Array1;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::quantization::{QuantizedSampleSet, StepQuantizer, quantize_samples};
use crate::sampling::sample;
use crate::waveform::generate;
use crate::{DigitizerError, DigitizerResult};

/// Peak amplitude of generated tones: half of `i16::MAX`.
pub const PEAK_AMPLITUDE: f64 = 32767.0 * 0.5;

/// Sample rates offered for audio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum AudioSampleRate {
    /// 4 kHz
    Hz4000,
    /// 8 kHz, telephone quality
    Hz8000,
    /// 11.025 kHz
    Hz11025,
    /// 22.05 kHz
    Hz22050,
    /// 44.1 kHz, CD quality
    #[default]
    Hz44100,
}

impl AudioSampleRate {
    /// Every option, lowest first.
    pub const ALL: [AudioSampleRate; 5] = [
        AudioSampleRate::Hz4000,
        AudioSampleRate::Hz8000,
        AudioSampleRate::Hz11025,
        AudioSampleRate::Hz22050,
        AudioSampleRate::Hz44100,
    ];

    /// Rate in samples per second.
    pub const fn hz(self) -> u32 {
        match self {
            AudioSampleRate::Hz4000 => 4000,
            AudioSampleRate::Hz8000 => 8000,
            AudioSampleRate::Hz11025 => 11025,
            AudioSampleRate::Hz22050 => 22050,
            AudioSampleRate::Hz44100 => 44100,
        }
    }
}

impl TryFrom<u32> for AudioSampleRate {
    type Error = DigitizerError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        AudioSampleRate::ALL
            .into_iter()
            .find(|rate| rate.hz() == value)
            .ok_or_else(|| {
                DigitizerError::invalid_parameter(
                    "audio_sample_rate",
                    format!("must be one of 4000, 8000, 11025, 22050, 44100, got {value}"),
                )
            })
    }
}

impl From<AudioSampleRate> for u32 {
    fn from(rate: AudioSampleRate) -> Self {
        rate.hz()
    }
}

/// Bit depths offered for audio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum AudioBitDepth {
    /// 4 steps
    Bits2,
    /// 16 steps
    Bits4,
    /// 256 steps
    Bits8,
    /// 65536 steps
    #[default]
    Bits16,
}

impl AudioBitDepth {
    /// Every option, coarsest first.
    pub const ALL: [AudioBitDepth; 4] = [
        AudioBitDepth::Bits2,
        AudioBitDepth::Bits4,
        AudioBitDepth::Bits8,
        AudioBitDepth::Bits16,
    ];

    /// Number of bits.
    pub const fn bits(self) -> u32 {
        match self {
            AudioBitDepth::Bits2 => 2,
            AudioBitDepth::Bits4 => 4,
            AudioBitDepth::Bits8 => 8,
            AudioBitDepth::Bits16 => 16,
        }
    }

    /// Number of quantization steps, `2^bits`.
    pub const fn levels(self) -> usize {
        1usize << self.bits()
    }
}

impl TryFrom<u32> for AudioBitDepth {
    type Error = DigitizerError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        AudioBitDepth::ALL
            .into_iter()
            .find(|depth| depth.bits() == value)
            .ok_or_else(|| {
                DigitizerError::invalid_parameter(
                    "audio_bit_depth",
                    format!("must be one of 2, 4, 8, 16, got {value}"),
                )
            })
    }
}

impl From<AudioBitDepth> for u32 {
    fn from(depth: AudioBitDepth) -> Self {
        depth.bits()
    }
}

/// Controls for the audio view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Sample rate of the generated clip.
    pub sample_rate: AudioSampleRate,
    /// Bit depth the clip is quantized to.
    pub bit_depth: AudioBitDepth,
    /// Tone frequency in Hz.
    pub frequency: f64,
    /// Clip length in seconds.
    pub duration: f64,
}

impl AudioSettings {
    /// Two seconds of A4 (440 Hz) at 44.1 kHz, 16 bits.
    pub const fn new() -> Self {
        Self {
            sample_rate: AudioSampleRate::Hz44100,
            bit_depth: AudioBitDepth::Bits16,
            frequency: 440.0,
            duration: 2.0,
        }
    }

    /// Telephone-like: 8 kHz, 8 bits.
    pub const fn telephone() -> Self {
        Self {
            sample_rate: AudioSampleRate::Hz8000,
            bit_depth: AudioBitDepth::Bits8,
            ..Self::new()
        }
    }

    /// Checks tone frequency and duration.
    ///
    /// # Errors
    /// [`DigitizerError::InvalidParameter`] if either is not a finite positive number.
    pub fn validate(&self) -> DigitizerResult<()> {
        for (name, value) in [("frequency", self.frequency), ("duration", self.duration)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DigitizerError::invalid_parameter(
                    name,
                    format!("must be finite and > 0, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// A digitized tone.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    sample_rate: AudioSampleRate,
    bit_depth: AudioBitDepth,
    quantized: QuantizedSampleSet<f64>,
    pcm: Array1<i16>,
}

impl AudioClip {
    /// Sample rate of the clip.
    pub const fn sample_rate(&self) -> AudioSampleRate {
        self.sample_rate
    }

    /// Bit depth the clip was quantized to.
    pub const fn bit_depth(&self) -> AudioBitDepth {
        self.bit_depth
    }

    /// Quantized samples in floating point, with the values before quantization.
    pub const fn quantized(&self) -> &QuantizedSampleSet<f64> {
        &self.quantized
    }

    /// Signed 16-bit samples, ready for a container encoder.
    pub const fn pcm(&self) -> &Array1<i16> {
        &self.pcm
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.pcm.len()
    }

    /// Returns true if the clip has no samples.
    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }
}

/// Converts floating samples to `i16`, truncating toward zero.
///
/// # Errors
/// [`DigitizerError::Conversion`] for the first value outside the `i16` range or NaN.
pub fn to_pcm16(values: &Array1<f64>) -> DigitizerResult<Array1<i16>> {
    values
        .iter()
        .map(|&value| {
            value.to_i16().ok_or_else(|| DigitizerError::Conversion {
                value: value.to_string(),
                target: "i16",
                reason: "value outside the signed 16-bit range".to_string(),
            })
        })
        .collect::<DigitizerResult<Vec<i16>>>()
        .map(Array1::from_vec)
}

/// Generates, samples and quantizes a tone according to `settings`.
///
/// The sine (peak [`PEAK_AMPLITUDE`]) is sampled at the selected rate for the
/// selected duration, quantized by step rounding over
/// `[-PEAK_AMPLITUDE, PEAK_AMPLITUDE]` with `2^bits` steps, then truncated to `i16`.
///
/// # Errors
/// Invalid settings, or (never for the built-in amplitude) a value outside `i16`.
///
/// # Examples
/// ```
/// use signal_digitizer::audio::{AudioSettings, digitize_tone};
///
/// let clip = digitize_tone(&AudioSettings::telephone()).unwrap();
/// assert_eq!(clip.len(), 16_000);
/// ```
pub fn digitize_tone(settings: &AudioSettings) -> DigitizerResult<AudioClip> {
    settings.validate()?;

    let tone = generate(settings.frequency, PEAK_AMPLITUDE);
    let sampled = sample(&tone, settings.duration, f64::from(settings.sample_rate.hz()))?;
    let quantizer =
        StepQuantizer::from_bit_depth(-PEAK_AMPLITUDE, PEAK_AMPLITUDE, settings.bit_depth.bits())?;
    let quantized = quantize_samples(&sampled, &quantizer);
    let pcm = to_pcm16(quantized.values())?;

    debug!(
        sample_rate = settings.sample_rate.hz(),
        bits = settings.bit_depth.bits(),
        len = pcm.len(),
        "digitized tone"
    );

    Ok(AudioClip {
        sample_rate: settings.sample_rate,
        bit_depth: settings.bit_depth,
        quantized,
        pcm,
    })
}
