//! Parameter sets supplied by a control surface.
//!
//! Each struct mirrors one group of controls, carries the defaults a fresh
//! session starts with, and can check itself against the ranges the controls
//! allow ([`SignalSettings::validate`], [`ImageSettings::validate`]). All of them
//! (de)serialize with serde, missing fields falling back to the defaults.

use serde::{Deserialize, Serialize};

use crate::{DigitizerError, DigitizerResult};

/// Lowest selectable sampling rate for the reference signal (Sa/s).
pub const MIN_SAMPLING_RATE: u32 = 1;
/// Highest selectable sampling rate for the reference signal (Sa/s).
pub const MAX_SAMPLING_RATE: u32 = 40;
/// Lowest selectable bit depth for the reference signal.
pub const MIN_SIGNAL_BIT_DEPTH: u32 = 1;
/// Highest selectable bit depth for the reference signal.
pub const MAX_SIGNAL_BIT_DEPTH: u32 = 8;

fn check_positive(name: &str, value: f64) -> DigitizerResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DigitizerError::invalid_parameter(
            name,
            format!("must be finite and > 0, got {value}"),
        ))
    }
}

/// Controls for the reference-signal view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSettings {
    /// Frequency of the reference sine in Hz.
    pub frequency: f64,
    /// Peak amplitude of the reference sine; quantization spans `[-amplitude, amplitude]`.
    pub amplitude: f64,
    /// Length of the observed window in seconds.
    pub duration: f64,
    /// Number of points used to draw the continuous trace.
    pub analog_points: usize,
    /// Samples per second, in `[1, 40]`.
    pub sampling_rate: u32,
    /// Bits per sample, in `[1, 8]`.
    pub bit_depth: u32,
}

impl SignalSettings {
    /// 2 Hz sine of amplitude 1 over one second, sampled at 10 Sa/s with 3 bits.
    pub const fn new() -> Self {
        Self {
            frequency: 2.0,
            amplitude: 1.0,
            duration: 1.0,
            analog_points: 1000,
            sampling_rate: 10,
            bit_depth: 3,
        }
    }

    /// Below the Nyquist rate: 3 Sa/s makes the 2 Hz sine look like 1 Hz.
    pub const fn aliased() -> Self {
        Self::new().with_sampling_rate(3)
    }

    /// The finest setting the controls allow.
    pub const fn finest() -> Self {
        Self::new()
            .with_sampling_rate(MAX_SAMPLING_RATE)
            .with_bit_depth(MAX_SIGNAL_BIT_DEPTH)
    }

    /// Returns a copy with a different sampling rate.
    pub const fn with_sampling_rate(mut self, sampling_rate: u32) -> Self {
        self.sampling_rate = sampling_rate;
        self
    }

    /// Returns a copy with a different bit depth.
    pub const fn with_bit_depth(mut self, bit_depth: u32) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    /// Number of quantization levels, `2^bit_depth`.
    pub const fn num_levels(&self) -> usize {
        match 1usize.checked_shl(self.bit_depth) {
            Some(levels) => levels,
            None => usize::MAX,
        }
    }

    /// Checks every field against the ranges of the controls.
    ///
    /// # Errors
    /// [`DigitizerError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> DigitizerResult<()> {
        if !(MIN_SAMPLING_RATE..=MAX_SAMPLING_RATE).contains(&self.sampling_rate) {
            return Err(DigitizerError::invalid_parameter(
                "sampling_rate",
                format!(
                    "must be in [{MIN_SAMPLING_RATE}, {MAX_SAMPLING_RATE}], got {}",
                    self.sampling_rate
                ),
            ));
        }
        if !(MIN_SIGNAL_BIT_DEPTH..=MAX_SIGNAL_BIT_DEPTH).contains(&self.bit_depth) {
            return Err(DigitizerError::invalid_parameter(
                "bit_depth",
                format!(
                    "must be in [{MIN_SIGNAL_BIT_DEPTH}, {MAX_SIGNAL_BIT_DEPTH}], got {}",
                    self.bit_depth
                ),
            ));
        }
        check_positive("frequency", self.frequency)?;
        check_positive("amplitude", self.amplitude)?;
        check_positive("duration", self.duration)?;
        if self.analog_points == 0 {
            return Err(DigitizerError::invalid_parameter(
                "analog_points",
                "must be >= 1",
            ));
        }
        Ok(())
    }
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Palette sizes offered for the image view.
#[cfg(feature = "image")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum ColorDepth {
    /// 2 colors
    C2,
    /// 4 colors
    C4,
    /// 8 colors
    C8,
    /// 16 colors
    C16,
    /// 32 colors
    C32,
    /// 64 colors
    C64,
    /// 256 colors
    #[default]
    C256,
}

#[cfg(feature = "image")]
impl ColorDepth {
    /// Every option, smallest first.
    pub const ALL: [ColorDepth; 7] = [
        ColorDepth::C2,
        ColorDepth::C4,
        ColorDepth::C8,
        ColorDepth::C16,
        ColorDepth::C32,
        ColorDepth::C64,
        ColorDepth::C256,
    ];

    /// Number of palette entries.
    pub const fn colors(self) -> u16 {
        match self {
            ColorDepth::C2 => 2,
            ColorDepth::C4 => 4,
            ColorDepth::C8 => 8,
            ColorDepth::C16 => 16,
            ColorDepth::C32 => 32,
            ColorDepth::C64 => 64,
            ColorDepth::C256 => 256,
        }
    }
}

#[cfg(feature = "image")]
impl TryFrom<u16> for ColorDepth {
    type Error = DigitizerError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ColorDepth::ALL
            .into_iter()
            .find(|depth| depth.colors() == value)
            .ok_or_else(|| {
                DigitizerError::invalid_parameter(
                    "color_depth",
                    format!("must be one of 2, 4, 8, 16, 32, 64, 256, got {value}"),
                )
            })
    }
}

#[cfg(feature = "image")]
impl From<ColorDepth> for u16 {
    fn from(depth: ColorDepth) -> Self {
        depth.colors()
    }
}

/// Controls for the image view.
#[cfg(feature = "image")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Spatial resolution kept, in percent of the original size, in `[1, 100]`.
    pub resolution_percent: u32,
    /// Palette size.
    pub color_depth: ColorDepth,
}

#[cfg(feature = "image")]
impl ImageSettings {
    /// Full resolution, 256 colors.
    pub const fn new() -> Self {
        Self {
            resolution_percent: 100,
            color_depth: ColorDepth::C256,
        }
    }

    /// Heavy pixelation and a tiny palette.
    pub const fn coarse() -> Self {
        Self {
            resolution_percent: 5,
            color_depth: ColorDepth::C4,
        }
    }

    /// Checks the resolution against `[1, 100]`.
    ///
    /// # Errors
    /// [`DigitizerError::InvalidParameter`] if the percentage is out of range.
    pub fn validate(&self) -> DigitizerResult<()> {
        if !(1..=100).contains(&self.resolution_percent) {
            return Err(DigitizerError::invalid_parameter(
                "resolution_percent",
                format!("must be in [1, 100], got {}", self.resolution_percent),
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "image")]
impl Default for ImageSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_defaults_are_valid() {
        let settings = SignalSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.num_levels(), 8);
        assert!(SignalSettings::aliased().validate().is_ok());
        assert_eq!(SignalSettings::finest().num_levels(), 256);
    }

    #[test]
    fn test_signal_range_checks() {
        let too_fast = SignalSettings::new().with_sampling_rate(41);
        assert!(matches!(
            too_fast.validate(),
            Err(DigitizerError::InvalidParameter { ref parameter, .. }) if parameter == "sampling_rate"
        ));
        assert!(SignalSettings::new().with_sampling_rate(0).validate().is_err());
        assert!(SignalSettings::new().with_bit_depth(0).validate().is_err());
        assert!(SignalSettings::new().with_bit_depth(9).validate().is_err());

        let mut negative = SignalSettings::new();
        negative.duration = -1.0;
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_signal_settings_from_partial_json() {
        let settings: SignalSettings =
            serde_json::from_str(r#"{ "sampling_rate": 25, "bit_depth": 6 }"#).unwrap();
        assert_eq!(settings.sampling_rate, 25);
        assert_eq!(settings.bit_depth, 6);
        assert_eq!(settings.frequency, 2.0);
        assert_eq!(settings.analog_points, 1000);
        assert!(settings.validate().is_ok());
    }

    #[cfg(feature = "image")]
    #[test]
    fn test_color_depth_options() {
        let counts: Vec<u16> = ColorDepth::ALL.iter().map(|d| d.colors()).collect();
        assert_eq!(counts, vec![2, 4, 8, 16, 32, 64, 256]);
        assert_eq!(ColorDepth::try_from(64).unwrap(), ColorDepth::C64);
        assert!(ColorDepth::try_from(128).is_err());
        assert_eq!(u16::from(ColorDepth::C8), 8);
    }

    #[cfg(feature = "image")]
    #[test]
    fn test_image_settings_json() {
        let settings: ImageSettings =
            serde_json::from_str(r#"{ "resolution_percent": 10, "color_depth": 16 }"#).unwrap();
        assert_eq!(settings.color_depth, ColorDepth::C16);
        assert!(settings.validate().is_ok());

        let bad: Result<ImageSettings, _> = serde_json::from_str(r#"{ "color_depth": 128 }"#);
        assert!(bad.is_err());

        let zero = ImageSettings {
            resolution_percent: 0,
            ..ImageSettings::new()
        };
        assert!(zero.validate().is_err());
        assert!(ImageSettings::coarse().validate().is_ok());
    }
}
