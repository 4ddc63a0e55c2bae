//! One call per parameter change.
//!
//! A control surface re-runs these whenever a control moves and hands the
//! result to its renderer. They hold no state between calls.

use tracing::debug;

use crate::DigitizerResult;
use crate::quantization::{LevelSet, NearestLevelQuantizer, QuantizedSampleSet, quantize_samples};
use crate::sampling::{SampleSet, alias_frequency, sample};
use crate::settings::SignalSettings;
use crate::waveform::{PeriodicSignal, generate, render};

#[cfg(feature = "image")]
use crate::image::{ImageGrid, reduce_colors, reduce_resolution, reduced_dimensions};
#[cfg(feature = "image")]
use crate::settings::ImageSettings;

/// Everything needed to draw the reference-signal view.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDigitization {
    /// The reference signal.
    pub signal: PeriodicSignal<f64>,
    /// Dense trace of the continuous signal, endpoints included.
    pub analog: SampleSet<f64>,
    /// Samples taken at the selected rate.
    pub sampled: SampleSet<f64>,
    /// Quantization levels over `[-amplitude, amplitude]`.
    pub levels: LevelSet<f64>,
    /// Sampled values snapped onto `levels`.
    pub quantized: QuantizedSampleSet<f64>,
    /// Frequency the samples appear to have; below the signal frequency when aliased.
    pub apparent_frequency: f64,
}

/// Digitizes the reference sine described by `settings`.
///
/// # Errors
/// [`crate::DigitizerError::InvalidParameter`] if a setting is outside the range of its control.
///
/// # Examples
/// ```
/// use signal_digitizer::{SignalSettings, digitize_signal};
///
/// let view = digitize_signal(&SignalSettings::aliased()).unwrap();
/// assert_eq!(view.sampled.len(), 3);
/// assert!((view.apparent_frequency - 1.0).abs() < 1e-12);
/// ```
pub fn digitize_signal(settings: &SignalSettings) -> DigitizerResult<SignalDigitization> {
    settings.validate()?;

    let signal = generate(settings.frequency, settings.amplitude);
    let analog = render(&signal, settings.duration, settings.analog_points)?;
    let sampled = sample(&signal, settings.duration, f64::from(settings.sampling_rate))?;
    let levels =
        LevelSet::from_bit_depth(-settings.amplitude, settings.amplitude, settings.bit_depth)?;
    let quantized = quantize_samples(&sampled, &NearestLevelQuantizer::new(levels.clone()));
    let apparent_frequency = alias_frequency(settings.frequency, f64::from(settings.sampling_rate));

    debug!(
        sampling_rate = settings.sampling_rate,
        bit_depth = settings.bit_depth,
        samples = sampled.len(),
        "digitized reference signal"
    );

    Ok(SignalDigitization {
        signal,
        analog,
        sampled,
        levels,
        quantized,
        apparent_frequency,
    })
}

/// Everything needed to draw the image view.
#[cfg(feature = "image")]
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDigitization {
    /// Size the image was sampled down to, `(width, height)`.
    pub reduced_dimensions: (usize, usize),
    /// The image at reduced resolution, shown at the original size.
    pub pixelated: ImageGrid,
    /// The image with its palette reduced, full color.
    pub color_reduced: ImageGrid,
}

/// Applies the image settings to `image`: pixelation and palette reduction, each
/// on the original.
///
/// # Errors
/// [`crate::DigitizerError::InvalidParameter`] if the resolution is outside `[1, 100]`.
#[cfg(feature = "image")]
pub fn digitize_image(
    image: &ImageGrid,
    settings: &ImageSettings,
) -> DigitizerResult<ImageDigitization> {
    settings.validate()?;

    let (width, height) = image.dimensions();
    let reduced_dimensions = reduced_dimensions(width, height, settings.resolution_percent)?;
    let pixelated = reduce_resolution(image, settings.resolution_percent)?;
    let color_reduced = reduce_colors(image, usize::from(settings.color_depth.colors()))?;

    Ok(ImageDigitization {
        reduced_dimensions,
        pixelated,
        color_reduced,
    })
}
