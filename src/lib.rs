// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)] // Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![deny(missing_docs)] // Documentation is a must for release

//! # signal_digitizer
//!
//! The two steps of analog-to-digital conversion, **sampling** (discretizing
//! time) and **quantization** (discretizing amplitude), as small, pure,
//! deterministic functions. The same ideas are applied to a synthetic waveform,
//! to audio, and to images (spatial resolution and palette size).
//!
//! Nothing here draws, plays or fetches anything. A presentation layer calls the
//! functions below with the values of its controls and renders what comes back.
//!
//! ## Features
//!
//! - `audio`: the 16-bit audio path ([`audio`]), step-rounding quantization of a tone
//! - `image`: the spatial/color reducer ([`image`]), nearest-neighbor pixelation and median-cut palettes
//!
//! Both are enabled by default.
//!
//! ## Error Handling
//!
//! Invalid parameters fail fast with a [`DigitizerError`]:
//!
//! ```rust
//! use signal_digitizer::{DigitizerError, generate, sample};
//!
//! let signal = generate(2.0f64, 1.0);
//! match sample(&signal, 1.0, 0.0) {
//!     Err(DigitizerError::InvalidParameter { parameter, .. }) => assert_eq!(parameter, "sampling_rate"),
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use signal_digitizer::{LevelSet, NearestLevelQuantizer, generate, quantize_samples, sample};
//!
//! // 2 Hz sine, sampled at 10 Sa/s for one second
//! let signal = generate(2.0f64, 1.0);
//! let sampled = sample(&signal, 1.0, 10.0).unwrap();
//! assert_eq!(sampled.len(), 10);
//!
//! // 3-bit quantization over [-1, 1]
//! let levels = LevelSet::from_bit_depth(-1.0, 1.0, 3).unwrap();
//! let quantized = quantize_samples(&sampled, &NearestLevelQuantizer::new(levels.clone()));
//! assert!(quantized.values().iter().all(|v| levels.contains(*v)));
//! ```
//!
//! ## Logging
//!
//! Operations emit `tracing` events at `debug` (one per call) and `trace`
//! (inner steps) level. Install any `tracing` subscriber to see them.

mod error;

#[cfg(feature = "audio")]
pub mod audio;
#[cfg(feature = "image")]
pub mod image;
pub mod pipeline;
pub mod quantization;
pub mod sampling;
pub mod settings;
pub mod waveform;

use std::fmt::Debug;

pub use crate::error::{DigitizerError, DigitizerResult};
pub use crate::pipeline::{SignalDigitization, digitize_signal};
#[cfg(feature = "image")]
pub use crate::pipeline::{ImageDigitization, digitize_image};
pub use crate::quantization::{
    LevelSet, MAX_BIT_DEPTH, NearestLevelQuantizer, QuantizationPolicy, QuantizedSampleSet,
    Quantizer, StepQuantizer, quantize_samples,
};
pub use crate::sampling::{
    SampleSet, alias_frequency, is_aliased, nyquist_rate, sample, sample_count,
};
pub use crate::settings::SignalSettings;
#[cfg(feature = "image")]
pub use crate::settings::{ColorDepth, ImageSettings};
pub use crate::waveform::{ContinuousSignal, PeriodicSignal, Waveform, generate, render};

use num_traits::{Float, FloatConst, NumCast};

/// Marker trait for real floating-point types (f32, f64)
pub trait RealFloat: Float + FloatConst + NumCast + Debug + Default + Send + Sync + 'static {}

impl RealFloat for f32 {}
impl RealFloat for f64 {}

/// Casts a numeric value into the target floating-point type `F`.
///
/// Lets generic code write constants and counts once for both `f32` and `f64`
/// without explicit `as` conversions. For `usize`, integer and float inputs the
/// cast into `f32`/`f64` always succeeds (possibly with rounding).
///
/// # Examples
/// ```
/// use signal_digitizer::to_precision;
///
/// let value_f32: f32 = to_precision(42usize);
/// assert_eq!(value_f32, 42.0);
/// ```
///
/// # Panics
/// Panics if the numeric conversion fails.
#[inline(always)]
pub fn to_precision<F, T>(value: T) -> F
where
    F: RealFloat,
    T: NumCast,
{
    NumCast::from(value).expect("to_precision: valid numeric conversion")
}
