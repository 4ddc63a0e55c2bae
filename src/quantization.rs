//! Amplitude quantization.
//!
//! Two policies are provided and deliberately kept apart:
//!
//! - [`QuantizationPolicy::NearestLevelLookup`] ([`NearestLevelQuantizer`]):
//!   snaps a value to the closest member of an explicit [`LevelSet`]. Every
//!   output is an exact level. Equidistant values go to the lower level.
//! - [`QuantizationPolicy::StepRounding`] ([`StepQuantizer`]): computes
//!   `round(value / step) · step` with `step = (max - min) / level_count`. The
//!   result is not clamped and can land slightly outside `[min, max]`.
//!
//! The two agree on most inputs but not on ties or near the range ends, so
//! swapping one for the other changes output.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sampling::SampleSet;
use crate::{DigitizerError, DigitizerResult, RealFloat, to_precision};

/// Largest bit depth accepted by [`LevelSet::from_bit_depth`] and [`StepQuantizer::from_bit_depth`].
pub const MAX_BIT_DEPTH: u32 = 16;

/// Selects how sample values are mapped onto quantization levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantizationPolicy {
    /// Exact lookup of the nearest level; ties resolve to the lower level.
    #[default]
    NearestLevelLookup,
    /// `round(value / step) · step` using Rust's `round` (ties away from zero), unclamped.
    StepRounding,
}

impl QuantizationPolicy {
    /// Builds a quantizer of this policy for `level_count` levels over `[min, max]`.
    ///
    /// # Errors
    /// Propagates the validation errors of [`LevelSet::new`] or [`StepQuantizer::new`].
    pub fn quantizer<F: RealFloat>(
        self,
        min: F,
        max: F,
        level_count: usize,
    ) -> DigitizerResult<Box<dyn Quantizer<F>>> {
        Ok(match self {
            QuantizationPolicy::NearestLevelLookup => Box::new(NearestLevelQuantizer::new(
                LevelSet::new(min, max, level_count)?,
            )),
            QuantizationPolicy::StepRounding => {
                Box::new(StepQuantizer::new(min, max, level_count)?)
            }
        })
    }
}

/// Maps a single amplitude onto a discrete value.
pub trait Quantizer<F: RealFloat> {
    /// The policy implemented by this quantizer.
    fn policy(&self) -> QuantizationPolicy;

    /// Quantizes one value.
    fn quantize(&self, value: F) -> F;
}

fn bit_depth_to_levels(bit_depth: u32) -> DigitizerResult<usize> {
    if !(1..=MAX_BIT_DEPTH).contains(&bit_depth) {
        return Err(DigitizerError::invalid_parameter(
            "bit_depth",
            format!("must be in [1, {MAX_BIT_DEPTH}], got {bit_depth}"),
        ));
    }
    Ok(1usize << bit_depth)
}

/// Evenly spaced quantization levels from `min` to `max` inclusive.
///
/// Levels are strictly increasing. With two or more levels the first is exactly
/// `min` and the last exactly `max`.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSet<F: RealFloat> {
    levels: Array1<F>,
}

impl<F: RealFloat> LevelSet<F> {
    /// Builds `level_count` evenly spaced levels over `[min, max]`.
    ///
    /// A single level sits at `min`.
    ///
    /// # Errors
    /// - [`DigitizerError::InvalidParameter`] if `level_count` is zero.
    /// - [`DigitizerError::InvalidRange`] if a bound is not finite, if `min > max`,
    ///   if `min == max` while more than one level is requested, or if the range
    ///   is too narrow for `F` to hold `level_count` distinct levels.
    ///
    /// # Examples
    /// ```
    /// use signal_digitizer::LevelSet;
    ///
    /// let levels = LevelSet::new(-1.0f64, 1.0, 8).unwrap();
    /// assert_eq!(levels.len(), 8);
    /// assert!((levels.step() - 2.0 / 7.0).abs() < 1e-12);
    /// ```
    pub fn new(min: F, max: F, level_count: usize) -> DigitizerResult<Self> {
        if level_count == 0 {
            return Err(DigitizerError::invalid_parameter(
                "level_count",
                "must be >= 1",
            ));
        }
        if !min.is_finite() || !max.is_finite() {
            return Err(DigitizerError::InvalidRange(format!(
                "Quantization bounds must be finite: min ({min:?}), max ({max:?})"
            )));
        }
        if min > max || (min == max && level_count > 1) {
            return Err(DigitizerError::InvalidRange(format!(
                "Invalid quantization range for {level_count} levels: min ({min:?}) >= max ({max:?})"
            )));
        }

        let levels = if level_count == 1 {
            Array1::from_vec(vec![min])
        } else {
            let step = (max - min) / to_precision::<F, _>(level_count - 1);
            let mut levels =
                Array1::from_shape_fn(level_count, |i| to_precision::<F, _>(i) * step + min);
            levels[level_count - 1] = max;
            levels
        };

        if let Some(i) = levels.windows(2).into_iter().position(|w| w[0] >= w[1]) {
            return Err(DigitizerError::InvalidRange(format!(
                "Range [{min:?}, {max:?}] is too narrow for {level_count} distinct levels: \
                 levels {i} and {} coincide",
                i + 1
            )));
        }

        Ok(Self { levels })
    }

    /// Builds `2^bit_depth` levels over `[min, max]`.
    ///
    /// # Errors
    /// [`DigitizerError::InvalidParameter`] if `bit_depth` is outside `[1, 16]`,
    /// otherwise as [`LevelSet::new`].
    pub fn from_bit_depth(min: F, max: F, bit_depth: u32) -> DigitizerResult<Self> {
        Self::new(min, max, bit_depth_to_levels(bit_depth)?)
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false: a level set holds at least one level.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The levels in increasing order.
    pub const fn levels(&self) -> &Array1<F> {
        &self.levels
    }

    /// Lowest level.
    pub fn min(&self) -> F {
        self.levels[0]
    }

    /// Highest level.
    pub fn max(&self) -> F {
        self.levels[self.levels.len() - 1]
    }

    /// Spacing between adjacent levels, zero for a single level.
    pub fn step(&self) -> F {
        if self.levels.len() < 2 {
            F::zero()
        } else {
            (self.max() - self.min()) / to_precision::<F, _>(self.levels.len() - 1)
        }
    }

    /// Index of the level closest to `value`.
    ///
    /// Equidistant values resolve to the lower index. NaN maps to index 0.
    pub fn nearest_index(&self, value: F) -> usize {
        let n = self.levels.len();

        // first level that is >= value
        let (mut lo, mut hi) = (0, n);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.levels[mid] < value {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        if lo == 0 {
            return 0;
        }
        if lo == n {
            return n - 1;
        }
        let below = lo - 1;
        if (value - self.levels[below]).abs() <= (self.levels[lo] - value).abs() {
            below
        } else {
            lo
        }
    }

    /// Returns the level closest to `value` (ties go to the lower level).
    pub fn quantize(&self, value: F) -> F {
        self.levels[self.nearest_index(value)]
    }

    /// Returns true if `value` is exactly one of the levels.
    pub fn contains(&self, value: F) -> bool {
        self.quantize(value) == value
    }
}

/// [`QuantizationPolicy::NearestLevelLookup`] over an explicit [`LevelSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct NearestLevelQuantizer<F: RealFloat> {
    levels: LevelSet<F>,
}

impl<F: RealFloat> NearestLevelQuantizer<F> {
    /// Creates a quantizer snapping onto `levels`.
    pub const fn new(levels: LevelSet<F>) -> Self {
        Self { levels }
    }

    /// The level set values are snapped onto.
    pub const fn levels(&self) -> &LevelSet<F> {
        &self.levels
    }
}

impl<F: RealFloat> Quantizer<F> for NearestLevelQuantizer<F> {
    fn policy(&self) -> QuantizationPolicy {
        QuantizationPolicy::NearestLevelLookup
    }

    fn quantize(&self, value: F) -> F {
        self.levels.quantize(value)
    }
}

/// [`QuantizationPolicy::StepRounding`]: `round(value / step) · step`.
///
/// `step = (max - min) / level_count`. Rounding uses [`num_traits::Float::round`],
/// which for `f32`/`f64` rounds half-way cases **away from zero**
/// (`round(0.5) == 1`, `round(-2.5) == -3`). Outputs are not clamped to
/// `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepQuantizer<F: RealFloat> {
    min: F,
    max: F,
    level_count: usize,
    step: F,
}

impl<F: RealFloat> StepQuantizer<F> {
    /// Creates a step quantizer for `level_count` steps over `[min, max]`.
    ///
    /// # Errors
    /// - [`DigitizerError::InvalidParameter`] if `level_count` is zero.
    /// - [`DigitizerError::InvalidRange`] if a bound is not finite or `min >= max`.
    pub fn new(min: F, max: F, level_count: usize) -> DigitizerResult<Self> {
        if level_count == 0 {
            return Err(DigitizerError::invalid_parameter(
                "level_count",
                "must be >= 1",
            ));
        }
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(DigitizerError::InvalidRange(format!(
                "Invalid quantization range: min ({min:?}) >= max ({max:?})"
            )));
        }

        Ok(Self {
            min,
            max,
            level_count,
            step: (max - min) / to_precision::<F, _>(level_count),
        })
    }

    /// Creates a step quantizer with `2^bit_depth` steps over `[min, max]`.
    ///
    /// # Errors
    /// [`DigitizerError::InvalidParameter`] if `bit_depth` is outside `[1, 16]`,
    /// otherwise as [`StepQuantizer::new`].
    pub fn from_bit_depth(min: F, max: F, bit_depth: u32) -> DigitizerResult<Self> {
        Self::new(min, max, bit_depth_to_levels(bit_depth)?)
    }

    /// Width of one quantization step.
    pub const fn step(&self) -> F {
        self.step
    }

    /// Number of steps the range was divided into.
    pub const fn level_count(&self) -> usize {
        self.level_count
    }

    /// Lower bound the step was derived from.
    pub const fn min(&self) -> F {
        self.min
    }

    /// Upper bound the step was derived from.
    pub const fn max(&self) -> F {
        self.max
    }
}

impl<F: RealFloat> Quantizer<F> for StepQuantizer<F> {
    fn policy(&self) -> QuantizationPolicy {
        QuantizationPolicy::StepRounding
    }

    fn quantize(&self, value: F) -> F {
        (value / self.step).round() * self.step
    }
}

/// A [`SampleSet`] whose values have been quantized.
///
/// Keeps the original values next to the quantized ones so the quantization
/// error can be shown and measured.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedSampleSet<F: RealFloat> {
    times: Array1<F>,
    original: Array1<F>,
    values: Array1<F>,
    sampling_rate: Option<F>,
    policy: QuantizationPolicy,
}

impl<F: RealFloat> QuantizedSampleSet<F> {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns true if the set holds no samples.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Sample instants, identical to those of the source [`SampleSet`].
    pub const fn times(&self) -> &Array1<F> {
        &self.times
    }

    /// Quantized values.
    pub const fn values(&self) -> &Array1<F> {
        &self.values
    }

    /// Values before quantization.
    pub const fn original(&self) -> &Array1<F> {
        &self.original
    }

    /// Sampling rate of the source set.
    pub const fn sampling_rate(&self) -> Option<F> {
        self.sampling_rate
    }

    /// Policy that produced [`Self::values`].
    pub const fn policy(&self) -> QuantizationPolicy {
        self.policy
    }

    /// Iterates over `(time, quantized value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (F, F)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// Quantization error per sample, `original - quantized`.
    pub fn errors(&self) -> Array1<F> {
        &self.original - &self.values
    }

    /// Largest absolute quantization error, zero for an empty set.
    pub fn max_abs_error(&self) -> F {
        self.errors()
            .iter()
            .fold(F::zero(), |acc, e| acc.max(e.abs()))
    }

    /// Mean squared quantization error, zero for an empty set.
    pub fn mean_squared_error(&self) -> F {
        if self.is_empty() {
            return F::zero();
        }
        let sum = self.errors().iter().fold(F::zero(), |acc, &e| acc + e * e);
        sum / to_precision::<F, _>(self.len())
    }
}

/// Quantizes every value of `samples` with `quantizer`, keeping the time points.
pub fn quantize_samples<F, Q>(samples: &SampleSet<F>, quantizer: &Q) -> QuantizedSampleSet<F>
where
    F: RealFloat,
    Q: Quantizer<F> + ?Sized,
{
    let values = samples.values().mapv(|v| quantizer.quantize(v));
    debug!(
        len = samples.len(),
        policy = ?quantizer.policy(),
        "quantized samples"
    );

    QuantizedSampleSet {
        times: samples.times().clone(),
        original: samples.values().clone(),
        values,
        sampling_rate: samples.sampling_rate(),
        policy: quantizer.policy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::sample;
    use crate::waveform::generate;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_levels_minus_one_to_one_eight() {
        let levels = LevelSet::new(-1.0f64, 1.0, 8).unwrap();
        assert_eq!(levels.len(), 8);
        assert_eq!(levels.min(), -1.0);
        assert_eq!(levels.max(), 1.0);

        let spacing = 2.0 / 7.0;
        for (i, level) in levels.levels().iter().enumerate() {
            assert_approx_eq!(*level, -1.0 + i as f64 * spacing, 1e-12);
        }
        assert_approx_eq!(levels.step(), spacing, 1e-12);
    }

    #[test]
    fn test_levels_strictly_increasing_with_exact_endpoints() {
        for &(min, max) in &[(-1.0f64, 1.0), (0.0, 255.0), (-16383.5, 16383.5), (0.1, 0.3)] {
            for n in [2usize, 3, 7, 8, 256, 65536] {
                let levels = LevelSet::new(min, max, n).unwrap();
                assert_eq!(levels.len(), n);
                assert_eq!(levels.levels()[0], min);
                assert_eq!(levels.levels()[n - 1], max);
                assert!(
                    levels
                        .levels()
                        .windows(2)
                        .into_iter()
                        .all(|w| w[0] < w[1])
                );
            }
        }
    }

    #[test]
    fn test_range_too_narrow_for_level_count_is_rejected() {
        // ulp at 1e15 is 0.125, so 65536 levels over a width of 1 collide
        assert!(matches!(
            LevelSet::new(1.0e15f64, 1.0e15 + 1.0, 65536),
            Err(DigitizerError::InvalidRange(_))
        ));
        assert!(matches!(
            LevelSet::new(1.0f32, 1.0 + 1.0e-6, 256),
            Err(DigitizerError::InvalidRange(_))
        ));

        let coarse = LevelSet::new(1.0e15f64, 1.0e15 + 1.0, 8).unwrap();
        assert!(coarse.levels().windows(2).into_iter().all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_from_bit_depth_counts_powers_of_two() {
        for bits in 1..=MAX_BIT_DEPTH {
            let levels = LevelSet::from_bit_depth(-1.0f32, 1.0, bits).unwrap();
            assert_eq!(levels.len(), 1usize << bits);
        }
        assert!(LevelSet::from_bit_depth(-1.0f32, 1.0, 0).is_err());
        assert!(LevelSet::from_bit_depth(-1.0f32, 1.0, 17).is_err());
    }

    #[test]
    fn test_single_level_and_invalid_sets() {
        let single = LevelSet::new(0.5f64, 0.5, 1).unwrap();
        assert_eq!(single.levels().to_vec(), vec![0.5]);
        assert_eq!(single.quantize(100.0), 0.5);
        assert_eq!(single.step(), 0.0);

        assert!(matches!(
            LevelSet::new(-1.0f64, 1.0, 0),
            Err(DigitizerError::InvalidParameter { .. })
        ));
        assert!(matches!(
            LevelSet::new(1.0f64, -1.0, 4),
            Err(DigitizerError::InvalidRange(_))
        ));
        assert!(LevelSet::new(1.0f64, 1.0, 2).is_err());
        assert!(LevelSet::new(f64::NEG_INFINITY, 1.0, 2).is_err());
    }

    #[test]
    fn test_quantize_picks_nearest_level() {
        let levels = LevelSet::new(-1.0f64, 1.0, 2).unwrap();
        assert_eq!(levels.quantize(0.05), 1.0);
        assert_eq!(levels.quantize(-0.05), -1.0);
        assert_eq!(levels.quantize(7.0), 1.0);
        assert_eq!(levels.quantize(-7.0), -1.0);
    }

    #[test]
    fn test_ties_go_to_lower_level() {
        let two = LevelSet::new(-1.0f64, 1.0, 2).unwrap();
        assert_eq!(two.quantize(0.0), -1.0);

        let five = LevelSet::new(0.0f64, 4.0, 5).unwrap();
        assert_eq!(five.quantize(2.5), 2.0);
        assert_eq!(five.quantize(0.5), 0.0);
        assert_eq!(five.nearest_index(3.5), 3);
    }

    #[test]
    fn test_nan_maps_to_first_level() {
        let levels = LevelSet::new(-1.0f64, 1.0, 4).unwrap();
        assert_eq!(levels.nearest_index(f64::NAN), 0);
    }

    #[test]
    fn test_quantization_is_idempotent() {
        let levels = LevelSet::from_bit_depth(-1.0f64, 1.0, 5).unwrap();
        for &level in levels.levels() {
            assert_eq!(levels.quantize(level), level);
            assert_eq!(
                levels.quantize(levels.quantize(level * 0.77)),
                levels.quantize(level * 0.77)
            );
        }
    }

    #[test]
    fn test_quantized_samples_are_level_members() {
        let signal = generate(2.0f64, 1.0);
        for bits in 1..=8 {
            let levels = LevelSet::from_bit_depth(-1.0, 1.0, bits).unwrap();
            let quantizer = NearestLevelQuantizer::new(levels.clone());
            for rate in [1.0, 3.0, 10.0, 40.0] {
                let sampled = sample(&signal, 1.0, rate).unwrap();
                let quantized = quantize_samples(&sampled, &quantizer);

                assert_eq!(quantized.len(), sampled.len());
                assert_eq!(quantized.times(), sampled.times());
                assert!(quantized.values().iter().all(|v| levels.levels().iter().any(|l| l == v)));
                assert!(quantized.max_abs_error() <= levels.step() / 2.0 + 1e-12);
            }
        }
    }

    #[test]
    fn test_step_rounding_rounds_half_away_from_zero() {
        let quantizer = StepQuantizer::new(-1.0f64, 1.0, 4).unwrap();
        assert_eq!(quantizer.step(), 0.5);
        assert_eq!(quantizer.quantize(0.25), 0.5);
        assert_eq!(quantizer.quantize(-0.25), -0.5);
        assert_eq!(quantizer.quantize(0.9), 1.0);
        assert_eq!(quantizer.quantize(0.1), 0.0);
        assert_eq!(quantizer.policy(), QuantizationPolicy::StepRounding);
    }

    #[test]
    fn test_step_rounding_is_not_clamped() {
        // step 0.6: 0.95 / 0.6 rounds to 2, one step past the top of the range
        let quantizer = StepQuantizer::new(-0.2f64, 1.0, 2).unwrap();
        let q = quantizer.quantize(0.95);
        assert!(q > 1.0);
        assert_approx_eq!(q, 1.2, 1e-12);
    }

    #[test]
    fn test_policies_diverge_on_ties() {
        let nearest = QuantizationPolicy::NearestLevelLookup
            .quantizer(-1.0f64, 1.0, 2)
            .unwrap();
        let step = QuantizationPolicy::StepRounding
            .quantizer(-1.0f64, 1.0, 2)
            .unwrap();

        // nearest: tie between -1 and 1 goes low, step (= 1.0): 0.5 rounds up
        assert_eq!(nearest.quantize(0.0), -1.0);
        assert_eq!(step.quantize(0.0), 0.0);
        assert_eq!(step.quantize(0.5), 1.0);
        assert_eq!(nearest.quantize(0.5), 1.0);
    }

    #[test]
    fn test_step_quantizer_rejects_bad_parameters() {
        assert!(matches!(
            StepQuantizer::new(-1.0f64, 1.0, 0),
            Err(DigitizerError::InvalidParameter { .. })
        ));
        assert!(StepQuantizer::new(1.0f64, 1.0, 4).is_err());
        assert!(StepQuantizer::<f64>::from_bit_depth(-1.0, 1.0, 32).is_err());
    }

    #[test]
    fn test_error_metrics() {
        let signal = |t: f64| t;
        let sampled = sample(&signal, 1.0, 4.0).unwrap(); // 0, .25, .5, .75
        let quantizer = NearestLevelQuantizer::new(LevelSet::new(0.0, 1.0, 2).unwrap());
        let quantized = quantize_samples(&sampled, &quantizer);

        // .5 ties to 0
        assert_eq!(quantized.values().to_vec(), vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(quantized.errors().to_vec(), vec![0.0, 0.25, 0.5, -0.25]);
        assert_eq!(quantized.max_abs_error(), 0.5);
        assert_approx_eq!(quantized.mean_squared_error(), (0.0625 + 0.25 + 0.0625) / 4.0, 1e-12);
        assert_eq!(quantized.policy(), QuantizationPolicy::NearestLevelLookup);
    }

    #[test]
    fn test_empty_set_metrics_are_zero() {
        let sampled = sample(&generate(2.0f64, 1.0), 0.0, 10.0).unwrap();
        let quantizer = StepQuantizer::new(-1.0, 1.0, 8).unwrap();
        let quantized = quantize_samples(&sampled, &quantizer);
        assert!(quantized.is_empty());
        assert_eq!(quantized.max_abs_error(), 0.0);
        assert_eq!(quantized.mean_squared_error(), 0.0);
    }
}
