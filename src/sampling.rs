//! Temporal sampling: turning a continuous signal into a finite sequence of
//! `(time, value)` pairs.
//!
//! The sampler never filters its input. Sampling below the Nyquist rate
//! produces a sequence that is indistinguishable from a lower-frequency signal
//! (aliasing), and that is exactly what [`sample`] returns.

use ndarray::Array1;
use tracing::debug;

use crate::waveform::ContinuousSignal;
use crate::{DigitizerError, DigitizerResult, RealFloat, to_precision};

/// An ordered, immutable sequence of `(time, value)` pairs.
///
/// Times are in seconds and strictly increasing. Produced by [`sample`] (and by
/// [`crate::render`] for dense traces, which carry no sampling rate).
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet<F: RealFloat> {
    times: Array1<F>,
    values: Array1<F>,
    sampling_rate: Option<F>,
}

impl<F: RealFloat> SampleSet<F> {
    pub(crate) fn from_parts(
        times: Array1<F>,
        values: Array1<F>,
        sampling_rate: Option<F>,
    ) -> Self {
        debug_assert_eq!(times.len(), values.len());
        Self {
            times,
            values,
            sampling_rate,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns true if the set holds no samples.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Sample instants in seconds.
    pub const fn times(&self) -> &Array1<F> {
        &self.times
    }

    /// Signal values at [`Self::times`].
    pub const fn values(&self) -> &Array1<F> {
        &self.values
    }

    /// Rate (samples per second) the set was taken at, `None` for dense renders.
    pub const fn sampling_rate(&self) -> Option<F> {
        self.sampling_rate
    }

    /// Iterates over `(time, value)` pairs in time order.
    pub fn iter(&self) -> impl Iterator<Item = (F, F)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }
}

/// Number of samples taken over `duration` seconds at `sampling_rate` Sa/s.
///
/// This is `floor(duration · sampling_rate)`.
///
/// # Errors
/// Returns [`DigitizerError::InvalidParameter`] if the rate is not a finite
/// positive number, if the duration is negative or not finite, or if the count
/// does not fit in `usize`.
pub fn sample_count<F: RealFloat>(duration: F, sampling_rate: F) -> DigitizerResult<usize> {
    if !sampling_rate.is_finite() || sampling_rate <= F::zero() {
        return Err(DigitizerError::invalid_parameter(
            "sampling_rate",
            format!("must be finite and > 0, got {sampling_rate:?}"),
        ));
    }
    if !duration.is_finite() || duration < F::zero() {
        return Err(DigitizerError::invalid_parameter(
            "duration",
            format!("must be finite and >= 0, got {duration:?}"),
        ));
    }

    (duration * sampling_rate).floor().to_usize().ok_or_else(|| {
        DigitizerError::invalid_parameter(
            "duration",
            "duration * sampling_rate does not fit in usize",
        )
    })
}

/// Samples `signal` at `sampling_rate` Sa/s over `[0, duration)`.
///
/// Takes `floor(duration · sampling_rate)` samples at `t_i = i · duration / n`.
/// The right endpoint is excluded, so the last sample lies strictly before
/// `duration`. A product below one gives an empty set rather than an error.
///
/// # Errors
/// Same conditions as [`sample_count`].
///
/// # Examples
/// ```
/// use signal_digitizer::{generate, sample};
///
/// let sampled = sample(&generate(2.0f64, 1.0), 1.0, 10.0).unwrap();
/// assert_eq!(sampled.len(), 10);
/// assert!((sampled.times()[9] - 0.9).abs() < 1e-12);
/// ```
pub fn sample<F, S>(signal: &S, duration: F, sampling_rate: F) -> DigitizerResult<SampleSet<F>>
where
    F: RealFloat,
    S: ContinuousSignal<F> + ?Sized,
{
    let count = sample_count(duration, sampling_rate)?;

    let times = if count == 0 {
        Array1::from_vec(Vec::new())
    } else {
        let step = duration / to_precision::<F, _>(count);
        Array1::from_shape_fn(count, |i| to_precision::<F, _>(i) * step)
    };
    let values = times.mapv(|t| signal.evaluate(t));

    debug!(count, ?duration, ?sampling_rate, "sampled signal");
    Ok(SampleSet::from_parts(times, values, Some(sampling_rate)))
}

/// Minimum sampling rate that represents a sinusoid of `frequency` Hz without aliasing.
pub fn nyquist_rate<F: RealFloat>(frequency: F) -> F {
    to_precision::<F, _>(2.0) * frequency
}

/// Returns true if sampling a `frequency` Hz sinusoid at `sampling_rate` aliases.
pub fn is_aliased<F: RealFloat>(frequency: F, sampling_rate: F) -> bool {
    sampling_rate < nyquist_rate(frequency)
}

/// Apparent frequency of a `frequency` Hz sinusoid sampled at `sampling_rate`.
///
/// Folds the frequency into `[0, sampling_rate / 2]`. Equals `frequency` itself
/// when the rate is above the Nyquist rate.
pub fn alias_frequency<F: RealFloat>(frequency: F, sampling_rate: F) -> F {
    (frequency - sampling_rate * (frequency / sampling_rate).round()).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::generate;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_sample_count_is_floor_of_product() {
        for &(duration, rate) in &[
            (1.0f64, 10.0),
            (1.0, 1.0),
            (1.0, 40.0),
            (2.5, 3.0),
            (0.75, 7.0),
            (2.0, 44100.0),
            (0.1, 4.0),
        ] {
            let signal = generate(2.0, 1.0);
            let sampled = sample(&signal, duration, rate).unwrap();
            assert_eq!(sampled.len(), (duration * rate).floor() as usize);
        }
    }

    #[test]
    fn test_sample_2hz_at_10hz() {
        let signal = generate(2.0f64, 1.0);
        let sampled = sample(&signal, 1.0, 10.0).unwrap();

        assert_eq!(sampled.len(), 10);
        assert_eq!(sampled.times()[0], 0.0);
        for (i, (t, v)) in sampled.iter().enumerate() {
            if i > 0 {
                assert_approx_eq!(t, i as f64 * 0.1, 1e-12);
            }
            let expected = (2.0 * std::f64::consts::PI * 2.0 * t).sin();
            assert!((v - expected).abs() < 1e-12);
        }
        assert_eq!(sampled.sampling_rate(), Some(10.0));
    }

    #[test]
    fn test_endpoint_is_excluded() {
        let signal = generate(1.0f64, 1.0);
        let sampled = sample(&signal, 2.0, 5.0).unwrap();
        let last = sampled.times()[sampled.len() - 1];
        assert!(last < 2.0);
        assert_approx_eq!(last, 1.8, 1e-12);
    }

    #[test]
    fn test_empty_when_product_below_one() {
        let signal = generate(2.0f64, 1.0);
        let sampled = sample(&signal, 0.05, 10.0).unwrap();
        assert!(sampled.is_empty());
        assert_eq!(sampled.iter().count(), 0);
    }

    #[test]
    fn test_invalid_rate_and_duration() {
        let signal = generate(2.0f64, 1.0);
        assert!(matches!(
            sample(&signal, 1.0, 0.0),
            Err(DigitizerError::InvalidParameter { .. })
        ));
        assert!(sample(&signal, 1.0, -3.0).is_err());
        assert!(sample(&signal, 1.0, f64::INFINITY).is_err());
        assert!(sample(&signal, -1.0, 10.0).is_err());
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let signal = generate(3.0f32, 0.7);
        let a = sample(&signal, 1.5, 17.0).unwrap();
        let b = sample(&signal, 1.5, 17.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_undersampling_aliases_to_lower_frequency() {
        // 2 Hz at 3 Sa/s folds to 1 Hz, with inverted phase
        let original = generate(2.0f64, 1.0);
        let sampled = sample(&original, 2.0, 3.0).unwrap();
        assert_eq!(sampled.len(), 6);
        assert!(is_aliased(2.0, 3.0));

        let apparent = alias_frequency(2.0, 3.0);
        assert_approx_eq!(apparent, 1.0, 1e-12);

        let impostor = generate(apparent, -1.0);
        let impostor_sampled = sample(&impostor, 2.0, 3.0).unwrap();
        for (a, b) in sampled.values().iter().zip(impostor_sampled.values().iter()) {
            assert!((a - b).abs() < 1e-9);
        }
        // the continuous signals themselves differ between the sample instants
        assert!((original.evaluate(0.1) - impostor.evaluate(0.1)).abs() > 0.1);
    }

    #[test]
    fn test_nyquist_helpers() {
        assert_eq!(nyquist_rate(2.0f64), 4.0);
        assert!(!is_aliased(2.0f64, 4.0));
        assert!(!is_aliased(2.0f64, 10.0));
        assert_approx_eq!(alias_frequency(2.0f64, 10.0), 2.0, 1e-12);
        assert_approx_eq!(alias_frequency(9.0f64, 10.0), 1.0, 1e-12);
    }
}
