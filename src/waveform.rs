//! Continuous-time reference signals.
//!
//! A [`ContinuousSignal`] is a pure `time -> amplitude` function with an
//! infinite domain. It is what the [`crate::sampling`] module measures. The
//! [`render`] helper evaluates a signal densely (endpoints included) so that a
//! renderer can draw the "analog" trace underneath the samples.

use ndarray::Array1;
use tracing::debug;

use crate::sampling::SampleSet;
use crate::{DigitizerError, DigitizerResult, RealFloat, to_precision};

/// A stateless signal that can be evaluated at any time `t` (seconds).
pub trait ContinuousSignal<F: RealFloat> {
    /// Returns the amplitude of the signal at time `t`.
    fn evaluate(&self, t: F) -> F;
}

impl<F, S> ContinuousSignal<F> for S
where
    F: RealFloat,
    S: Fn(F) -> F,
{
    fn evaluate(&self, t: F) -> F {
        self(t)
    }
}

/// Shapes of periodic reference signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Waveform {
    /// `sin(2π·f·t)`
    #[default]
    Sine,
    /// `cos(2π·f·t)`
    Cosine,
    /// `+1` while the sine is non-negative, `-1` otherwise.
    Square,
    /// Rises from `-1` to `+1` over the first half period, falls back over the second.
    Triangle,
    /// Ramps from `-1` to `+1` once per period.
    Sawtooth,
}

/// A periodic signal with a fixed shape, frequency (Hz) and peak amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicSignal<F: RealFloat> {
    shape: Waveform,
    frequency: F,
    amplitude: F,
}

impl<F: RealFloat> PeriodicSignal<F> {
    /// Creates a periodic signal.
    pub const fn new(shape: Waveform, frequency: F, amplitude: F) -> Self {
        Self {
            shape,
            frequency,
            amplitude,
        }
    }

    /// Creates a sine wave, `amplitude · sin(2π·frequency·t)`.
    pub const fn sine(frequency: F, amplitude: F) -> Self {
        Self::new(Waveform::Sine, frequency, amplitude)
    }

    /// Shape of the signal.
    pub const fn shape(&self) -> Waveform {
        self.shape
    }

    /// Frequency in Hz.
    pub const fn frequency(&self) -> F {
        self.frequency
    }

    /// Peak amplitude.
    pub const fn amplitude(&self) -> F {
        self.amplitude
    }

    // Fractional position within the current period, in [0, 1).
    fn phase(&self, t: F) -> F {
        let cycles = self.frequency * t;
        cycles - cycles.floor()
    }
}

impl<F: RealFloat> ContinuousSignal<F> for PeriodicSignal<F> {
    fn evaluate(&self, t: F) -> F {
        let two_pi_freq = to_precision::<F, _>(2.0) * F::PI() * self.frequency;
        let unit = match self.shape {
            Waveform::Sine => (two_pi_freq * t).sin(),
            Waveform::Cosine => (two_pi_freq * t).cos(),
            Waveform::Square => {
                if (two_pi_freq * t).sin() >= F::zero() {
                    F::one()
                } else {
                    -F::one()
                }
            }
            Waveform::Triangle => {
                let phase = self.phase(t);
                if phase < to_precision::<F, _>(0.5) {
                    to_precision::<F, _>(4.0) * phase - F::one()
                } else {
                    to_precision::<F, _>(3.0) - to_precision::<F, _>(4.0) * phase
                }
            }
            Waveform::Sawtooth => to_precision::<F, _>(2.0) * self.phase(t) - F::one(),
        };
        self.amplitude * unit
    }
}

/// Creates the reference sine signal `amplitude · sin(2π·frequency·t)`.
///
/// Pure and infallible; the caller supplies finite, positive values.
///
/// # Examples
/// ```
/// use signal_digitizer::{ContinuousSignal, generate};
///
/// let signal = generate(2.0f64, 1.0);
/// assert!((signal.evaluate(0.125) - 1.0).abs() < 1e-12);
/// ```
pub const fn generate<F: RealFloat>(frequency: F, amplitude: F) -> PeriodicSignal<F> {
    PeriodicSignal::sine(frequency, amplitude)
}

/// Evaluates `signal` at `num_points` times evenly spaced over `[0, duration]`.
///
/// Unlike [`crate::sample`], both endpoints are included, which is what a plot
/// of the continuous trace needs. `num_points == 0` gives an empty set and
/// `num_points == 1` gives the single point `t = 0`.
///
/// # Errors
/// Returns [`DigitizerError::InvalidParameter`] if `duration` is negative or not finite.
pub fn render<F, S>(signal: &S, duration: F, num_points: usize) -> DigitizerResult<SampleSet<F>>
where
    F: RealFloat,
    S: ContinuousSignal<F> + ?Sized,
{
    if !duration.is_finite() || duration < F::zero() {
        return Err(DigitizerError::invalid_parameter(
            "duration",
            format!("must be finite and >= 0, got {duration:?}"),
        ));
    }

    let times: Array1<F> = match num_points {
        0 => Array1::from_vec(Vec::new()),
        1 => Array1::from_vec(vec![F::zero()]),
        n => {
            let step = duration / to_precision::<F, _>(n - 1);
            let mut times = Array1::from_shape_fn(n, |i| to_precision::<F, _>(i) * step);
            times[n - 1] = duration;
            times
        }
    };
    let values = times.mapv(|t| signal.evaluate(t));

    debug!(num_points, ?duration, "rendered continuous signal");
    Ok(SampleSet::from_parts(times, values, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_generate_is_sine() {
        let signal = generate(2.0f64, 1.5);
        for &t in &[0.0, 0.03, 0.1, 0.37, 0.9] {
            let expected = 1.5 * (2.0 * std::f64::consts::PI * 2.0 * t).sin();
            assert_approx_eq!(signal.evaluate(t), expected, 1e-12);
        }
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate(3.0f32, 1.0);
        let b = generate(3.0f32, 1.0);
        assert_eq!(a.evaluate(0.123), b.evaluate(0.123));
    }

    #[test]
    fn test_closure_is_a_signal() {
        let ramp = |t: f64| 2.0 * t;
        assert_eq!(ContinuousSignal::<f64>::evaluate(&ramp, 0.25), 0.5);
    }

    #[test]
    fn test_square_wave_levels() {
        let square = PeriodicSignal::new(Waveform::Square, 1.0f64, 0.5);
        assert_eq!(square.evaluate(0.1), 0.5);
        assert_eq!(square.evaluate(0.6), -0.5);
    }

    #[test]
    fn test_triangle_and_sawtooth_shapes() {
        let triangle = PeriodicSignal::new(Waveform::Triangle, 1.0f64, 1.0);
        assert_approx_eq!(triangle.evaluate(0.0), -1.0, 1e-12);
        assert_approx_eq!(triangle.evaluate(0.5), 1.0, 1e-12);
        assert!(triangle.evaluate(0.25).abs() < 1e-12);

        let saw = PeriodicSignal::new(Waveform::Sawtooth, 1.0f64, 1.0);
        assert_approx_eq!(saw.evaluate(0.0), -1.0, 1e-12);
        assert_approx_eq!(saw.evaluate(0.75), 0.5, 1e-12);
    }

    #[test]
    fn test_render_includes_both_endpoints() {
        let signal = generate(2.0f64, 1.0);
        let analog = render(&signal, 1.0, 1000).unwrap();

        assert_eq!(analog.len(), 1000);
        assert_eq!(analog.times()[0], 0.0);
        assert_eq!(analog.times()[999], 1.0);
        assert_approx_eq!(analog.times()[1], 1.0 / 999.0, 1e-12);
        assert_eq!(analog.sampling_rate(), None);
    }

    #[test]
    fn test_render_degenerate_point_counts() {
        let signal = generate(2.0f64, 1.0);
        assert!(render(&signal, 1.0, 0).unwrap().is_empty());

        let single = render(&signal, 1.0, 1).unwrap();
        assert_eq!(single.times().to_vec(), vec![0.0]);
    }

    #[test]
    fn test_render_rejects_negative_duration() {
        let signal = generate(2.0f64, 1.0);
        assert!(render(&signal, -1.0, 10).is_err());
        assert!(render(&signal, f64::NAN, 10).is_err());
    }
}
