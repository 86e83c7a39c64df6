//! Sine and cosine as a fixed 8th-order polynomial
//!
//! Around the reference angle `3π/2`, where sine reaches `-1` with zero slope,
//!
//! ```text
//! sin(x) ≈ -1 + u²/2 - u⁴/24 + u⁶/720 - u⁸/40320,    u = x - 3π/2
//! ```
//!
//! Cosine is the same polynomial evaluated at `x + π/2`. Both are one [`Phase`]-parameterised kernel,
//! so they share the expansion and the reference point.
//!
//! # Accuracy
//!
//! The truncation error is bounded by the first dropped term, `|u|¹⁰ / 10!` (see [`truncation_bound`]):
//!
//! | `|u|` | worst case |
//! |---|---|
//! | ≤ 1 | 2.8e-7 |
//! | ≤ π/2 | 2.5e-5 |
//! | ≤ π | 2.6e-2 |
//!
//! The calibrated range is `|u| ≤ π`, i.e. sine arguments in `[π/2, 5π/2]` and cosine arguments in
//! `[0, 2π]`. Beyond it the error grows like `|u|¹⁰` and nothing can detect that under encryption.
//! Encoding the constants adds quantization error on top, dominated by the `u⁸` weight. The bounds the
//! step circuit actually meets are tabulated in [`crate::ext::step`].

use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::Result;
use crate::evaluator::{Encoder, EvaluatorOps};

/// Angle the expansion is centred on.
pub const REFERENCE_ANGLE: f64 = 3.0 * FRAC_PI_2;

/// Distance from the reference angle within which the kernel is calibrated.
pub const CALIBRATED_RADIUS: f64 = PI;

/// Coefficients of the kernel polynomial.
pub mod coefficients {
	/// Weight of `u^(2j)` at index `j`.
	pub static KERNEL_WEIGHTS: [f64; 5] = [
		-1.0,
		1.0 / 2.0,
		-1.0 / 24.0,
		1.0 / 720.0,
		-1.0 / 40320.0,
	];
}

use self::coefficients::KERNEL_WEIGHTS;

/// Which function the kernel evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	/// `sin(x)`.
	Sine,
	/// `cos(x) = sin(x + π/2)`.
	Cosine,
}

impl Phase {
	/// Phase added to the argument before the shift to the reference angle.
	pub fn offset(self) -> f64 {
		match self {
			Phase::Sine => 0.0,
			Phase::Cosine => FRAC_PI_2,
		}
	}

	/// Plaintext constant added to the input: the phase, minus the reference angle.
	pub fn shift(self) -> f64 {
		self.offset() - REFERENCE_ANGLE
	}

	/// Arguments for which the kernel stays within the documented error.
	pub fn calibrated_range(self) -> (f64, f64) {
		let center = REFERENCE_ANGLE - self.offset();
		(center - CALIBRATED_RADIUS, center + CALIBRATED_RADIUS)
	}
}

/// Evaluates the kernel polynomial in the clear, in powers of `u²`.
pub fn kernel_plain(
	x: f64,
	phase: Phase,
) -> f64 {
	let u = x + phase.shift();
	let u2 = u * u;

	KERNEL_WEIGHTS
		.iter()
		.rev()
		.fold(0.0, |acc, &w| acc * u2 + w)
}

/// Upper bound of `|kernel(x) - f(x)|` from truncation alone.
pub fn truncation_bound(
	x: f64,
	phase: Phase,
) -> f64 {
	const FACTORIAL_10: f64 = 3_628_800.0;

	(x + phase.shift()).abs().powi(10) / FACTORIAL_10
}

/// The kernel constants, encoded once and shared by every evaluation.
#[derive(Debug, Clone)]
pub struct TrigKernel<P> {
	sine_shift: P,
	cosine_shift: P,
	constant: P,
	weights: [P; 4],
}

impl<P> TrigKernel<P> {
	/// Encodes the shifts and weights with `encoder`.
	pub fn encode<E>(encoder: &E) -> Result<Self>
	where
		E: Encoder<Plaintext = P>,
	{
		Ok(Self {
			sine_shift: encoder.encode_f64(Phase::Sine.shift())?,
			cosine_shift: encoder.encode_f64(Phase::Cosine.shift())?,
			constant: encoder.encode_f64(KERNEL_WEIGHTS[0])?,
			weights: [
				encoder.encode_f64(KERNEL_WEIGHTS[1])?,
				encoder.encode_f64(KERNEL_WEIGHTS[2])?,
				encoder.encode_f64(KERNEL_WEIGHTS[3])?,
				encoder.encode_f64(KERNEL_WEIGHTS[4])?,
			],
		})
	}

	fn shift(
		&self,
		phase: Phase,
	) -> &P {
		match phase {
			Phase::Sine => &self.sine_shift,
			Phase::Cosine => &self.cosine_shift,
		}
	}
}

/// [`EvaluatorOps`] extension that evaluates sine and cosine of a ciphertext.
pub trait TrigEvaluator: EvaluatorOps {
	/// Evaluates the kernel for `phase` on `x`.
	///
	/// # Arguments
	/// * `x` - The angle. Must lie in `phase.calibrated_range()` for the documented accuracy.
	/// * `phase` - Selects sine or cosine.
	/// * `kernel` - The encoded kernel constants.
	fn trig_kernel(
		&self,
		x: &Self::Ciphertext,
		phase: Phase,
		kernel: &TrigKernel<Self::Plaintext>,
	) -> Result<Self::Ciphertext>;

	/// Approximates `sin(x)`.
	fn sin_approx(
		&self,
		x: &Self::Ciphertext,
		kernel: &TrigKernel<Self::Plaintext>,
	) -> Result<Self::Ciphertext> {
		self.trig_kernel(x, Phase::Sine, kernel)
	}

	/// Approximates `cos(x)` as `sin(x + π/2)`.
	fn cos_approx(
		&self,
		x: &Self::Ciphertext,
		kernel: &TrigKernel<Self::Plaintext>,
	) -> Result<Self::Ciphertext> {
		self.trig_kernel(x, Phase::Cosine, kernel)
	}
}

impl<E> TrigEvaluator for E
where
	E: EvaluatorOps + ?Sized,
{
	fn trig_kernel(
		&self,
		x: &Self::Ciphertext,
		phase: Phase,
		kernel: &TrigKernel<Self::Plaintext>,
	) -> Result<Self::Ciphertext> {
		let u = self.add_plain(x, kernel.shift(phase))?;

		// Depths relative to x: u² 1, u⁴ 2, u⁶ 4, u⁸ 3.
		let u2 = self.square(&u)?;
		let u4 = self.square(&u2)?;
		let mut u6 = self.multiply(&u4, &u)?;
		self.multiply_inplace(&mut u6, &u)?;
		let u8 = self.square(&u4)?;

		let [w2, w4, w6, w8] = &kernel.weights;

		let mut sum = self.multiply_plain(&u2, w2)?;
		self.add_inplace(&mut sum, &self.multiply_plain(&u4, w4)?)?;
		self.add_inplace(&mut sum, &self.multiply_plain(&u6, w6)?)?;
		self.add_inplace(&mut sum, &self.multiply_plain(&u8, w8)?)?;
		self.add_plain_inplace(&mut sum, &kernel.constant)?;

		Ok(sum)
	}
}
