//! Step Approximator
//!
//! Assembles a truncated Fourier sum from two encrypted thresholds and evaluates it for a bank of
//! consecutive integer offsets:
//!
//! ```text
//! offset = (b1 + b2)·(-½)        b = (b2 - b1)·½
//! slot[i] = amplitude · ( b/64 + Σ_k coeff[k] · sin((offset + i)·sincoeff[k]) · cos(b·coscoeff[k]) )
//! ```
//!
//! This is the slot layout of the decoding circuit the crate reproduces. It places the position in
//! the sine and the half-width in the cosine. The textbook pulse series swaps the two,
//! `sin(k·b·π/64)·cos(k·(x - m)·π/64)`, and is available in the clear as
//! [`StepSeries`](crate::fourier::StepSeries). The bank is therefore not an approximation of the
//! indicator of `[b1, b2]`.
//!
//! Every slot uses its own phase `offset + i`; nothing carries over from one slot to the next, so
//! `slot[i]` for `(b1, b2)` equals `slot[0]` for `(b1 - i, b2 - i)`.
//!
//! The base term `b/64` and the cosine factors do not depend on the slot and are evaluated once. The
//! critical path of each slot is [`SLOT_DEPTH`](crate::depth::SLOT_DEPTH) levels regardless of the
//! degree.
//!
//! # Kernel error over the input domain
//!
//! With thresholds in `[0, 64)` and 16 slots, the sine arguments of harmonic `k` lie in
//! `(-kπ, 15kπ/64]` and the cosine arguments in `[0, kπ/2)`. Measured from the kernel's reference
//! angle, the sine inputs never reach the calibrated range of [`crate::ext::trig`]. The worst-case
//! truncation bounds, as computed by [`kernel_error_bound`], are:
//!
//! | `k` | sine `u` range | sine bound | cosine bound |
//! |---|---|---|---|
//! | 1 | `[-7.85, -3.98]` | 2.5e2 | 2.6e-2 |
//! | 2 | `[-11.0, -3.24]` | 7.1e3 | 2.6e-2 |
//! | 4 | `[-17.3, -1.77]` | 6.5e5 | 2.6e-2 |
//! | 5 | `[-20.4, -1.03]` | 3.5e6 | 1.5 |
//! | 8 | `[-29.8, 1.18]` | 1.5e8 | 1.5e3 |
//! | 16 | `[-55.0, 7.07]` | 7.0e10 | 7.3e6 |
//!
//! The bound grows with `k`. [`StepApproximator::plain_bank`] reproduces the circuit in the clear,
//! including the kernel, so the effect on a given threshold pair can be inspected without a scheme.

use std::ops::Index;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ApproxConfig, DOMAIN_WIDTH};
use crate::depth::{DepthPlan, NoiseCapacity};
use crate::error::Result;
use crate::evaluator::{Encoder, EvaluatorOps};
use crate::ext::trig::{kernel_plain, truncation_bound, Phase, TrigEvaluator, TrigKernel};
use crate::fourier::{FourierCoefficients, Harmonic};

/// Bound placed on evaluators, ciphertexts and plaintexts that cross threads when the `parallel`
/// feature evaluates slots concurrently. Without the feature every type satisfies it.
#[cfg(feature = "parallel")]
pub trait ThreadSafe: Send + Sync {}

#[cfg(feature = "parallel")]
impl<T: Send + Sync + ?Sized> ThreadSafe for T {}

/// Bound placed on evaluators, ciphertexts and plaintexts that cross threads when the `parallel`
/// feature evaluates slots concurrently. Without the feature every type satisfies it.
#[cfg(not(feature = "parallel"))]
pub trait ThreadSafe {}

#[cfg(not(feature = "parallel"))]
impl<T: ?Sized> ThreadSafe for T {}

#[cfg(feature = "parallel")]
fn map_slots<T, F>(
	slots: usize,
	f: F,
) -> Result<Vec<T>>
where
	T: Send,
	F: Fn(usize) -> Result<T> + Send + Sync,
{
	use rayon::prelude::*;

	(0..slots).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_slots<T, F>(
	slots: usize,
	f: F,
) -> Result<Vec<T>>
where
	F: Fn(usize) -> Result<T>,
{
	(0..slots).map(f).collect()
}

/// Worst-case truncation error of the two kernel evaluations of one harmonic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelErrorBound {
	/// Harmonic index.
	pub k: u32,
	/// Bound of the sine kernel over every slot phase.
	pub sine: f64,
	/// Bound of the cosine kernel over every half-width.
	pub cosine: f64,
}

/// Bounds the kernel error of harmonic `h` over every threshold pair in `[0, 64)` and every slot
/// below `slots`.
///
/// Slot phases range over `[-64, slots - 1]` and half-widths over `[0, 32]`. The truncation bound
/// grows with the distance to the reference angle, so the extremes of each interval decide it.
pub fn kernel_error_bound(
	h: &Harmonic,
	slots: usize,
) -> KernelErrorBound {
	let last_slot = slots.saturating_sub(1) as f64;

	let sine = [-DOMAIN_WIDTH, last_slot]
		.iter()
		.map(|&phase| truncation_bound(phase * h.sin_frequency, Phase::Sine))
		.fold(0.0, f64::max);
	let cosine = [0.0, DOMAIN_WIDTH * 0.5]
		.iter()
		.map(|&b| truncation_bound(b * h.cos_frequency, Phase::Cosine))
		.fold(0.0, f64::max);

	KernelErrorBound {
		k: h.k,
		sine,
		cosine,
	}
}

/// Encrypted inputs of one evaluation.
#[derive(Debug)]
pub struct StepInputs<'a, C> {
	/// Rising edge.
	pub b1: &'a C,
	/// Falling edge.
	pub b2: &'a C,
	/// Height of the pulse.
	pub amplitude: &'a C,
}

impl<C> Clone for StepInputs<'_, C> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<C> Copy for StepInputs<'_, C> {}

/// The ordered per-slot results of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBank<C> {
	slots: Vec<C>,
}

impl<C> ResultBank<C> {
	/// Number of slots.
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	/// Whether the bank holds no slot. Never true for banks produced by [`StepApproximator`].
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// The result of slot `index`.
	pub fn get(
		&self,
		index: usize,
	) -> Option<&C> {
		self.slots.get(index)
	}

	/// Iterates over the slots in order.
	pub fn iter(&self) -> std::slice::Iter<'_, C> {
		self.slots.iter()
	}

	/// Takes the slots out of the bank.
	pub fn into_vec(self) -> Vec<C> {
		self.slots
	}
}

impl<C> Index<usize> for ResultBank<C> {
	type Output = C;

	fn index(
		&self,
		index: usize,
	) -> &C {
		&self.slots[index]
	}
}

impl<C> IntoIterator for ResultBank<C> {
	type Item = C;
	type IntoIter = std::vec::IntoIter<C>;

	fn into_iter(self) -> Self::IntoIter {
		self.slots.into_iter()
	}
}

impl<'a, C> IntoIterator for &'a ResultBank<C> {
	type Item = &'a C;
	type IntoIter = std::slice::Iter<'a, C>;

	fn into_iter(self) -> Self::IntoIter {
		self.slots.iter()
	}
}

/// Plaintext operands of the series, encoded once.
#[derive(Debug, Clone)]
struct EncodedSeries<P> {
	neg_half: P,
	half: P,
	inv_domain: P,
	coeff: Vec<P>,
	sincoeff: Vec<P>,
	coscoeff: Vec<P>,
	slot_offsets: Vec<P>,
	kernel: TrigKernel<P>,
}

impl<P> EncodedSeries<P> {
	fn encode<E>(
		encoder: &E,
		coefficients: &FourierCoefficients,
		slots: usize,
	) -> Result<Self>
	where
		E: Encoder<Plaintext = P>,
	{
		let encode_all = |values: &[f64]| -> Result<Vec<P>> {
			values.iter().map(|&v| encoder.encode_f64(v)).collect()
		};

		Ok(Self {
			neg_half: encoder.encode_f64(-0.5)?,
			half: encoder.encode_f64(0.5)?,
			inv_domain: encoder.encode_f64(1.0 / DOMAIN_WIDTH)?,
			coeff: encode_all(coefficients.coeff())?,
			sincoeff: encode_all(coefficients.sincoeff())?,
			coscoeff: encode_all(coefficients.coscoeff())?,
			slot_offsets: (0..slots)
				.map(|i| encoder.encode_f64(i as f64))
				.collect::<Result<_>>()?,
			kernel: TrigKernel::encode(encoder)?,
		})
	}
}

/// Evaluates the step approximation for one configuration.
///
/// Construction validates the configuration, derives and encodes the coefficients and checks the
/// [`DepthPlan`] against the scheme's capacity. All of this happens before any ciphertext is touched,
/// so a configuration that cannot run is rejected up front.
#[derive(Debug, Clone)]
pub struct StepApproximator<P> {
	config: ApproxConfig,
	coefficients: FourierCoefficients,
	plan: DepthPlan,
	constants: EncodedSeries<P>,
}

impl<P> StepApproximator<P> {
	/// Prepares an approximator.
	///  * `config` - degree and slot count.
	///  * `capacity` - what the encryption parameters afford.
	///  * `encoder` - turns the plaintext constants into operands.
	pub fn new<E>(
		config: ApproxConfig,
		capacity: NoiseCapacity,
		encoder: &E,
	) -> Result<Self>
	where
		E: Encoder<Plaintext = P>,
	{
		config.validate()?;

		let plan = DepthPlan::for_config(&config)?;
		plan.check(&capacity)?;

		let coefficients = FourierCoefficients::generate(config.degree)?;
		let constants = EncodedSeries::encode(encoder, &coefficients, config.slots)?;

		debug!(
			degree = config.degree,
			slots = config.slots,
			slot_depth = plan.slot_depth,
			multiplications = plan.total.multiplications(),
			"step approximator ready"
		);

		Ok(Self {
			config,
			coefficients,
			plan,
			constants,
		})
	}

	/// The configuration.
	pub fn config(&self) -> &ApproxConfig {
		&self.config
	}

	/// The plaintext coefficients.
	pub fn coefficients(&self) -> &FourierCoefficients {
		&self.coefficients
	}

	/// The resources one evaluation consumes.
	pub fn plan(&self) -> &DepthPlan {
		&self.plan
	}

	/// Evaluates the bank.
	///  * `evaluator` - the scheme's evaluator.
	///  * `inputs` - encrypted thresholds and amplitude.
	#[tracing::instrument(
		level = "debug",
		skip_all,
		fields(degree = self.config.degree, slots = self.config.slots)
	)]
	pub fn evaluate<V>(
		&self,
		evaluator: &V,
		inputs: StepInputs<'_, V::Ciphertext>,
	) -> Result<ResultBank<V::Ciphertext>>
	where
		V: EvaluatorOps<Plaintext = P> + ThreadSafe,
		V::Ciphertext: Clone + ThreadSafe,
		P: ThreadSafe,
	{
		let c = &self.constants;

		let mut offset = evaluator.add(inputs.b1, inputs.b2)?;
		evaluator.multiply_plain_inplace(&mut offset, &c.neg_half)?;

		let mut halfwidth = evaluator.sub(inputs.b2, inputs.b1)?;
		evaluator.multiply_plain_inplace(&mut halfwidth, &c.half)?;

		let base = evaluator.multiply_plain(&halfwidth, &c.inv_domain)?;

		let cos_factors = c
			.coscoeff
			.iter()
			.map(|frequency| {
				let arg = evaluator.multiply_plain(&halfwidth, frequency)?;
				evaluator.cos_approx(&arg, &c.kernel)
			})
			.collect::<Result<Vec<_>>>()?;

		let slots = map_slots(self.config.slots, |i| {
			self.slot(evaluator, i, &offset, &base, &cos_factors, inputs.amplitude)
		})?;

		debug!(slots = slots.len(), "result bank evaluated");

		Ok(ResultBank { slots })
	}

	fn slot<V>(
		&self,
		evaluator: &V,
		index: usize,
		offset: &V::Ciphertext,
		base: &V::Ciphertext,
		cos_factors: &[V::Ciphertext],
		amplitude: &V::Ciphertext,
	) -> Result<V::Ciphertext>
	where
		V: EvaluatorOps<Plaintext = P>,
		V::Ciphertext: Clone,
	{
		let c = &self.constants;

		let phase = evaluator.add_plain(offset, &c.slot_offsets[index])?;
		let mut sum = base.clone();

		for ((frequency, weight), cos_factor) in c.sincoeff.iter().zip(&c.coeff).zip(cos_factors) {
			let arg = evaluator.multiply_plain(&phase, frequency)?;

			let mut term = evaluator.sin_approx(&arg, &c.kernel)?;
			evaluator.multiply_inplace(&mut term, cos_factor)?;
			evaluator.multiply_plain_inplace(&mut term, weight)?;

			evaluator.add_inplace(&mut sum, &term)?;
		}

		evaluator.multiply_inplace(&mut sum, amplitude)?;

		Ok(sum)
	}

	/// Kernel error bounds of every harmonic for the configured slot count.
	pub fn error_bounds(&self) -> Vec<KernelErrorBound> {
		self.coefficients
			.harmonics()
			.map(|h| kernel_error_bound(&h, self.config.slots))
			.collect()
	}

	/// Runs the same circuit on plaintext values, with the same kernel polynomial and exact constants.
	/// A correct backend decrypts the bank to these values up to encoding and scheme noise.
	pub fn plain_bank(
		&self,
		b1: f64,
		b2: f64,
		amplitude: f64,
	) -> Vec<f64> {
		let offset = (b1 + b2) * -0.5;
		let b = (b2 - b1) * 0.5;

		(0..self.config.slots)
			.map(|i| {
				let phase = offset + i as f64;
				let sum = self.coefficients.harmonics().fold(b / DOMAIN_WIDTH, |acc, h| {
					acc + kernel_plain(phase * h.sin_frequency, Phase::Sine)
						* kernel_plain(b * h.cos_frequency, Phase::Cosine)
						* h.weight
				});
				sum * amplitude
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ApproxConfigBuilder;
	use crate::depth::SLOT_DEPTH;
	use crate::error::Error;
	use crate::tracked::{TrackedCiphertext, TrackedEncoder, TrackedEvaluator, TrackedPlaintext};

	fn build(
		degree: u32,
		slots: usize,
	) -> StepApproximator<TrackedPlaintext> {
		let config = ApproxConfigBuilder::new()
			.set_degree(degree)
			.set_slot_count(slots)
			.build()
			.unwrap();

		StepApproximator::new(
			config,
			NoiseCapacity::levels(SLOT_DEPTH),
			&TrackedEncoder::exact(),
		)
		.unwrap()
	}

	fn run(
		approximator: &StepApproximator<TrackedPlaintext>,
		evaluator: &TrackedEvaluator,
		b1: f64,
		b2: f64,
		amplitude: f64,
	) -> Result<ResultBank<TrackedCiphertext>> {
		let b1 = evaluator.encrypt(b1);
		let b2 = evaluator.encrypt(b2);
		let amplitude = evaluator.encrypt(amplitude);

		approximator.evaluate(
			evaluator,
			StepInputs {
				b1: &b1,
				b2: &b2,
				amplitude: &amplitude,
			},
		)
	}

	fn assert_close(
		actual: f64,
		expected: f64,
	) {
		let tolerance = 1e-9 * expected.abs().max(1.0);
		assert!(
			(actual - expected).abs() < tolerance,
			"{} != {}",
			actual,
			expected
		);
	}

	#[test]
	fn bank_matches_plaintext_circuit() {
		let approximator = build(4, 16);
		let evaluator = TrackedEvaluator::new(SLOT_DEPTH);

		let bank = run(&approximator, &evaluator, 20.0, 40.0, 1.0).unwrap();
		let expected = approximator.plain_bank(20.0, 40.0, 1.0);

		assert_eq!(bank.len(), 16);
		for (ct, &value) in bank.iter().zip(&expected) {
			assert_close(evaluator.decrypt(ct), value);
		}
	}

	#[test]
	fn every_slot_consumes_the_planned_depth() {
		let approximator = build(8, 16);
		let evaluator = TrackedEvaluator::new(SLOT_DEPTH);

		let bank = run(&approximator, &evaluator, 12.0, 18.0, 3.0).unwrap();

		assert_eq!(approximator.plan().slot_depth, SLOT_DEPTH);
		for ct in &bank {
			assert_eq!(ct.depth(), approximator.plan().slot_depth);
			assert_eq!(evaluator.remaining_budget(ct), 0);
		}
	}

	#[test]
	fn executed_operations_match_the_plan() {
		for (degree, slots) in [(1, 1), (3, 5), (8, 16)] {
			let approximator = build(degree, slots);
			let evaluator = TrackedEvaluator::new(SLOT_DEPTH);

			run(&approximator, &evaluator, 10.0, 30.0, 1.0).unwrap();

			assert_eq!(evaluator.op_counts(), approximator.plan().total);
		}
	}

	#[test]
	fn slot_phase_does_not_accumulate() {
		let approximator = build(6, 8);
		let evaluator = TrackedEvaluator::new(SLOT_DEPTH);

		let bank = run(&approximator, &evaluator, 20.0, 26.0, 1.0).unwrap();

		for i in 0..8 {
			let shifted = run(&approximator, &evaluator, 20.0 - i as f64, 26.0 - i as f64, 1.0).unwrap();
			assert_close(evaluator.decrypt(&bank[i]), evaluator.decrypt(&shifted[0]));
		}

		let single = build(6, 1);
		let first = run(&single, &evaluator, 20.0, 26.0, 1.0).unwrap();
		assert_eq!(first.len(), 1);
		assert_close(evaluator.decrypt(&first[0]), evaluator.decrypt(&bank[0]));
	}

	#[test]
	fn amplitude_scales_every_slot() {
		let approximator = build(4, 4);
		let evaluator = TrackedEvaluator::new(SLOT_DEPTH);

		let unit = run(&approximator, &evaluator, 4.0, 12.0, 1.0).unwrap();
		let scaled = run(&approximator, &evaluator, 4.0, 12.0, 2.5).unwrap();

		for (a, b) in unit.iter().zip(&scaled) {
			assert_close(evaluator.decrypt(b), 2.5 * evaluator.decrypt(a));
		}
	}

	#[test]
	fn shallow_scheme_is_rejected_before_evaluation() {
		let config = ApproxConfig::new(8).unwrap();

		let result = StepApproximator::new(
			config,
			NoiseCapacity::levels(SLOT_DEPTH - 1),
			&TrackedEncoder::exact(),
		);

		assert_eq!(
			result.err(),
			Some(Error::DepthExceeded {
				required: SLOT_DEPTH,
				available: SLOT_DEPTH - 1,
			})
		);
	}

	#[test]
	fn invalid_config_is_rejected_at_construction() {
		let degree_zero = ApproxConfig {
			degree: 0,
			slots: 16,
		};
		let no_slots = ApproxConfig {
			degree: 8,
			slots: 0,
		};

		assert_eq!(
			StepApproximator::new(degree_zero, NoiseCapacity::levels(SLOT_DEPTH), &TrackedEncoder::exact())
				.err(),
			Some(Error::InvalidDegree(0))
		);
		assert_eq!(
			StepApproximator::new(no_slots, NoiseCapacity::levels(SLOT_DEPTH), &TrackedEncoder::exact())
				.err(),
			Some(Error::InvalidSlotCount(0))
		);
	}

	#[test]
	fn kernel_bounds_cover_the_input_domain() {
		let approximator = build(16, 16);
		let bounds = approximator.error_bounds();

		assert_eq!(bounds.len(), 16);
		assert_eq!(bounds[0].k, 1);
		assert!(240.0 < bounds[0].sine && bounds[0].sine < 250.0, "{:?}", bounds[0]);

		for bound in &bounds[..4] {
			assert!(bound.cosine < 0.026, "{:?}", bound);
		}
		assert!(bounds[7].cosine > 1000.0, "{:?}", bounds[7]);

		for pair in bounds.windows(2) {
			assert!(pair[1].sine > pair[0].sine);
			assert!(pair[1].cosine >= pair[0].cosine);
		}

		let first = approximator.coefficients().harmonics().next().unwrap();
		for phase in -64..16 {
			let x = phase as f64 * first.sin_frequency;
			let error = (kernel_plain(x, Phase::Sine) - x.sin()).abs();
			assert!(error <= bounds[0].sine, "phase={} error={}", phase, error);
		}
	}

	#[test]
	fn bank_is_not_confined_to_the_unit_interval() {
		let bank = build(8, 16).plain_bank(20.0, 40.0, 1.0);

		assert!(bank.iter().all(|&v| v > 1.0), "{:?}", bank);
		assert!((bank[0] - 13651.18).abs() < 0.01, "{}", bank[0]);
		assert!((bank[15] - 347.55).abs() < 0.01, "{}", bank[15]);

		let narrow = build(4, 16).plain_bank(2.0, 6.0, 1.0);
		assert!(narrow[0] < -4.0, "{:?}", narrow);
		assert!(narrow.iter().any(|&v| (0.0..=1.0).contains(&v)));
	}

	#[test]
	fn overstated_capacity_exhausts_the_budget() {
		let approximator = build(2, 2);
		let evaluator = TrackedEvaluator::new(SLOT_DEPTH - 1);

		let result = run(&approximator, &evaluator, 20.0, 40.0, 1.0);

		assert_eq!(
			result,
			Err(Error::NoiseBudgetExhausted {
				required: SLOT_DEPTH,
				capacity: SLOT_DEPTH - 1,
			})
		);
	}
}
