//! A plaintext stand-in for a leveled scheme.
//!
//! [`TrackedEvaluator`] performs the arithmetic in the clear but follows the resource rules of a leveled
//! scheme: every ciphertext records the multiplicative depth it has consumed, operations that would go
//! beyond the configured capacity fail, and every operation is counted. It runs the same circuits as a
//! real backend, so the static accounting in [`crate::depth`] can be checked step by step against it.
//!
//! Nothing here is encrypted. Use it for tests, depth audits and numeric experiments only.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::depth::OpCounts;
use crate::error::{Error, Result};
use crate::evaluator::{Encoder, EvaluatorOps};

/// A value together with the number of levels consumed to produce it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedCiphertext {
	value: f64,
	depth: u32,
}

impl TrackedCiphertext {
	/// Multiplicative depth consumed so far.
	pub fn depth(&self) -> u32 {
		self.depth
	}
}

/// An encoded constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedPlaintext(f64);

impl TrackedPlaintext {
	/// The value after encoding.
	pub fn value(&self) -> f64 {
		self.0
	}
}

/// Encodes constants, optionally rounding them to a fixed-point grid the way fractional and CKKS
/// encoders do.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackedEncoder {
	scale_bits: Option<u32>,
}

impl TrackedEncoder {
	/// An encoder that keeps constants exact.
	pub fn exact() -> Self {
		Self { scale_bits: None }
	}

	/// An encoder that rounds constants to multiples of `2^-bits`.
	pub fn with_scale_bits(bits: u32) -> Self {
		Self {
			scale_bits: Some(bits),
		}
	}
}

impl Encoder for TrackedEncoder {
	type Plaintext = TrackedPlaintext;

	fn encode_f64(
		&self,
		value: f64,
	) -> Result<TrackedPlaintext> {
		let encoded = match self.scale_bits {
			Some(bits) => {
				let scale = 2f64.powi(bits as i32);
				(value * scale).round() / scale
			}
			None => value,
		};

		Ok(TrackedPlaintext(encoded))
	}
}

#[derive(Debug, Default)]
struct Counters {
	add: AtomicU64,
	sub: AtomicU64,
	add_plain: AtomicU64,
	multiply: AtomicU64,
	square: AtomicU64,
	multiply_plain: AtomicU64,
}

fn bump(counter: &AtomicU64) {
	counter.fetch_add(1, Ordering::Relaxed);
}

/// Evaluator over [`TrackedCiphertext`]s with a fixed level capacity.
#[derive(Debug)]
pub struct TrackedEvaluator {
	capacity: u32,
	counters: Counters,
}

impl TrackedEvaluator {
	/// Creates an evaluator whose ciphertexts support `capacity` multiplicative levels.
	pub fn new(capacity: u32) -> Self {
		Self {
			capacity,
			counters: Counters::default(),
		}
	}

	/// Level capacity of fresh ciphertexts.
	pub fn capacity(&self) -> u32 {
		self.capacity
	}

	/// Produces a fresh ciphertext of `value`.
	pub fn encrypt(
		&self,
		value: f64,
	) -> TrackedCiphertext {
		TrackedCiphertext { value, depth: 0 }
	}

	/// Reads the value back.
	pub fn decrypt(
		&self,
		a: &TrackedCiphertext,
	) -> f64 {
		a.value
	}

	/// Levels `a` can still afford.
	pub fn remaining_budget(
		&self,
		a: &TrackedCiphertext,
	) -> u32 {
		self.capacity.saturating_sub(a.depth)
	}

	/// Operations performed since creation or the last [`reset_counts`](Self::reset_counts).
	pub fn op_counts(&self) -> OpCounts {
		let c = &self.counters;

		OpCounts {
			add: c.add.load(Ordering::Relaxed),
			sub: c.sub.load(Ordering::Relaxed),
			add_plain: c.add_plain.load(Ordering::Relaxed),
			multiply: c.multiply.load(Ordering::Relaxed),
			square: c.square.load(Ordering::Relaxed),
			multiply_plain: c.multiply_plain.load(Ordering::Relaxed),
		}
	}

	/// Zeroes the operation counters.
	pub fn reset_counts(&self) {
		let c = &self.counters;

		for counter in [
			&c.add,
			&c.sub,
			&c.add_plain,
			&c.multiply,
			&c.square,
			&c.multiply_plain,
		] {
			counter.store(0, Ordering::Relaxed);
		}
	}

	fn leveled(
		&self,
		value: f64,
		depth: u32,
	) -> Result<TrackedCiphertext> {
		if depth > self.capacity {
			return Err(Error::NoiseBudgetExhausted {
				required: depth,
				capacity: self.capacity,
			});
		}

		Ok(TrackedCiphertext { value, depth })
	}
}

impl EvaluatorOps for TrackedEvaluator {
	type Plaintext = TrackedPlaintext;
	type Ciphertext = TrackedCiphertext;

	fn add_inplace(
		&self,
		a: &mut TrackedCiphertext,
		b: &TrackedCiphertext,
	) -> Result<()> {
		*a = self.add(a, b)?;

		Ok(())
	}

	fn add(
		&self,
		a: &TrackedCiphertext,
		b: &TrackedCiphertext,
	) -> Result<TrackedCiphertext> {
		bump(&self.counters.add);
		self.leveled(a.value + b.value, a.depth.max(b.depth))
	}

	fn sub_inplace(
		&self,
		a: &mut TrackedCiphertext,
		b: &TrackedCiphertext,
	) -> Result<()> {
		*a = self.sub(a, b)?;

		Ok(())
	}

	fn sub(
		&self,
		a: &TrackedCiphertext,
		b: &TrackedCiphertext,
	) -> Result<TrackedCiphertext> {
		bump(&self.counters.sub);
		self.leveled(a.value - b.value, a.depth.max(b.depth))
	}

	fn multiply_inplace(
		&self,
		a: &mut TrackedCiphertext,
		b: &TrackedCiphertext,
	) -> Result<()> {
		*a = self.multiply(a, b)?;

		Ok(())
	}

	fn multiply(
		&self,
		a: &TrackedCiphertext,
		b: &TrackedCiphertext,
	) -> Result<TrackedCiphertext> {
		bump(&self.counters.multiply);
		self.leveled(a.value * b.value, a.depth.max(b.depth) + 1)
	}

	fn square_inplace(
		&self,
		a: &mut TrackedCiphertext,
	) -> Result<()> {
		*a = self.square(a)?;

		Ok(())
	}

	fn square(
		&self,
		a: &TrackedCiphertext,
	) -> Result<TrackedCiphertext> {
		bump(&self.counters.square);
		self.leveled(a.value * a.value, a.depth + 1)
	}

	fn add_plain(
		&self,
		a: &TrackedCiphertext,
		b: &TrackedPlaintext,
	) -> Result<TrackedCiphertext> {
		bump(&self.counters.add_plain);
		self.leveled(a.value + b.0, a.depth)
	}

	fn add_plain_inplace(
		&self,
		a: &mut TrackedCiphertext,
		b: &TrackedPlaintext,
	) -> Result<()> {
		*a = self.add_plain(a, b)?;

		Ok(())
	}

	fn multiply_plain(
		&self,
		a: &TrackedCiphertext,
		b: &TrackedPlaintext,
	) -> Result<TrackedCiphertext> {
		bump(&self.counters.multiply_plain);
		self.leveled(a.value * b.0, a.depth + 1)
	}

	fn multiply_plain_inplace(
		&self,
		a: &mut TrackedCiphertext,
		b: &TrackedPlaintext,
	) -> Result<()> {
		*a = self.multiply_plain(a, b)?;

		Ok(())
	}
}
