//! Static depth and operation accounting.
//!
//! Budget exhaustion cannot be observed under encryption, so the circuit is accounted for before any
//! ciphertext exists. Every multiplication, squaring and plain multiplication consumes one level;
//! additions take the deeper of their operands.
//!
//! ```text
//! kernel:  u ─┬─ u² (1) ─ u⁴ (2) ─┬─ u⁸ (3) ─ ·w₈ (4)
//!             │                    └─ ·u (3) ─ ·u (4) ─ ·w₆ (5)   <- critical path
//!             └──────────────────────── ·w₂ (2), u⁴·w₄ (3)
//!
//! slot:    (b1 ± b2)·½ (1) ─ ·kπ/64 (2) ─ kernel (7) ─ sin·cos (8) ─ ·2/kπ (9) ─ ·amplitude (10)
//! ```
//!
//! The slot depth does not grow with the number of harmonics: harmonics are summed, never chained.
//! The number of operations does, and [`OpCounts`] tracks it for schemes whose noise grows with the
//! operation count as well.

use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

use crate::config::ApproxConfig;
use crate::error::{Error, Result};

/// Levels consumed by one kernel evaluation.
pub const KERNEL_DEPTH: u32 = 5;

/// Levels consumed by the centring step, `(b1 + b2)·(-½)` and `(b2 - b1)·½`.
pub const CENTERING_DEPTH: u32 = 1;

/// Levels consumed from the scaled kernel arguments to the amplitude-scaled slot: argument scaling,
/// the kernel, `sin·cos`, the harmonic weight and the amplitude.
pub const SLOT_TAIL_DEPTH: u32 = 1 + KERNEL_DEPTH + 1 + 1 + 1;

/// Levels on the critical path of one result slot.
pub const SLOT_DEPTH: u32 = CENTERING_DEPTH + SLOT_TAIL_DEPTH;

/// Operation counts of a circuit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpCounts {
	/// Ciphertext additions.
	pub add: u64,
	/// Ciphertext subtractions.
	pub sub: u64,
	/// Additions of a plaintext constant.
	pub add_plain: u64,
	/// Ciphertext multiplications.
	pub multiply: u64,
	/// Squarings.
	pub square: u64,
	/// Multiplications by a plaintext constant.
	pub multiply_plain: u64,
}

impl OpCounts {
	/// Operations of one kernel evaluation: the shift and the constant term (add-plain), three squarings,
	/// two multiplications for `u⁶`, four weights and three additions.
	pub const KERNEL: OpCounts = OpCounts {
		add: 3,
		sub: 0,
		add_plain: 2,
		multiply: 2,
		square: 3,
		multiply_plain: 4,
	};

	/// Centring of the thresholds and the `b/64` base term, shared by all slots.
	pub const SETUP: OpCounts = OpCounts {
		add: 1,
		sub: 1,
		add_plain: 0,
		multiply: 0,
		square: 0,
		multiply_plain: 3,
	};

	/// All operations that consume a multiplicative level.
	pub fn multiplications(&self) -> u64 {
		self.multiply + self.square + self.multiply_plain
	}

	/// All operations.
	pub fn total(&self) -> u64 {
		self.add + self.sub + self.add_plain + self.multiplications()
	}
}

impl Add for OpCounts {
	type Output = OpCounts;

	fn add(
		self,
		rhs: OpCounts,
	) -> OpCounts {
		OpCounts {
			add: self.add + rhs.add,
			sub: self.sub + rhs.sub,
			add_plain: self.add_plain + rhs.add_plain,
			multiply: self.multiply + rhs.multiply,
			square: self.square + rhs.square,
			multiply_plain: self.multiply_plain + rhs.multiply_plain,
		}
	}
}

impl Mul<u64> for OpCounts {
	type Output = OpCounts;

	fn mul(
		self,
		rhs: u64,
	) -> OpCounts {
		OpCounts {
			add: self.add * rhs,
			sub: self.sub * rhs,
			add_plain: self.add_plain * rhs,
			multiply: self.multiply * rhs,
			square: self.square * rhs,
			multiply_plain: self.multiply_plain * rhs,
		}
	}
}

/// What the encryption parameters can afford.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseCapacity {
	/// Multiplicative levels available to a fresh ciphertext.
	pub levels: u32,
	/// Optional ceiling on the total number of multiplications of one evaluation.
	#[serde(default)]
	pub multiplications: Option<u64>,
}

impl NoiseCapacity {
	/// A capacity bounded by levels only.
	pub fn levels(levels: u32) -> Self {
		Self {
			levels,
			multiplications: None,
		}
	}

	/// Adds a multiplication ceiling.
	pub fn with_multiplications(
		mut self,
		multiplications: u64,
	) -> Self {
		self.multiplications = Some(multiplications);
		self
	}
}

/// The resources one evaluation of the step approximation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthPlan {
	/// Levels consumed by one kernel evaluation.
	pub kernel_depth: u32,
	/// Levels on the critical path of every result slot.
	pub slot_depth: u32,
	/// Operations shared by all slots: centring, the base term and the cosine factors.
	pub shared: OpCounts,
	/// Operations of a single slot.
	pub per_slot: OpCounts,
	/// Operations of the whole evaluation.
	pub total: OpCounts,
}

impl DepthPlan {
	/// Computes the plan for `config`.
	pub fn for_config(config: &ApproxConfig) -> Result<Self> {
		config.validate()?;

		let degree = config.degree as u64;
		let slots = config.slots as u64;

		let scale = OpCounts {
			multiply_plain: 1,
			..OpCounts::default()
		};
		let combine = OpCounts {
			add: 1,
			multiply: 1,
			multiply_plain: 1,
			..OpCounts::default()
		};

		// cos(b·kπ/64) does not depend on the slot and is evaluated once per harmonic.
		let shared = OpCounts::SETUP + (scale + OpCounts::KERNEL) * degree;

		let phase = OpCounts {
			add_plain: 1,
			..OpCounts::default()
		};
		let amplitude = OpCounts {
			multiply: 1,
			..OpCounts::default()
		};
		let per_slot = phase + (scale + OpCounts::KERNEL + combine) * degree + amplitude;

		Ok(Self {
			kernel_depth: KERNEL_DEPTH,
			slot_depth: SLOT_DEPTH,
			shared,
			per_slot,
			total: shared + per_slot * slots,
		})
	}

	/// Fails if the plan does not fit in `capacity`.
	pub fn check(
		&self,
		capacity: &NoiseCapacity,
	) -> Result<()> {
		if self.slot_depth > capacity.levels {
			return Err(Error::DepthExceeded {
				required: self.slot_depth,
				available: capacity.levels,
			});
		}

		if let Some(available) = capacity.multiplications {
			let required = self.total.multiplications();
			if required > available {
				return Err(Error::MultiplicationsExceeded {
					required,
					available,
				});
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn slot_depth_is_ten_for_every_degree() {
		assert_eq!(SLOT_DEPTH, 10);

		for degree in [1, 2, 8, 32] {
			let plan = DepthPlan::for_config(&ApproxConfig::new(degree).unwrap()).unwrap();
			assert_eq!(plan.kernel_depth, 5);
			assert_eq!(plan.slot_depth, 10);
		}
	}

	#[test]
	fn counts_match_closed_form() {
		let config = ApproxConfig::new(8).unwrap();
		let plan = DepthPlan::for_config(&config).unwrap();

		let (d, s) = (8u64, 16u64);
		assert_eq!(plan.total.add, 1 + 3 * d + 4 * s * d);
		assert_eq!(plan.total.sub, 1);
		assert_eq!(plan.total.add_plain, 2 * d + s * (1 + 2 * d));
		assert_eq!(plan.total.square, 3 * d + 3 * s * d);
		assert_eq!(plan.total.multiply, 2 * d + s * (3 * d + 1));
		assert_eq!(plan.total.multiply_plain, 3 + 5 * d + 6 * s * d);
	}

	#[test]
	fn counts_grow_linearly_with_degree() {
		let small = DepthPlan::for_config(&ApproxConfig::new(4).unwrap()).unwrap();
		let large = DepthPlan::for_config(&ApproxConfig::new(8).unwrap()).unwrap();

		// One shared cosine (scale + kernel) and, per slot, scale + sine kernel + product + weight.
		let kernel = OpCounts::KERNEL.multiplications();
		let per_harmonic = (1 + kernel) + 16 * (1 + kernel + 2);

		assert_eq!(kernel, 9);
		assert_eq!(
			large.total.multiplications() - small.total.multiplications(),
			4 * per_harmonic
		);
	}

	#[test]
	fn shallow_capacity_is_rejected() {
		let plan = DepthPlan::for_config(&ApproxConfig::new(4).unwrap()).unwrap();

		assert_eq!(
			plan.check(&NoiseCapacity::levels(9)),
			Err(Error::DepthExceeded {
				required: 10,
				available: 9,
			})
		);
		assert!(plan.check(&NoiseCapacity::levels(10)).is_ok());
	}

	#[test]
	fn multiplication_ceiling_is_enforced() {
		let plan = DepthPlan::for_config(&ApproxConfig::new(4).unwrap()).unwrap();
		let required = plan.total.multiplications();

		let tight = NoiseCapacity::levels(12).with_multiplications(required - 1);
		assert_eq!(
			plan.check(&tight),
			Err(Error::MultiplicationsExceeded {
				required,
				available: required - 1,
			})
		);

		let exact = NoiseCapacity::levels(12).with_multiplications(required);
		assert!(plan.check(&exact).is_ok());
	}

	#[test]
	fn invalid_config_has_no_plan() {
		let config = ApproxConfig {
			degree: 0,
			slots: 16,
		};

		assert_eq!(
			DepthPlan::for_config(&config),
			Err(Error::InvalidDegree(0))
		);
	}
}
