//! Development-time inspection of intermediate ciphertexts.
//!
//! A probe decrypts a value and reports it together with the remaining noise budget, which makes numeric
//! drift and budget consumption visible while a circuit is being tuned. It needs the secret key, so it
//! lives behind the `diagnostics` feature and nothing in the evaluation path calls it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::tracked::{TrackedCiphertext, TrackedEvaluator};

/// What a probe observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
	/// The decrypted value.
	pub value: f64,
	/// Levels the ciphertext can still afford.
	pub noise_budget: u32,
}

/// Decrypts ciphertexts for inspection.
pub trait Inspect {
	/// The ciphertext type.
	type Ciphertext;

	/// Decrypts `a` and reads its remaining budget.
	fn inspect(
		&self,
		a: &Self::Ciphertext,
	) -> Result<Inspection>;
}

impl Inspect for TrackedEvaluator {
	type Ciphertext = TrackedCiphertext;

	fn inspect(
		&self,
		a: &TrackedCiphertext,
	) -> Result<Inspection> {
		Ok(Inspection {
			value: self.decrypt(a),
			noise_budget: self.remaining_budget(a),
		})
	}
}

/// Inspects `a` and logs the result at debug level under `label`.
pub fn probe<I>(
	inspector: &I,
	label: &str,
	a: &I::Ciphertext,
) -> Result<Inspection>
where
	I: Inspect + ?Sized,
{
	let inspection = inspector.inspect(a)?;

	debug!(
		label,
		value = inspection.value,
		noise_budget = inspection.noise_budget,
		"probe"
	);

	Ok(inspection)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::evaluator::EvaluatorOps;

	#[test]
	fn probe_reports_value_and_budget() {
		let evaluator = TrackedEvaluator::new(6);

		let a = evaluator.encrypt(1.5);
		let squared = evaluator.square(&a).unwrap();

		let fresh = probe(&evaluator, "fresh", &a).unwrap();
		assert_eq!(
			fresh,
			Inspection {
				value: 1.5,
				noise_budget: 6,
			}
		);

		let used = probe(&evaluator, "squared", &squared).unwrap();
		assert_eq!(used.value, 2.25);
		assert_eq!(used.noise_budget, 5);
	}
}
