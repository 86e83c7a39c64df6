use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A type representing all errors that can occur in homstep.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Error {
	/// The Fourier degree must be at least one harmonic.
	#[error("invalid degree {0}: at least one harmonic is required")]
	InvalidDegree(u32),

	/// The result bank must hold at least one slot.
	#[error("invalid slot count {0}: at least one slot is required")]
	InvalidSlotCount(usize),

	/// The circuit needs more multiplicative levels than the scheme provides.
	#[error("circuit requires depth {required} but the scheme supports {available}")]
	DepthExceeded {
		/// Levels consumed along the critical path of one slot.
		required: u32,
		/// Levels the encryption parameters were configured for.
		available: u32,
	},

	/// The circuit performs more multiplications than the configured ceiling.
	#[error("circuit performs {required} multiplications but the ceiling is {available}")]
	MultiplicationsExceeded {
		/// Multiplications of all kinds performed by one evaluation.
		required: u64,
		/// Ceiling configured for the scheme.
		available: u64,
	},

	/// An operation would leave a ciphertext with no noise budget. Only a
	/// tracking backend can observe this; real schemes decrypt to garbage.
	#[error("noise budget exhausted: operation reaches depth {required}, capacity is {capacity}")]
	NoiseBudgetExhausted {
		/// Depth the result would have.
		required: u32,
		/// Depth the evaluator supports.
		capacity: u32,
	},

	/// An error reported by an external evaluator or encoder.
	#[error("backend error: {0}")]
	Backend(String),
}

/// `Result` type for homstep operations.
pub type Result<T> = std::result::Result<T, Error>;
