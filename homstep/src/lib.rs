//! Fourier-series approximation of a step function over leveled homomorphic encryption.
//!
//! The indicator of `[b1, b2]` on the domain `[0, 64)` cannot be evaluated under encryption: it has
//! discontinuities, and its Fourier series needs sine and cosine. This crate evaluates a truncated
//! Fourier sum built from the thresholds, with the trigonometric functions replaced by an 8th-order
//! Taylor kernel, so that the whole computation uses only additions, multiplications and
//! multiplications by constants.
//!
//! The sum follows the slot layout of a fixed decoding circuit, and its sine arguments lie outside
//! the kernel's calibrated range for every threshold pair. The bank it produces is not an
//! approximation of the indicator. See [`ext::step`] for the layout and the per-harmonic error bounds.
//!
//! The crate drives any scheme that implements [`EvaluatorOps`] and [`Encoder`]; it never holds keys.
//!
//! ```no_run
//! use homstep::{ApproxConfig, NoiseCapacity, StepApproximator, StepInputs};
//! use homstep::tracked::{TrackedEncoder, TrackedEvaluator};
//!
//! # fn main() -> homstep::Result<()> {
//! let evaluator = TrackedEvaluator::new(10);
//! let approximator = StepApproximator::new(
//! 	ApproxConfig::new(8)?,
//! 	NoiseCapacity::levels(10),
//! 	&TrackedEncoder::exact(),
//! )?;
//!
//! let (b1, b2, amplitude) = (evaluator.encrypt(20.0), evaluator.encrypt(40.0), evaluator.encrypt(1.0));
//! let bank = approximator.evaluate(&evaluator, StepInputs { b1: &b1, b2: &b2, amplitude: &amplitude })?;
//! assert_eq!(bank.len(), 16);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod depth;
mod error;
pub mod evaluator;
pub mod ext;
pub mod fourier;
#[cfg(feature = "diagnostics")]
pub mod probe;
pub mod tracked;

pub use config::{ApproxConfig, ApproxConfigBuilder, DEFAULT_SLOT_COUNT, DOMAIN_WIDTH, KERNEL_ORDER};
pub use depth::{DepthPlan, NoiseCapacity, OpCounts, KERNEL_DEPTH, SLOT_DEPTH};
pub use error::{Error, Result};
pub use evaluator::{Encoder, EvaluatorOps};
pub use ext::step::{kernel_error_bound, KernelErrorBound, ResultBank, StepApproximator, StepInputs, ThreadSafe};
pub use ext::trig::{Phase, TrigEvaluator, TrigKernel};
pub use fourier::{FourierCoefficients, Harmonic, StepSeries};

static_assertions::const_assert_eq!(KERNEL_ORDER, 8);
static_assertions::const_assert_eq!(SLOT_DEPTH, 10);
static_assertions::assert_impl_all!(tracked::TrackedEvaluator: Send, Sync);
static_assertions::assert_impl_all!(Error: Send, Sync, std::error::Error);
