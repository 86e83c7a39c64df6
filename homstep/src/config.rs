//! Approximation configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Width of the integer domain `[0, DOMAIN_WIDTH)` the thresholds live in.
pub const DOMAIN_WIDTH: f64 = 64.0;

/// Number of result slots produced by the reference design.
pub const DEFAULT_SLOT_COUNT: usize = 16;

/// Order of the Taylor expansion used for sine and cosine. Not configurable.
pub const KERNEL_ORDER: u32 = 8;

/// Shape of one step approximation: how many Fourier harmonics are summed and how many offset slots
/// are produced. Changing either requires regenerating the coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproxConfig {
	/// Number of Fourier harmonics, `D`.
	pub degree: u32,
	/// Number of offset slots in the result bank.
	#[serde(default = "default_slot_count")]
	pub slots: usize,
}

fn default_slot_count() -> usize {
	DEFAULT_SLOT_COUNT
}

impl ApproxConfig {
	/// Creates a validated configuration with the default slot count.
	///  * `degree` - the number of Fourier harmonics.
	pub fn new(degree: u32) -> Result<Self> {
		ApproxConfigBuilder::new().set_degree(degree).build()
	}

	/// Checks the configuration. Deserialized configurations bypass the builder and must be validated
	/// before use.
	pub fn validate(&self) -> Result<()> {
		if self.degree == 0 {
			return Err(Error::InvalidDegree(self.degree));
		}

		if self.slots == 0 {
			return Err(Error::InvalidSlotCount(self.slots));
		}

		Ok(())
	}

	/// The domain width the coefficients are derived for.
	pub fn domain_width(&self) -> f64 {
		DOMAIN_WIDTH
	}

	/// The fixed kernel expansion order.
	pub fn kernel_order(&self) -> u32 {
		KERNEL_ORDER
	}
}

/// Builder for [`ApproxConfig`].
#[derive(Debug, Clone, Default)]
pub struct ApproxConfigBuilder {
	degree: Option<u32>,
	slots: Option<usize>,
}

impl ApproxConfigBuilder {
	/// Creates a new builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the number of Fourier harmonics.
	pub fn set_degree(
		mut self,
		degree: u32,
	) -> Self {
		self.degree = Some(degree);
		self
	}

	/// Sets the number of slots in the result bank. Defaults to [`DEFAULT_SLOT_COUNT`].
	pub fn set_slot_count(
		mut self,
		slots: usize,
	) -> Self {
		self.slots = Some(slots);
		self
	}

	/// Builds and validates the configuration. A missing degree is reported as degree zero.
	pub fn build(self) -> Result<ApproxConfig> {
		let config = ApproxConfig {
			degree: self.degree.unwrap_or(0),
			slots: self.slots.unwrap_or(DEFAULT_SLOT_COUNT),
		};

		config.validate()?;

		Ok(config)
	}
}
