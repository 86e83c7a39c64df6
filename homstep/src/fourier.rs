//! Fourier Coefficient Generator
//!
//! A rectangular pulse of half-width `b` centred on the origin has the partial sum
//!
//! ```text
//! f(x) ≈ b/64 + Σ_{k=1..D} (2/(kπ)) · sin(k·b·π/64) · cos(k·x·π/64)
//! ```
//!
//! over a period of 128, so shifting the pulse anywhere inside `[0, 64)` never wraps around.
//! The generator only produces the plaintext constants; [`StepSeries`] evaluates the same sum in
//! the clear for reference.

use std::f64::consts::PI;

use crate::config::DOMAIN_WIDTH;
use crate::error::{Error, Result};

/// Plaintext constants of a `D`-term series. All three tables have length `D` and are indexed by
/// `k - 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct FourierCoefficients {
	coeff: Vec<f64>,
	sincoeff: Vec<f64>,
	coscoeff: Vec<f64>,
}

/// One harmonic of the series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
	/// Harmonic index, starting at 1.
	pub k: u32,
	/// Amplitude weight `2 / (kπ)`.
	pub weight: f64,
	/// Angular frequency applied to the phase argument, `kπ/64`.
	pub sin_frequency: f64,
	/// Angular frequency applied to the half-width argument, `kπ/64`.
	pub cos_frequency: f64,
}

impl FourierCoefficients {
	/// Computes the coefficient tables for `degree` harmonics.
	///
	/// # Arguments
	///
	/// * `degree` - Number of series terms, must be at least 1
	pub fn generate(degree: u32) -> Result<Self> {
		if degree == 0 {
			return Err(Error::InvalidDegree(degree));
		}

		let capacity = degree as usize;
		let mut coeff = Vec::with_capacity(capacity);
		let mut sincoeff = Vec::with_capacity(capacity);
		let mut coscoeff = Vec::with_capacity(capacity);

		for k in 1..=degree {
			let k = k as f64;
			coeff.push(2.0 / (k * PI));
			sincoeff.push(k * PI / DOMAIN_WIDTH);
			coscoeff.push(k * PI / DOMAIN_WIDTH);
		}

		Ok(Self {
			coeff,
			sincoeff,
			coscoeff,
		})
	}

	/// Number of harmonics.
	pub fn degree(&self) -> u32 {
		self.coeff.len() as u32
	}

	/// Amplitude weights `2 / (kπ)`.
	pub fn coeff(&self) -> &[f64] {
		&self.coeff
	}

	/// Frequencies applied to the phase argument.
	pub fn sincoeff(&self) -> &[f64] {
		&self.sincoeff
	}

	/// Frequencies applied to the half-width argument.
	pub fn coscoeff(&self) -> &[f64] {
		&self.coscoeff
	}

	/// Iterates over the harmonics in increasing `k`.
	pub fn harmonics(&self) -> impl Iterator<Item = Harmonic> + '_ {
		self.coeff
			.iter()
			.zip(&self.sincoeff)
			.zip(&self.coscoeff)
			.enumerate()
			.map(|(i, ((&weight, &sin_frequency), &cos_frequency))| Harmonic {
				k: i as u32 + 1,
				weight,
				sin_frequency,
				cos_frequency,
			})
	}
}

/// The partial Fourier sum of a pulse between `b1` and `b2`, evaluated with exact trigonometry.
#[derive(Debug, Clone)]
pub struct StepSeries {
	b1: f64,
	b2: f64,
	coefficients: FourierCoefficients,
}

impl StepSeries {
	/// Creates the series of the pulse on `[b1, b2]` truncated to `degree` harmonics.
	pub fn new(
		b1: f64,
		b2: f64,
		degree: u32,
	) -> Result<Self> {
		Ok(Self {
			b1,
			b2,
			coefficients: FourierCoefficients::generate(degree)?,
		})
	}

	/// Half the pulse width, `(b2 - b1) / 2`.
	pub fn halfwidth(&self) -> f64 {
		(self.b2 - self.b1) * 0.5
	}

	/// Pulse centre, `(b1 + b2) / 2`.
	pub fn center(&self) -> f64 {
		(self.b1 + self.b2) * 0.5
	}

	/// Evaluates the truncated series at `x`.
	pub fn evaluate(
		&self,
		x: f64,
	) -> f64 {
		let b = self.halfwidth();
		let shifted = x - self.center();

		self.coefficients
			.harmonics()
			.fold(b / DOMAIN_WIDTH, |acc, h| {
				acc + h.weight * (b * h.sin_frequency).sin() * (shifted * h.cos_frequency).cos()
			})
	}

	/// The ideal indicator the series approximates, closed on both edges.
	pub fn indicator(
		&self,
		x: f64,
	) -> f64 {
		if self.b1 <= x && x <= self.b2 {
			1.0
		} else {
			0.0
		}
	}

	/// Largest deviation from the ideal indicator at integer points of the domain lying one or two
	/// units away from either edge. The edges themselves are excluded since every truncation passes
	/// through one half there.
	pub fn gibbs_error(&self) -> f64 {
		(0..DOMAIN_WIDTH as i32)
			.map(f64::from)
			.filter(|&x| {
				let distance = (x - self.b1).abs().min((x - self.b2).abs());
				(1.0..=2.0).contains(&distance)
			})
			.map(|x| (self.evaluate(x) - self.indicator(x)).abs())
			.fold(0.0, f64::max)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn coefficients_match_closed_form() {
		for degree in [1, 4, 8, 16] {
			let c = FourierCoefficients::generate(degree).unwrap();

			assert_eq!(c.degree(), degree);
			assert_eq!(c.coeff().len(), degree as usize);
			assert_eq!(c.sincoeff().len(), degree as usize);
			assert_eq!(c.coscoeff().len(), degree as usize);

			for h in c.harmonics() {
				let k = h.k as f64;
				assert!((h.weight - 2.0 / (k * PI)).abs() < 1e-12);
				assert!((h.sin_frequency - k * PI / 64.0).abs() < 1e-12);
				assert_eq!(h.sin_frequency, h.cos_frequency);
			}
		}
	}

	#[test]
	fn weights_are_positive_and_strictly_decreasing() {
		let c = FourierCoefficients::generate(16).unwrap();

		assert!(c.coeff().iter().all(|&w| w > 0.0));
		for pair in c.coeff().windows(2) {
			assert!(pair[1] < pair[0]);
		}
	}

	#[test]
	fn zero_degree_is_rejected() {
		assert_eq!(
			FourierCoefficients::generate(0),
			Err(Error::InvalidDegree(0))
		);
		assert!(StepSeries::new(20.0, 40.0, 0).is_err());
	}

	#[test]
	fn series_resembles_smoothed_pulse() {
		let series = StepSeries::new(20.0, 40.0, 8).unwrap();
		assert_eq!(series.halfwidth(), 10.0);
		assert_eq!(series.center(), 30.0);

		let values: Vec<f64> = (0..64).map(|x| series.evaluate(x as f64)).collect();

		for x in 25..=35 {
			assert!((values[x] - 1.0).abs() < 0.15, "x={} f={}", x, values[x]);
		}

		for x in (0..=10).chain(50..64) {
			assert!(values[x].abs() < 0.15, "x={} f={}", x, values[x]);
		}

		// Peak at the centre, half height on the edges.
		let peak = values
			.iter()
			.enumerate()
			.max_by(|a, b| a.1.total_cmp(b.1))
			.map(|(x, _)| x)
			.unwrap();
		assert_eq!(peak, 30);
		assert!((values[20] - 0.5).abs() < 0.05);
		assert!((values[40] - 0.5).abs() < 0.05);
	}

	#[test]
	fn gibbs_error_shrinks_with_degree() {
		let errors: Vec<f64> = [2, 4, 8, 16]
			.iter()
			.map(|&d| StepSeries::new(20.0, 40.0, d).unwrap().gibbs_error())
			.collect();

		for pair in errors.windows(2) {
			assert!(pair[1] < pair[0], "{:?}", errors);
		}
	}
}
