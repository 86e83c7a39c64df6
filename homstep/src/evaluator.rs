//! Capability interface to a leveled homomorphic encryption scheme.
//!
//! homstep never touches keys, parameters or the ciphertext representation. It
//! drives whatever evaluator the caller hands it through [`EvaluatorOps`] and
//! turns real constants into plaintext operands through [`Encoder`].

use crate::error::Result;

/// Provides arithmetic on ciphertexts. Due to the properties of the encryption scheme, every operation
/// passes through the encryption layer to the underlying plaintext, changing it according to the type of
/// the operation.
///
/// # Noise budget
/// Every ciphertext carries a finite budget that is consumed by the operations applied to it and never
/// restored. Multiplication, squaring and plain multiplication each consume one multiplicative level;
/// additions and subtractions only combine the budgets of their operands. A ciphertext whose budget is
/// exhausted decrypts to garbage, and no implementation is expected to detect that at runtime. Callers
/// account for depth statically, see [`crate::depth`].
///
/// # Ownership
/// The non-inplace operations borrow their operands and return a fresh ciphertext. The inplace variants
/// overwrite their first operand. Implementations that need relinearization or rescaling after a
/// multiplication perform it inside `multiply`/`square`/`multiply_plain`.
pub trait EvaluatorOps {
	/// The plaintext type.
	type Plaintext;
	/// The ciphertext type.
	type Ciphertext;

	/// Add `a` and `b` and store the result in `a`.
	///  * `a` - the accumulator
	///  * `b` - the added value
	fn add_inplace(
		&self,
		a: &mut Self::Ciphertext,
		b: &Self::Ciphertext,
	) -> Result<()>;

	/// Adds `a` and `b`.
	///  * `a` - first operand
	///  * `b` - second operand
	fn add(
		&self,
		a: &Self::Ciphertext,
		b: &Self::Ciphertext,
	) -> Result<Self::Ciphertext>;

	/// Subtracts `b` from `a` and stores the result in `a`.
	///  * `a` - the left operand and destination
	///  * `b` - the right operand
	fn sub_inplace(
		&self,
		a: &mut Self::Ciphertext,
		b: &Self::Ciphertext,
	) -> Result<()>;

	/// Subtracts `b` from `a`.
	///  * `a` - the left operand
	///  * `b` - the right operand
	fn sub(
		&self,
		a: &Self::Ciphertext,
		b: &Self::Ciphertext,
	) -> Result<Self::Ciphertext>;

	/// Multiplies `a` and `b` and stores the result in `a`.
	///  * `a` - the left operand and destination.
	///  * `b` - the right operand.
	fn multiply_inplace(
		&self,
		a: &mut Self::Ciphertext,
		b: &Self::Ciphertext,
	) -> Result<()>;

	/// Multiplies `a` and `b`.
	///  * `a` - the left operand.
	///  * `b` - the right operand.
	fn multiply(
		&self,
		a: &Self::Ciphertext,
		b: &Self::Ciphertext,
	) -> Result<Self::Ciphertext>;

	/// Squares `a` and stores the result in `a`.
	///  * `a` - the value to square.
	fn square_inplace(
		&self,
		a: &mut Self::Ciphertext,
	) -> Result<()>;

	/// Squares `a`.
	///  * `a` - the value to square.
	fn square(
		&self,
		a: &Self::Ciphertext,
	) -> Result<Self::Ciphertext>;

	/// Adds a ciphertext and a plaintext.
	/// * `a` - the ciphertext
	/// * `b` - the plaintext
	fn add_plain(
		&self,
		a: &Self::Ciphertext,
		b: &Self::Plaintext,
	) -> Result<Self::Ciphertext>;

	/// Adds a ciphertext and a plaintext and stores the result in the ciphertext.
	/// * `a` - the ciphertext
	/// * `b` - the plaintext
	fn add_plain_inplace(
		&self,
		a: &mut Self::Ciphertext,
		b: &Self::Plaintext,
	) -> Result<()>;

	/// Multiply a ciphertext by a plaintext.
	///  * `a` - the ciphertext
	///  * `b` - the plaintext
	fn multiply_plain(
		&self,
		a: &Self::Ciphertext,
		b: &Self::Plaintext,
	) -> Result<Self::Ciphertext>;

	/// Multiply a ciphertext by a plaintext and store in the ciphertext.
	///  * `a` - the ciphertext
	///  * `b` - the plaintext
	fn multiply_plain_inplace(
		&self,
		a: &mut Self::Ciphertext,
		b: &Self::Plaintext,
	) -> Result<()>;
}

/// Turns a real number into a plaintext operand usable with an evaluator.
///
/// Fractional and CKKS-style encoders quantize the value; the error this
/// introduces is part of the numeric budget of every circuit in this crate.
pub trait Encoder {
	/// The plaintext type produced by the encoder.
	type Plaintext;

	/// Encodes `value` as a constant operand.
	fn encode_f64(
		&self,
		value: f64,
	) -> Result<Self::Plaintext>;
}
