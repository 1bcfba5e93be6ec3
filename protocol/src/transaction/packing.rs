//! Lossy fixed-point packing of token amounts.
//!
//! The circuit cannot carry a 256-bit amount per field, so amounts travel as
//! a decimal floating-point word: a `mantissa_bits` mantissa followed by an
//! `exponent_bits` power-of-ten exponent. Packing truncates toward zero, so a
//! packed amount never overstates what the user typed.
//!
//! ```text
//! packed = mantissa << exponent_bits | exponent
//! value  = mantissa * 10^exponent
//! ```
//!
//! [`AmountCodec::clean`] returns `value` for an input, which is what the
//! builder stores in the transaction. Minimum-amount checks downstream then
//! compare against exactly the number that gets hashed and proved.

use std::fmt;

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::config::{
    ProtocolConfig, AMOUNT_EXPONENT_BITS, AMOUNT_MANTISSA_BITS, FEE_EXPONENT_BITS,
    FEE_MANTISSA_BITS,
};
use crate::error::{CodecError, RangeViolation};

/// Widest packed word we accept. Keeps `mantissa << exponent_bits` inside a
/// non-negative `i64`, which is how the circuit reads it.
const MAX_WORD_BITS: u32 = 63;

/// Exponents beyond 2^8 - 1 decimal digits have no use and make
/// `max_value` needlessly expensive.
const MAX_EXPONENT_BITS: u32 = 8;

/// Which precision budget an amount is packed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrecisionClass {
    /// Ordinary token amounts (transfers, liquidity, swaps).
    Amount,
    /// Gas fees. Coarser than amounts since fees are small.
    Fee,
}

impl fmt::Display for PrecisionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount => write!(f, "amount"),
            Self::Fee => write!(f, "fee"),
        }
    }
}

/// Bit budget of one precision class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackingParams {
    pub mantissa_bits: u32,
    pub exponent_bits: u32,
}

impl PackingParams {
    pub const AMOUNT: Self = Self::new(AMOUNT_MANTISSA_BITS, AMOUNT_EXPONENT_BITS);
    pub const FEE: Self = Self::new(FEE_MANTISSA_BITS, FEE_EXPONENT_BITS);

    pub const fn new(mantissa_bits: u32, exponent_bits: u32) -> Self {
        Self {
            mantissa_bits,
            exponent_bits,
        }
    }

    /// Whether a packed word of this budget fits the circuit's word.
    pub fn fits_word(&self) -> bool {
        self.mantissa_bits >= 1
            && self.exponent_bits >= 1
            && self.exponent_bits <= MAX_EXPONENT_BITS
            && self.mantissa_bits + self.exponent_bits <= MAX_WORD_BITS
    }

    pub fn max_mantissa(&self) -> u64 {
        (1u64 << self.mantissa_bits) - 1
    }

    pub fn max_exponent(&self) -> u32 {
        (1u32 << self.exponent_bits) - 1
    }

    /// Largest integer this budget can represent exactly.
    pub fn max_value(&self) -> BigUint {
        BigUint::from(self.max_mantissa()) * BigUint::from(10u32).pow(self.max_exponent())
    }
}

/// Packs and cleans amounts for both precision classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountCodec {
    amount: PackingParams,
    fee: PackingParams,
}

impl Default for AmountCodec {
    fn default() -> Self {
        Self::new(PackingParams::AMOUNT, PackingParams::FEE)
    }
}

impl AmountCodec {
    pub fn new(amount: PackingParams, fee: PackingParams) -> Self {
        Self { amount, fee }
    }

    pub fn from_config(config: &ProtocolConfig) -> Self {
        Self::new(config.amount_packing, config.fee_packing)
    }

    pub fn params(&self, class: PrecisionClass) -> PackingParams {
        match class {
            PrecisionClass::Amount => self.amount,
            PrecisionClass::Fee => self.fee,
        }
    }

    pub fn max_representable(&self, class: PrecisionClass) -> BigUint {
        self.params(class).max_value()
    }

    /// Packs `amount` into its fixed-point word, rounding down.
    pub fn pack(&self, amount: &BigUint, class: PrecisionClass) -> Result<u64, CodecError> {
        self.pack_field(&class.to_string(), amount, class)
    }

    /// Rounds `amount` down to the nearest value the packed word can carry.
    pub fn clean(&self, amount: &BigUint, class: PrecisionClass) -> Result<BigUint, CodecError> {
        self.clean_field(&class.to_string(), amount, class)
    }

    /// Decodes a packed word back into its integer value.
    pub fn unpack(&self, packed: u64, class: PrecisionClass) -> BigUint {
        let params = self.params(class);
        let exponent = (packed & u64::from(params.max_exponent())) as u32;
        let mantissa = packed >> params.exponent_bits;
        BigUint::from(mantissa) * BigUint::from(10u32).pow(exponent)
    }

    pub(crate) fn pack_field(
        &self,
        field: &str,
        amount: &BigUint,
        class: PrecisionClass,
    ) -> Result<u64, CodecError> {
        let params = self.params(class);
        let (mantissa, exponent) = self.split(field, amount, class)?;
        Ok((mantissa << params.exponent_bits) | u64::from(exponent))
    }

    pub(crate) fn clean_field(
        &self,
        field: &str,
        amount: &BigUint,
        class: PrecisionClass,
    ) -> Result<BigUint, CodecError> {
        let (mantissa, exponent) = self.split(field, amount, class)?;
        Ok(BigUint::from(mantissa) * BigUint::from(10u32).pow(exponent))
    }

    /// Splits an amount into (mantissa, exponent), dropping trailing digits
    /// until the mantissa fits its budget. Anything above `max_value` is
    /// rejected, even where rounding down would reach it.
    fn split(
        &self,
        field: &str,
        amount: &BigUint,
        class: PrecisionClass,
    ) -> Result<(u64, u32), CodecError> {
        let params = self.params(class);
        if !params.fits_word() {
            return Err(CodecError::range(
                field,
                RangeViolation::Unrepresentable(format!(
                    "nothing ({}+{} bit budget)",
                    params.mantissa_bits, params.exponent_bits
                )),
            ));
        }
        let max_value = params.max_value();
        let unrepresentable = || {
            CodecError::range(
                field,
                RangeViolation::Unrepresentable(max_value.to_string()),
            )
        };
        if amount > &max_value {
            return Err(unrepresentable());
        }

        let max_mantissa = BigUint::from(params.max_mantissa());
        let ten = BigUint::from(10u32);
        let mut mantissa = amount.clone();
        let mut exponent = 0u32;
        while mantissa > max_mantissa {
            mantissa /= &ten;
            exponent += 1;
            if exponent > params.max_exponent() {
                return Err(unrepresentable());
            }
        }

        let mantissa = mantissa.to_u64().ok_or_else(unrepresentable)?;
        Ok((mantissa, exponent))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
