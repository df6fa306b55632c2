//! Deterministic form validation.
//!
//! Rules run in a fixed priority order and stop at the first violation, so a
//! form with several problems always reports the same one.
//!
//! The precision rule ("at most 7 decimal places") is an addition to the
//! nine user-facing rules: it rejects positive amounts that cannot be
//! expressed in stroops.

use serde::Serialize;

use crate::form::{Field, FormData};

pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const MAX_EXTERNAL_URL_CHARS: usize = 200;
pub const MAX_IMAGE_HASH_CHARS: usize = 100;

/// Fractional digits of the native asset (1 unit = 10^7 stroops).
pub const AMOUNT_DECIMALS: usize = 7;
const STROOPS_PER_UNIT: i128 = 10_000_000;

/// First rule a form violated, tied to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: Field,
    pub message: &'static str,
}

impl ValidationError {
    fn new(field: Field, message: &'static str) -> Self {
        Self { field, message }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Why a target amount string was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    /// Not a plain decimal number, or too large to represent.
    Malformed,
    /// Zero or negative.
    NotPositive,
    /// More fractional digits than the asset supports.
    TooPrecise,
}

/// Validate `form`, returning the first violated rule.
pub fn validate(form: &FormData) -> Result<(), ValidationError> {
    require_text(
        &form.name,
        Field::Name,
        "Pool name is required",
        None,
    )?;
    require_text(
        &form.description,
        Field::Description,
        "Description is required",
        Some((MAX_DESCRIPTION_CHARS, "Description must be 500 characters or less")),
    )?;
    require_text(
        &form.external_url,
        Field::ExternalUrl,
        "External URL is required",
        Some((MAX_EXTERNAL_URL_CHARS, "External URL must be 200 characters or less")),
    )?;
    require_text(
        &form.image_hash,
        Field::ImageHash,
        "Image hash is required",
        Some((MAX_IMAGE_HASH_CHARS, "Image hash must be 100 characters or less")),
    )?;

    match parse_amount(&form.target_amount) {
        Ok(_) => {}
        Err(AmountError::TooPrecise) => {
            return Err(ValidationError::new(
                Field::TargetAmount,
                "Target amount can have at most 7 decimal places",
            ))
        }
        Err(AmountError::Malformed | AmountError::NotPositive) => {
            return Err(ValidationError::new(
                Field::TargetAmount,
                "Target amount must be greater than 0",
            ))
        }
    }

    if parse_duration_days(&form.duration_days).is_none() {
        return Err(ValidationError::new(
            Field::DurationDays,
            "Duration must be greater than 0 days",
        ));
    }

    Ok(())
}

fn require_text(
    value: &str,
    field: Field,
    empty_message: &'static str,
    max: Option<(usize, &'static str)>,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, empty_message));
    }
    if let Some((limit, message)) = max {
        if value.chars().count() > limit {
            return Err(ValidationError::new(field, message));
        }
    }
    Ok(())
}

/// Parse a decimal amount string into stroops.
///
/// Accepts an optional sign, an integer part and/or a fractional part
/// (`"5"`, `"5."`, `".5"`, `"0.0000001"`). Exponents are not accepted.
/// Sign and zero are checked before precision, so `"-0.00000001"` is
/// [`AmountError::NotPositive`] rather than [`AmountError::TooPrecise`].
pub fn parse_amount(raw: &str) -> Result<i128, AmountError> {
    let s = raw.trim();
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };

    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return Err(AmountError::Malformed);
    }

    let is_zero = int_part.bytes().chain(frac_part.bytes()).all(|b| b == b'0');
    if negative || is_zero {
        return Err(AmountError::NotPositive);
    }
    if frac_part.len() > AMOUNT_DECIMALS {
        return Err(AmountError::TooPrecise);
    }

    let whole = digits_to_i128(int_part)?;
    let frac = digits_to_i128(frac_part)? * 10i128.pow((AMOUNT_DECIMALS - frac_part.len()) as u32);

    whole
        .checked_mul(STROOPS_PER_UNIT)
        .and_then(|w| w.checked_add(frac))
        .ok_or(AmountError::Malformed)
}

fn digits_to_i128(digits: &str) -> Result<i128, AmountError> {
    digits.bytes().try_fold(0i128, |acc, b| {
        acc.checked_mul(10)
            .and_then(|v| v.checked_add(i128::from(b - b'0')))
            .ok_or(AmountError::Malformed)
    })
}

/// Parse a strictly positive whole number of days.
pub fn parse_duration_days(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|d| *d > 0)
}
