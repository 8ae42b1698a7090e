//! CEP input mask.
//!
//! Turns whatever is in the postal-code field into the `NNNNN-NNN` display
//! form while the user types.

use std::sync::LazyLock;

use regex::Regex;

/// Display length of a fully masked CEP (`NNNNN-NNN`).
pub const MASKED_LEN: usize = 9;

/// Number of digits in a complete CEP.
pub const CEP_DIGITS: usize = 8;

// ASCII classes on purpose: `\d` in the regex crate also matches other scripts' digits.
static NON_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9]").expect("static pattern"));
static SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{5})([0-9]{1,3})").expect("static pattern"));

/// Digit-only projection of a raw field value.
pub fn cep_digits(raw: &str) -> String {
    NON_DIGIT.replace_all(raw, "").into_owned()
}

/// Format a raw field value as a (possibly partial) masked CEP.
///
/// Non-digits are dropped, a hyphen goes after the fifth digit once a sixth
/// one exists, and the result is capped at `NNNNN-NNN`.
pub fn format_cep(raw: &str) -> String {
    let digits = cep_digits(raw);
    let mut masked = SPLIT.replacen(&digits, 1, "$1-$2").into_owned();
    // Only ASCII digits and '-' remain, so byte truncation is safe.
    masked.truncate(MASKED_LEN);
    masked
}

/// True once the field holds exactly eight digits.
pub fn is_complete(raw: &str) -> bool {
    cep_digits(raw).len() == CEP_DIGITS
}
