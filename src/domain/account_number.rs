//! Account Number
//!
//! IBAN-style checksum-validated account identifier: a 2-letter country
//! code, 2 check digits, then the national bank/branch/account digits.
//! Validity is defined purely by the ISO 7064 mod-97-10 checksum.
//!
//! Generation is pure and stateless. Collision handling (retrying with the
//! next sequence number when an identifier is already taken) belongs to the
//! caller.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::DomainError;

/// Width of the sequential account part within the national identifier
const ACCOUNT_DIGITS: usize = 11;

/// A checksum-validated account identifier, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Parse and validate an identifier.
    ///
    /// # Errors
    /// - `DomainError::Validation` if the shape is wrong or the mod-97
    ///   checksum does not hold
    pub fn parse(identifier: &str) -> Result<Self, DomainError> {
        if !Self::validate(identifier) {
            return Err(DomainError::validation(format!(
                "invalid account number: {identifier}"
            )));
        }
        Ok(Self(identifier.to_string()))
    }

    /// Check an identifier against the mod-97 rule.
    ///
    /// Rearranges the identifier (first 4 characters moved to the end),
    /// maps letters to their two-digit numeric equivalents (A=10 .. Z=35)
    /// and confirms the resulting numeral mod 97 equals 1.
    pub fn validate(identifier: &str) -> bool {
        if identifier.len() < 5 || !identifier.chars().all(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        let country_ok = identifier[..2].chars().all(|c| c.is_ascii_uppercase());
        let check_ok = identifier[2..4].chars().all(|c| c.is_ascii_digit());
        if !country_ok || !check_ok {
            return false;
        }

        let rearranged = format!("{}{}", &identifier[4..], &identifier[..4]);
        mod97(&rearranged) == Some(1)
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Country code (first two letters).
    pub fn country_code(&self) -> &str {
        &self.0[..2]
    }

    /// Check digits (characters 3 and 4).
    pub fn check_digits(&self) -> &str {
        &self.0[2..4]
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AccountNumber::parse(&value)
    }
}

impl From<AccountNumber> for String {
    fn from(number: AccountNumber) -> Self {
        number.0
    }
}

/// Generates account numbers under a fixed bank/branch prefix.
#[derive(Debug, Clone)]
pub struct AccountNumberGenerator {
    country_code: String,
    bank_code: String,
    branch_code: String,
}

impl AccountNumberGenerator {
    /// Create a generator for the given prefix.
    ///
    /// # Errors
    /// - `DomainError::Validation` if the country code is not 2 uppercase
    ///   letters or the bank/branch codes are not all digits
    pub fn new(
        country_code: &str,
        bank_code: &str,
        branch_code: &str,
    ) -> Result<Self, DomainError> {
        if country_code.len() != 2 || !country_code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(DomainError::validation(format!(
                "country code must be 2 uppercase letters (got {country_code:?})"
            )));
        }
        for (name, code) in [("bank code", bank_code), ("branch code", branch_code)] {
            if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
                return Err(DomainError::validation(format!(
                    "{name} must be numeric (got {code:?})"
                )));
            }
        }

        Ok(Self {
            country_code: country_code.to_string(),
            bank_code: bank_code.to_string(),
            branch_code: branch_code.to_string(),
        })
    }

    /// Generate the identifier for a sequential account number.
    ///
    /// Builds the national part from the fixed bank/branch prefix and the
    /// zero-padded sequence, then computes the two check digits so that the
    /// full identifier satisfies mod-97 == 1.
    pub fn generate(&self, sequence_number: u64) -> AccountNumber {
        let national = format!(
            "{}{}{:0width$}",
            self.bank_code,
            self.branch_code,
            sequence_number,
            width = ACCOUNT_DIGITS
        );

        // Placeholder check digits move to the end with the country code
        let rearranged = format!("{}{}00", national, self.country_code);
        // The rearranged string is alphanumeric by construction
        let remainder = mod97(&rearranged).unwrap_or(0);
        let check_digits = 98 - remainder;

        AccountNumber(format!(
            "{}{:02}{}",
            self.country_code, check_digits, national
        ))
    }
}

/// Reduce an alphanumeric string modulo 97, mapping letters A..Z to 10..35.
///
/// Works digit by digit so identifiers of any length never overflow.
/// Returns `None` if a character is outside `[0-9A-Za-z]`.
fn mod97(input: &str) -> Option<u32> {
    let mut remainder: u32 = 0;
    for ch in input.chars() {
        let value = if ch.is_ascii_digit() {
            ch as u32 - '0' as u32
        } else if ch.is_ascii_alphabetic() {
            ch.to_ascii_uppercase() as u32 - 'A' as u32 + 10
        } else {
            return None;
        };

        if value < 10 {
            remainder = (remainder * 10 + value) % 97;
        } else {
            remainder = (remainder * 100 + value) % 97;
        }
    }
    Some(remainder)
}
