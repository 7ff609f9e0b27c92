//! National document validation (CPF for persons, CNPJ for businesses).

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use clientreg_core::{DomainError, DomainResult, ValueObject};

const CPF_LEN: usize = 11;
const CNPJ_LEN: usize = 14;

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Party type of a client: individual (`PERSON`) or organization (`BUSINESS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClientKind {
    Person,
    Business,
}

impl ClientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientKind::Person => "PERSON",
            ClientKind::Business => "BUSINESS",
        }
    }

    /// Number of digits a normalized document must have for this kind.
    pub fn document_len(&self) -> usize {
        match self {
            ClientKind::Person => CPF_LEN,
            ClientKind::Business => CNPJ_LEN,
        }
    }

    fn document_label(&self) -> &'static str {
        match self {
            ClientKind::Person => "CPF",
            ClientKind::Business => "CNPJ",
        }
    }
}

impl core::fmt::Display for ClientKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PERSON" => Ok(ClientKind::Person),
            "BUSINESS" => Ok(ClientKind::Business),
            _ => Err(DomainError::invalid_party_type(s)),
        }
    }
}

/// How strictly documents are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Length check on the normalized digits only.
    #[default]
    Structural,
    /// Length check plus the mod-11 check digits of CPF/CNPJ.
    CheckDigits,
}

impl FromStr for ValidationMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structural" => Ok(ValidationMode::Structural),
            "check_digits" | "checksum" => Ok(ValidationMode::CheckDigits),
            other => Err(DomainError::validation(format!(
                "unknown document validation mode: {other}"
            ))),
        }
    }
}

/// A validated, digits-only document number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(String);

impl ValueObject for Document {}

impl Document {
    /// Normalize `raw` and check it against `kind` under `mode`.
    pub fn parse(raw: &str, kind: ClientKind, mode: ValidationMode) -> DomainResult<Self> {
        let digits = normalize(raw);

        if digits.len() != kind.document_len() {
            return Err(DomainError::validation(format!(
                "{} must have {} digits for type {}",
                kind.document_label(),
                kind.document_len(),
                kind
            )));
        }

        if mode == ValidationMode::CheckDigits && !has_valid_check_digits(&digits, kind) {
            return Err(DomainError::validation(format!(
                "invalid {}",
                kind.document_label()
            )));
        }

        Ok(Self(digits))
    }

    /// Wrap an already-normalized value read back from storage.
    pub fn from_trusted(digits: impl Into<String>) -> Self {
        Self(digits.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::borrow::Borrow<str> for Document {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Document {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strip every character that is not an ASCII digit.
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Structural validation of `raw` for `kind`.
pub fn validate(raw: &str, kind: ClientKind) -> DomainResult<Document> {
    Document::parse(raw, kind, ValidationMode::Structural)
}

/// Validate against a party type given as free text (e.g. straight from a request body).
///
/// Unknown party types fail with [`DomainError::InvalidPartyType`] regardless of the document.
pub fn validate_raw(raw: &str, kind: &str) -> DomainResult<Document> {
    let kind: ClientKind = kind.parse()?;
    validate(raw, kind)
}

fn has_valid_check_digits(digits: &str, kind: ClientKind) -> bool {
    let d: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();

    // Repeated-digit sequences pass the arithmetic but are never issued.
    if d.iter().all(|&x| x == d[0]) {
        return false;
    }

    match kind {
        ClientKind::Person => {
            let first = check_digit(&d[..9], (2..=10).rev());
            let second = check_digit(&d[..10], (2..=11).rev());
            d[9] == first && d[10] == second
        }
        ClientKind::Business => {
            let first = check_digit(&d[..12], CNPJ_FIRST_WEIGHTS.iter().copied());
            let second = check_digit(&d[..13], CNPJ_SECOND_WEIGHTS.iter().copied());
            d[12] == first && d[13] == second
        }
    }
}

fn check_digit(digits: &[u32], weights: impl Iterator<Item = u32>) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formatted_and_bare_cpf_validate_identically() {
        let formatted = validate("075.210.019-07", ClientKind::Person).unwrap();
        let bare = validate("07521001907", ClientKind::Person).unwrap();
        assert_eq!(formatted, bare);
        assert_eq!(bare.as_str(), "07521001907");
    }

    #[test]
    fn short_cpf_is_rejected() {
        let err = validate("123", ClientKind::Person).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn fourteen_digit_cnpj_passes_structural_check() {
        let doc = validate("12345678901234", ClientKind::Business).unwrap();
        assert_eq!(doc.as_str(), "12345678901234");
    }

    #[test]
    fn cpf_length_is_not_accepted_for_business() {
        let err = validate("07521001907", ClientKind::Business).unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("CNPJ must have 14 digits for type BUSINESS")
        );
    }

    #[test]
    fn unknown_party_type_always_fails() {
        for doc in ["07521001907", "12345678901234", "", "abc"] {
            let err = validate_raw(doc, "ALIEN").unwrap_err();
            assert!(matches!(err, DomainError::InvalidPartyType(_)));
        }
    }

    #[test]
    fn party_type_parsing_is_case_insensitive() {
        assert_eq!("person".parse::<ClientKind>().unwrap(), ClientKind::Person);
        assert_eq!(" Business ".parse::<ClientKind>().unwrap(), ClientKind::Business);
    }

    #[test]
    fn check_digits_accept_real_numbers() {
        let mode = ValidationMode::CheckDigits;
        assert!(Document::parse("075.210.019-07", ClientKind::Person, mode).is_ok());
        assert!(Document::parse("11.222.333/0001-81", ClientKind::Business, mode).is_ok());
    }

    #[test]
    fn check_digits_reject_bad_numbers() {
        let mode = ValidationMode::CheckDigits;
        assert!(Document::parse("07521001908", ClientKind::Person, mode).is_err());
        assert!(Document::parse("12345678901234", ClientKind::Business, mode).is_err());
        assert!(Document::parse("111.111.111-11", ClientKind::Person, mode).is_err());
    }

    #[test]
    fn validation_mode_parses_config_values() {
        assert_eq!("structural".parse::<ValidationMode>().unwrap(), ValidationMode::Structural);
        assert_eq!("CHECK_DIGITS".parse::<ValidationMode>().unwrap(), ValidationMode::CheckDigits);
        assert!("strict".parse::<ValidationMode>().is_err());
    }

    proptest! {
        #[test]
        fn normalize_keeps_only_digits(raw in ".{0,40}") {
            let out = normalize(&raw);
            prop_assert!(out.chars().all(|c| c.is_ascii_digit()));
        }

        #[test]
        fn punctuation_does_not_change_the_outcome(digits in "[0-9]{11}", sep in "[.\\- /]{0,3}") {
            let decorated = format!("{}{}{}{}{}", &digits[..3], sep, &digits[3..6], sep, &digits[6..]);
            prop_assert_eq!(
                validate(&decorated, ClientKind::Person),
                validate(&digits, ClientKind::Person)
            );
        }

        #[test]
        fn wrong_length_is_always_rejected(digits in "[0-9]{0,20}") {
            prop_assume!(digits.len() != 11);
            prop_assert!(validate(&digits, ClientKind::Person).is_err());
        }
    }
}
