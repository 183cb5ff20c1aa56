//! Per-field checkout validators.
//!
//! Each field has a validator returning a [`FieldCheck`]. The validators are
//! composed per step by [`validate_address`] and [`validate_payment`], which
//! collect every failing field rather than stopping at the first one.

use core::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

// `\d` in `regex` matches any Unicode digit; these fields take ASCII only.

/// Four groups of four digits separated by single spaces.
static CARD_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4} [0-9]{4} [0-9]{4} [0-9]{4}$").expect("Invalid regex")
});

/// `MM/YY` with a month between 01 and 12.
static EXPIRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/([0-9]{2})$").expect("Invalid regex"));

static CVC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{3}$").expect("Invalid regex"));

// =============================================================================
// Fields and results
// =============================================================================

/// Form field identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    FirstName,
    LastName,
    Address,
    CardNumber,
    ExpiryDate,
    Cvc,
}

impl Field {
    /// Form name of the field.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Address => "address",
            Self::CardNumber => "cardNumber",
            Self::ExpiryDate => "expiryDate",
            Self::Cvc => "cvc",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single field validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCheck {
    Valid,
    Invalid(&'static str),
}

impl FieldCheck {
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// A failing field and the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

/// Every failing field of one submission, in form order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    fn record(&mut self, field: Field, check: FieldCheck) {
        if let FieldCheck::Invalid(message) = check {
            self.0.push(FieldError { field, message });
        }
    }

    fn into_result<T>(self, ok: impl FnOnce() -> T) -> Result<T, Self> {
        if self.0.is_empty() { Ok(ok()) } else { Err(self) }
    }

    /// All field errors.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// The message for `field`, if it failed.
    #[must_use]
    pub fn message_for(&self, field: Field) -> Option<&'static str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message)
    }

    /// Whether `field` failed.
    #[must_use]
    pub fn has(&self, field: Field) -> bool {
        self.message_for(field).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// Field validators
// =============================================================================

fn required(value: &str, message: &'static str) -> FieldCheck {
    if value.trim().is_empty() {
        FieldCheck::Invalid(message)
    } else {
        FieldCheck::Valid
    }
}

/// First name must be non-empty after trimming.
#[must_use]
pub fn first_name(value: &str) -> FieldCheck {
    required(value, "First name is required")
}

/// Last name must be non-empty after trimming.
#[must_use]
pub fn last_name(value: &str) -> FieldCheck {
    required(value, "Last name is required")
}

/// Address must be non-empty after trimming.
#[must_use]
pub fn address(value: &str) -> FieldCheck {
    required(value, "Address is required")
}

/// Card number must be exactly `dddd dddd dddd dddd`.
#[must_use]
pub fn card_number(value: &str) -> FieldCheck {
    if CARD_NUMBER_RE.is_match(value) {
        FieldCheck::Valid
    } else {
        FieldCheck::Invalid("Invalid card number")
    }
}

/// Expiry must be `MM/YY` and not before the month containing `today`.
#[must_use]
pub fn expiry_date(value: &str, today: NaiveDate) -> FieldCheck {
    match check_expiry(value, today) {
        Ok(_) => FieldCheck::Valid,
        Err(message) => FieldCheck::Invalid(message),
    }
}

fn check_expiry(value: &str, today: NaiveDate) -> Result<ExpiryDate, &'static str> {
    match ExpiryDate::parse(value) {
        None => Err("Invalid expiry date"),
        Some(expiry) if expiry.is_expired(today) => Err("Expiry date is in the past"),
        Some(expiry) => Ok(expiry),
    }
}

/// CVC must be exactly three digits.
#[must_use]
pub fn cvc(value: &str) -> FieldCheck {
    if CVC_RE.is_match(value) {
        FieldCheck::Valid
    } else {
        FieldCheck::Invalid("Invalid CVC")
    }
}

// =============================================================================
// Address step
// =============================================================================

/// Raw address form as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub address: String,
}

impl AddressInput {
    /// Fast gate: every field has some content. Format is not checked.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.first_name.is_empty() && !self.last_name.is_empty() && !self.address.is_empty()
    }
}

/// Validated shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInfo {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
}

impl AddressInfo {
    /// Input pre-filled from this address, for editing after going back.
    #[must_use]
    pub fn to_input(&self) -> AddressInput {
        AddressInput {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            address: self.address.clone(),
        }
    }
}

/// Validate the address step.
///
/// # Errors
///
/// Returns every field that is empty after trimming.
pub fn validate_address(input: &AddressInput) -> Result<AddressInfo, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.record(Field::FirstName, first_name(&input.first_name));
    errors.record(Field::LastName, last_name(&input.last_name));
    errors.record(Field::Address, address(&input.address));

    errors.into_result(|| AddressInfo {
        first_name: input.first_name.trim().to_owned(),
        last_name: input.last_name.trim().to_owned(),
        address: input.address.trim().to_owned(),
    })
}

// =============================================================================
// Payment step
// =============================================================================

/// Raw payment form as typed by the user.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default)]
    pub cvc: String,
}

impl fmt::Debug for PaymentInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentInput")
            .field("card_number", &"[REDACTED]")
            .field("expiry_date", &self.expiry_date)
            .field("cvc", &"[REDACTED]")
            .finish()
    }
}

impl PaymentInput {
    /// Fast gate: every field has some content. Format is not checked.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.card_number.is_empty() && !self.expiry_date.is_empty() && !self.cvc.is_empty()
    }
}

/// Card expiry month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ExpiryDate {
    year: i32,
    month: u32,
}

impl ExpiryDate {
    /// Parse `MM/YY`; the two-digit year is taken as 2000 + YY.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let captures = EXPIRY_RE.captures(value)?;
        let month = captures.get(1)?.as_str().parse().ok()?;
        let year: i32 = captures.get(2)?.as_str().parse().ok()?;
        Some(Self {
            year: 2000 + year,
            month,
        })
    }

    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Strictly before the month containing `today`. The current month is
    /// still valid.
    #[must_use]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        (self.year, self.month) < (today.year(), today.month())
    }
}

impl fmt::Display for ExpiryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.year % 100)
    }
}

/// A validated card number.
#[derive(Clone)]
pub struct CardNumber(SecretString);

impl CardNumber {
    /// Last four digits.
    #[must_use]
    pub fn last4(&self) -> &str {
        let digits = self.0.expose_secret();
        digits.get(digits.len().saturating_sub(4)..).unwrap_or("")
    }

    /// Masked form safe for logs and receipts ("**** **** **** 4242").
    #[must_use]
    pub fn masked(&self) -> String {
        format!("**** **** **** {}", self.last4())
    }

    /// The full number. Only hand this to a payment processor.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CardNumber").field(&self.masked()).finish()
    }
}

/// Validated payment details.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct PaymentInfo {
    pub card_number: CardNumber,
    pub expiry: ExpiryDate,
    pub cvc: SecretString,
}

impl fmt::Debug for PaymentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentInfo")
            .field("card_number", &self.card_number)
            .field("expiry", &self.expiry)
            .field("cvc", &"[REDACTED]")
            .finish()
    }
}

/// Validate the payment step against the month containing `today`.
///
/// # Errors
///
/// Returns every field that fails its format or expiry rule.
pub fn validate_payment(
    input: &PaymentInput,
    today: NaiveDate,
) -> Result<PaymentInfo, ValidationErrors> {
    let expiry = check_expiry(&input.expiry_date, today);

    let mut errors = ValidationErrors::default();
    errors.record(Field::CardNumber, card_number(&input.card_number));
    if let Err(message) = expiry {
        errors.record(Field::ExpiryDate, FieldCheck::Invalid(message));
    }
    errors.record(Field::Cvc, cvc(&input.cvc));

    match expiry {
        Ok(expiry) if errors.is_empty() => Ok(PaymentInfo {
            card_number: CardNumber(SecretString::from(input.card_number.clone())),
            expiry,
            cvc: SecretString::from(input.cvc.clone()),
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn payment(card: &str, expiry: &str, cvc: &str) -> PaymentInput {
        PaymentInput {
            card_number: card.to_owned(),
            expiry_date: expiry.to_owned(),
            cvc: cvc.to_owned(),
        }
    }

    #[test]
    fn test_required_fields_trim_whitespace() {
        assert_eq!(first_name("   "), FieldCheck::Invalid("First name is required"));
        assert!(first_name(" Ada ").is_valid());
        assert!(!address("").is_valid());
    }

    #[test]
    fn test_validate_address_collects_all_errors() {
        let errors = validate_address(&AddressInput::default()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.has(Field::FirstName));
        assert!(errors.has(Field::LastName));
        assert!(errors.has(Field::Address));
    }

    #[test]
    fn test_validate_address_trims_values() {
        let info = validate_address(&AddressInput {
            first_name: " Ada ".to_owned(),
            last_name: "Lovelace".to_owned(),
            address: "  12 St James's Square ".to_owned(),
        })
        .unwrap();
        assert_eq!(info.first_name, "Ada");
        assert_eq!(info.address, "12 St James's Square");
    }

    #[test]
    fn test_card_number_format() {
        assert!(card_number("4242 4242 4242 4242").is_valid());
        assert!(!card_number("4242-4242-4242-4242").is_valid());
        assert!(!card_number("4242424242424242").is_valid());
        assert!(!card_number("4242  4242 4242 4242").is_valid());
        assert!(!card_number("4242 4242 4242 424").is_valid());
        assert!(!card_number(" 4242 4242 4242 4242").is_valid());
    }

    #[test]
    fn test_expiry_format() {
        let today = date(2024, 6, 15);
        assert_eq!(expiry_date("13/30", today), FieldCheck::Invalid("Invalid expiry date"));
        assert_eq!(expiry_date("00/30", today), FieldCheck::Invalid("Invalid expiry date"));
        assert_eq!(expiry_date("1/30", today), FieldCheck::Invalid("Invalid expiry date"));
        assert_eq!(expiry_date("01-30", today), FieldCheck::Invalid("Invalid expiry date"));
    }

    #[test]
    fn test_expiry_past_month_rejected() {
        assert_eq!(
            expiry_date("01/24", date(2024, 2, 1)),
            FieldCheck::Invalid("Expiry date is in the past")
        );
        assert!(!expiry_date("12/23", date(2024, 1, 1)).is_valid());
    }

    #[test]
    fn test_expiry_current_month_is_valid() {
        assert!(expiry_date("06/24", date(2024, 6, 30)).is_valid());
        assert!(expiry_date("12/99", date(2024, 6, 30)).is_valid());
    }

    #[test]
    fn test_expiry_display() {
        let expiry = ExpiryDate::parse("03/27").unwrap();
        assert_eq!(expiry.month(), 3);
        assert_eq!(expiry.year(), 2027);
        assert_eq!(expiry.to_string(), "03/27");
    }

    #[test]
    fn test_cvc_format() {
        assert!(cvc("123").is_valid());
        assert!(!cvc("12").is_valid());
        assert!(!cvc("1234").is_valid());
        assert!(!cvc("12a").is_valid());
    }

    #[test]
    fn test_non_ascii_digits_rejected() {
        assert!(!card_number("٤٢٤٢ ٤٢٤٢ ٤٢٤٢ ٤٢٤٢").is_valid());
        assert!(!cvc("１２３").is_valid());
        assert!(!expiry_date("12/９９", date(2024, 6, 1)).is_valid());

        let errors = validate_payment(
            &payment("٤٢٤٢ ٤٢٤٢ ٤٢٤٢ ٤٢٤٢", "12/99", "１２３"),
            date(2024, 6, 1),
        )
        .unwrap_err();
        assert!(errors.has(Field::CardNumber));
        assert!(errors.has(Field::Cvc));
        assert!(!errors.has(Field::ExpiryDate));
    }

    #[test]
    fn test_validate_payment_success() {
        let info =
            validate_payment(&payment("4242 4242 4242 4242", "12/99", "123"), date(2024, 6, 1))
                .unwrap();
        assert_eq!(info.card_number.last4(), "4242");
        assert_eq!(info.card_number.masked(), "**** **** **** 4242");
        assert_eq!(info.expiry.year(), 2099);
    }

    #[test]
    fn test_validate_payment_reports_each_field() {
        let errors =
            validate_payment(&payment("4242-4242", "01/24", "9"), date(2024, 6, 1)).unwrap_err();
        assert_eq!(
            errors.errors().iter().map(|e| e.field).collect::<Vec<_>>(),
            [Field::CardNumber, Field::ExpiryDate, Field::Cvc]
        );
        assert_eq!(
            errors.message_for(Field::ExpiryDate),
            Some("Expiry date is in the past")
        );
    }

    #[test]
    fn test_payment_debug_redacts_secrets() {
        let input = payment("4242 4242 4242 4242", "12/99", "987");
        let info = validate_payment(&input, date(2024, 6, 1)).unwrap();

        for output in [format!("{input:?}"), format!("{info:?}")] {
            assert!(output.contains("[REDACTED]"));
            assert!(!output.contains("4242 4242 4242 4242"));
            assert!(!output.contains("987"));
        }
    }

    #[test]
    fn test_gating_ignores_format() {
        assert!(payment("x", "y", "z").is_complete());
        assert!(!payment("4242 4242 4242 4242", "", "123").is_complete());
        assert!(
            AddressInput {
                first_name: " ".to_owned(),
                last_name: "b".to_owned(),
                address: "c".to_owned(),
            }
            .is_complete()
        );
    }

    #[test]
    fn test_validation_errors_display() {
        let errors = validate_address(&AddressInput {
            first_name: "Ada".to_owned(),
            ..AddressInput::default()
        })
        .unwrap_err();
        assert_eq!(
            errors.to_string(),
            "lastName: Last name is required; address: Address is required"
        );
    }
}
