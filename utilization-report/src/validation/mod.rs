use once_cell::sync::Lazy;
use regex::Regex;
use time::{Date, OffsetDateTime};

/// Ranges longer than this many days get an advisory warning.
pub const LONG_RANGE_DAYS: i64 = 31;

pub const LONG_RANGE_WARNING: &str =
    "The requested data is for more than 31 days, report generation might take a while. Please wait.";

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .expect("identifier pattern must compile")
});

/// True when `s`, once trimmed, is an 8-4-4-4-12 hex grouped identifier.
pub fn is_valid_identifier(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.is_empty() && IDENTIFIER_PATTERN.is_match(trimmed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCheck {
    /// `start` is at least one calendar day before `end`.
    pub ok: bool,
    /// Advisory only; never blocks submission.
    pub warn_long_range: bool,
}

/// Compare two calendar dates. Works at day resolution only.
pub fn validate_range(start: Date, end: Date) -> RangeCheck {
    let days = (end - start).whole_days();
    RangeCheck {
        ok: days >= 1,
        warn_long_range: days > LONG_RANGE_DAYS,
    }
}

/// Same as [`validate_range`] after dropping the time of day.
pub fn validate_datetime_range(start: OffsetDateTime, end: OffsetDateTime) -> RangeCheck {
    validate_range(start.date(), end.date())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    CustomerId,
    SubscriptionId,
    DateRange,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a valid Customer ID")]
    InvalidCustomerId,
    #[error("Please enter a valid Subscription ID")]
    InvalidSubscriptionId,
    #[error("Please make sure start date is at least 1 day before the end date")]
    DateOrder,
    #[error("Dates cannot be in the future")]
    FutureDate,
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            Self::InvalidCustomerId => Field::CustomerId,
            Self::InvalidSubscriptionId => Field::SubscriptionId,
            Self::DateOrder | Self::FutureDate => Field::DateRange,
        }
    }
}

/// Outcome of validating one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub customer_id_valid: bool,
    pub subscription_id_valid: bool,
    pub date_range_valid: bool,
    pub warning: Option<String>,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_for(&self, field: Field) -> Option<ValidationError> {
        self.errors.iter().copied().find(|e| e.field() == field)
    }
}

/// Identifier checks shared by both screens.
pub fn validate_identifiers(customer_id: &str, subscription_id: &str) -> ValidationResult {
    let customer_id_valid = is_valid_identifier(customer_id);
    let subscription_id_valid = is_valid_identifier(subscription_id);

    let mut errors = Vec::new();
    if !customer_id_valid {
        errors.push(ValidationError::InvalidCustomerId);
    }
    if !subscription_id_valid {
        errors.push(ValidationError::InvalidSubscriptionId);
    }

    ValidationResult {
        customer_id_valid,
        subscription_id_valid,
        date_range_valid: true,
        warning: None,
        errors,
    }
}

/// Full check of the report form: identifiers, date order, no future dates,
/// and the long-range advisory.
pub fn validate_report_input(
    customer_id: &str,
    subscription_id: &str,
    start: Date,
    end: Date,
    today: Date,
) -> ValidationResult {
    let mut result = validate_identifiers(customer_id, subscription_id);
    let range = validate_range(start, end);

    if !range.ok {
        result.date_range_valid = false;
        result.errors.push(ValidationError::DateOrder);
    } else if start > today || end > today {
        result.date_range_valid = false;
        result.errors.push(ValidationError::FutureDate);
    }

    if range.warn_long_range {
        result.warning = Some(LONG_RANGE_WARNING.to_string());
    }

    result
}
