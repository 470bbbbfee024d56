use rust_decimal::Decimal;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::constants::*;
use crate::error::{ApiError, ApiResult};

pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn now_ts() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Current UTC date as YYYY-MM-DD, the format transaction dates are stored in.
pub fn today() -> String {
    let d = OffsetDateTime::now_utc().date();
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

pub fn validate_string_length(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!(
            "{} cannot be empty",
            field_name
        )));
    }
    if value.len() > max_length {
        return Err(ApiError::Validation(format!(
            "{} must be less than {} characters",
            field_name, max_length
        )));
    }
    Ok(())
}

pub fn validate_positive_amount(amount: Decimal) -> ApiResult<()> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::Validation(
            "Amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_date(value: &str) -> ApiResult<()> {
    Date::parse(value, DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| ApiError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", value)))
}

pub fn validate_month(value: &str) -> ApiResult<()> {
    // A month is valid iff its first day parses as a date
    Date::parse(&format!("{}-01", value), DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| ApiError::Validation(format!("Invalid month '{}', expected YYYY-MM", value)))
}

pub fn validate_limit(limit: Option<u32>) -> ApiResult<u32> {
    match limit {
        Some(0) => Err(ApiError::Validation(
            "Limit must be greater than 0".to_string(),
        )),
        Some(l) if l > MAX_LIMIT => Err(ApiError::Validation(format!(
            "Limit cannot exceed {}",
            MAX_LIMIT
        ))),
        Some(l) => Ok(l),
        None => Ok(DEFAULT_TRANSACTIONS_LIMIT),
    }
}

pub fn validate_offset(offset: Option<u32>) -> ApiResult<u32> {
    match offset {
        Some(o) if o > MAX_OFFSET => Err(ApiError::Validation(format!(
            "Offset cannot exceed {}",
            MAX_OFFSET
        ))),
        Some(o) => Ok(o),
        None => Ok(0),
    }
}

/// Balances and amounts are stored as decimal text; a row that fails to parse
/// is corrupt, not a caller mistake.
pub fn parse_stored_decimal(raw: &str, what: &str) -> ApiResult<Decimal> {
    raw.parse::<Decimal>()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt {} value '{}': {}", what, raw, e)))
}
