//! Payloads accepted by account creation and order insertion.
//!
//! The JSON keys are fixed by existing callers and stay in Portuguese; the
//! Rust field names do not.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

/// Calendar date format of the `data` field (`2021-08-15`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time-of-day format of the `hora` field (`15:00:00`).
pub const TIME_FORMAT: &str = "%H:%M:%S";

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Account creation request: `{ "usuario", "senha", "email" }`.
///
/// `password` is the plaintext; it is hashed before it reaches the store and
/// is redacted from `Debug` output.
#[derive(Clone, Deserialize, Validate)]
pub struct NewAccount {
    #[serde(rename = "usuario")]
    #[validate(length(min = 1, max = 255))]
    pub username: String,

    #[serde(rename = "senha")]
    #[validate(length(min = 1))]
    pub password: String,

    #[validate(email, length(max = 255))]
    pub email: String,
}

impl NewAccount {
    /// Decode and validate a raw JSON account payload.
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        let account: Self = serde_json::from_str(raw)
            .map_err(|e| CoreError::Validation(format!("invalid account payload: {e}")))?;
        account.check()?;
        Ok(account)
    }

    /// Run field validation, mapping failures to [`CoreError::Validation`].
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Order batches
// ---------------------------------------------------------------------------

/// Order insertion request: `{ "pedidos": [..], "data": "YYYY-MM-DD", "hora": "HH:MM:SS" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderBatch {
    #[serde(rename = "pedidos")]
    pub item_ids: Vec<i32>,
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "hora")]
    pub time: String,
}

/// An order batch whose date and time have been parsed and checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOrderBatch {
    pub item_ids: Vec<i32>,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl NewOrderBatch {
    /// Decode a raw JSON order payload. Date and time are parsed later by
    /// [`NewOrderBatch::parse`].
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw)
            .map_err(|e| CoreError::Validation(format!("invalid order payload: {e}")))
    }

    /// Parse `date` and `time` and reject an empty item list.
    ///
    /// Item order and duplicates are kept as given.
    pub fn parse(&self) -> Result<ParsedOrderBatch, CoreError> {
        if self.item_ids.is_empty() {
            return Err(CoreError::Validation(
                "order batch must contain at least one item id".into(),
            ));
        }

        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT).map_err(|e| {
            CoreError::Validation(format!(
                "invalid date '{}', expected YYYY-MM-DD: {e}",
                self.date
            ))
        })?;

        let time = NaiveTime::parse_from_str(&self.time, TIME_FORMAT).map_err(|e| {
            CoreError::Validation(format!(
                "invalid time '{}', expected HH:MM:SS: {e}",
                self.time
            ))
        })?;

        Ok(ParsedOrderBatch {
            item_ids: self.item_ids.clone(),
            date,
            time,
        })
    }
}
