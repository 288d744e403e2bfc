//! Order and Lead Records
//!
//! Append-only records written by the storefront. Neither is mutated or
//! deleted once stored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StorefrontError};

/// Durable record of a completed, paid checkout session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Payment provider session id; at most one order exists per session
    pub session_id: String,

    /// Email reported by the payment provider
    pub email: Option<String>,

    /// Total charged, in minor units
    pub amount_minor: i64,

    /// Purchased line-item display names
    pub items: Vec<String>,

    /// Purchased catalog ids, when the session carried them
    #[serde(default)]
    pub catalog_ids: Vec<String>,

    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Total charged in major units
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.amount_minor, 2)
    }
}

/// Result of an insert-if-absent order write
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderOutcome {
    /// First verification of this session; a new order was stored
    Created,

    /// An order for this session already existed; nothing was written
    AlreadyRecorded,
}

/// Validation rules for call requests
#[derive(Clone, Copy, Debug, Default)]
pub struct CallRequestPolicy {
    pub require_company: bool,
}

/// Contact form as submitted
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CallRequestForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub goals: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

/// Persisted sales lead
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    pub name: String,
    pub email: String,
    pub goals: String,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn present(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

impl CallRequestForm {
    /// Check required fields and build the record to persist
    ///
    /// Whitespace-only values count as missing.
    pub fn validate(&self, policy: CallRequestPolicy) -> Result<CallRequest> {
        let name = present(self.name.as_ref());
        let email = present(self.email.as_ref());
        let goals = present(self.goals.as_ref());
        let company = present(self.company.as_ref());

        let (Some(name), Some(email), Some(goals)) = (name, email, goals) else {
            return Err(StorefrontError::Validation("Missing fields".into()));
        };

        if policy.require_company && company.is_none() {
            return Err(StorefrontError::Validation("Missing fields".into()));
        }

        Ok(CallRequest {
            name,
            email,
            goals,
            company,
            created_at: Utc::now(),
        })
    }
}
