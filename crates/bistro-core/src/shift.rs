//! # Shift
//!
//! An operating session. Orders opened during a shift are numbered
//! 1, 2, 3… in the order they are created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreResult, ShiftError};
use crate::validation::validate_required;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shift {
    pub id: String,
    pub attendant_id: String,

    /// Last order number handed out. Zero until the first order.
    pub current_order_number: i64,

    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Shift {
    pub fn open(attendant_id: impl Into<String>) -> CoreResult<Self> {
        let attendant_id = attendant_id.into();
        validate_required("attendant_id", &attendant_id)?;

        Ok(Shift {
            id: Uuid::new_v4().to_string(),
            attendant_id,
            current_order_number: 0,
            opened_at: Utc::now(),
            closed_at: None,
        })
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Advances the counter and returns the new order number.
    pub fn next_order_number(&mut self) -> CoreResult<i64> {
        if !self.is_open() {
            return Err(ShiftError::AlreadyClosed.into());
        }

        self.current_order_number += 1;
        Ok(self.current_order_number)
    }

    pub fn close(&mut self) -> CoreResult<()> {
        if !self.is_open() {
            return Err(ShiftError::AlreadyClosed.into());
        }

        self.closed_at = Some(Utc::now());
        Ok(())
    }
}
