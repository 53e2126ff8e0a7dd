//! # Payment Types
//!
//! Payments recorded against an order. A payment is immutable once recorded;
//! corrections are made by canceling the order, not by editing payments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::money::Money;
use crate::validation::validate_payment_amount;

/// Accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Visa,
    MasterCard,
    Ticket,
    Vr,
    AmericanExpress,
    Elo,
    DinersClub,
    Hipercard,
    VisaElectron,
    Maestro,
    Alelo,
    PayPal,
    Other,
}

/// A payment applied to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentOrder {
    pub id: String,
    pub order_id: String,
    pub amount: Money,
    pub method: PaymentMethod,
    pub is_paid: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PaymentOrder {
    /// Records a settled payment. The amount must be strictly positive.
    pub fn new(order_id: impl Into<String>, amount: Money, method: PaymentMethod) -> CoreResult<Self> {
        validate_payment_amount(amount)?;

        Ok(PaymentOrder {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            amount,
            method,
            is_paid: true,
            created_at: Utc::now(),
        })
    }
}
