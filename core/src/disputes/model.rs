use crate::documents::model::{DisputeId, DocumentId, TransactionId};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

pub const REASON_CODES_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    UnauthorizedCharge,
    DuplicateCharge,
    IncorrectAmount,
    ServiceNotProvided,
    ProductNotReceived,
    DefectiveProduct,
    IncorrectFee,
    BillingError,
    Other,
}

impl ReasonCode {
    pub const ALL: [ReasonCode; 9] = [
        ReasonCode::UnauthorizedCharge,
        ReasonCode::DuplicateCharge,
        ReasonCode::IncorrectAmount,
        ReasonCode::ServiceNotProvided,
        ReasonCode::ProductNotReceived,
        ReasonCode::DefectiveProduct,
        ReasonCode::IncorrectFee,
        ReasonCode::BillingError,
        ReasonCode::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::UnauthorizedCharge => "unauthorized_charge",
            ReasonCode::DuplicateCharge => "duplicate_charge",
            ReasonCode::IncorrectAmount => "incorrect_amount",
            ReasonCode::ServiceNotProvided => "service_not_provided",
            ReasonCode::ProductNotReceived => "product_not_received",
            ReasonCode::DefectiveProduct => "defective_product",
            ReasonCode::IncorrectFee => "incorrect_fee",
            ReasonCode::BillingError => "billing_error",
            ReasonCode::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReasonCode::UnauthorizedCharge => "Unauthorized charge",
            ReasonCode::DuplicateCharge => "Duplicate charge",
            ReasonCode::IncorrectAmount => "Incorrect amount",
            ReasonCode::ServiceNotProvided => "Service not provided",
            ReasonCode::ProductNotReceived => "Product not received",
            ReasonCode::DefectiveProduct => "Defective product",
            ReasonCode::IncorrectFee => "Incorrect fee",
            ReasonCode::BillingError => "Billing error",
            ReasonCode::Other => "Other",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasonCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReasonCode::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| CoreError::InvalidInput(format!("unknown dispute reason code: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Draft,
    Sent,
    Resolved,
}

impl DisputeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::Draft => "draft",
            DisputeStatus::Sent => "sent",
            DisputeStatus::Resolved => "resolved",
        }
    }

    /// Forward only: draft -> sent -> resolved, or draft -> resolved.
    pub fn can_move_to(&self, next: DisputeStatus) -> bool {
        matches!(
            (self, next),
            (DisputeStatus::Draft, DisputeStatus::Sent)
                | (DisputeStatus::Draft, DisputeStatus::Resolved)
                | (DisputeStatus::Sent, DisputeStatus::Resolved)
        )
    }

    pub fn transition(&self, next: DisputeStatus) -> CoreResult<DisputeStatus> {
        if self.can_move_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition(format!(
                "dispute cannot move from {} to {}",
                self.as_str(),
                next.as_str()
            )))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeCase {
    pub id: DisputeId,
    pub document_id: DocumentId,
    pub transaction_id: TransactionId,
    pub reason_code: ReasonCode,
    pub detail: String,
    pub letter: String,
    pub version: u32,
    pub supersedes: Option<DisputeId>,
    pub status: DisputeStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
