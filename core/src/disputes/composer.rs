//! Fixed-template dispute letters.
//!
//! A letter depends only on its inputs: no clock, no randomness, no state.
//! Sender name and date are left as placeholders for the user to fill in.

use super::model::ReasonCode;
use crate::documents::model::DocumentType;
use crate::error::{CoreError, CoreResult};
use crate::ledger::model::{Direction, Transaction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisputeConfig {
    pub max_detail_chars: usize,
}

impl Default for DisputeConfig {
    fn default() -> Self {
        Self {
            max_detail_chars: 2000,
        }
    }
}

impl DisputeConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_detail_chars == 0 {
            return Err(CoreError::Config("disputes.max_detail_chars must be positive".to_string()));
        }
        Ok(())
    }
}

/// Facts about the disputed charge that the letter cites.
pub struct LetterFacts<'a> {
    pub document_type: DocumentType,
    pub account_identifier: Option<&'a str>,
    pub transaction: &'a Transaction,
}

/// A rendered letter plus the validated inputs it was rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedLetter {
    pub reason: ReasonCode,
    /// Detail text after length capping, exactly as it appears in the body.
    pub detail: String,
    pub body: String,
}

pub struct DisputeComposer {
    max_detail_chars: usize,
}

impl DisputeComposer {
    pub fn new(config: &DisputeConfig) -> Self {
        Self {
            max_detail_chars: config.max_detail_chars,
        }
    }

    /// Validates the reason code and renders the letter.
    pub fn compose(&self, facts: &LetterFacts<'_>, reason_code: &str, detail: &str) -> CoreResult<ComposedLetter> {
        let reason: ReasonCode = reason_code.parse()?;
        Ok(ComposedLetter {
            reason,
            detail: self.cap_detail(detail),
            body: self.render(facts, reason, detail),
        })
    }

    pub fn cap_detail(&self, detail: &str) -> String {
        detail.chars().take(self.max_detail_chars).collect()
    }

    pub fn render(&self, facts: &LetterFacts<'_>, reason: ReasonCode, detail: &str) -> String {
        let tx = facts.transaction;
        let detail = self.cap_detail(detail);
        let (recipient, statute) = addressee(facts.document_type);
        let kind = match tx.direction() {
            Direction::Debit => "charge",
            Direction::Credit => "credit",
        };

        let detail = if detail.trim().is_empty() {
            "(none provided)".to_string()
        } else {
            detail
        };
        let lines = [
            "[Your Name]".to_string(),
            "[Your Address]".to_string(),
            "[City, State ZIP]".to_string(),
            String::new(),
            "[Date]".to_string(),
            String::new(),
            recipient.to_string(),
            String::new(),
            format!(
                "Re: {} - {} of ${:.2} on {}",
                reason.label(),
                kind,
                tx.amount(),
                tx.date()
            ),
            format!(
                "Account: {}",
                facts.account_identifier.unwrap_or("[Account Number]")
            ),
            format!("Transaction reference: {}", tx.id()),
            String::new(),
            "Dear Sir or Madam,".to_string(),
            String::new(),
            format!(
                "I am writing to dispute a {} of ${:.2} dated {}, which appears on my statement as \"{}\".",
                kind,
                tx.amount(),
                tx.date(),
                tx.description()
            ),
            String::new(),
            reason_paragraph(reason).to_string(),
            String::new(),
            "Additional details:".to_string(),
            detail,
            String::new(),
            format!(
                "I ask that you investigate this matter, correct the error and credit my account for the disputed amount together with any related fees or finance charges. {}",
                statute
            ),
            String::new(),
            "Please confirm in writing within 30 days of receiving this letter how the dispute has been resolved. Copies of my supporting records are available on request.".to_string(),
            String::new(),
            "Sincerely,".to_string(),
            String::new(),
            "[Your Name]".to_string(),
        ];
        lines.join("\n")
    }
}

fn addressee(document_type: DocumentType) -> (&'static str, &'static str) {
    match document_type {
        DocumentType::CreditCardStatement => (
            "Card Issuer Billing Disputes Department",
            "I am making this request under the billing error provisions of the Fair Credit Billing Act.",
        ),
        DocumentType::BankStatement => (
            "Bank Customer Disputes Department",
            "I am making this request under the error resolution provisions of the Electronic Fund Transfer Act.",
        ),
        DocumentType::UtilityBill => (
            "Utility Provider Billing Department",
            "I ask that collection of the disputed amount be paused while it is under review.",
        ),
        DocumentType::Invoice | DocumentType::Receipt => (
            "Merchant Customer Service Department",
            "I ask that you treat this as a formal request under applicable consumer protection law.",
        ),
        DocumentType::Other => (
            "Billing Disputes Department",
            "I ask that you treat this as a formal request under applicable consumer protection law.",
        ),
    }
}

fn reason_paragraph(reason: ReasonCode) -> &'static str {
    match reason {
        ReasonCode::UnauthorizedCharge => {
            "I did not authorize this transaction and did not receive any goods or services in exchange for it."
        }
        ReasonCode::DuplicateCharge => {
            "This transaction duplicates another charge for the same purchase. I was billed more than once for a single transaction."
        }
        ReasonCode::IncorrectAmount => {
            "The amount charged does not match the amount I agreed to pay."
        }
        ReasonCode::ServiceNotProvided => {
            "I paid for a service that was not provided as agreed."
        }
        ReasonCode::ProductNotReceived => {
            "I paid for goods that I never received."
        }
        ReasonCode::DefectiveProduct => {
            "The product I received was defective or not as described, and the merchant has not resolved the problem."
        }
        ReasonCode::IncorrectFee => {
            "This fee was charged in error and is not permitted under the terms of my account."
        }
        ReasonCode::BillingError => {
            "This transaction reflects a billing error on my statement."
        }
        ReasonCode::Other => "I believe this transaction is incorrect for the reasons set out below.",
    }
}
