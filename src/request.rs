//! Swap requests and the negotiation state machine
//!
//! ```text
//! pending ──accept (seller)───▶ accepted
//!    │ ────decline (seller)───▶ declined
//!    └─────cancel (requester)─▶ cancelled
//! ```
//!
//! Only `pending` has outgoing edges. A request counts as *active* while it is
//! `pending` or `accepted`.
use super::book::Book;
use super::error::{LedgerError, Result};
use super::types::{BookId, RequestId, TimeStamp, UserId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(
    minicbor::Encode, minicbor::Decode, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq,
)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Accepted,
    #[n(2)]
    Declined,
    #[n(3)]
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Declined => "declined",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Active requests block a second request for the same book by the same requester.
    pub fn is_active(&self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Accepted)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl FromStr for RequestStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "declined" => Ok(RequestStatus::Declined),
            "cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(LedgerError::validation(format!(
                "unknown request status '{other}'"
            ))),
        }
    }
}

/// A status change a caller may ask for. There is no way back to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Accept,
    Decline,
    Cancel,
}

impl Transition {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.parse::<RequestStatus>() {
            Ok(RequestStatus::Accepted) => Ok(Transition::Accept),
            Ok(RequestStatus::Declined) => Ok(Transition::Decline),
            Ok(RequestStatus::Cancelled) => Ok(Transition::Cancel),
            _ => Err(LedgerError::validation(
                "status must be one of accepted, declined, cancelled",
            )),
        }
    }

    pub fn target(&self) -> RequestStatus {
        match self {
            Transition::Accept => RequestStatus::Accepted,
            Transition::Decline => RequestStatus::Declined,
            Transition::Cancel => RequestStatus::Cancelled,
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[n(0)]
    pub id: RequestId,
    #[n(1)]
    pub book: BookId,
    #[n(2)]
    pub seller: UserId, // owner of the book when the request was opened
    #[n(3)]
    pub requester: UserId,
    #[n(4)]
    pub message: String,
    #[n(5)]
    pub contact_details: Option<String>,
    #[n(6)]
    pub status: RequestStatus,
    #[n(7)]
    pub version: u64,
    #[n(8)]
    pub created_at: TimeStamp<Utc>,
    #[n(9)]
    pub updated_at: TimeStamp<Utc>,
}

impl Request {
    /// A fresh `pending` request against `book`. The seller is copied from the book's owner.
    pub fn open(
        id: RequestId,
        book: &Book,
        requester: UserId,
        message: String,
        contact_details: Option<String>,
    ) -> Self {
        let now = TimeStamp::new();
        Self {
            id,
            book: book.id.clone(),
            seller: book.owner.clone(),
            requester,
            message,
            contact_details: contact_details.filter(|c| !c.trim().is_empty()),
            status: RequestStatus::Pending,
            version: 1,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Checks that `caller` may perform `transition`, then that the request is still
    /// pending, and applies it.
    pub fn transition(&mut self, transition: Transition, caller: &UserId) -> Result<()> {
        match transition {
            Transition::Accept | Transition::Decline if *caller != self.seller => {
                return Err(LedgerError::forbidden(
                    "only the seller may accept or decline",
                ));
            }
            Transition::Cancel if *caller != self.requester => {
                return Err(LedgerError::forbidden("only the requester may cancel"));
            }
            _ => {}
        }

        if self.status != RequestStatus::Pending {
            return Err(LedgerError::invalid_operation(format!(
                "request is not pending (current status: {})",
                self.status.as_str()
            )));
        }

        self.status = transition.target();
        self.version += 1;
        self.updated_at = TimeStamp::new();
        Ok(())
    }
}
