//! One consolidated fulfillment request per batch.
//!
//! The request is all-or-nothing: a rejected submission fails the whole batch,
//! no per-unit partial submission is attempted.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use fulfillsync_core::{BatchId, DomainError, DomainResult, Quantity, Sku};
use fulfillsync_sales::DemandMap;

/// One stock unit and the aggregated quantity to ship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLine {
    pub sku: Sku,
    pub quantity: Quantity,
}

/// The consolidated request sent to the fulfillment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentRequest {
    /// Seller-side reference for the provider order (the batch identifier).
    pub batch_id: BatchId,
    pub lines: Vec<RequestLine>,
}

impl FulfillmentRequest {
    /// Build a request with one line per demanded stock unit (sorted by unit).
    pub fn from_demand(batch_id: BatchId, demand: &DemandMap) -> DomainResult<Self> {
        if demand.is_empty() {
            return Err(DomainError::validation(
                "cannot build a fulfillment request without demand",
            ));
        }
        let lines = demand
            .iter()
            .map(|(sku, quantity)| RequestLine {
                sku: sku.clone(),
                quantity,
            })
            .collect();
        Ok(Self { batch_id, lines })
    }

    pub fn total_units(&self) -> Quantity {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// What the provider returns for an accepted request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub confirmation_id: Option<String>,
}

/// Contract of the external fulfillment provider.
pub trait FulfillmentProvider: Send + Sync {
    type Error: core::fmt::Display;

    /// Submit the request as one atomic call.
    fn submit(&self, request: &FulfillmentRequest) -> Result<SubmissionReceipt, Self::Error>;
}

impl<T: FulfillmentProvider + ?Sized> FulfillmentProvider for &T {
    type Error = T::Error;

    fn submit(&self, request: &FulfillmentRequest) -> Result<SubmissionReceipt, Self::Error> {
        (**self).submit(request)
    }
}

/// Overall result of submitting a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Submission {
    Accepted { confirmation_id: Option<String> },
    Rejected { reason: String },
}

impl Submission {
    pub fn is_success(&self) -> bool {
        matches!(self, Submission::Accepted { .. })
    }

    pub fn confirmation_id(&self) -> Option<&str> {
        match self {
            Submission::Accepted { confirmation_id } => confirmation_id.as_deref(),
            Submission::Rejected { .. } => None,
        }
    }
}

/// Turns a demand map into one provider call.
#[derive(Debug, Clone)]
pub struct Submitter<P> {
    provider: P,
}

impl<P: FulfillmentProvider> Submitter<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn submit(&self, batch_id: BatchId, demand: &DemandMap) -> Submission {
        let request = match FulfillmentRequest::from_demand(batch_id, demand) {
            Ok(request) => request,
            Err(e) => {
                error!(batch_id = %batch_id, error = %e, "fulfillment request not built");
                return Submission::Rejected {
                    reason: e.to_string(),
                };
            }
        };

        match self.provider.submit(&request) {
            Ok(receipt) => {
                info!(
                    batch_id = %batch_id,
                    units = request.lines.len(),
                    total = request.total_units().units(),
                    confirmation_id = receipt.confirmation_id.as_deref().unwrap_or(""),
                    "consolidated fulfillment request accepted"
                );
                Submission::Accepted {
                    confirmation_id: receipt.confirmation_id,
                }
            }
            Err(e) => {
                error!(batch_id = %batch_id, error = %e, "consolidated fulfillment request rejected");
                Submission::Rejected {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeProvider {
        reject_with: Option<String>,
        seen: Mutex<Vec<FulfillmentRequest>>,
    }

    impl FulfillmentProvider for FakeProvider {
        type Error = String;

        fn submit(&self, request: &FulfillmentRequest) -> Result<SubmissionReceipt, Self::Error> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reject_with {
                Some(reason) => Err(reason.clone()),
                None => Ok(SubmissionReceipt {
                    confirmation_id: Some("MCF-1".to_string()),
                }),
            }
        }
    }

    fn demand(entries: &[(&str, u64)]) -> DemandMap {
        entries
            .iter()
            .map(|(s, q)| (Sku::parse(s).unwrap(), Quantity::new(*q)))
            .collect()
    }

    #[test]
    fn sends_one_request_with_every_unit() {
        let provider = FakeProvider::default();
        let batch_id = BatchId::new();

        let submission = Submitter::new(&provider).submit(batch_id, &demand(&[("B", 1), ("A", 4)]));

        assert!(submission.is_success());
        assert_eq!(submission.confirmation_id(), Some("MCF-1"));

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].batch_id, batch_id);
        let skus: Vec<&str> = seen[0].lines.iter().map(|l| l.sku.as_str()).collect();
        assert_eq!(skus, vec!["A", "B"]);
        assert_eq!(seen[0].total_units(), Quantity::new(5));
    }

    #[test]
    fn provider_rejection_fails_the_submission() {
        let provider = FakeProvider {
            reject_with: Some("invalid address".to_string()),
            ..FakeProvider::default()
        };

        let submission = Submitter::new(&provider).submit(BatchId::new(), &demand(&[("A", 1)]));

        assert_eq!(
            submission,
            Submission::Rejected {
                reason: "invalid address".to_string()
            }
        );
        assert_eq!(submission.confirmation_id(), None);
    }

    #[test]
    fn empty_demand_is_never_sent() {
        let provider = FakeProvider::default();
        let submission = Submitter::new(&provider).submit(BatchId::new(), &DemandMap::default());

        assert!(!submission.is_success());
        assert!(provider.seen.lock().unwrap().is_empty());
    }
}
