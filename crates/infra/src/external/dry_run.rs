use std::convert::Infallible;

use tracing::info;

use fulfillsync_fulfillment::{FulfillmentProvider, FulfillmentRequest, SubmissionReceipt};

use crate::config::{AmazonConfig, Marketplace};

/// Fulfillment provider that logs the consolidated request instead of sending it.
///
/// Every request is accepted; the confirmation id is derived from the batch.
#[derive(Debug, Clone)]
pub struct DryRunFulfillmentProvider {
    marketplace: Marketplace,
}

impl DryRunFulfillmentProvider {
    pub fn new(config: &AmazonConfig) -> Self {
        Self {
            marketplace: config.marketplace,
        }
    }
}

impl FulfillmentProvider for DryRunFulfillmentProvider {
    type Error = Infallible;

    fn submit(&self, request: &FulfillmentRequest) -> Result<SubmissionReceipt, Self::Error> {
        for line in &request.lines {
            info!(
                marketplace_id = self.marketplace.marketplace_id(),
                sku = %line.sku,
                quantity = line.quantity.units(),
                "dry run: would request fulfillment"
            );
        }
        Ok(SubmissionReceipt {
            confirmation_id: Some(format!(
                "dry-run-{}-{}",
                self.marketplace.code(),
                request.batch_id
            )),
        })
    }
}
