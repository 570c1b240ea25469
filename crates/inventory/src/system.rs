use fulfillsync_core::{Quantity, Sku};

/// Read/write contract of the external inventory system.
///
/// Implementations own transport concerns (auth, retries, timeouts). Both calls
/// address a single stock unit; no transaction spans several units.
pub trait InventorySystem: Send + Sync {
    type Error: core::fmt::Display;

    /// Current available quantity, or `Ok(None)` when the unit has no record.
    fn get_quantity(&self, sku: &Sku) -> Result<Option<Quantity>, Self::Error>;

    /// Overwrite the available quantity of an existing unit.
    fn set_quantity(&self, sku: &Sku, quantity: Quantity) -> Result<(), Self::Error>;
}

impl<T: InventorySystem + ?Sized> InventorySystem for &T {
    type Error = T::Error;

    fn get_quantity(&self, sku: &Sku) -> Result<Option<Quantity>, Self::Error> {
        (**self).get_quantity(sku)
    }

    fn set_quantity(&self, sku: &Sku, quantity: Quantity) -> Result<(), Self::Error> {
        (**self).set_quantity(sku, quantity)
    }
}
