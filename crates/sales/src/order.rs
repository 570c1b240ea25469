use serde::{Deserialize, Serialize};

use fulfillsync_core::{DomainError, OrderId, Quantity, Sku, ValueObject};

/// Order status as reported by the sales channel.
///
/// Parsing is case-insensitive; unknown statuses are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    #[default]
    Pending,
    Fulfilled,
    Shipped,
    Complete,
    Other(String),
}

impl OrderStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => OrderStatus::Pending,
            "fulfilled" => OrderStatus::Fulfilled,
            "shipped" => OrderStatus::Shipped,
            "complete" => OrderStatus::Complete,
            _ => OrderStatus::Other(raw.to_string()),
        }
    }

    /// Orders in these states have already left the warehouse and must not be
    /// fulfilled again.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            OrderStatus::Fulfilled | OrderStatus::Shipped | OrderStatus::Complete
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Complete => "complete",
            OrderStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        OrderStatus::parse(&value)
    }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Line item exactly as delivered by the order source (unvalidated).
///
/// Decoding never fails on field types: a non-string stock unit becomes `None`
/// and a quantity that is not a whole number becomes `0`, so the item is
/// dropped by normalization instead of rejecting the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawLineItem {
    #[serde(default, deserialize_with = "lenient::sku")]
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity: i64,
}

impl RawLineItem {
    pub fn new(sku: impl Into<String>, quantity: i64) -> Self {
        Self {
            sku: Some(sku.into()),
            quantity,
        }
    }
}

/// Raw order record produced by the order source.
///
/// Immutable once ingested; the channel may name the identifier `id` or `order_id`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, alias = "order_id", deserialize_with = "lenient::order_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::status")]
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "lenient::items")]
    pub items: Vec<RawLineItem>,
}

impl Order {
    pub fn new(id: impl Into<String>, status: OrderStatus, items: Vec<RawLineItem>) -> Self {
        Self {
            id: Some(id.into()),
            status,
            items,
        }
    }

    pub fn pending(id: impl Into<String>, items: Vec<RawLineItem>) -> Self {
        Self::new(id, OrderStatus::Pending, items)
    }
}

/// Validated line item: non-empty stock unit, strictly positive quantity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItem {
    pub sku: Sku,
    pub quantity: Quantity,
}

impl ValueObject for LineItem {}

impl TryFrom<&RawLineItem> for LineItem {
    type Error = DomainError;

    fn try_from(raw: &RawLineItem) -> Result<Self, Self::Error> {
        let sku = Sku::parse(raw.sku.as_deref().unwrap_or_default())?;
        let quantity = Quantity::requested(raw.quantity)?;
        Ok(Self { sku, quantity })
    }
}

/// An order that survived normalization, with only its valid line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedOrder {
    pub id: OrderId,
    pub items: Vec<LineItem>,
}

/// Field decoders that map malformed values to "invalid" instead of erroring.
mod lenient {
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer};

    use super::{OrderStatus, RawLineItem};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Int(i64),
        Float(f64),
        Text(String),
        Other(IgnoredAny),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Item {
        Object(RawLineItem),
        Other(IgnoredAny),
    }

    pub(super) fn sku<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        Ok(match Scalar::deserialize(de)? {
            Scalar::Text(s) => Some(s),
            _ => None,
        })
    }

    pub(super) fn quantity<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
        Ok(match Scalar::deserialize(de)? {
            Scalar::Int(n) => n,
            Scalar::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
            Scalar::Text(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        })
    }

    pub(super) fn order_id<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        Ok(match Scalar::deserialize(de)? {
            Scalar::Text(s) => Some(s),
            Scalar::Int(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Missing, null or non-string statuses count as pending.
    pub(super) fn status<'de, D: Deserializer<'de>>(de: D) -> Result<OrderStatus, D::Error> {
        Ok(match Scalar::deserialize(de)? {
            Scalar::Text(s) => OrderStatus::parse(&s),
            _ => OrderStatus::Pending,
        })
    }

    /// Entries that are not objects decode as empty items, which normalization drops.
    pub(super) fn items<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<RawLineItem>, D::Error> {
        let items: Option<Vec<Item>> = Option::deserialize(de)?;
        Ok(items
            .unwrap_or_default()
            .into_iter()
            .map(|item| match item {
                Item::Object(raw) => raw,
                Item::Other(_) => RawLineItem::default(),
            })
            .collect())
    }
}
