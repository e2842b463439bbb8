//! Order line items.
//!
//! Stored form is a versioned envelope:
//!
//! ```json
//! {"version": 1, "items": [{"product_id": "P1", "quantity": 2}]}
//! ```
//!
//! Older rows hold a bare `{"P1": 2, "P2": 1}` object. Both decode to the
//! same [`OrderItems`]; key order of the legacy form is kept.

use std::collections::HashSet;
use std::fmt;

use orderdesk_shared::types::ProductId;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Envelope version written by [`OrderItems::encode`].
pub const ORDER_ITEMS_VERSION: u64 = 1;

/// Errors decoding or validating line items.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LineItemError {
    /// Not a JSON object of a recognized shape.
    #[error("malformed line items: {0}")]
    Malformed(String),

    /// Envelope with a version this build does not understand.
    #[error("unsupported line item version {0}")]
    UnsupportedVersion(u64),

    /// A product id is blank.
    #[error("line item has an empty product id")]
    EmptyProductId,

    /// Quantity is not a positive whole number.
    #[error("invalid quantity for product {product_id}: {value}")]
    InvalidQuantity {
        /// Product the quantity belongs to.
        product_id: String,
        /// Raw value as found in the input.
        value: String,
    },

    /// The same product appears twice.
    #[error("product {0} appears more than once")]
    DuplicateProduct(String),
}

/// One `(product, quantity)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product referenced by this line.
    pub product_id: ProductId,
    /// Number of units, always at least one.
    pub quantity: u32,
}

/// Ordered, validated line items of an order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderItems {
    items: Vec<LineItem>,
}

impl OrderItems {
    /// Validates and wraps `items`.
    pub fn new(items: Vec<LineItem>) -> Result<Self, LineItemError> {
        validate(&items)?;
        Ok(Self { items })
    }

    /// Decodes either the envelope or the legacy object form.
    pub fn decode(raw: &str) -> Result<Self, LineItemError> {
        let OrderedEntries(entries) =
            serde_json::from_str(raw).map_err(|e| LineItemError::Malformed(e.to_string()))?;
        Self::from_entries(entries)
    }

    /// Encodes to the current envelope version.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_envelope().to_string()
    }

    /// Line items in order.
    #[must_use]
    pub fn as_slice(&self) -> &[LineItem] {
        &self.items
    }

    /// Iterates line items in order.
    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    /// Number of line items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the order has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn to_envelope(&self) -> Value {
        let items: Vec<Value> = self
            .items
            .iter()
            .map(|item| {
                serde_json::json!({
                    "product_id": item.product_id.as_str(),
                    "quantity": item.quantity,
                })
            })
            .collect();
        serde_json::json!({ "version": ORDER_ITEMS_VERSION, "items": items })
    }

    fn from_entries(entries: Vec<(String, Value)>) -> Result<Self, LineItemError> {
        let envelope_items = entries
            .iter()
            .find(|(key, value)| key == "items" && value.is_array());

        match envelope_items {
            Some((_, items)) => {
                let version = entries
                    .iter()
                    .find(|(key, _)| key == "version")
                    .and_then(|(_, v)| v.as_u64())
                    .ok_or_else(|| {
                        LineItemError::Malformed("envelope is missing a numeric version".into())
                    })?;
                if version != ORDER_ITEMS_VERSION {
                    return Err(LineItemError::UnsupportedVersion(version));
                }
                Self::from_envelope_items(items)
            }
            None => Self::from_legacy(entries),
        }
    }

    fn from_envelope_items(items: &Value) -> Result<Self, LineItemError> {
        let raw = items.as_array().map(Vec::as_slice).unwrap_or_default();
        let mut parsed = Vec::with_capacity(raw.len());
        for entry in raw {
            let product_id = entry
                .get("product_id")
                .and_then(Value::as_str)
                .ok_or_else(|| LineItemError::Malformed("item is missing product_id".into()))?;
            let quantity = entry
                .get("quantity")
                .ok_or_else(|| LineItemError::Malformed("item is missing quantity".into()))?;
            parsed.push(LineItem {
                product_id: ProductId::from(product_id),
                quantity: parse_quantity(product_id, quantity)?,
            });
        }
        Self::new(parsed)
    }

    fn from_legacy(entries: Vec<(String, Value)>) -> Result<Self, LineItemError> {
        let mut parsed = Vec::with_capacity(entries.len());
        for (product_id, value) in entries {
            let quantity = parse_quantity(&product_id, &value)?;
            parsed.push(LineItem {
                product_id: ProductId::from(product_id),
                quantity,
            });
        }
        Self::new(parsed)
    }
}

fn validate(items: &[LineItem]) -> Result<(), LineItemError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.product_id.as_str().trim().is_empty() {
            return Err(LineItemError::EmptyProductId);
        }
        if item.quantity == 0 {
            return Err(LineItemError::InvalidQuantity {
                product_id: item.product_id.to_string(),
                value: "0".to_string(),
            });
        }
        if !seen.insert(item.product_id.as_str()) {
            return Err(LineItemError::DuplicateProduct(item.product_id.to_string()));
        }
    }
    Ok(())
}

fn parse_quantity(product_id: &str, value: &Value) -> Result<u32, LineItemError> {
    value
        .as_u64()
        .and_then(|q| u32::try_from(q).ok())
        .filter(|q| *q > 0)
        .ok_or_else(|| LineItemError::InvalidQuantity {
            product_id: product_id.to_string(),
            value: value.to_string(),
        })
}

impl<'a> IntoIterator for &'a OrderItems {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Serialize for OrderItems {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_envelope().serialize(serializer)
    }
}

/// Accepts the envelope, the legacy object, or either one embedded as a JSON
/// string.
impl<'de> Deserialize<'de> for OrderItems {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(OrderItemsVisitor)
    }
}

struct OrderItemsVisitor;

impl<'de> Visitor<'de> for OrderItemsVisitor {
    type Value = OrderItems;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a line item object or a JSON string containing one")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        OrderItems::decode(v).map_err(E::custom)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        let entries = collect_entries(map)?;
        OrderItems::from_entries(entries).map_err(de::Error::custom)
    }
}

/// Object entries in document order.
struct OrderedEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                collect_entries(map).map(OrderedEntries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

fn collect_entries<'de, A: MapAccess<'de>>(mut map: A) -> Result<Vec<(String, Value)>, A::Error> {
    let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
    while let Some((key, value)) = map.next_entry::<String, Value>()? {
        entries.push((key, value));
    }
    Ok(entries)
}
