//! Inventory item domain model.
//!
//! # Responsibility
//! - Define the canonical record stored in the inventory collection.
//! - Provide validation used by repository write paths.
//!
//! # Invariants
//! - `id` is unique across the collection and never reused.
//! - `id` ordering (lexicographic) is the pagination contract; ids are
//!   immutable once assigned.
//! - `quantity` is never negative.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Canonical inventory record.
///
/// Fields the repository filters or sorts on (`id`, `owner_id`, `name`) are
/// concrete; everything else a surrounding service stores alongside them
/// travels through `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable caller-assigned identifier. Sort key for pagination.
    pub id: String,
    /// Identifier of the owning user/account.
    pub owner_id: String,
    /// Display name. Indexed (descending, non-unique) at initialization.
    pub name: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Units on hand. Never negative.
    #[serde(default)]
    pub quantity: i64,
    /// Arbitrary additional attributes, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Item {
    /// Creates an item with the required identity fields set and everything
    /// else empty.
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            name: name.into(),
            description: None,
            quantity: 0,
            extra: serde_json::Map::new(),
        }
    }

    /// Checks the write-path invariants.
    ///
    /// # Errors
    /// - `EmptyId` when `id` is empty or whitespace-only.
    /// - `EmptyOwner` when `owner_id` is empty or whitespace-only.
    /// - `NegativeQuantity` when `quantity < 0`.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.trim().is_empty() {
            return Err(ItemValidationError::EmptyId);
        }
        if self.owner_id.trim().is_empty() {
            return Err(ItemValidationError::EmptyOwner);
        }
        if self.quantity < 0 {
            return Err(ItemValidationError::NegativeQuantity(self.quantity));
        }
        Ok(())
    }
}

/// Validation failure for item write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    EmptyId,
    EmptyOwner,
    NegativeQuantity(i64),
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "item id must not be empty"),
            Self::EmptyOwner => write!(f, "item owner_id must not be empty"),
            Self::NegativeQuantity(quantity) => {
                write!(f, "item quantity must not be negative, got {quantity}")
            }
        }
    }
}

impl Error for ItemValidationError {}

#[cfg(test)]
mod tests {
    use super::{Item, ItemValidationError};

    #[test]
    fn valid_item_passes_validation() {
        let item = Item::new("item-1", "owner-1", "Widget");
        assert!(item.validate().is_ok());
    }

    #[test]
    fn empty_id_is_rejected() {
        let item = Item::new("  ", "owner-1", "Widget");
        assert_eq!(item.validate(), Err(ItemValidationError::EmptyId));
    }

    #[test]
    fn empty_owner_is_rejected() {
        let item = Item::new("item-1", "", "Widget");
        assert_eq!(item.validate(), Err(ItemValidationError::EmptyOwner));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let mut item = Item::new("item-1", "owner-1", "Widget");
        item.quantity = -3;
        assert_eq!(
            item.validate(),
            Err(ItemValidationError::NegativeQuantity(-3))
        );
    }

    #[test]
    fn extra_attributes_round_trip_through_json() {
        let mut item = Item::new("item-1", "owner-1", "Widget");
        item.extra
            .insert("color".to_string(), serde_json::json!("blue"));

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["color"], serde_json::json!("blue"));

        let back: Item = serde_json::from_value(value).unwrap();
        assert_eq!(back, item);
    }
}
