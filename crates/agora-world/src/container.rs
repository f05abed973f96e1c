//! Capacity-bounded item containers.
//!
//! A [`ResourceContainer`] backs both player inventories and home
//! storage. Each item occupies `quantity * unit_capacity` capacity units
//! (unit capacity comes from the [`Catalog`]). When a capacity is set,
//! the total load never exceeds it. Entries whose quantity reaches zero
//! are removed.
//!
//! All arithmetic is checked. Every mutating operation validates fully
//! before touching the map, so a failed call leaves the container as it
//! was.

use std::collections::BTreeMap;

use agora_types::ItemId;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::WorldError;

/// A named bag of items with an optional capacity budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContainer {
    /// Display name (e.g. `inventory`, `locker`).
    name: String,

    /// Item quantities. Never holds a zero entry.
    items: BTreeMap<ItemId, u32>,

    /// Maximum load in capacity units, or `None` for unbounded.
    capacity: Option<u32>,
}

impl ResourceContainer {
    /// Create an empty container.
    pub fn new(name: impl Into<String>, capacity: Option<u32>) -> Self {
        Self {
            name: name.into(),
            items: BTreeMap::new(),
            capacity,
        }
    }

    /// The container's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The capacity budget, if enforced.
    pub const fn capacity(&self) -> Option<u32> {
        self.capacity
    }

    /// Units of `item` held.
    pub fn quantity(&self, item: &str) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    /// Whether at least `qty` units of `item` are held.
    pub fn contains(&self, item: &str, qty: u32) -> bool {
        self.quantity(item) >= qty
    }

    /// All held items in key order.
    pub const fn items(&self) -> &BTreeMap<ItemId, u32> {
        &self.items
    }

    /// Whether the container holds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total capacity units in use.
    pub fn load(&self, catalog: &Catalog) -> Result<u32, WorldError> {
        let mut total: u32 = 0;
        for (item, qty) in &self.items {
            let units = weight(catalog, item.as_str(), *qty)?;
            total = total
                .checked_add(units)
                .ok_or_else(|| WorldError::ArithmeticOverflow {
                    context: format!("load of {}", self.name),
                })?;
        }
        Ok(total)
    }

    /// Capacity units still free, or `None` when unbounded.
    pub fn free(&self, catalog: &Catalog) -> Result<Option<u32>, WorldError> {
        match self.capacity {
            None => Ok(None),
            Some(capacity) => Ok(Some(capacity.saturating_sub(self.load(catalog)?))),
        }
    }

    /// Check that `qty` units of `item` would fit, without adding them.
    pub fn ensure_room(&self, catalog: &Catalog, item: &ItemId, qty: u32) -> Result<(), WorldError> {
        let required = weight(catalog, item.as_str(), qty)?;
        if let Some(free) = self.free(catalog)?
            && required > free
        {
            return Err(WorldError::NoCapacity {
                container: self.name.clone(),
                item: item.clone(),
                required,
                free,
            });
        }
        Ok(())
    }

    /// Add `qty` units of `item`.
    ///
    /// Fails without side effects if the item is unknown, the container
    /// lacks room, or the count would overflow.
    pub fn add(&mut self, catalog: &Catalog, item: &ItemId, qty: u32) -> Result<(), WorldError> {
        self.ensure_room(catalog, item, qty)?;
        let updated = self
            .quantity(item.as_str())
            .checked_add(qty)
            .ok_or_else(|| WorldError::ArithmeticOverflow {
                context: format!("quantity of {item} in {}", self.name),
            })?;
        if updated > 0 {
            self.items.insert(item.clone(), updated);
        }
        Ok(())
    }

    /// Remove `qty` units of `item`, dropping the entry when it reaches zero.
    pub fn remove(&mut self, item: &ItemId, qty: u32) -> Result<(), WorldError> {
        let available = self.quantity(item.as_str());
        let remaining = available
            .checked_sub(qty)
            .ok_or_else(|| WorldError::Insufficient {
                item: item.clone(),
                requested: qty,
                available,
            })?;
        if remaining == 0 {
            self.items.remove(item);
        } else {
            self.items.insert(item.clone(), remaining);
        }
        Ok(())
    }

    /// Raise the capacity budget by `bonus` units. No-op when unbounded.
    pub fn extend_capacity(&mut self, bonus: u32) -> Result<(), WorldError> {
        if let Some(capacity) = self.capacity {
            let raised = capacity
                .checked_add(bonus)
                .ok_or_else(|| WorldError::ArithmeticOverflow {
                    context: format!("capacity of {}", self.name),
                })?;
            self.capacity = Some(raised);
        }
        Ok(())
    }
}

/// Move `qty` units of `item` from `source` to `destination`.
///
/// Both sides are validated before either is mutated.
pub fn transfer(
    catalog: &Catalog,
    source: &mut ResourceContainer,
    destination: &mut ResourceContainer,
    item: &ItemId,
    qty: u32,
) -> Result<(), WorldError> {
    let available = source.quantity(item.as_str());
    if available < qty {
        return Err(WorldError::Insufficient {
            item: item.clone(),
            requested: qty,
            available,
        });
    }
    destination.add(catalog, item, qty)?;
    source.remove(item, qty)
}

fn weight(catalog: &Catalog, item: &str, qty: u32) -> Result<u32, WorldError> {
    catalog
        .unit_capacity(item)?
        .checked_mul(qty)
        .ok_or_else(|| WorldError::ArithmeticOverflow {
            context: format!("weight of {qty} {item}"),
        })
}
