use uuid::Uuid;
use std::collections::HashMap;
use serde::{Deserialize, Serialize};

/// Stock tracking for a single listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryItem {
    pub listing_id: Uuid,
    pub available_quantity: u32,
    pub reserved_quantity: u32,
    pub sold_quantity: u32,
}

/// In-memory inventory manager
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryManager {
    inventory: HashMap<Uuid, InventoryItem>,
}

impl InventoryManager {
    pub fn new() -> Self {
        Self {
            inventory: HashMap::new(),
        }
    }

    /// Initialize stock for a listing, replacing any previous record
    pub fn initialize(&mut self, listing_id: Uuid, quantity: u32) {
        self.inventory.insert(listing_id, InventoryItem {
            listing_id,
            available_quantity: quantity,
            reserved_quantity: 0,
            sold_quantity: 0,
        });
    }

    pub fn get(&self, listing_id: &Uuid) -> Option<&InventoryItem> {
        self.inventory.get(listing_id)
    }

    pub fn available(&self, listing_id: &Uuid) -> u32 {
        self.inventory.get(listing_id).map(|i| i.available_quantity).unwrap_or(0)
    }

    /// Hold stock for a placed order
    pub fn reserve(&mut self, listing_id: &Uuid, quantity: u32) -> Result<(), InventoryError> {
        let item = self.inventory.get_mut(listing_id)
            .ok_or(InventoryError::NotFound(*listing_id))?;

        if item.available_quantity < quantity {
            return Err(InventoryError::InsufficientInventory {
                listing_id: *listing_id,
                requested: quantity,
                available: item.available_quantity,
            });
        }

        item.available_quantity -= quantity;
        item.reserved_quantity += quantity;

        Ok(())
    }

    /// Return held stock (order cancelled)
    pub fn release(&mut self, listing_id: &Uuid, quantity: u32) -> Result<(), InventoryError> {
        let item = self.inventory.get_mut(listing_id)
            .ok_or(InventoryError::NotFound(*listing_id))?;

        let released = quantity.min(item.reserved_quantity);
        item.available_quantity += released;
        item.reserved_quantity -= released;

        Ok(())
    }

    /// Move held stock to sold (order shipped)
    pub fn commit(&mut self, listing_id: &Uuid, quantity: u32) -> Result<(), InventoryError> {
        let item = self.inventory.get_mut(listing_id)
            .ok_or(InventoryError::NotFound(*listing_id))?;

        if item.reserved_quantity < quantity {
            return Err(InventoryError::InsufficientReserved {
                listing_id: *listing_id,
                requested: quantity,
                reserved: item.reserved_quantity,
            });
        }

        item.reserved_quantity -= quantity;
        item.sold_quantity += quantity;

        Ok(())
    }

    /// Add units to available stock; returns the new available quantity
    pub fn restock(&mut self, listing_id: &Uuid, quantity: u32) -> Result<u32, InventoryError> {
        let item = self.inventory.get_mut(listing_id)
            .ok_or(InventoryError::NotFound(*listing_id))?;

        item.available_quantity = item.available_quantity.saturating_add(quantity);
        Ok(item.available_quantity)
    }

    /// Overwrite available stock; returns the new available quantity
    pub fn set_available(&mut self, listing_id: &Uuid, quantity: u32) -> Result<u32, InventoryError> {
        let item = self.inventory.get_mut(listing_id)
            .ok_or(InventoryError::NotFound(*listing_id))?;

        item.available_quantity = quantity;
        Ok(quantity)
    }

    pub fn items(&self) -> impl Iterator<Item = &InventoryItem> {
        self.inventory.values()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Inventory not found: {0}")]
    NotFound(Uuid),

    #[error("Insufficient inventory for {listing_id}: requested {requested}, available {available}")]
    InsufficientInventory {
        listing_id: Uuid,
        requested: u32,
        available: u32,
    },

    #[error("Insufficient reserved inventory for {listing_id}: requested {requested}, reserved {reserved}")]
    InsufficientReserved {
        listing_id: Uuid,
        requested: u32,
        reserved: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_lifecycle() {
        let mut manager = InventoryManager::new();
        let listing_id = Uuid::new_v4();

        manager.initialize(listing_id, 10);
        assert_eq!(manager.available(&listing_id), 10);

        manager.reserve(&listing_id, 3).unwrap();
        assert_eq!(manager.available(&listing_id), 7);
        assert_eq!(manager.get(&listing_id).unwrap().reserved_quantity, 3);

        manager.commit(&listing_id, 2).unwrap();
        let item = manager.get(&listing_id).unwrap();
        assert_eq!(item.reserved_quantity, 1);
        assert_eq!(item.sold_quantity, 2);

        manager.release(&listing_id, 1).unwrap();
        assert_eq!(manager.available(&listing_id), 8);
        assert_eq!(manager.get(&listing_id).unwrap().reserved_quantity, 0);
    }

    #[test]
    fn test_reserve_beyond_stock_fails() {
        let mut manager = InventoryManager::new();
        let listing_id = Uuid::new_v4();
        manager.initialize(listing_id, 2);

        let err = manager.reserve(&listing_id, 3).unwrap_err();
        assert!(matches!(err, InventoryError::InsufficientInventory { available: 2, .. }));
        assert_eq!(manager.available(&listing_id), 2);
    }

    #[test]
    fn test_release_never_exceeds_reserved() {
        let mut manager = InventoryManager::new();
        let listing_id = Uuid::new_v4();
        manager.initialize(listing_id, 5);
        manager.reserve(&listing_id, 1).unwrap();

        manager.release(&listing_id, 4).unwrap();
        assert_eq!(manager.available(&listing_id), 5);
    }

    #[test]
    fn test_restock_unknown_listing() {
        let mut manager = InventoryManager::new();
        assert!(matches!(
            manager.restock(&Uuid::new_v4(), 5),
            Err(InventoryError::NotFound(_))
        ));
    }
}
