//! Player inventory: item stacks keyed by item id.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    pub item: String,
    pub count: u32,
}

/// Ordered item stacks. Adding an item already present merges counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub slots: Vec<InventorySlot>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` of `item`. Returns the new total.
    pub fn add_item(&mut self, item: &str, count: u32) -> u32 {
        match self.slots.iter_mut().find(|s| s.item == item) {
            Some(slot) => {
                slot.count = slot.count.saturating_add(count);
                slot.count
            }
            None => {
                self.slots.push(InventorySlot {
                    item: item.to_string(),
                    count,
                });
                count
            }
        }
    }

    pub fn count(&self, item: &str) -> u32 {
        self.slots
            .iter()
            .find(|s| s.item == item)
            .map_or(0, |s| s.count)
    }

    /// Take `count` of `item` if that many are held. Empty stacks are dropped.
    pub fn remove_item(&mut self, item: &str, count: u32) -> bool {
        let Some(index) = self.slots.iter().position(|s| s.item == item) else {
            return false;
        };
        if self.slots[index].count < count {
            return false;
        }
        self.slots[index].count -= count;
        if self.slots[index].count == 0 {
            self.slots.remove(index);
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_merges() {
        let mut inventory = Inventory::new();
        assert_eq!(inventory.add_item("codingland.wood", 10), 10);
        assert_eq!(inventory.add_item("codingland.stone", 1), 1);
        assert_eq!(inventory.add_item("codingland.wood", 12), 22);
        assert_eq!(inventory.slots.len(), 2);
        assert_eq!(inventory.count("codingland.wood"), 22);
        assert_eq!(inventory.count("missing"), 0);
    }

    #[test]
    fn test_remove() {
        let mut inventory = Inventory::new();
        inventory.add_item("codingland.wood", 5);
        assert!(!inventory.remove_item("codingland.wood", 6));
        assert!(inventory.remove_item("codingland.wood", 5));
        assert!(inventory.is_empty());
        assert!(!inventory.remove_item("codingland.wood", 1));
    }
}
