use ahash::AHashMap;

use crate::types::{ItemId, ItemName, SupportCount};

/// Bidirectional mapping between item names and dense integer ids, plus the
/// persistent f-list: all item ids that ever qualified as frequent, ordered
/// by descending support at the time they first qualified.
///
/// The f-list is built from the first batch and afterwards only extended,
/// never reordered. Reordering would invalidate the paths of every pattern
/// already stored in the pattern tree; appending new items at the end keeps
/// them coherent across batches.
#[derive(Debug, Default)]
pub struct ItemDictionary {
    names: Vec<ItemName>,
    ids: AHashMap<ItemName, ItemId>,
    f_list: Vec<ItemId>,
    f_list_positions: AHashMap<ItemId, usize>,
}

impl ItemDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the id for a name, creating one on first use. Returns the id
    /// and whether it was newly created.
    pub fn intern(&mut self, name: &str) -> (ItemId, bool) {
        if let Some(&id) = self.ids.get(name) {
            return (id, false);
        }
        let id = self.names.len() as ItemId;
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        (id, true)
    }

    pub fn lookup(&self, id: ItemId) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    pub fn id_of(&self, name: &str) -> Option<ItemId> {
        self.ids.get(name).copied()
    }

    /// Number of distinct items ever observed.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn f_list(&self) -> &[ItemId] {
        &self.f_list
    }

    /// Position of an item in the f-list, if it ever qualified as frequent.
    pub fn f_list_position(&self, id: ItemId) -> Option<usize> {
        self.f_list_positions.get(&id).copied()
    }

    /// Append the given frequent items to the f-list, skipping items already
    /// present. `frequent` must already be ordered (descending support,
    /// ascending id for ties); existing items keep their position.
    pub fn extend_f_list(&mut self, frequent: &[ItemId]) {
        for &id in frequent {
            if !self.f_list_positions.contains_key(&id) {
                self.f_list_positions.insert(id, self.f_list.len());
                self.f_list.push(id);
            }
        }
    }
}

/// Order item ids by decreasing support count, breaking ties by ascending
/// id so the result is deterministic.
pub fn sort_item_ids_by_decreasing_support(
    supports: &AHashMap<ItemId, SupportCount>,
) -> Vec<ItemId> {
    let mut pairs: Vec<(ItemId, SupportCount)> =
        supports.iter().map(|(&id, &count)| (id, count)).collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs.into_iter().map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_lookup_round_trip() {
        let mut items = ItemDictionary::new();
        let (a, new_a) = items.intern("A");
        let (b, new_b) = items.intern("B");
        let (a_again, new_a_again) = items.intern("A");

        assert!(new_a && new_b && !new_a_again);
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(a_again, a);
        assert_eq!(items.lookup(a), Some("A"));
        assert_eq!(items.lookup(b), Some("B"));
        assert_eq!(items.id_of("B"), Some(1));
        assert_eq!(items.lookup(7), None);
    }

    #[test]
    fn test_sort_by_decreasing_support() {
        let mut supports = AHashMap::new();
        supports.insert(0, 6);
        supports.insert(1, 5);
        supports.insert(2, 8);
        supports.insert(3, 5);

        // Ties (ids 1 and 3, both 5) resolve by ascending id.
        assert_eq!(sort_item_ids_by_decreasing_support(&supports), vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_f_list_extends_without_reordering() {
        let mut items = ItemDictionary::new();
        for name in ["A", "B", "C"] {
            items.intern(name);
        }
        items.extend_f_list(&[2, 0, 1]);
        assert_eq!(items.f_list(), &[2, 0, 1]);
        assert_eq!(items.f_list_position(2), Some(0));

        // A later batch where item 1 became the most frequent must not move
        // it; only genuinely new items are appended.
        items.intern("D");
        items.extend_f_list(&[1, 3]);
        assert_eq!(items.f_list(), &[2, 0, 1, 3]);
        assert_eq!(items.f_list_position(1), Some(2));
        assert_eq!(items.f_list_position(3), Some(3));
    }
}
