use serde::{Deserialize, Serialize};

/// Identifies a distinct item. Supports 2^32 different items; widen to u64
/// to support more.
pub type ItemId = u32;

/// An item name as observed in a transaction. May contain `*` wildcards in
/// constraint contexts.
pub type ItemName = String;

/// Number of transactions an item or itemset occurs in. Supports 2^32 total
/// occurrences; widen to u64 to support more.
pub type SupportCount = u32;

/// Sentinel item id carried by tree root nodes.
pub const ROOT_ITEM_ID: ItemId = ItemId::MAX;

/// An item occurrence with an attached support count.
///
/// One would not expect a support count to be associated with a single item,
/// but it makes conditional FP-tree construction direct: the prefix paths
/// returned by [`FpTree::prefix_paths`](crate::mining::fptree::FpTree::prefix_paths)
/// already carry the correct counts and can be fed back into
/// [`FpTree::insert`](crate::mining::fptree::FpTree::insert) as-is, instead
/// of being inserted repeatedly. An item occurs once per transaction, so the
/// count defaults to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub support: SupportCount,
}

impl Item {
    pub fn new(id: ItemId) -> Self {
        Self { id, support: 1 }
    }

    pub fn with_support(id: ItemId, support: SupportCount) -> Self {
        Self { id, support }
    }
}

/// An itemset together with the support count computed from the tree scan
/// that produced it. The item order is the f-list order (most frequent
/// first).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequentItemset {
    pub itemset: Vec<ItemId>,
    pub support: SupportCount,
}

impl FrequentItemset {
    pub fn new(itemset: Vec<ItemId>, support: SupportCount) -> Self {
        Self { itemset, support }
    }

    /// Extend a suffix itemset with a new head item, as done when candidate
    /// itemsets are generated during mining. The head is more frequent than
    /// everything in the suffix, so prepending preserves f-list order.
    pub fn extend_suffix(head: ItemId, head_support: SupportCount, suffix: &FrequentItemset) -> Self {
        let mut itemset = Vec::with_capacity(suffix.itemset.len() + 1);
        itemset.push(head);
        itemset.extend_from_slice(&suffix.itemset);
        Self {
            itemset,
            support: head_support,
        }
    }

    pub fn len(&self) -> usize {
        self.itemset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemset.is_empty()
    }
}

/// Association rule: antecedent → consequent, with the support of the full
/// itemset and the rule confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub antecedent: Vec<ItemName>,
    pub consequent: Vec<ItemName>,
    pub support: SupportCount,
    pub confidence: f64,
}
