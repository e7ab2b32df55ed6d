use ahash::{AHashMap, AHashSet};
use log::{debug, trace};

use crate::constraints::Constraints;
use crate::items::{sort_item_ids_by_decreasing_support, ItemDictionary};
use crate::mining::fptree::FpTree;
use crate::types::{FrequentItemset, Item, ItemId, ItemName, SupportCount};

/// Whether a mining branch should be explored further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exploration {
    Explore,
    Prune,
}

/// Receives frequent itemsets as they are generated, one by one, and
/// decides per itemset whether its supersets are worth mining.
///
/// `on_itemset` is invoked synchronously for every generated itemset. When
/// it returns [`Exploration::Explore`] and a search space exists
/// (`has_search_space`), the miner descends into the conditional tree and
/// calls `on_branch_done` once everything below the itemset has been
/// evaluated; `on_branch_done` for an itemset therefore strictly follows all
/// emissions of its supersets. A final `on_branch_done` with the empty
/// itemset signals the end of the run.
pub trait ItemsetVisitor {
    fn on_itemset(
        &mut self,
        itemset: &FrequentItemset,
        matches_itemset_constraints: bool,
        matches_consequent_constraints: bool,
        has_search_space: bool,
    ) -> Exploration;

    fn on_branch_done(&mut self, _itemset: &[ItemId]) {}
}

/// Batch frequent-itemset miner.
///
/// Scans a batch of transactions, builds an FP-tree in f-list order and
/// recursively generates frequent itemsets from conditional trees. The item
/// dictionary (and with it the f-list) is shared with the caller so that
/// successive batches agree on item order; the constraint sets are
/// preprocessed as new items are interned, and the miner works on per-batch
/// copies from which the ids of infrequent items have been removed.
pub struct FpGrowth<'a> {
    transactions: &'a [Vec<ItemName>],
    min_support_absolute: SupportCount,
    items: &'a mut ItemDictionary,
    itemset_constraints: &'a mut Constraints,
    consequent_constraints: &'a mut Constraints,
    batch_itemset_constraints: Constraints,
    batch_consequent_constraints: Constraints,
    batch_supports: AHashMap<ItemId, SupportCount>,
    tree: FpTree,
}

impl<'a> FpGrowth<'a> {
    pub fn new(
        transactions: &'a [Vec<ItemName>],
        min_support_absolute: SupportCount,
        items: &'a mut ItemDictionary,
        itemset_constraints: &'a mut Constraints,
        consequent_constraints: &'a mut Constraints,
    ) -> Self {
        Self {
            transactions,
            min_support_absolute,
            items,
            itemset_constraints,
            consequent_constraints,
            batch_itemset_constraints: Constraints::new(),
            batch_consequent_constraints: Constraints::new(),
            batch_supports: AHashMap::new(),
            tree: FpTree::new(),
        }
    }

    /// Mine all frequent itemsets at once and return the ones that match
    /// the itemset constraints. Single-shot, like [`mine`](Self::mine).
    pub fn mine_frequent_itemsets(&mut self) -> Vec<FrequentItemset> {
        struct Collector {
            itemsets: Vec<FrequentItemset>,
        }

        impl ItemsetVisitor for Collector {
            fn on_itemset(
                &mut self,
                itemset: &FrequentItemset,
                matches_itemset_constraints: bool,
                _matches_consequent_constraints: bool,
                _has_search_space: bool,
            ) -> Exploration {
                if matches_itemset_constraints {
                    self.itemsets.push(itemset.clone());
                }
                Exploration::Explore
            }
        }

        let mut collector = Collector {
            itemsets: Vec::new(),
        };
        self.mine(&mut collector);
        collector.itemsets
    }

    /// Mine the batch, handing each generated frequent itemset to the
    /// visitor as soon as it is produced. Consumes the scan state: call at
    /// most once per instance.
    pub fn mine<V: ItemsetVisitor>(&mut self, visitor: &mut V) {
        self.scan_transactions();
        self.build_tree();
        self.generate(&self.tree, &FrequentItemset::default(), visitor);
        visitor.on_branch_done(&[]);
    }

    /// First pass over the batch: intern names, preprocess constraints for
    /// newly seen items, count per-item supports, discard infrequent items
    /// and extend the f-list with the frequent ones.
    fn scan_transactions(&mut self) {
        for transaction in self.transactions {
            for name in transaction {
                let (id, newly_interned) = self.items.intern(name);
                if newly_interned {
                    self.itemset_constraints.preprocess_item(name, id);
                    self.consequent_constraints.preprocess_item(name, id);
                }
                *self.batch_supports.entry(id).or_insert(0) += 1;
            }
        }

        self.batch_itemset_constraints = self.itemset_constraints.clone();
        self.batch_consequent_constraints = self.consequent_constraints.clone();

        let infrequent: Vec<ItemId> = self
            .batch_supports
            .iter()
            .filter(|&(_, &support)| support < self.min_support_absolute)
            .map(|(&id, _)| id)
            .collect();
        for id in infrequent {
            self.batch_supports.remove(&id);
            self.batch_itemset_constraints.remove_item(id);
            self.batch_consequent_constraints.remove_item(id);
        }

        let ordered = sort_item_ids_by_decreasing_support(&self.batch_supports);
        self.items.extend_f_list(&ordered);

        debug!(
            "scanned {} transactions: {} frequent items, f-list length {}",
            self.transactions.len(),
            self.batch_supports.len(),
            self.items.f_list().len()
        );
    }

    /// Second pass: insert every transaction, restricted to this batch's
    /// frequent items and ordered by the f-list. Duplicate items within one
    /// transaction collapse to a single occurrence.
    fn build_tree(&mut self) {
        for transaction in self.transactions {
            let mut present: AHashSet<ItemId> = transaction
                .iter()
                .filter_map(|name| self.items.id_of(name))
                .filter(|id| self.batch_supports.contains_key(id))
                .collect();

            let mut optimized: Vec<Item> = Vec::with_capacity(present.len());
            for &id in self.items.f_list() {
                if present.remove(&id) {
                    optimized.push(Item::new(id));
                }
                if present.is_empty() {
                    break;
                }
            }

            if !optimized.is_empty() {
                self.tree.insert(&optimized);
            }
        }
    }

    /// Generate frequent itemsets from a (conditional) tree. Candidates are
    /// visited in reverse f-list order (least frequent first), restricted to
    /// the items present in the tree.
    fn generate<V: ItemsetVisitor>(
        &self,
        tree: &FpTree,
        suffix: &FrequentItemset,
        visitor: &mut V,
    ) {
        let candidates: Vec<ItemId> = self
            .items
            .f_list()
            .iter()
            .rev()
            .copied()
            .filter(|&id| tree.has_item(id))
            .collect();

        for candidate in candidates {
            let support = tree.item_support(candidate);
            if support < self.min_support_absolute {
                continue;
            }

            let itemset = FrequentItemset::extend_suffix(candidate, support, suffix);
            let matches_itemset = self.batch_itemset_constraints.match_itemset(&itemset.itemset);
            let matches_consequent = self
                .batch_consequent_constraints
                .match_itemset(&itemset.itemset);
            let conditional = self.conditional_tree(tree, candidate, &itemset.itemset);

            trace!(
                "itemset {:?} (support {}), search space: {}",
                itemset.itemset,
                itemset.support,
                conditional.is_some()
            );

            let decision = visitor.on_itemset(
                &itemset,
                matches_itemset,
                matches_consequent,
                conditional.is_some(),
            );

            if let Some(conditional) = conditional {
                if decision == Exploration::Explore {
                    self.generate(&conditional, &itemset, visitor);
                    visitor.on_branch_done(&itemset.itemset);
                }
            }
        }
    }

    /// Build the conditional tree for a candidate item, or `None` when the
    /// candidate has no prefix paths, when the search space cannot satisfy
    /// the itemset constraints, or when no path item is frequent within the
    /// prefix paths.
    fn conditional_tree(
        &self,
        tree: &FpTree,
        candidate: ItemId,
        itemset: &[ItemId],
    ) -> Option<FpTree> {
        let prefix_paths = tree.prefix_paths(candidate);
        if prefix_paths.is_empty() {
            return None;
        }

        let path_supports = FpTree::support_counts_for_paths(&prefix_paths);
        if !self
            .batch_itemset_constraints
            .match_search_space(itemset, &path_supports)
        {
            trace!("search space below {:?} cannot match constraints", itemset);
            return None;
        }

        let mut filtered = Vec::with_capacity(prefix_paths.len());
        for path in &prefix_paths {
            let kept: Vec<Item> = path
                .iter()
                .copied()
                .filter(|item| path_supports[&item.id] >= self.min_support_absolute)
                .collect();
            if !kept.is_empty() {
                filtered.push(kept);
            }
        }

        if filtered.is_empty() {
            None
        } else {
            Some(FpTree::from_paths(&filtered))
        }
    }
}
