use ahash::AHashMap;

use crate::constraints::Constraints;
use crate::stream::ttw::{TiltedTimeWindow, GRANULARITY_QUARTER};
use crate::types::{FrequentItemset, ItemId, SupportCount, ROOT_ITEM_ID};

#[derive(Debug)]
pub(crate) struct PatternNode {
    pub(crate) item: ItemId,
    pub(crate) ttw: TiltedTimeWindow,
    pub(crate) children: AHashMap<ItemId, PatternNode>,
}

impl PatternNode {
    fn new(item: ItemId) -> Self {
        Self {
            item,
            ttw: TiltedTimeWindow::new(),
            children: AHashMap::new(),
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn descendant_count(&self) -> u32 {
        self.children
            .values()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// Prefix-shared forest of itemsets; each node owns the tilted-time window
/// of the pattern spelled by its root path. Paths follow f-list order, so
/// patterns sharing a prefix share nodes.
#[derive(Debug)]
pub struct PatternTree {
    root: PatternNode,
    node_count: u32,
    current_quarter: usize,
}

impl Default for PatternTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternTree {
    pub fn new() -> Self {
        Self {
            root: PatternNode::new(ROOT_ITEM_ID),
            node_count: 0,
            current_quarter: 0,
        }
    }

    /// Number of non-root nodes.
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    pub fn current_quarter(&self) -> usize {
        self.current_quarter
    }

    /// Advance the quarter counter, so that windows created later in the
    /// cycle can be padded into sync.
    pub fn next_quarter(&mut self) {
        self.current_quarter = (self.current_quarter + 1) % 4;
    }

    /// Append a pattern's support for the current batch, creating its path
    /// as needed. A freshly created window is first caught up with the
    /// quarter cycle by appending zero-support quarters for the timeslots it
    /// missed.
    pub fn add_pattern(&mut self, pattern: &FrequentItemset, update_id: u32) {
        let current_quarter = self.current_quarter;
        let mut created = 0u32;
        let mut node = &mut self.root;
        for &id in &pattern.itemset {
            node = node.children.entry(id).or_insert_with(|| {
                created += 1;
                PatternNode::new(id)
            });
        }

        for _ in node.ttw.capacity_used(GRANULARITY_QUARTER)..current_quarter {
            node.ttw.append_quarter(0, update_id);
        }
        node.ttw.append_quarter(pattern.support, update_id);
        self.node_count += created;
    }

    /// The window of a pattern, or `None` when no node spells the itemset.
    pub fn get_pattern_support(&self, itemset: &[ItemId]) -> Option<&TiltedTimeWindow> {
        let mut node = &self.root;
        for id in itemset {
            node = node.children.get(id)?;
        }
        Some(&node.ttw)
    }

    pub fn get_pattern_support_mut(&mut self, itemset: &[ItemId]) -> Option<&mut TiltedTimeWindow> {
        let mut node = &mut self.root;
        for id in itemset {
            node = node.children.get_mut(id)?;
        }
        Some(&mut node.ttw)
    }

    /// Detach a pattern's node (and everything below it). Returns whether
    /// the pattern existed.
    pub fn remove_pattern(&mut self, itemset: &[ItemId]) -> bool {
        let Some((&last, prefix)) = itemset.split_last() else {
            return false;
        };
        let mut node = &mut self.root;
        for id in prefix {
            match node.children.get_mut(id) {
                Some(child) => node = child,
                None => return false,
            }
        }
        match node.children.remove(&last) {
            Some(removed) => {
                self.node_count -= 1 + removed.descendant_count();
                true
            }
            None => false,
        }
    }

    /// All patterns whose support over the bucket range strictly exceeds
    /// `min_support` and that match the constraints.
    pub fn frequent_itemsets_for_range(
        &self,
        min_support: SupportCount,
        constraints: &Constraints,
        from: usize,
        to: usize,
    ) -> Vec<FrequentItemset> {
        let mut result = Vec::new();
        let mut prefix = Vec::new();
        Self::collect_range(
            &self.root,
            &mut prefix,
            min_support,
            constraints,
            from,
            to,
            &mut result,
        );
        result
    }

    fn collect_range(
        node: &PatternNode,
        prefix: &mut Vec<ItemId>,
        min_support: SupportCount,
        constraints: &Constraints,
        from: usize,
        to: usize,
        result: &mut Vec<FrequentItemset>,
    ) {
        for child in node.children.values() {
            prefix.push(child.item);
            let support = child.ttw.support_for_range(from, to);
            if support > min_support && constraints.match_itemset(prefix) {
                result.push(FrequentItemset::new(prefix.clone(), support));
            }
            Self::collect_range(child, prefix, min_support, constraints, from, to, result);
            prefix.pop();
        }
    }

    pub(crate) fn root_mut(&mut self) -> &mut PatternNode {
        &mut self.root
    }

    pub(crate) fn note_removed(&mut self, count: u32) {
        self.node_count -= count;
    }
}
