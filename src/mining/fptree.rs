use ahash::AHashMap;

use crate::types::{Item, ItemId, SupportCount, ROOT_ITEM_ID};

/// Index of a node in the tree arena. The root always lives at index 0.
pub(crate) type NodeIndex = usize;

const ROOT: NodeIndex = 0;

#[derive(Debug)]
struct FpTreeNode {
    item: ItemId,
    value: SupportCount,
    parent: NodeIndex,
    children: AHashMap<ItemId, NodeIndex>,
}

/// Prefix tree of frequency-ordered transactions.
///
/// Nodes live in an arena and refer to each other through dense indices, so
/// the per-item node lists (the "item paths") can safely point back into the
/// tree without reference cycles: the arena outlives every index handed out.
#[derive(Debug)]
pub struct FpTree {
    nodes: Vec<FpTreeNode>,
    item_paths: AHashMap<ItemId, Vec<NodeIndex>>,
}

impl Default for FpTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FpTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![FpTreeNode {
                item: ROOT_ITEM_ID,
                value: 0,
                parent: ROOT,
                children: AHashMap::new(),
            }],
            item_paths: AHashMap::new(),
        }
    }

    /// Build a tree by inserting prefix paths as if they were transactions.
    pub fn from_paths(paths: &[Vec<Item>]) -> Self {
        let mut tree = Self::new();
        for path in paths {
            tree.insert(path);
        }
        tree
    }

    /// Insert a frequency-ordered transaction, reusing existing child nodes
    /// where the prefix already exists.
    pub fn insert(&mut self, transaction: &[Item]) {
        let mut current = ROOT;
        for item in transaction {
            if let Some(&child) = self.nodes[current].children.get(&item.id) {
                self.nodes[child].value += item.support;
                current = child;
            } else {
                let index = self.nodes.len();
                self.nodes.push(FpTreeNode {
                    item: item.id,
                    value: item.support,
                    parent: current,
                    children: AHashMap::new(),
                });
                self.nodes[current].children.insert(item.id, index);
                self.item_paths.entry(item.id).or_default().push(index);
                current = index;
            }
        }
    }

    pub fn has_item(&self, id: ItemId) -> bool {
        self.item_paths.contains_key(&id)
    }

    /// Ids of all items present in this tree.
    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.item_paths.keys().copied()
    }

    /// Total support of an item: the sum over all nodes carrying its id.
    pub fn item_support(&self, id: ItemId) -> SupportCount {
        self.item_paths
            .get(&id)
            .map(|nodes| nodes.iter().map(|&n| self.nodes[n].value).sum())
            .unwrap_or(0)
    }

    /// The prefix paths ending in (but excluding) each occurrence of `id`,
    /// in root-to-leaf order. Every item on a path carries the support of
    /// the occurrence node it was reached from, since only the transactions
    /// through that node are being counted.
    pub fn prefix_paths(&self, id: ItemId) -> Vec<Vec<Item>> {
        let Some(occurrences) = self.item_paths.get(&id) else {
            return Vec::new();
        };

        let mut paths = Vec::new();
        for &occurrence in occurrences {
            let support = self.nodes[occurrence].value;
            let mut path = Vec::new();
            let mut current = self.nodes[occurrence].parent;
            while current != ROOT {
                path.push(Item::with_support(self.nodes[current].item, support));
                current = self.nodes[current].parent;
            }
            if !path.is_empty() {
                path.reverse();
                paths.push(path);
            }
        }
        paths
    }

    /// Per-item cumulative support within a set of prefix paths.
    pub fn support_counts_for_paths(paths: &[Vec<Item>]) -> AHashMap<ItemId, SupportCount> {
        let mut supports = AHashMap::new();
        for path in paths {
            for item in path {
                *supports.entry(item.id).or_insert(0) += item.support;
            }
        }
        supports
    }
}
