use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::types::{ItemId, ItemName, SupportCount};

/// Category key for constraint entries that match item names exactly.
/// Wildcard entries form their own category, keyed by the entry string.
const NON_WILDCARDS: &str = "non-wildcards";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintType {
    /// Every id of the category must be present in the itemset.
    PositiveMatchAll,
    /// At least one id of the category must be present.
    PositiveMatchAny,
    /// No id of the category may be present.
    NegativeMatchAll,
    /// At least one id of the category must be absent.
    NegativeMatchAny,
}

impl ConstraintType {
    pub const ALL: [ConstraintType; 4] = [
        ConstraintType::PositiveMatchAll,
        ConstraintType::PositiveMatchAny,
        ConstraintType::NegativeMatchAll,
        ConstraintType::NegativeMatchAny,
    ];
}

/// Item constraints over item names, with `*` wildcards.
///
/// Raw entries are registered up front; as item names are interned they are
/// preprocessed into per-category id sets so that matching during mining
/// only touches integer ids. Preprocessing is idempotent, so entries added
/// late can simply be re-run against every known item.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    entries: AHashMap<ConstraintType, AHashSet<ItemName>>,
    preprocessed: AHashMap<ConstraintType, AHashMap<ItemName, AHashSet<ItemId>>>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register a raw constraint entry of the given type.
    pub fn add_item_constraint(&mut self, item: &str, constraint_type: ConstraintType) {
        self.entries
            .entry(constraint_type)
            .or_default()
            .insert(item.to_string());
    }

    /// Consider an interned item for constraint matching: record its id
    /// under every category whose entry matches its name.
    pub fn preprocess_item(&mut self, name: &str, id: ItemId) {
        for constraint_type in ConstraintType::ALL {
            let Some(entries) = self.entries.get(&constraint_type) else {
                continue;
            };
            for entry in entries {
                if entry == name {
                    self.preprocessed
                        .entry(constraint_type)
                        .or_default()
                        .entry(NON_WILDCARDS.to_string())
                        .or_default()
                        .insert(id);
                } else if entry.contains('*') && wildcard_match(entry, name) {
                    self.preprocessed
                        .entry(constraint_type)
                        .or_default()
                        .entry(entry.clone())
                        .or_default()
                        .insert(id);
                }
            }
        }
    }

    /// Erase an id from every category, once the item is known to be too
    /// infrequent to appear in any itemset.
    pub fn remove_item(&mut self, id: ItemId) {
        for categories in self.preprocessed.values_mut() {
            for ids in categories.values_mut() {
                ids.remove(&id);
            }
        }
    }

    /// True iff the itemset satisfies every (type, category) group.
    /// Empty constraints trivially pass.
    pub fn match_itemset(&self, itemset: &[ItemId]) -> bool {
        for (&constraint_type, categories) in &self.preprocessed {
            for ids in categories.values() {
                if !match_itemset_group(itemset, constraint_type, ids) {
                    return false;
                }
            }
        }
        true
    }

    /// Like [`match_itemset`](Self::match_itemset), but over a search space:
    /// an id counts as present when it is in the itemset prefix *or* has
    /// positive support in the candidate prefix paths. Used to decide
    /// whether a mining branch can still produce matching supersets.
    pub fn match_search_space(
        &self,
        itemset: &[ItemId],
        prefix_path_supports: &AHashMap<ItemId, SupportCount>,
    ) -> bool {
        for (&constraint_type, categories) in &self.preprocessed {
            for ids in categories.values() {
                if !match_search_space_group(itemset, prefix_path_supports, constraint_type, ids) {
                    return false;
                }
            }
        }
        true
    }
}

fn match_itemset_group(
    itemset: &[ItemId],
    constraint_type: ConstraintType,
    constraint_ids: &AHashSet<ItemId>,
) -> bool {
    for &id in constraint_ids {
        match constraint_type {
            ConstraintType::PositiveMatchAll => {
                if !itemset.contains(&id) {
                    return false;
                }
            }
            ConstraintType::PositiveMatchAny => {
                if itemset.contains(&id) {
                    return true;
                }
            }
            ConstraintType::NegativeMatchAll => {
                if itemset.contains(&id) {
                    return false;
                }
            }
            ConstraintType::NegativeMatchAny => {
                if !itemset.contains(&id) {
                    return true;
                }
            }
        }
    }

    // No early exit: for the "all" types that means no violation was found,
    // for the "any" types it means no witness was found.
    matches!(
        constraint_type,
        ConstraintType::PositiveMatchAll | ConstraintType::NegativeMatchAll
    )
}

fn match_search_space_group(
    itemset: &[ItemId],
    prefix_path_supports: &AHashMap<ItemId, SupportCount>,
    constraint_type: ConstraintType,
    constraint_ids: &AHashSet<ItemId>,
) -> bool {
    let support = |id: ItemId| prefix_path_supports.get(&id).copied().unwrap_or(0);

    for &id in constraint_ids {
        match constraint_type {
            ConstraintType::PositiveMatchAll => {
                if !itemset.contains(&id) && support(id) == 0 {
                    return false;
                }
            }
            ConstraintType::PositiveMatchAny => {
                if itemset.contains(&id) || support(id) > 0 {
                    return true;
                }
            }
            ConstraintType::NegativeMatchAll => {
                if support(id) > 0 {
                    return false;
                }
            }
            ConstraintType::NegativeMatchAny => {
                if support(id) == 0 {
                    return true;
                }
            }
        }
    }

    matches!(
        constraint_type,
        ConstraintType::PositiveMatchAll | ConstraintType::NegativeMatchAll
    )
}

/// Anchored, case-sensitive wildcard match where `*` spans any run of
/// characters, including the empty one. A plain fragment scan; a full regex
/// engine would be overkill for this.
pub(crate) fn wildcard_match(pattern: &str, name: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == name;
    }

    let fragments: Vec<&str> = pattern.split('*').collect();
    let first = fragments[0];
    let last = fragments[fragments.len() - 1];

    if !name.starts_with(first) {
        return false;
    }
    let mut remainder = &name[first.len()..];

    for fragment in &fragments[1..fragments.len() - 1] {
        if fragment.is_empty() {
            continue;
        }
        match remainder.find(fragment) {
            Some(pos) => remainder = &remainder[pos + fragment.len()..],
            None => return false,
        }
    }

    remainder.ends_with(last)
}
