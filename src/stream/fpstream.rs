use log::{debug, trace};

use crate::config::MiningConfig;
use crate::constraints::{ConstraintType, Constraints};
use crate::errors::{MiningError, Result};
use crate::items::ItemDictionary;
use crate::mining::fpgrowth::{Exploration, FpGrowth, ItemsetVisitor};
use crate::mining::rules;
use crate::mining::stats::MiningStats;
use crate::stream::pattern_tree::{PatternNode, PatternTree};
use crate::stream::ttw::{
    TiltedTimeWindow, BUCKET_UNUSED, GRANULARITY_BUCKET_OFFSET, TTW_NUM_BUCKETS,
    TTW_NUM_GRANULARITIES,
};
use crate::types::{AssociationRule, FrequentItemset, ItemId, ItemName, SupportCount};

/// Streaming association-rule mining coordinator.
///
/// Ingests batches of transactions (one batch per quarter) and maintains a
/// pattern tree of every itemset that was potentially frequent at some point
/// in the stream, each with its own tilted-time window. Rules can then be
/// mined on demand for any bucket range.
///
/// The first batch seeds the pattern tree synchronously. Later batches
/// drive FP-Growth itemset by itemset: a pattern already in the tree has its
/// window updated and tail-pruned, and superset mining continues only while
/// the window stays non-empty and the search space can still satisfy the
/// constraints; a pattern not in the tree stops its branch outright, and is
/// recorded only when it matches the rule-consequent constraints or a
/// superset may still need its support. Once mining finishes, every node the
/// batch did not touch receives a zero quarter, is tail-pruned, and is
/// removed when it becomes an empty leaf.
pub struct FpStream {
    config: MiningConfig,
    items: ItemDictionary,
    itemset_constraints: Constraints,
    consequent_constraints: Constraints,
    pattern_tree: PatternTree,
    batch_sizes: TiltedTimeWindow,
    initial_batch_processed: bool,
    current_batch_id: u32,
    processing_batch: bool,
    stats: MiningStats,
}

impl FpStream {
    pub fn new(config: MiningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            items: ItemDictionary::new(),
            itemset_constraints: Constraints::new(),
            consequent_constraints: Constraints::new(),
            pattern_tree: PatternTree::new(),
            batch_sizes: TiltedTimeWindow::new(),
            initial_batch_processed: false,
            current_batch_id: 0,
            processing_batch: false,
            stats: MiningStats::new(),
        })
    }

    /// Constrain which itemsets qualify as frequent. Wildcards (`*`) are
    /// allowed in the item name.
    pub fn add_frequent_itemset_constraint(&mut self, item: &str, constraint_type: ConstraintType) {
        self.itemset_constraints
            .add_item_constraint(item, constraint_type);
        preprocess_known_items(&self.items, &mut self.itemset_constraints);
    }

    /// Constrain which consequents qualify for rules. A consequent comes
    /// from a frequent itemset, so the same entry is installed as a
    /// frequent-itemset constraint as well.
    pub fn add_rule_consequent_constraint(&mut self, item: &str, constraint_type: ConstraintType) {
        self.add_frequent_itemset_constraint(item, constraint_type);
        self.consequent_constraints
            .add_item_constraint(item, constraint_type);
        preprocess_known_items(&self.items, &mut self.consequent_constraints);
    }

    /// Process one batch of transactions covering the next quarter.
    ///
    /// `events_per_transaction` adjusts the recorded batch size when a
    /// single source event was expanded into multiple transactions, so that
    /// relative thresholds keep referring to events.
    pub fn process_batch(
        &mut self,
        transactions: &[Vec<ItemName>],
        events_per_transaction: f64,
    ) -> Result<()> {
        if self.processing_batch {
            return Err(MiningError::ConcurrentBatch);
        }
        if !(events_per_transaction > 0.0) {
            return Err(MiningError::InvalidParameter(format!(
                "events_per_transaction must be positive, got {events_per_transaction}"
            )));
        }

        self.processing_batch = true;
        if self.initial_batch_processed {
            self.current_batch_id += 1;
        }
        let batch_id = self.current_batch_id;

        let adjusted_size = (transactions.len() as f64 / events_per_transaction) as SupportCount;
        self.batch_sizes.append_quarter(adjusted_size, batch_id);

        // The batch threshold is the error bound, not the minimum support:
        // a pattern is kept while its support may still reach the minimum
        // within the error, which bounds the relative error of any answer
        // by max_support_error / min_support.
        let threshold = (self.config.max_support_error * transactions.len() as f64
            / events_per_transaction) as SupportCount;
        debug!(
            "batch {batch_id}: {} transactions (adjusted size {adjusted_size}), threshold {threshold}",
            transactions.len()
        );

        let mut fpgrowth = FpGrowth::new(
            transactions,
            threshold,
            &mut self.items,
            &mut self.itemset_constraints,
            &mut self.consequent_constraints,
        );

        if !self.initial_batch_processed {
            let frequent = fpgrowth.mine_frequent_itemsets();
            self.stats.itemsets_processed += frequent.len();
            for itemset in &frequent {
                self.pattern_tree.add_pattern(itemset, batch_id);
            }
            self.initial_batch_processed = true;
        } else {
            self.pattern_tree.next_quarter();
            let mut update = BatchUpdate {
                pattern_tree: &mut self.pattern_tree,
                batch_sizes: &self.batch_sizes,
                min_support: self.config.min_support,
                max_support_error: self.config.max_support_error,
                batch_id,
                // The initial, empty suffix counts as an active branch; its
                // completion marks the end of the batch.
                active_branches: vec![Vec::new()],
                stats: &mut self.stats,
            };
            fpgrowth.mine(&mut update);
        }

        debug!(
            "batch {batch_id} done: pattern tree holds {} nodes",
            self.pattern_tree.node_count()
        );
        self.stats.batches_processed += 1;
        self.processing_batch = false;
        Ok(())
    }

    /// Mine association rules over the bucket range `[from, to]` of the
    /// pattern windows (bucket 0 is the most recent quarter).
    pub fn mine_rules(
        &self,
        from: usize,
        to: usize,
        min_confidence: f64,
    ) -> Result<Vec<AssociationRule>> {
        if from > to || to >= TTW_NUM_BUCKETS {
            return Err(MiningError::InvalidParameter(format!(
                "bucket range [{from}, {to}] is not within the {TTW_NUM_BUCKETS} buckets"
            )));
        }
        if !(min_confidence > 0.0 && min_confidence <= 1.0) {
            return Err(MiningError::InvalidParameter(format!(
                "min_confidence must be in (0, 1], got {min_confidence}"
            )));
        }

        let range_support = self.min_support_for_range(from, to);
        let frequent = self.pattern_tree.frequent_itemsets_for_range(
            range_support,
            &self.itemset_constraints,
            from,
            to,
        );
        debug!(
            "mining rules over buckets [{from}, {to}]: {} itemsets above support {range_support}",
            frequent.len()
        );

        Ok(rules::mine_association_rules(
            &frequent,
            min_confidence,
            &self.consequent_constraints,
            &self.items,
            |itemset| {
                self.pattern_tree
                    .get_pattern_support(itemset)
                    .map(|window| window.support_for_range(from, to))
            },
        ))
    }

    /// Absolute minimum support over a bucket range, derived from the batch
    /// sizes observed for those buckets.
    pub fn min_support_for_range(&self, from: usize, to: usize) -> SupportCount {
        (self.config.min_support * self.batch_sizes.support_for_range(from, to) as f64).ceil()
            as SupportCount
    }

    pub fn pattern_tree(&self) -> &PatternTree {
        &self.pattern_tree
    }

    pub fn items(&self) -> &ItemDictionary {
        &self.items
    }

    pub fn stats(&self) -> &MiningStats {
        &self.stats
    }
}

/// Per-batch visitor: applies the pattern-tree update and the pruning rules
/// to each frequent itemset as FP-Growth produces it.
struct BatchUpdate<'a> {
    pattern_tree: &'a mut PatternTree,
    batch_sizes: &'a TiltedTimeWindow,
    min_support: f64,
    max_support_error: f64,
    batch_id: u32,
    active_branches: Vec<Vec<ItemId>>,
    stats: &'a mut MiningStats,
}

impl ItemsetVisitor for BatchUpdate<'_> {
    fn on_itemset(
        &mut self,
        itemset: &FrequentItemset,
        _matches_itemset_constraints: bool,
        matches_consequent_constraints: bool,
        has_search_space: bool,
    ) -> Exploration {
        self.stats.itemsets_processed += 1;

        if self.pattern_tree.get_pattern_support(&itemset.itemset).is_some() {
            self.pattern_tree.add_pattern(itemset, self.batch_id);
            let Some(window) = self.pattern_tree.get_pattern_support_mut(&itemset.itemset) else {
                return Exploration::Prune;
            };
            if let Some(granularity) = calculate_droppable_tail(
                window,
                self.min_support,
                self.max_support_error,
                self.batch_sizes,
            ) {
                window.drop_tail(granularity);
            }

            // Supersets stay interesting only while this pattern's history
            // survived tail pruning and the search space can still satisfy
            // the constraints.
            if !window.is_empty() && has_search_space {
                self.active_branches.push(itemset.itemset.clone());
                Exploration::Explore
            } else {
                trace!("stopping below {:?}", itemset.itemset);
                Exploration::Prune
            }
        } else {
            // A pattern that is new at this point never had frequent
            // supersets, so none are mined. It enters the tree when it can
            // feed rule mining: as a consequent source, or as the antecedent
            // of a superset that may yet be recorded.
            if matches_consequent_constraints || has_search_space {
                self.pattern_tree.add_pattern(itemset, self.batch_id);
            }
            Exploration::Prune
        }
    }

    fn on_branch_done(&mut self, itemset: &[ItemId]) {
        if let Some(position) = self
            .active_branches
            .iter()
            .position(|branch| branch == itemset)
        {
            self.active_branches.remove(position);
        }

        if self.active_branches.is_empty() {
            let removed = update_unaffected_nodes(
                self.pattern_tree,
                self.batch_id,
                self.min_support,
                self.max_support_error,
                self.batch_sizes,
            );
            self.stats.nodes_pruned += removed as usize;
        }
    }
}

/// Append a zero quarter to every pattern the batch did not touch, tail
/// prune it, and drop it once it is an empty leaf. Returns the number of
/// removed nodes.
fn update_unaffected_nodes(
    tree: &mut PatternTree,
    batch_id: u32,
    min_support: f64,
    max_support_error: f64,
    batch_sizes: &TiltedTimeWindow,
) -> u32 {
    let mut removed = 0;
    sweep_children(
        tree.root_mut(),
        batch_id,
        min_support,
        max_support_error,
        batch_sizes,
        &mut removed,
    );
    tree.note_removed(removed);
    if removed > 0 {
        debug!("batch {batch_id}: pruned {removed} stale pattern nodes");
    }
    removed
}

fn sweep_children(
    node: &mut PatternNode,
    batch_id: u32,
    min_support: f64,
    max_support_error: f64,
    batch_sizes: &TiltedTimeWindow,
    removed: &mut u32,
) {
    node.children.retain(|_, child| {
        sweep_children(
            child,
            batch_id,
            min_support,
            max_support_error,
            batch_sizes,
            removed,
        );

        if child.ttw.last_update() != batch_id {
            child.ttw.append_quarter(0, batch_id);
            if let Some(granularity) =
                calculate_droppable_tail(&child.ttw, min_support, max_support_error, batch_sizes)
            {
                child.ttw.drop_tail(granularity);
            }
            if child.is_leaf() && child.ttw.is_empty() {
                *removed += 1;
                return false;
            }
        }
        true
    });
}

/// Decide how much of a pattern window's tail can be dropped, as the
/// granularity at which dropping starts, or `None` when nothing is
/// droppable.
///
/// Walking from the oldest filled bucket toward the present, first find the
/// youngest bucket whose own support misses the minimum support for its
/// batch; then, within that stretch, the youngest bucket where the
/// cumulative support also misses the cumulative error threshold. The cut is
/// finally rounded up to a whole-granularity boundary, since only entire
/// granularities may be dropped. A never-written bucket (in the window or in
/// the batch sizes) ends the scan: the tail under judgment must be
/// contiguous from the oldest end.
pub(crate) fn calculate_droppable_tail(
    window: &TiltedTimeWindow,
    min_support: f64,
    max_support_error: f64,
    batch_sizes: &TiltedTimeWindow,
) -> Option<usize> {
    let oldest = window.oldest_bucket_filled()?;
    debug_assert!(batch_sizes
        .oldest_bucket_filled()
        .is_some_and(|b| oldest <= b));

    let mut first_failing = None;
    for i in (0..=oldest).rev() {
        if window.buckets[i] == BUCKET_UNUSED || batch_sizes.buckets[i] == BUCKET_UNUSED {
            break;
        }
        if (window.buckets[i] as f64) < (min_support * batch_sizes.buckets[i] as f64).ceil() {
            first_failing = Some(i);
        } else {
            break;
        }
    }
    let first_failing = first_failing?;

    let mut cut = None;
    let mut cumulative_support = 0u64;
    let mut cumulative_batch_size = 0u64;
    for i in (first_failing..=oldest).rev() {
        if window.buckets[i] == BUCKET_UNUSED || batch_sizes.buckets[i] == BUCKET_UNUSED {
            break;
        }
        cumulative_batch_size += batch_sizes.buckets[i] as u64;
        cumulative_support += window.buckets[i] as u64;
        if (cumulative_support as f64) < (max_support_error * cumulative_batch_size as f64).ceil() {
            cut = Some(i);
        } else {
            break;
        }
    }
    let cut = cut?;

    for granularity in 0..TTW_NUM_GRANULARITIES {
        let next_offset = GRANULARITY_BUCKET_OFFSET
            .get(granularity + 1)
            .copied()
            .unwrap_or(TTW_NUM_BUCKETS);
        if cut <= GRANULARITY_BUCKET_OFFSET[granularity] && cut < next_offset {
            return Some(granularity);
        }
    }
    None
}

fn preprocess_known_items(items: &ItemDictionary, constraints: &mut Constraints) {
    for id in 0..items.len() as ItemId {
        if let Some(name) = items.lookup(id) {
            constraints.preprocess_item(name, id);
        }
    }
}
