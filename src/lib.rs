//! # stream-rule-miner
//!
//! Streaming association rule mining over batches of transactions.
//!
//! Batches (one per quarter) are mined with a constraint-directed FP-Growth;
//! the results feed a pattern tree in which every potentially frequent
//! itemset keeps its support history in a tilted-time window: full detail
//! for the last hour, coarser aggregates the further back in time it goes.
//! Patterns whose support can no longer reach the minimum within the error
//! bound are pruned along the way. Association rules can then be mined on
//! demand for any range of time buckets.
//!
//! ## Quick Start
//!
//! ```rust
//! use stream_rule_miner::{FpStream, MiningConfig};
//!
//! let transactions: Vec<Vec<String>> = vec![
//!     vec!["Laptop".to_string(), "Mouse".to_string()],
//!     vec!["Laptop".to_string(), "Keyboard".to_string()],
//!     vec!["Laptop".to_string(), "Mouse".to_string()],
//! ];
//!
//! let config = MiningConfig {
//!     min_support: 0.5,
//!     max_support_error: 0.25,
//! };
//! let mut miner = FpStream::new(config).unwrap();
//! miner.process_batch(&transactions, 1.0).unwrap();
//!
//! // Rules over the most recent quarter.
//! let rules = miner.mine_rules(0, 0, 0.6).unwrap();
//! for rule in &rules {
//!     println!("{:?} -> {:?} ({:.2})", rule.antecedent, rule.consequent, rule.confidence);
//! }
//! ```

pub mod config;
pub mod constraints;
pub mod errors;
pub mod items;
pub mod types;

// Mining algorithms
pub mod mining;

// Streaming engine
pub mod stream;

// Re-exports
pub use config::MiningConfig;
pub use constraints::{ConstraintType, Constraints};
pub use errors::{MiningError, Result};
pub use items::ItemDictionary;
pub use mining::fpgrowth::{Exploration, FpGrowth, ItemsetVisitor};
pub use mining::fptree::FpTree;
pub use mining::stats::MiningStats;
pub use stream::fpstream::FpStream;
pub use stream::pattern_tree::PatternTree;
pub use stream::ttw::TiltedTimeWindow;
pub use types::{AssociationRule, FrequentItemset, Item, ItemId, ItemName, SupportCount};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() {
        let miner = FpStream::new(MiningConfig::default()).unwrap();
        assert_eq!(miner.pattern_tree().node_count(), 0);
        assert_eq!(miner.stats().batches_processed, 0);
    }
}
