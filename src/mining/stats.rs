use serde::{Deserialize, Serialize};

/// Mining statistics
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MiningStats {
    pub batches_processed: usize,
    pub itemsets_processed: usize,
    pub nodes_pruned: usize,
}

impl MiningStats {
    pub fn new() -> Self {
        Self::default()
    }
}
