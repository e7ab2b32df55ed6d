use crate::types::SupportCount;

pub const TTW_NUM_BUCKETS: usize = 72;
pub const TTW_NUM_GRANULARITIES: usize = 5;

/// Buckets per granularity: Quarter, Hour, Day, Month, Year.
pub const GRANULARITY_BUCKET_COUNT: [usize; TTW_NUM_GRANULARITIES] = [4, 24, 31, 12, 1];
/// First bucket of each granularity within the bucket array.
pub const GRANULARITY_BUCKET_OFFSET: [usize; TTW_NUM_GRANULARITIES] = [0, 4, 28, 59, 71];

pub const GRANULARITY_QUARTER: usize = 0;
pub const GRANULARITY_HOUR: usize = 1;
pub const GRANULARITY_DAY: usize = 2;
pub const GRANULARITY_MONTH: usize = 3;
pub const GRANULARITY_YEAR: usize = 4;

/// Marks a bucket that has never been written. A written bucket holding 0
/// means "observed, but without support in this timeslot".
pub const BUCKET_UNUSED: SupportCount = SupportCount::MAX;

/// Fixed-size multi-granularity summary of support counts.
///
/// New quarters enter at bucket 0; each granularity fills left to right and,
/// once full, rolls its sum up into the first bucket of the next coarser
/// granularity. A rollup out of the Year granularity drops the sum.
///
/// Granularities are only ever dropped whole: partial drops would let
/// windows of different patterns tip over into coarser granularities at
/// different times, desynchronizing them.
#[derive(Debug, Clone)]
pub struct TiltedTimeWindow {
    pub(crate) buckets: [SupportCount; TTW_NUM_BUCKETS],
    pub(crate) capacity_used: [usize; TTW_NUM_GRANULARITIES],
    pub(crate) oldest_bucket_filled: Option<usize>,
    last_update: u32,
}

impl Default for TiltedTimeWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl TiltedTimeWindow {
    pub fn new() -> Self {
        Self {
            buckets: [BUCKET_UNUSED; TTW_NUM_BUCKETS],
            capacity_used: [0; TTW_NUM_GRANULARITIES],
            oldest_bucket_filled: None,
            last_update: 0,
        }
    }

    /// Record a new quarter's support count, cascading rollups as needed.
    pub fn append_quarter(&mut self, support: SupportCount, update_id: u32) {
        self.last_update = update_id;
        self.store(GRANULARITY_QUARTER, support);
    }

    /// Id of the batch that most recently wrote to this window.
    pub fn last_update(&self) -> u32 {
        self.last_update
    }

    pub fn is_empty(&self) -> bool {
        self.oldest_bucket_filled.is_none()
    }

    pub fn oldest_bucket_filled(&self) -> Option<usize> {
        self.oldest_bucket_filled
    }

    pub fn buckets(&self) -> &[SupportCount; TTW_NUM_BUCKETS] {
        &self.buckets
    }

    pub(crate) fn capacity_used(&self, granularity: usize) -> usize {
        self.capacity_used[granularity]
    }

    /// Total support over the bucket range `[from, to]`, counting only
    /// buckets that have been written.
    pub fn support_for_range(&self, from: usize, to: usize) -> SupportCount {
        debug_assert!(from <= to);
        debug_assert!(to < TTW_NUM_BUCKETS);
        if from > to || to >= TTW_NUM_BUCKETS {
            return 0;
        }
        let Some(oldest) = self.oldest_bucket_filled else {
            return 0;
        };

        let mut sum = 0;
        for i in from..=to.min(oldest) {
            if self.buckets[i] != BUCKET_UNUSED {
                sum += self.buckets[i];
            }
        }
        sum
    }

    /// Reset every granularity at or above `start`, coarsest first.
    pub fn drop_tail(&mut self, start: usize) {
        for granularity in (start..TTW_NUM_GRANULARITIES).rev() {
            self.reset(granularity);
        }
    }

    fn reset(&mut self, granularity: usize) {
        let offset = GRANULARITY_BUCKET_OFFSET[granularity];
        let count = GRANULARITY_BUCKET_COUNT[granularity];

        self.buckets[offset..offset + count].fill(BUCKET_UNUSED);
        self.capacity_used[granularity] = 0;

        // Pull the oldest-filled marker back to the oldest bucket still in
        // use when it pointed into this granularity.
        if let Some(oldest) = self.oldest_bucket_filled {
            if oldest >= offset && oldest < offset + count {
                self.oldest_bucket_filled =
                    (0..offset).rev().find(|&i| self.buckets[i] != BUCKET_UNUSED);
            }
        }
    }

    /// Roll a full granularity's sum up into the next coarser one. Past the
    /// topmost granularity the sum is dropped.
    fn shift(&mut self, granularity: usize) {
        if granularity + 1 >= TTW_NUM_GRANULARITIES {
            self.reset(granularity);
            return;
        }

        let offset = GRANULARITY_BUCKET_OFFSET[granularity];
        let count = GRANULARITY_BUCKET_COUNT[granularity];
        let sum = self.buckets[offset..offset + count].iter().sum();

        self.reset(granularity);
        self.store(granularity + 1, sum);
    }

    fn store(&mut self, granularity: usize, support: SupportCount) {
        let offset = GRANULARITY_BUCKET_OFFSET[granularity];
        let count = GRANULARITY_BUCKET_COUNT[granularity];

        if self.capacity_used[granularity] == count {
            self.shift(granularity);
        }

        // Newest entry goes into the granularity's first bucket; older
        // entries slide one slot toward its tail.
        let used = self.capacity_used[granularity];
        if used > 0 {
            self.buckets.copy_within(offset..offset + used, offset + 1);
        }
        self.buckets[offset] = support;
        self.capacity_used[granularity] += 1;

        let newest_tail = offset + self.capacity_used[granularity] - 1;
        if self.oldest_bucket_filled.map_or(true, |oldest| oldest < newest_tail) {
            self.oldest_bucket_filled = Some(newest_tail);
        }
    }
}
