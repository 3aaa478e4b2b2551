//! Bounded-memory quantile sketch over a stream of nanosecond samples.
//!
//! The sketch is a compressed centroid list: a sorted, capacity-bounded
//! vector of `(sum, count)` centroids. Each incoming sample is inserted as a
//! unit centroid; once the list exceeds its capacity, the adjacent pair with
//! the smallest combined count is merged. The merge rule keeps centroid
//! weights balanced, so no centroid ever absorbs more than roughly `2n/k`
//! samples for capacity `k`, and a quantile query lands within `n/k` ranks
//! of the true rank regardless of how long the stream runs.
//!
//! Alongside the approximate quantiles the sketch keeps *exact* state that
//! the severity table depends on: per-bucket counts over a predeclared
//! partition of the value domain, and the maximum sample together with the
//! iteration index that produced it.
//!
//! All sample arithmetic is integer (`u64` values, `u128` centroid sums);
//! floating point appears only in the `quantile(q)` query parameter, so
//! identical streams produce identical sketches on every host.

/// Default number of centroids retained by the sketch.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy)]
struct Centroid {
    sum: u128,
    count: u64,
}

impl Centroid {
    #[inline]
    fn unit(value: u64) -> Self {
        Self {
            sum: value as u128,
            count: 1,
        }
    }

    #[inline]
    fn mean(&self) -> u64 {
        (self.sum / self.count as u128) as u64
    }
}

/// Streaming quantile and histogram estimator with strictly bounded memory.
#[derive(Debug, Clone)]
pub struct QuantileSketch {
    centroids: Vec<Centroid>,
    capacity: usize,
    /// Upper edges of the bucket partition; the bucket past the last edge is
    /// unbounded. Edges are strictly increasing.
    edges: Vec<u64>,
    bucket_counts: Vec<u64>,
    count: u64,
    max: Option<(u64, u64)>,
}

impl QuantileSketch {
    /// Create a sketch with the given centroid capacity and bucket edges.
    ///
    /// `edges` are the upper bounds of the half-open buckets
    /// `[0, e0) [e0, e1) … [e_last, ∞)`; the sketch therefore tracks
    /// `edges.len() + 1` exact bucket counts. All storage is allocated here;
    /// `record` never allocates.
    pub fn with_capacity(capacity: usize, edges: &[u64]) -> Self {
        debug_assert!(capacity >= 2, "sketch needs at least two centroids");
        debug_assert!(edges.windows(2).all(|w| w[0] < w[1]));
        Self {
            // One slot of headroom: insert first, then merge back down.
            centroids: Vec::with_capacity(capacity + 1),
            capacity,
            edges: edges.to_vec(),
            bucket_counts: vec![0; edges.len() + 1],
            count: 0,
            max: None,
        }
    }

    /// Create a sketch with [`DEFAULT_CAPACITY`] centroids.
    pub fn new(edges: &[u64]) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, edges)
    }

    /// Record one sample tagged with the iteration index that produced it.
    ///
    /// Amortized `O(log k)` in the centroid capacity `k`: a binary search to
    /// find the insertion point, plus an occasional linear merge pass.
    pub fn record(&mut self, value: u64, index: u64) {
        self.count += 1;
        let bucket = self.bucket_of(value);
        self.bucket_counts[bucket] += 1;

        match self.max {
            Some((current, _)) if value <= current => {}
            _ => self.max = Some((value, index)),
        }

        let at = self.centroids.partition_point(|c| c.mean() <= value);
        self.centroids.insert(at, Centroid::unit(value));
        if self.centroids.len() > self.capacity {
            self.merge_lightest_pair();
        }
    }

    /// Merge the adjacent centroid pair with the smallest combined count.
    ///
    /// The merged mean lies between the two source means, so the list stays
    /// sorted without re-sorting.
    fn merge_lightest_pair(&mut self) {
        let mut best = 0;
        let mut best_weight = u64::MAX;
        for i in 0..self.centroids.len() - 1 {
            let weight = self.centroids[i].count + self.centroids[i + 1].count;
            if weight < best_weight {
                best_weight = weight;
                best = i;
            }
        }
        let absorbed = self.centroids.remove(best + 1);
        let kept = &mut self.centroids[best];
        kept.sum += absorbed.sum;
        kept.count += absorbed.count;
    }

    #[inline]
    fn bucket_of(&self, value: u64) -> usize {
        self.edges.partition_point(|&edge| edge <= value)
    }

    /// Approximate quantile of the stream, `0.0 <= q <= 1.0`.
    ///
    /// Returns the mean of the centroid covering the target rank; the rank
    /// error is bounded by the heaviest centroid, i.e. by the stream length
    /// divided by the capacity, independent of how many samples were fed.
    /// `None` on an empty stream.
    pub fn quantile(&self, q: f64) -> Option<u64> {
        if self.count == 0 {
            return None;
        }
        let q = q.clamp(0.0, 1.0);
        let target = (q * (self.count - 1) as f64).round() as u64;
        let mut cumulative = 0u64;
        for centroid in &self.centroids {
            cumulative += centroid.count;
            if cumulative > target {
                return Some(centroid.mean());
            }
        }
        self.centroids.last().map(Centroid::mean)
    }

    /// Exact number of samples that fell in the `i`-th declared bucket.
    pub fn count_in_bucket(&self, i: usize) -> u64 {
        self.bucket_counts[i]
    }

    /// Number of buckets, including the unbounded rightmost one.
    pub fn bucket_len(&self) -> usize {
        self.bucket_counts.len()
    }

    /// Exact maximum sample and the iteration index at which it occurred.
    pub fn max(&self) -> Option<(u64, u64)> {
        self.max
    }

    /// Total number of recorded samples.
    pub fn len(&self) -> u64 {
        self.count
    }

    /// True if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sketch_with_edges() -> QuantileSketch {
        QuantileSketch::new(&[125_000, 250_000, 500_000, 1_000_000])
    }

    #[test]
    fn bucket_counts_sum_to_stream_length() {
        let mut sketch = sketch_with_edges();
        for i in 0..10_000u64 {
            sketch.record(i * 173 % 2_000_000, i);
        }
        let total: u64 = (0..sketch.bucket_len())
            .map(|i| sketch.count_in_bucket(i))
            .sum();
        assert_eq!(total, 10_000);
        assert_eq!(sketch.len(), 10_000);
    }

    #[test]
    fn bucket_edges_are_half_open() {
        let mut sketch = QuantileSketch::new(&[100, 200]);
        sketch.record(99, 0);
        sketch.record(100, 1);
        sketch.record(199, 2);
        sketch.record(200, 3);
        assert_eq!(sketch.count_in_bucket(0), 1);
        assert_eq!(sketch.count_in_bucket(1), 2);
        assert_eq!(sketch.count_in_bucket(2), 1);
    }

    #[test]
    fn max_tracks_value_and_index_exactly() {
        let mut sketch = sketch_with_edges();
        sketch.record(10, 0);
        sketch.record(999, 7);
        sketch.record(500, 12);
        // Ties keep the first index that reached the maximum.
        sketch.record(999, 30);
        assert_eq!(sketch.max(), Some((999, 7)));
    }

    #[test]
    fn quantile_error_is_bounded_on_uniform_stream() {
        let mut sketch = sketch_with_edges();
        let n = 1_000_000u64;
        // Deterministic uniform coverage of [0, 1000).
        for i in 0..n {
            sketch.record(i * 997 % 1000, i);
        }
        assert_eq!(sketch.max().map(|(v, _)| v), Some(999));

        // Rank error <= n / capacity, which for uniform values in [0, 1000)
        // translates to a value error of a few times 1000 / capacity once
        // centroid averaging at the query point is included.
        let tolerance = 32;
        let median = sketch.quantile(0.5).unwrap();
        assert!(
            median.abs_diff(500) <= tolerance,
            "median {median} too far from 500"
        );
        let p99 = sketch.quantile(0.99).unwrap();
        assert!(p99.abs_diff(990) <= tolerance, "p99 {p99} too far from 990");
    }

    #[test]
    fn memory_is_bounded_by_capacity() {
        let mut sketch = QuantileSketch::with_capacity(64, &[1_000]);
        for i in 0..100_000u64 {
            sketch.record(i % 50_000, i);
        }
        assert!(sketch.centroids.len() <= 64);
        // The headroom slot means an insert never reallocates.
        assert!(sketch.centroids.capacity() <= 66);
    }

    #[test]
    fn quantile_extremes() {
        let mut sketch = sketch_with_edges();
        for i in 1..=100u64 {
            sketch.record(i, i);
        }
        assert_eq!(sketch.quantile(0.0), Some(1));
        assert_eq!(sketch.quantile(1.0), Some(100));
    }

    #[test]
    fn empty_sketch_has_no_answers() {
        let sketch = sketch_with_edges();
        assert_eq!(sketch.quantile(0.5), None);
        assert_eq!(sketch.max(), None);
        assert!(sketch.is_empty());
    }

    #[test]
    fn merged_centroids_stay_sorted() {
        let mut sketch = QuantileSketch::with_capacity(8, &[1_000]);
        for i in (0..1000u64).rev() {
            sketch.record(i * 13 % 977, i);
        }
        let means: Vec<u64> = sketch.centroids.iter().map(Centroid::mean).collect();
        let mut sorted = means.clone();
        sorted.sort_unstable();
        assert_eq!(means, sorted);
    }
}
