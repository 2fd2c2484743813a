use crate::utils::validation::count_to_f64;

/// Per-position read depth over one reference
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoverageProfile {
    depth: Vec<u32>,
}

impl CoverageProfile {
    /// Create a zero-filled profile of `length` positions
    pub fn new(length: u64) -> Self {
        let length = usize::try_from(length).unwrap_or(usize::MAX);
        Self {
            depth: vec![0; length],
        }
    }

    /// Number of positions in the profile
    pub fn len(&self) -> usize {
        self.depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }

    /// Depth at each position, 0-based
    pub fn depth(&self) -> &[u32] {
        &self.depth
    }

    /// Add one to every position in `[start, start + span_len)` that lies on the reference
    ///
    /// Aligners may report spans that run past the stored reference length, so
    /// out-of-range positions are dropped rather than rejected. A non-positive
    /// `span_len` is a no-op. Returns the number of positions dropped past the
    /// end of the reference.
    pub fn add_span(&mut self, start: i64, span_len: i64) -> u64 {
        if span_len <= 0 {
            return 0;
        }
        let end = start.saturating_add(span_len);
        let length = i64::try_from(self.depth.len()).unwrap_or(i64::MAX);

        let lo = start.clamp(0, length);
        let hi = end.clamp(0, length);
        let overrun = end.saturating_sub(length.max(start)).max(0);

        // lo/hi are within [0, len] so the casts cannot truncate
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        for d in &mut self.depth[lo as usize..hi as usize] {
            *d = d.saturating_add(1);
        }

        #[allow(clippy::cast_sign_loss)]
        {
            overrun as u64
        }
    }

    /// Arithmetic mean depth over all positions; 0.0 for an empty profile
    pub fn mean_depth(&self) -> f64 {
        if self.depth.is_empty() {
            return 0.0;
        }
        let total: u64 = self.depth.iter().map(|&d| u64::from(d)).sum();
        count_to_f64(total) / count_to_f64(self.depth.len() as u64)
    }

    /// Count of positions with depth of at least 1
    pub fn covered_bases(&self) -> u64 {
        self.covered_bases_within(1, None)
    }

    /// Count of positions with `min_value <= depth <= max_value`
    ///
    /// A `max_value` of `None` leaves the upper bound open.
    pub fn covered_bases_within(&self, min_value: u32, max_value: Option<u32>) -> u64 {
        let max_value = max_value.unwrap_or(u32::MAX);
        self.depth
            .iter()
            .filter(|&&d| d >= min_value && d <= max_value)
            .count() as u64
    }
}
