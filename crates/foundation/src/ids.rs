use std::fmt;

/// Discrete genomic interval (bin) identifier.
///
/// Bin ids are the universal join key across dataset resources: node ids,
/// edge endpoints, heatmap axes and parallel-plot axes all resolve through
/// the numeric bin id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BinId(pub u32);

impl BinId {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derives the numeric bin id from a dataset node id such as `"Node42"`.
///
/// All non-digit characters are ignored, so `"Node42"`, `"bin_42"` and
/// `"42"` resolve to the same id. Returns `None` when the string carries no
/// digits at all. Values beyond `u32::MAX` saturate.
pub fn numeric_id(id: &str) -> Option<BinId> {
    let mut value: u64 = 0;
    let mut seen = false;
    for c in id.chars() {
        if let Some(d) = c.to_digit(10) {
            seen = true;
            value = value.saturating_mul(10).saturating_add(d as u64);
        }
    }
    if !seen {
        return None;
    }
    Some(BinId(value.min(u32::MAX as u64) as u32))
}

/// Materializes the contiguous bin range `from..=to` in ascending order.
///
/// Callers validate the range ordering before calling; an inverted range
/// yields an empty vec rather than panicking.
pub fn bin_range(from: u32, to: u32) -> Vec<BinId> {
    if from > to {
        return Vec::new();
    }
    (from..=to).map(BinId).collect()
}
