/// Identifies one dataset-switch load.
///
/// Fetches are not cancellable; when a newer load begins, completions
/// carrying an older generation are detected and discarded instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadGeneration(pub u64);
