use std::collections::BTreeSet;

use foundation::ids::{BinId, bin_range};

/// User-entered bin range rejected before any state mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidRangeError {
    NotANumber(String),
    Inverted { from: u32, to: u32 },
}

impl std::fmt::Display for InvalidRangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidRangeError::NotANumber(raw) => {
                write!(f, "'{raw}' is not a valid bin number")
            }
            InvalidRangeError::Inverted { from, to } => {
                write!(f, "bin range {from}..{to} is inverted")
            }
        }
    }
}

impl std::error::Error for InvalidRangeError {}

/// Parses one bin bound from raw control input.
pub fn parse_bin_input(raw: &str) -> Result<u32, InvalidRangeError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| InvalidRangeError::NotANumber(raw.to_string()))
}

/// The one authoritative selection.
///
/// Checkbox and range selection are mutually exclusive by construction:
/// holding them in a single tagged value makes simultaneous checkbox and
/// range state unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Checkbox(BTreeSet<BinId>),
    Range {
        from: u32,
        to: u32,
    },
}

impl Selection {
    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Selection::Range { .. })
    }

    pub fn range_bounds(&self) -> Option<(u32, u32)> {
        match self {
            Selection::Range { from, to } => Some((*from, *to)),
            _ => None,
        }
    }

    /// Materializes the selected bin ids in ascending order.
    pub fn ids(&self) -> BTreeSet<BinId> {
        match self {
            Selection::None => BTreeSet::new(),
            Selection::Checkbox(ids) => ids.clone(),
            Selection::Range { from, to } => bin_range(*from, *to).into_iter().collect(),
        }
    }

    pub fn contains(&self, bin: BinId) -> bool {
        match self {
            Selection::None => false,
            Selection::Checkbox(ids) => ids.contains(&bin),
            Selection::Range { from, to } => bin.value() >= *from && bin.value() <= *to,
        }
    }
}

/// What changed, published on the runtime event bus.
///
/// Views subscribe to these instead of being called by the mutation sites,
/// so the session state never knows which views exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    DatasetChanged(String),
    SelectionChanged,
    FiltersChanged,
    WeightPercentileChanged,
    LinkOpacityChanged,
    SessionReset,
}

/// Process-wide session state; one instance per page session, one logical
/// writer (the UI event loop).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    dataset: Option<String>,
    selection: Selection,
    /// 3D click selection; deliberately separate from the multi-select.
    clicked_node: Option<BinId>,
    interaction_filters: BTreeSet<i32>,
    edge_weight_percentile: u8,
    link_opacity: u8,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            dataset: None,
            selection: Selection::None,
            clicked_node: None,
            interaction_filters: BTreeSet::new(),
            edge_weight_percentile: 100,
            link_opacity: 100,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_ids(&self) -> BTreeSet<BinId> {
        self.selection.ids()
    }

    pub fn clicked_node(&self) -> Option<BinId> {
        self.clicked_node
    }

    pub fn interaction_filters(&self) -> &BTreeSet<i32> {
        &self.interaction_filters
    }

    pub fn edge_weight_percentile(&self) -> u8 {
        self.edge_weight_percentile
    }

    pub fn link_opacity(&self) -> u8 {
        self.link_opacity
    }

    /// Switches the active dataset and drops every per-dataset selection.
    pub fn set_dataset(&mut self, name: impl Into<String>) -> SessionEvent {
        let name = name.into();
        self.dataset = Some(name.clone());
        self.selection = Selection::None;
        self.clicked_node = None;
        SessionEvent::DatasetChanged(name)
    }

    /// Replaces the selection with a discrete checkbox id set.
    ///
    /// Any active range selection is cleared; the two modes never coexist.
    pub fn select_by_checkbox(&mut self, ids: impl IntoIterator<Item = BinId>) -> SessionEvent {
        self.selection = Selection::Checkbox(ids.into_iter().collect());
        SessionEvent::SelectionChanged
    }

    /// Replaces the selection with a contiguous bin range.
    ///
    /// Fails before any mutation when the range is inverted; callers show
    /// the error to the user instead of silently ignoring it.
    pub fn select_by_range(&mut self, from: u32, to: u32) -> Result<SessionEvent, InvalidRangeError> {
        if from > to {
            return Err(InvalidRangeError::Inverted { from, to });
        }
        self.selection = Selection::Range { from, to };
        Ok(SessionEvent::SelectionChanged)
    }

    pub fn set_interaction_filters(
        &mut self,
        codes: impl IntoIterator<Item = i32>,
    ) -> SessionEvent {
        self.interaction_filters = codes.into_iter().collect();
        SessionEvent::FiltersChanged
    }

    /// Clamped to 0..=100.
    pub fn set_weight_percentile(&mut self, percentile: i64) -> SessionEvent {
        self.edge_weight_percentile = percentile.clamp(0, 100) as u8;
        SessionEvent::WeightPercentileChanged
    }

    /// Clamped to 0..=100.
    pub fn set_link_opacity(&mut self, opacity: i64) -> SessionEvent {
        self.link_opacity = opacity.clamp(0, 100) as u8;
        SessionEvent::LinkOpacityChanged
    }

    /// Toggles the 3D click selection; clicking the same node deselects it.
    pub fn toggle_clicked_node(&mut self, bin: BinId) -> Option<BinId> {
        self.clicked_node = match self.clicked_node {
            Some(current) if current == bin => None,
            _ => Some(bin),
        };
        self.clicked_node
    }

    pub fn reset(&mut self) -> SessionEvent {
        *self = Self {
            dataset: self.dataset.clone(),
            ..Self::default()
        };
        SessionEvent::SessionReset
    }
}

#[cfg(test)]
mod tests {
    use super::{InvalidRangeError, Selection, SessionState, parse_bin_input};
    use foundation::ids::BinId;
    use std::collections::BTreeSet;

    fn ids(values: &[u32]) -> BTreeSet<BinId> {
        values.iter().copied().map(BinId).collect()
    }

    #[test]
    fn range_selection_materializes_inclusive_ids() {
        let mut state = SessionState::new();
        state.select_by_range(3, 5).unwrap();
        assert_eq!(state.selected_ids(), ids(&[3, 4, 5]));
        assert!(state.selection().is_range());
    }

    #[test]
    fn inverted_range_is_rejected_without_mutation() {
        let mut state = SessionState::new();
        state.select_by_checkbox(ids(&[7]));

        let err = state.select_by_range(5, 3).unwrap_err();
        assert_eq!(err, InvalidRangeError::Inverted { from: 5, to: 3 });
        // The previous selection is untouched.
        assert_eq!(state.selected_ids(), ids(&[7]));
    }

    #[test]
    fn checkbox_and_range_are_mutually_exclusive() {
        let mut state = SessionState::new();

        state.select_by_range(1, 4).unwrap();
        state.select_by_checkbox(ids(&[9, 11]));
        assert_eq!(state.selected_ids(), ids(&[9, 11]));
        assert!(state.selection().range_bounds().is_none());

        state.select_by_range(2, 3).unwrap();
        assert_eq!(state.selected_ids(), ids(&[2, 3]));
        assert!(!matches!(state.selection(), Selection::Checkbox(_)));
    }

    #[test]
    fn sliders_clamp_to_percent_range() {
        let mut state = SessionState::new();
        state.set_weight_percentile(250);
        assert_eq!(state.edge_weight_percentile(), 100);
        state.set_weight_percentile(-5);
        assert_eq!(state.edge_weight_percentile(), 0);
        state.set_link_opacity(70);
        assert_eq!(state.link_opacity(), 70);
    }

    #[test]
    fn clicked_node_toggles_and_is_separate_from_multi_select() {
        let mut state = SessionState::new();
        state.select_by_checkbox(ids(&[1, 2]));

        assert_eq!(state.toggle_clicked_node(BinId(5)), Some(BinId(5)));
        assert_eq!(state.toggle_clicked_node(BinId(5)), None);
        assert_eq!(state.selected_ids(), ids(&[1, 2]));
    }

    #[test]
    fn reset_keeps_the_dataset_but_drops_everything_else() {
        let mut state = SessionState::new();
        state.set_dataset("Bacillus_30C");
        state.select_by_range(1, 10).unwrap();
        state.set_interaction_filters([1, 2]);
        state.set_weight_percentile(40);

        state.reset();
        assert_eq!(state.dataset(), Some("Bacillus_30C"));
        assert!(state.selection().is_none());
        assert!(state.interaction_filters().is_empty());
        assert_eq!(state.edge_weight_percentile(), 100);
    }

    #[test]
    fn dataset_switch_clears_selection() {
        let mut state = SessionState::new();
        state.select_by_checkbox(ids(&[1]));
        state.set_dataset("Bacillus_42C45M");
        assert!(state.selection().is_none());
    }

    #[test]
    fn bin_input_parsing() {
        assert_eq!(parse_bin_input(" 42 "), Ok(42));
        assert!(matches!(
            parse_bin_input("abc"),
            Err(InvalidRangeError::NotANumber(_))
        ));
        assert!(matches!(
            parse_bin_input(""),
            Err(InvalidRangeError::NotANumber(_))
        ));
    }
}
