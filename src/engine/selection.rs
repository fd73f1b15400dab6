//! Selection ranges in seconds

use serde::{Deserialize, Serialize};

/// A time range used for copy/cut/delete and selection-restricted playback
///
/// Each end is either a time in seconds or unset. The range itself does not
/// enforce `start <= end`; the controller normalizes raw ranges coming from
/// gesture handling before storing them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl SelectionRange {
    /// Range with both ends set
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Range with neither end set
    pub fn cleared() -> Self {
        Self::default()
    }

    /// True if neither end is set
    pub fn is_cleared(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Swap the ends if both are set and `start > end`
    pub fn normalized(self) -> Self {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => Self::new(end, start),
            _ => self,
        }
    }

    /// Normalize, then clamp both ends into `[0, max]`
    pub fn clamped(self, max: f64) -> Self {
        let clamp = |t: f64| t.clamp(0.0, max.max(0.0));
        let normalized = self.normalized();
        Self {
            start: normalized.start.map(clamp),
            end: normalized.end.map(clamp),
        }
    }

    /// Normalized `(start, end)` if both ends are set
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let normalized = self.normalized();
        Some((normalized.start?, normalized.end?))
    }

    /// Normalized bounds, only when the range has non-zero length
    pub fn effective(&self) -> Option<(f64, f64)> {
        self.bounds().filter(|(start, end)| end > start)
    }

    /// Length in seconds, zero when not effective
    pub fn duration(&self) -> f64 {
        self.effective().map(|(s, e)| e - s).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_swaps_reversed_range() {
        let raw = SelectionRange::new(5.0, 2.0);
        assert_eq!(raw.normalized(), SelectionRange::new(2.0, 5.0));
        assert_eq!(raw.bounds(), Some((2.0, 5.0)));
        assert_eq!(raw.effective(), Some((2.0, 5.0)));
    }

    #[test]
    fn test_zero_length_is_not_effective() {
        let sel = SelectionRange::new(3.0, 3.0);
        assert_eq!(sel.bounds(), Some((3.0, 3.0)));
        assert_eq!(sel.effective(), None);
        assert_eq!(sel.duration(), 0.0);
    }

    #[test]
    fn test_partial_selection_has_no_bounds() {
        let sel = SelectionRange {
            start: Some(1.0),
            end: None,
        };
        assert_eq!(sel.bounds(), None);
        assert!(!sel.is_cleared());
        assert!(SelectionRange::cleared().is_cleared());
    }

    #[test]
    fn test_clamped() {
        let sel = SelectionRange::new(12.0, -1.0).clamped(10.0);
        assert_eq!(sel, SelectionRange::new(0.0, 10.0));
    }
}
