use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A closed interval during which a task should be serviced. A missing bound
/// is unconstrained; a window with neither bound is the default window and
/// contributes no scheduling constraint at all.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    start: Option<Timestamp>,
    end: Option<Timestamp>,
}

impl TimeWindow {
    pub fn new(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        if let (Some(start), Some(end)) = (start, end) {
            assert!(start <= end, "time window start must not exceed its end");
        }

        TimeWindow { start, end }
    }

    pub fn from_range(start: Timestamp, end: Timestamp) -> Self {
        Self::new(Some(start), Some(end))
    }

    pub fn start(&self) -> Option<Timestamp> {
        self.start
    }

    pub fn end(&self) -> Option<Timestamp> {
        self.end
    }

    pub fn is_default(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn start_or(&self, fallback: Timestamp) -> Timestamp {
        self.start.unwrap_or(fallback)
    }

    pub fn end_or(&self, fallback: Timestamp) -> Timestamp {
        self.end.unwrap_or(fallback)
    }
}

#[derive(Default)]
pub struct TimeWindowBuilder {
    start: Option<Timestamp>,
    end: Option<Timestamp>,
}

impl TimeWindowBuilder {
    pub fn with_start(mut self, start: Timestamp) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: Timestamp) -> Self {
        self.end = Some(end);
        self
    }

    pub fn build(self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}

/// The windows of one task, ordered by start and non-overlapping. Always
/// non-empty: a task without windows holds a single default window.
#[derive(Serialize, Debug, Clone)]
pub struct TimeWindows(SmallVec<[TimeWindow; 1]>);

impl TimeWindows {
    pub fn from_vec(windows: Vec<TimeWindow>) -> Self {
        if windows.is_empty() {
            return Self::default();
        }

        for pair in windows.windows(2) {
            assert!(
                pair[0].end_or(Timestamp::MAX) < pair[1].start_or(Timestamp::MIN),
                "time windows must be sorted and disjoint"
            );
        }

        TimeWindows(SmallVec::from_vec(windows))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_default(&self) -> bool {
        self.0.len() == 1 && self.0[0].is_default()
    }

    pub fn get(&self, rank: usize) -> &TimeWindow {
        &self.0[rank]
    }

    pub fn first(&self) -> &TimeWindow {
        &self.0[0]
    }

    pub fn last(&self) -> &TimeWindow {
        &self.0[self.0.len() - 1]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeWindow> {
        self.0.iter()
    }
}

impl Default for TimeWindows {
    fn default() -> Self {
        TimeWindows(SmallVec::from_elem(TimeWindow::default(), 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_second(secs).unwrap()
    }

    #[test]
    fn test_builder() {
        let window = TimeWindowBuilder::default()
            .with_start(ts(50))
            .with_end(ts(60))
            .build();

        assert_eq!(window.start(), Some(ts(50)));
        assert_eq!(window.end(), Some(ts(60)));
        assert!(!window.is_default());
    }

    #[test]
    fn test_default_window() {
        let window = TimeWindow::default();

        assert!(window.is_default());
        assert_eq!(window.start_or(ts(7)), ts(7));
        assert_eq!(window.end_or(ts(9)), ts(9));
    }

    #[test]
    #[should_panic(expected = "start must not exceed")]
    fn test_rejects_inverted_window() {
        TimeWindow::from_range(ts(10), ts(5));
    }

    #[test]
    fn test_empty_vec_becomes_default() {
        let windows = TimeWindows::from_vec(vec![]);

        assert_eq!(windows.len(), 1);
        assert!(windows.is_default());
    }

    #[test]
    fn test_sorted_windows_accepted() {
        let windows = TimeWindows::from_vec(vec![
            TimeWindow::from_range(ts(0), ts(10)),
            TimeWindow::from_range(ts(100), ts(110)),
        ]);

        assert_eq!(windows.len(), 2);
        assert_eq!(windows.first().start(), Some(ts(0)));
        assert_eq!(windows.last().end(), Some(ts(110)));
    }

    #[test]
    #[should_panic(expected = "sorted and disjoint")]
    fn test_rejects_overlapping_windows() {
        TimeWindows::from_vec(vec![
            TimeWindow::from_range(ts(0), ts(100)),
            TimeWindow::from_range(ts(50), ts(110)),
        ]);
    }
}
