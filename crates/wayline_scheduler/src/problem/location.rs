use jiff::SignedDuration;
use serde::Deserialize;

use crate::define_index_newtype;

define_index_newtype!(LocationIdx);

/// Travel durations between locations, flattened row-major: the entry for a
/// pair is at `from * num_locations + to`. Durations are whole seconds.
#[derive(Deserialize, Debug, Clone)]
pub struct TravelMatrix {
    times: Vec<i64>,
    num_locations: usize,
}

impl TravelMatrix {
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Self {
        let num_locations = rows.len();
        assert!(
            rows.iter().all(|row| row.len() == num_locations),
            "travel matrix must be square"
        );
        assert!(
            rows.iter().flatten().all(|&t| t >= 0),
            "travel durations must be non-negative"
        );

        TravelMatrix { times: rows.into_iter().flatten().collect(), num_locations }
    }

    #[inline(always)]
    fn get_index(&self, from: LocationIdx, to: LocationIdx) -> usize {
        from.get() * self.num_locations + to.get()
    }

    #[inline(always)]
    pub fn travel_time(&self, from: LocationIdx, to: LocationIdx) -> SignedDuration {
        if from == to {
            return SignedDuration::ZERO;
        }

        SignedDuration::from_secs(self.times[self.get_index(from, to)])
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_time_lookup() {
        let matrix = TravelMatrix::from_rows(vec![vec![0, 10], vec![7, 0]]);

        assert_eq!(
            matrix.travel_time(LocationIdx::new(0), LocationIdx::new(1)),
            SignedDuration::from_secs(10)
        );
        assert_eq!(
            matrix.travel_time(LocationIdx::new(1), LocationIdx::new(0)),
            SignedDuration::from_secs(7)
        );
        assert_eq!(
            matrix.travel_time(LocationIdx::new(1), LocationIdx::new(1)),
            SignedDuration::ZERO
        );
    }

    #[test]
    #[should_panic(expected = "square")]
    fn test_rejects_ragged_rows() {
        TravelMatrix::from_rows(vec![vec![0, 1], vec![1]]);
    }
}
