use std::ops::{AddAssign, Index, SubAssign};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

type Vector = SmallVec<[i64; 2]>;

/// A multi-dimensional integer quantity: vehicle capacities, job pickups and
/// deliveries, and running loads. Dimensions missing on one side of an
/// operation are treated as zero.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Amount(Vector);

impl Amount {
    pub const EMPTY: Amount = Amount(Vector::new_const());

    pub fn empty() -> Self {
        Self::EMPTY
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        let mut vec = SmallVec::with_capacity(dimensions);
        vec.resize(dimensions, 0);
        Amount(vec)
    }

    pub fn from_vec(vec: Vec<i64>) -> Self {
        Amount(SmallVec::from_vec(vec))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty() || self.0.iter().all(|&v| v == 0)
    }

    #[inline]
    pub fn get(&self, index: usize) -> i64 {
        self.0.get(index).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }

    /// Componentwise `self <= capacity`. This is the load check: a load fits
    /// as long as no dimension exceeds the corresponding capacity entry.
    pub fn fits_within(&self, capacity: &Amount) -> bool {
        (0..self.len().max(capacity.len())).all(|i| self.get(i) <= capacity.get(i))
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, rhs: &Amount) {
        if self.0.len() < rhs.len() {
            self.0.resize(rhs.len(), 0);
        }

        for (a, b) in self.0.iter_mut().zip(rhs.iter()) {
            *a += b;
        }
    }
}

impl SubAssign<&Amount> for Amount {
    fn sub_assign(&mut self, rhs: &Amount) {
        if self.0.len() < rhs.len() {
            self.0.resize(rhs.len(), 0);
        }

        for (a, b) in self.0.iter_mut().zip(rhs.iter()) {
            *a -= b;
        }
    }
}

impl Index<usize> for Amount {
    type Output = i64;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        (0..self.len().max(other.len())).all(|i| self.get(i) == other.get(i))
    }
}

impl Eq for Amount {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_assign_extends_dimensions() {
        let mut a = Amount::from_vec(vec![10, 20]);
        let b = Amount::from_vec(vec![5, 15, 25]);

        a += &b;

        assert_eq!(a.get(0), 15);
        assert_eq!(a.get(1), 35);
        assert_eq!(a.get(2), 25);
    }

    #[test]
    fn test_sub_assign() {
        let mut a = Amount::from_vec(vec![10, 20, 30]);
        let b = Amount::from_vec(vec![5, 15]);

        a -= &b;

        assert_eq!(a, Amount::from_vec(vec![5, 5, 30]));
    }

    #[test]
    fn test_fits_within() {
        let capacity = Amount::from_vec(vec![10, 5]);

        assert!(Amount::from_vec(vec![10, 5]).fits_within(&capacity));
        assert!(Amount::from_vec(vec![0, 0]).fits_within(&capacity));
        assert!(Amount::empty().fits_within(&capacity));
        assert!(!Amount::from_vec(vec![11, 0]).fits_within(&capacity));
        assert!(!Amount::from_vec(vec![0, 6]).fits_within(&capacity));
        assert!(!Amount::from_vec(vec![0, 0, 1]).fits_within(&capacity));
    }

    #[test]
    fn test_eq_ignores_trailing_zeros() {
        assert_eq!(Amount::from_vec(vec![1, 0]), Amount::from_vec(vec![1]));
        assert_eq!(Amount::empty(), Amount::from_vec(vec![0, 0]));
        assert_ne!(Amount::from_vec(vec![1]), Amount::from_vec(vec![1, 2]));
    }
}
