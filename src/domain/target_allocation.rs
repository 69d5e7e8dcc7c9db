use crate::error::{Error, Result};

/// Minimum number of servers of each type that must be serving at each breakpoint (`d[i, k]`).
///
/// Lookups outside the horizon, including the predecessor of breakpoint `0`, yield `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetAllocation {
    num_breakpoints: usize,
    counts: Vec<i64>,
}

impl TargetAllocation {
    pub fn new(num_server_types: usize, num_breakpoints: usize) -> Self {
        TargetAllocation { num_breakpoints, counts: vec![0; num_server_types * num_breakpoints] }
    }

    /// Builds an allocation from one row of counts per server type.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Result<Self> {
        let num_breakpoints = rows.first().map_or(0, Vec::len);

        if let Some(i) = rows.iter().position(|row| row.len() != num_breakpoints) {
            return Err(Error::ModelConstructionError(format!(
                "Target allocation row {} has {} breakpoints, expected {}.",
                i,
                rows[i].len(),
                num_breakpoints
            )));
        }

        let counts: Vec<i64> = rows.into_iter().flatten().collect();

        if let Some(position) = counts.iter().position(|count| *count < 0) {
            return Err(Error::ModelConstructionError(format!(
                "Target allocation for server type {} at breakpoint {} is negative.",
                position / num_breakpoints,
                position % num_breakpoints
            )));
        }

        Ok(TargetAllocation { num_breakpoints, counts })
    }

    pub fn num_server_types(&self) -> usize {
        if self.num_breakpoints == 0 { 0 } else { self.counts.len() / self.num_breakpoints }
    }

    pub fn num_breakpoints(&self) -> usize {
        self.num_breakpoints
    }

    pub fn get(&self, i: usize, k: usize) -> i64 {
        if k >= self.num_breakpoints {
            return 0;
        }

        self.counts.get(i * self.num_breakpoints + k).copied().unwrap_or(0)
    }

    /// `d[i, k - 1]`, with `d[i, -1] = 0`.
    pub fn previous(&self, i: usize, k: usize) -> i64 {
        match k.checked_sub(1) {
            Some(previous) => self.get(i, previous),
            None => 0,
        }
    }

    pub fn set(&mut self, i: usize, k: usize, count: i64) {
        self.counts[i * self.num_breakpoints + k] = count;
    }

    pub fn row(&self, i: usize) -> &[i64] {
        &self.counts[i * self.num_breakpoints..(i + 1) * self.num_breakpoints]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_outside_the_horizon_are_zero() {
        let allocation = TargetAllocation::from_rows(vec![vec![2, 0, 3]]).unwrap();

        assert_eq!(allocation.previous(0, 0), 0);
        assert_eq!(allocation.previous(0, 1), 2);
        assert_eq!(allocation.get(0, 3), 0);
        assert_eq!(allocation.get(1, 0), 0);
    }

    #[test]
    fn rejects_ragged_and_negative_rows() {
        assert!(TargetAllocation::from_rows(vec![vec![1, 2], vec![1]]).is_err());
        assert!(TargetAllocation::from_rows(vec![vec![1, -2]]).is_err());
    }

    #[test]
    fn set_and_row() {
        let mut allocation = TargetAllocation::new(2, 3);
        allocation.set(1, 2, 5);

        assert_eq!(allocation.num_server_types(), 2);
        assert_eq!(allocation.row(1), &[0, 0, 5]);
        assert_eq!(allocation.row(0), &[0, 0, 0]);
    }
}
