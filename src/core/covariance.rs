use super::{self_displacements, DomainError, MatrixXd, PositionTable};
use log::debug;

/// Number of timesteps spanned by one covariance window
pub const WINDOW_SIZE: usize = 3;

/// Covariance of two per-atom displacement vectors.
///
/// Each atom is treated as a variable and the two vectors as two
/// observations of all variables, so the result is `natoms x natoms`.
/// The unbiased estimator is used (denominator is the number of
/// observations minus one).
pub fn covariance(first: &[f64], second: &[f64]) -> Result<MatrixXd, DomainError> {
    if first.len() != second.len() {
        return Err(DomainError::Sizes(first.len(), second.len()));
    }
    Ok(covariance_of_observations(&[first, second]))
}

/// Covariance between atoms over any number of observations
pub fn covariance_of_observations(obs: &[&[f64]]) -> MatrixXd {
    let nvar = obs.first().map_or(0, |o| o.len());
    let nobs = obs.len();
    // Rows are variables, columns are observations
    let mut x = MatrixXd::from_fn(nvar, nobs, |i, k| obs[k][i]);
    for mut row in x.row_iter_mut() {
        let m = row.mean();
        row.add_scalar_mut(-m);
    }
    let denom = nobs.saturating_sub(1).max(1) as f64;
    (&x * x.transpose()) / denom
}

/// Displacement covariance for the window starting at timestep `start`.
///
/// Correlates per-atom displacements `start -> start+1` with
/// displacements `start+1 -> start+2`.
pub fn windowed_covariance(table: &PositionTable, start: usize) -> Result<MatrixXd, DomainError> {
    table.require("covariance", WINDOW_SIZE)?;
    let available = table.num_timesteps();
    if start + WINDOW_SIZE > available {
        return Err(DomainError::WindowOutOfRange { start, available });
    }
    let f = self_displacements(table, start, start + 1);
    let s = self_displacements(table, start + 1, start + 2);
    covariance(&f, &s)
}

/// Number of covariance windows in the table
pub fn num_windows(table: &PositionTable) -> usize {
    (table.num_timesteps() + 1).saturating_sub(WINDOW_SIZE)
}

/// Lazy sequence of covariance matrices for all windows.
///
/// Only one matrix is alive at a time, which matters for large atom counts.
pub struct CovarianceWindows<'a> {
    table: &'a PositionTable,
    cur: usize,
    end: usize,
}

impl<'a> CovarianceWindows<'a> {
    pub fn new(table: &'a PositionTable) -> Result<Self, DomainError> {
        table.require("covariance", WINDOW_SIZE)?;
        debug!(
            "{} covariance windows of {}x{}",
            num_windows(table),
            table.num_atoms(),
            table.num_atoms()
        );
        Ok(Self {
            table,
            cur: 0,
            end: num_windows(table),
        })
    }
}

impl Iterator for CovarianceWindows<'_> {
    type Item = MatrixXd;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur >= self.end {
            return None;
        }
        let f = self_displacements(self.table, self.cur, self.cur + 1);
        let s = self_displacements(self.table, self.cur + 1, self.cur + 2);
        self.cur += 1;
        // Lengths always match here
        Some(covariance_of_observations(&[&f, &s]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.cur;
        (n, Some(n))
    }
}

impl ExactSizeIterator for CovarianceWindows<'_> {}
