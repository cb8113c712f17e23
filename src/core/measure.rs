use super::{MetricSeries, Pos, PosIterator, PositionTable, Vector3d};
use itertools::izip;
use thiserror::Error;

//==============================================================
// Per-timestep measurements over the position table
//==============================================================

/// Errors caused by data which can't be fed to an analysis
#[derive(Error, Debug)]
pub enum DomainError {
    /// The table has no atoms
    #[error("zero atoms")]
    ZeroAtoms,

    /// Not enough timesteps for the requested analysis
    #[error("{analysis} requires at least {required} timesteps, {found} available")]
    TooShort {
        analysis: &'static str,
        required: usize,
        found: usize,
    },

    /// Table length is not a multiple of the atom count
    #[error("{records} position records can't be split into frames of {natoms} atoms")]
    NotDivisible { records: usize, natoms: usize },

    /// Frame with unexpected number of atoms
    #[error("timestep {timestep} has {found} atoms instead of {expected}")]
    FrameSize {
        timestep: usize,
        expected: usize,
        found: usize,
    },

    /// Mismatch in sizes between two displacement vectors
    #[error("invalid data sizes: {0} and {1}")]
    Sizes(usize, usize),

    /// Window start outside of the trajectory
    #[error("window at timestep {start} needs timesteps up to {}, only {available} available", .start + 2)]
    WindowOutOfRange { start: usize, available: usize },

    /// High-pass radius which is negative or not finite
    #[error("invalid high-pass cutoff {0}")]
    Cutoff(f64),
}

/// Euclidean distance between two points
pub fn distance(p: &Pos, q: &Pos) -> f64 {
    (p - q).norm()
}

/// Geometric center of a set of positions
pub fn center_of_geometry<'a>(iter: impl PosIterator<'a>) -> Pos {
    let n = iter.len();
    let mut cog = Vector3d::zeros();
    for p in iter {
        cog += p.coords;
    }
    Pos::from(cog / n as f64)
}

/// Distances travelled by each atom between timesteps `t1` and `t2`
pub fn self_displacements(table: &PositionTable, t1: usize, t2: usize) -> Vec<f64> {
    table
        .timestep(t1)
        .iter()
        .zip(table.timestep(t2))
        .map(|(p1, p2)| distance(p1, p2))
        .collect()
}

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

/// Radius of gyration for every timestep.
///
/// The per-axis deviations from the centroid are summed before squaring:
/// `sqrt( sum_atoms (dx+dy+dz)^2 / natoms )`.
pub fn radius_of_gyration(table: &PositionTable) -> Result<MetricSeries, DomainError> {
    table.require("radius of gyration", 2)?;
    let n = table.num_atoms() as f64;
    Ok(table
        .iter_timesteps()
        .map(|frame| {
            let c = center_of_geometry(frame.iter());
            let s: f64 = frame
                .iter()
                .map(|p| (p - c).sum().powi(2))
                .sum();
            (s / n).sqrt()
        })
        .collect())
}

/// Mean distance travelled by the atoms between consecutive timesteps.
///
/// Produces one value less than the number of timesteps.
pub fn average_self_displacement(table: &PositionTable) -> Result<MetricSeries, DomainError> {
    table.require("average self-displacement", 2)?;
    Ok(izip!(table.iter_timesteps(), table.iter_timesteps().skip(1))
        .map(|(cur, next)| {
            let s: f64 = cur.iter().zip(next).map(|(p1, p2)| distance(p1, p2)).sum();
            s / table.num_atoms() as f64
        })
        .collect())
}

/// Displacement from the first timestep for lags `1..=num_timesteps-2`.
///
/// Raw distances are averaged over atoms first, then the square root is
/// taken of each averaged value.
pub fn rms_displacement(table: &PositionTable) -> Result<MetricSeries, DomainError> {
    table.require("root-mean-square displacement", 3)?;
    let last_lag = table.num_timesteps() - 2;
    Ok((1..=last_lag)
        .map(|lag| mean(&self_displacements(table, 0, lag)).sqrt())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_atoms() -> PositionTable {
        // Atom 0 moves along x, atom 1 stays at (5,5,5)
        PositionTable::from_frames([
            [Pos::new(0.0, 0.0, 0.0), Pos::new(5.0, 5.0, 5.0)],
            [Pos::new(1.0, 0.0, 0.0), Pos::new(5.0, 5.0, 5.0)],
            [Pos::new(2.0, 0.0, 0.0), Pos::new(5.0, 5.0, 5.0)],
        ])
        .unwrap()
    }

    fn stationary(natoms: usize, nt: usize) -> PositionTable {
        let frame: Vec<Pos> = (0..natoms)
            .map(|i| Pos::new(i as f64, 2.0 * i as f64, -1.5))
            .collect();
        PositionTable::from_frames(std::iter::repeat(frame).take(nt)).unwrap()
    }

    #[test]
    fn distance_is_euclidean() {
        let d = distance(&Pos::new(1.0, 2.0, 3.0), &Pos::new(4.0, 6.0, 3.0));
        assert_eq!(d, 5.0);
        assert_eq!(distance(&Pos::origin(), &Pos::origin()), 0.0);
    }

    #[test]
    fn gyration_sums_deviations_before_squaring() -> anyhow::Result<()> {
        let rog = radius_of_gyration(&two_atoms())?;
        assert_eq!(rog.len(), 3);
        // Centroid (2.5,2.5,2.5): summed deviations are -7.5 and 7.5
        assert!((rog[0] - 7.5).abs() < 1e-12);
        // Centroid (3,2.5,2.5): -2-2.5-2.5 = -7 and 2+2.5+2.5 = 7
        assert!((rog[1] - 7.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn gyration_of_single_atom_is_zero() -> anyhow::Result<()> {
        let table = PositionTable::from_frames([
            [Pos::new(1.0, 2.0, 3.0)],
            [Pos::new(-4.0, 0.5, 9.0)],
            [Pos::new(0.1, 0.2, 0.3)],
        ])?;
        let rog = radius_of_gyration(&table)?;
        assert_eq!(rog, vec![0.0; 3]);
        Ok(())
    }

    #[test]
    fn self_displacement_of_moving_atom() -> anyhow::Result<()> {
        let d = average_self_displacement(&two_atoms())?;
        assert_eq!(d, vec![0.5, 0.5]);
        Ok(())
    }

    #[test]
    fn rmsd_takes_root_of_mean_distance() -> anyhow::Result<()> {
        let table = PositionTable::from_frames([
            [Pos::new(0.0, 0.0, 0.0), Pos::new(5.0, 5.0, 5.0)],
            [Pos::new(8.0, 0.0, 0.0), Pos::new(5.0, 5.0, 5.0)],
            [Pos::new(2.0, 0.0, 0.0), Pos::new(5.0, 5.0, 5.0)],
            [Pos::new(0.0, 18.0, 0.0), Pos::new(5.0, 5.0, 5.0)],
        ])?;
        let r = rms_displacement(&table)?;
        // Lags 1 and 2 only, the last timestep is not used
        assert_eq!(r.len(), 2);
        assert!((r[0] - 2.0).abs() < 1e-12);
        assert!((r[1] - 1.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn stationary_atoms_do_not_move() -> anyhow::Result<()> {
        let table = stationary(4, 6);
        assert_eq!(average_self_displacement(&table)?, vec![0.0; 5]);
        assert_eq!(rms_displacement(&table)?, vec![0.0; 4]);
        Ok(())
    }

    #[test]
    fn too_short_trajectories() {
        let one = stationary(3, 1);
        assert!(matches!(
            average_self_displacement(&one),
            Err(DomainError::TooShort { required: 2, found: 1, .. })
        ));
        assert!(matches!(
            radius_of_gyration(&one),
            Err(DomainError::TooShort { .. })
        ));
        let two = stationary(3, 2);
        assert!(average_self_displacement(&two).is_ok());
        assert!(matches!(
            rms_displacement(&two),
            Err(DomainError::TooShort { required: 3, found: 2, .. })
        ));
    }

    #[test]
    #[should_panic]
    fn zero_atoms() {
        radius_of_gyration(&PositionTable::default()).unwrap();
    }
}
