use anyhow::Result;
use molmotion::prelude::*;
use std::io::Cursor;

fn lammpstrj(frames: &[Vec<[f64; 3]>]) -> String {
    let mut s = String::new();
    for (t, atoms) in frames.iter().enumerate() {
        s.push_str(&format!(
            "ITEM: TIMESTEP\n{}\nITEM: NUMBER OF ATOMS\n{}\nITEM: BOX BOUNDS pp pp pp\n\
             -10 10\n-10 10\n-10 10\nITEM: ATOMS id x y z\n",
            t * 1000,
            atoms.len()
        ));
        for (i, [x, y, z]) in atoms.iter().enumerate() {
            s.push_str(&format!("{} {x} {y} {z}\n", i + 1));
        }
    }
    s
}

fn moving_atoms(natoms: usize, nt: usize) -> Vec<Vec<[f64; 3]>> {
    (0..nt)
        .map(|t| {
            (0..natoms)
                .map(|a| {
                    let (t, a) = (t as f64, a as f64);
                    [(0.3 * t * a).sin() * 4.0, a - 0.2 * t, (t + a).cos()]
                })
                .collect()
        })
        .collect()
}

#[test]
fn two_atoms_three_timesteps() -> Result<()> {
    let frames = vec![
        vec![[0.0, 0.0, 0.0], [5.0, 5.0, 5.0]],
        vec![[1.0, 0.0, 0.0], [5.0, 5.0, 5.0]],
        vec![[2.0, 0.0, 0.0], [5.0, 5.0, 5.0]],
    ];
    let traj = Trajectory::read(Cursor::new(lammpstrj(&frames)))?;
    assert_eq!(traj.timesteps(), &[0, 1000, 2000]);

    let table = traj.table();
    assert_eq!(average_self_displacement(table)?, vec![0.5, 0.5]);

    // Centroid (2.5,2.5,2.5), both atoms deviate by 7.5 in summed components
    let rog = radius_of_gyration(table)?;
    assert_eq!(rog.len(), 3);
    assert!((rog[0] - 7.5).abs() < 1e-12);

    let rmsd = rms_displacement(table)?;
    assert_eq!(rmsd.len(), 1);
    assert!((rmsd[0] - 0.5f64.sqrt()).abs() < 1e-12);
    Ok(())
}

#[test]
fn table_holds_every_record() -> Result<()> {
    for (natoms, nt) in [(1, 1), (3, 4), (17, 9)] {
        let (table, n) = parse(Cursor::new(lammpstrj(&moving_atoms(natoms, nt))))?;
        assert_eq!(n, natoms);
        assert_eq!(table.len(), natoms * nt);
        assert_eq!(table.num_timesteps(), nt);
    }
    Ok(())
}

#[test]
fn parsing_is_deterministic() -> Result<()> {
    let text = lammpstrj(&moving_atoms(5, 6));
    let (t1, _) = parse(Cursor::new(&text))?;
    let (t2, _) = parse(Cursor::new(&text))?;
    assert_eq!(t1, t2);
    Ok(())
}

#[test]
fn series_lengths() -> Result<()> {
    let nt = 8;
    let (table, _) = parse(Cursor::new(lammpstrj(&moving_atoms(4, nt))))?;
    assert_eq!(radius_of_gyration(&table)?.len(), nt);
    assert_eq!(average_self_displacement(&table)?.len(), nt - 1);
    assert_eq!(rms_displacement(&table)?.len(), nt - 2);
    assert_eq!(CovarianceWindows::new(&table)?.len(), nt - 2);
    Ok(())
}

#[test]
fn stationary_atoms_do_not_move() -> Result<()> {
    let frame = vec![[1.0, 2.0, 3.0], [-4.0, 0.5, 2.0], [0.0, 0.0, 9.0]];
    let (table, _) = parse(Cursor::new(lammpstrj(&vec![frame; 5])))?;
    assert!(average_self_displacement(&table)?.iter().all(|v| *v == 0.0));
    assert!(rms_displacement(&table)?.iter().all(|v| *v == 0.0));
    Ok(())
}

#[test]
fn single_atom_has_zero_gyration() -> Result<()> {
    let (table, _) = parse(Cursor::new(lammpstrj(&moving_atoms(1, 6))))?;
    assert!(radius_of_gyration(&table)?.iter().all(|v| *v == 0.0));
    Ok(())
}

#[test]
fn covariance_is_square_and_symmetric() -> Result<()> {
    let (table, _) = parse(Cursor::new(lammpstrj(&moving_atoms(7, 5))))?;
    for cov in CovarianceWindows::new(&table)? {
        assert_eq!(cov.shape(), (7, 7));
        assert!((&cov - cov.transpose()).abs().max() < 1e-12);
    }
    Ok(())
}

#[test]
fn rolling_average_is_rounded_running_mean() -> Result<()> {
    let (table, _) = parse(Cursor::new(lammpstrj(&moving_atoms(9, 12))))?;
    let tally = rolling_peak_average(&table, &PeakConfig::default())?;
    assert_eq!(tally.len(), 10);
    for i in 0..tally.len() {
        let counts = &tally.counts()[..=i];
        let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        assert_eq!(tally.rolling_average()[i], round2(mean));
    }
    Ok(())
}

#[test]
fn short_data_line_is_rejected() {
    let text = lammpstrj(&moving_atoms(2, 2));
    let mut lines: Vec<&str> = text.lines().collect();
    lines[10] = "2 0.5";
    let broken = lines.join("\n") + "\n";
    assert!(matches!(
        parse(Cursor::new(broken)),
        Err(ParseError::TooFewFields { block: 0, line: 11, found: 2 })
    ));
}

#[test]
fn driver_runs_everything() -> Result<()> {
    let traj = Trajectory::read(Cursor::new(lammpstrj(&moving_atoms(6, 7))))?;
    let res = Analysis::new(&traj, AnalysisKinds::all()).run()?;
    assert_eq!(res.gyration.map(|v| v.len()), Some(7));
    assert_eq!(res.displacement.map(|v| v.len()), Some(6));
    assert_eq!(res.rmsd.map(|v| v.len()), Some(5));
    assert_eq!(res.peaks.map(|t| t.len()), Some(5));
    Ok(())
}
