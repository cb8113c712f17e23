use anyhow::{bail, Context, Result};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use log::{info, warn};
use molmotion::prelude::*;
use std::fmt::Write as FmtWrite;
use std::io::{BufRead, Write as StdWrite};
use std::path::Path;

/// Creates the output directory or asks before reusing an existing one.
///
/// Returns `false` if the user declined to write into an existing directory.
pub fn prepare_out_dir(dir: &Path, force: bool) -> Result<bool> {
    if dir.exists() {
        if !dir.is_dir() {
            bail!("'{}' exists and is not a directory", dir.display());
        }
        if force {
            warn!("Writing into existing directory '{}'", dir.display());
        } else {
            let question = format!(
                "Directory '{}' already exists, files in it may be overwritten. Continue?",
                dir.display()
            );
            if !ask_yes_no(&question, std::io::stdin().lock(), std::io::stdout())? {
                return Ok(false);
            }
        }
    } else {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory '{}'", dir.display()))?;
    }
    Ok(true)
}

/// Repeats the question until the answer is `y` or `n`
fn ask_yes_no(question: &str, mut input: impl BufRead, mut out: impl StdWrite) -> Result<bool> {
    let mut answer = String::new();
    loop {
        write!(out, "{question} [y/n] ")?;
        out.flush()?;
        answer.clear();
        if input.read_line(&mut answer)? == 0 {
            bail!("no answer given");
        }
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(out, "Please answer 'y' or 'n'")?,
        }
    }
}

fn save(dir: &Path, fname: &str, s: &str) -> Result<()> {
    let path = dir.join(fname);
    let mut f = std::fs::File::create(&path)
        .with_context(|| format!("creating '{}'", path.display()))?;
    write!(f, "{s}")?;
    Ok(())
}

/// Series with one value per labelled timestep.
///
/// Value `i` is labelled by `labels[i + first_label]`.
fn series_to_string(header: &str, labels: &[u64], first_label: usize, values: &[f64]) -> Result<String> {
    let mut s = format!("#timestep\t{header}\n");
    for (i, v) in values.iter().enumerate() {
        writeln!(s, "{}\t{v:.6}", labels[i + first_label])?;
    }
    Ok(s)
}

fn peaks_to_string(labels: &[u64], tally: &PeakTally) -> Result<String> {
    let mut s = "#timestep\tpeaks\trolling_avg\n".to_string();
    for (i, (n, avg)) in tally.counts().iter().zip(tally.rolling_average()).enumerate() {
        writeln!(s, "{}\t{n}\t{avg:.2}", labels[i])?;
    }
    Ok(s)
}

fn covariance_to_string(labels: &[u64], frames: &[MatrixXd]) -> Result<String> {
    let mut s = String::new();
    for (i, m) in frames.iter().enumerate() {
        writeln!(s, "#window {i} timestep {} size {}", labels[i], m.nrows())?;
        for row in m.row_iter() {
            let line = row.iter().map(|v| format!("{v:e}")).collect::<Vec<_>>();
            writeln!(s, "{}", line.join("\t"))?;
        }
    }
    Ok(s)
}

/// Writes every computed series into its own file in `dir`
pub fn write_results(dir: &Path, res: &AnalysisResults) -> Result<()> {
    let labels = &res.timesteps;

    if let Some(rog) = &res.gyration {
        info!("\tWriting radius of gyration...");
        save(dir, "rog.dat", &series_to_string("rog", labels, 0, rog)?)?;
    }

    if let Some(dp) = &res.displacement {
        info!("\tWriting average displacement...");
        save(dir, "avgdp.dat", &series_to_string("avgdp", labels, 1, dp)?)?;
    }

    if let Some(rmsd) = &res.rmsd {
        info!("\tWriting RMSD...");
        save(dir, "rmsd.dat", &series_to_string("rmsd", labels, 1, rmsd)?)?;
    }

    if let Some(tally) = &res.peaks {
        info!("\tWriting peak counts...");
        save(dir, "peaks.dat", &peaks_to_string(labels, tally)?)?;
    }

    if !res.covariance_frames.is_empty() {
        info!(
            "\tWriting {} covariance matrices...",
            res.covariance_frames.len()
        );
        save(
            dir,
            "covariance.dat",
            &covariance_to_string(labels, &res.covariance_frames)?,
        )?;
    }
    Ok(())
}

fn last_of(v: &[f64]) -> String {
    v.last().map_or("-".into(), |x| format!("{x:.4}"))
}

pub fn summary_table(res: &AnalysisResults) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Series", "Values", "Last"]);

    if let Some(v) = &res.gyration {
        table.add_row(vec!["Radius of gyration".into(), v.len().to_string(), last_of(v)]);
    }
    if let Some(v) = &res.displacement {
        table.add_row(vec!["Average displacement".into(), v.len().to_string(), last_of(v)]);
    }
    if let Some(v) = &res.rmsd {
        table.add_row(vec!["RMSD".into(), v.len().to_string(), last_of(v)]);
    }
    if let Some(t) = &res.peaks {
        table.add_row(vec![
            "Rolling peak average".into(),
            t.len().to_string(),
            last_of(t.rolling_average()),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn results() -> AnalysisResults {
        let mut peaks = PeakTally::default();
        peaks.push(2);
        peaks.push(1);
        AnalysisResults {
            num_atoms: 2,
            timesteps: vec![0, 10, 20, 30],
            gyration: Some(vec![1.0, 2.0, 3.0, 4.0]),
            displacement: Some(vec![0.5, 0.25, 0.125]),
            rmsd: Some(vec![0.1, 0.2]),
            peaks: Some(peaks),
            covariance_frames: vec![MatrixXd::identity(2, 2)],
        }
    }

    #[test]
    fn answers_are_repeated_until_valid() -> Result<()> {
        let mut out: Vec<u8> = vec![];
        assert!(ask_yes_no("Go?", Cursor::new("maybe\n\nY\n"), &mut out)?);
        let printed = String::from_utf8(out)?;
        assert_eq!(printed.matches("Go? [y/n]").count(), 3);
        assert!(!ask_yes_no("Go?", Cursor::new("no\n"), std::io::sink())?);
        assert!(ask_yes_no("Go?", Cursor::new(""), std::io::sink()).is_err());
        Ok(())
    }

    #[test]
    fn series_are_labelled_by_timestep() -> Result<()> {
        let res = results();
        let s = series_to_string("avgdp", &res.timesteps, 1, res.displacement.as_ref().unwrap())?;
        let lines: Vec<_> = s.lines().collect();
        assert_eq!(lines[0], "#timestep\tavgdp");
        assert_eq!(lines[1], "10\t0.500000");
        assert_eq!(lines[3], "30\t0.125000");

        let s = peaks_to_string(&res.timesteps, res.peaks.as_ref().unwrap())?;
        assert_eq!(s.lines().nth(2), Some("10\t1\t1.50"));
        Ok(())
    }

    #[test]
    fn all_files_written() -> Result<()> {
        let dir = TempDir::new()?;
        let out = dir.path().join("out");
        assert!(prepare_out_dir(&out, false)?);
        write_results(&out, &results())?;
        for f in ["rog.dat", "avgdp.dat", "rmsd.dat", "peaks.dat", "covariance.dat"] {
            assert!(out.join(f).is_file(), "{f} is missing");
        }
        let cov = std::fs::read_to_string(out.join("covariance.dat"))?;
        assert_eq!(cov.lines().count(), 3);
        // Existing directory is reused without asking
        assert!(prepare_out_dir(&out, true)?);
        Ok(())
    }

    #[test]
    fn summary_has_row_per_series() {
        let table = summary_table(&results());
        assert_eq!(table.row_iter().count(), 4);
    }
}
