use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use molmotion::prelude::*;
use std::path::PathBuf;

mod output;

use output::{prepare_out_dir, summary_table, write_results};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CovarianceOutput {
    /// Rolling average of peak counts only
    Peaks,
    /// Peaks and the covariance matrices of the first windows
    Frames,
}

/// Computes structural and kinetic time series from a LAMMPS text trajectory
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cmd {
    /// Trajectory file (.lammpstrj)
    infile: PathBuf,

    /// Output directory, created if missing
    outfolder: PathBuf,

    /// Quiet, only warnings and errors are reported
    #[arg(short)]
    quiet: bool,

    /// Radius of gyration for every timestep
    #[arg(short = 'r')]
    gyration: bool,

    /// Average self-displacement between consecutive timesteps
    #[arg(short = 'd')]
    displacement: bool,

    /// Root-mean-square displacement from the first timestep
    #[arg(short = 'm')]
    rmsd: bool,

    /// Covariance peak analysis
    #[arg(short = 'c', value_enum, num_args = 0..=1, default_missing_value = "peaks")]
    covariance: Option<CovarianceOutput>,

    /// All analyses
    #[arg(short = 'a', long)]
    all: bool,

    /// Export covariance matrices of all windows, not only the first `max_frames`
    #[arg(long)]
    full: bool,

    /// TOML file with analysis settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write into an existing output directory without asking
    #[arg(short, long)]
    force: bool,
}

impl Cmd {
    fn kinds(&self) -> AnalysisKinds {
        if self.all {
            AnalysisKinds::all()
        } else {
            AnalysisKinds {
                gyration: self.gyration,
                displacement: self.displacement,
                rmsd: self.rmsd,
                covariance: self.covariance.is_some(),
            }
        }
    }

    fn config(&self) -> Result<AnalysisConfig> {
        let mut cfg = match &self.config {
            Some(f) => AnalysisConfig::from_file(f)
                .with_context(|| format!("loading settings from '{}'", f.display()))?,
            None => AnalysisConfig::default(),
        };
        if self.full {
            cfg.max_frames = 0;
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();

    env_logger::builder()
        .format_timestamp(None)
        .format_indent(Some(8))
        .filter_level(if cmd.quiet {
            log::LevelFilter::Warn
        } else {
            log::LevelFilter::Info
        })
        .init();

    if !cmd.quiet {
        molmotion::greeting("molmotion");
    }

    let kinds = cmd.kinds();
    if kinds.is_empty() {
        anyhow::bail!("nothing to do, select at least one analysis or use --all");
    }
    let cfg = cmd.config()?;

    if !prepare_out_dir(&cmd.outfolder, cmd.force)? {
        info!("Output directory is kept untouched, exiting");
        return Ok(());
    }

    let traj = Trajectory::from_file(&cmd.infile)?;
    info!("Loaded information!");

    let results = Analysis::new(&traj, kinds)
        .with_config(cfg)
        .with_covariance_frames(cmd.covariance == Some(CovarianceOutput::Frames))
        .run()
        .with_context(|| format!("analysing '{}'", cmd.infile.display()))?;

    write_results(&cmd.outfolder, &results)?;

    if !cmd.quiet {
        println!("{}", summary_table(&results));
    }
    Ok(())
}
