use crate::core::*;
use crate::io::{FileIoError, ParseError, Trajectory};
use log::info;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    FileIo(#[from] FileIoError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no analyses selected")]
    NothingSelected,
}

/// Which series to compute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisKinds {
    pub gyration: bool,
    pub displacement: bool,
    pub rmsd: bool,
    pub covariance: bool,
}

impl AnalysisKinds {
    pub fn all() -> Self {
        Self {
            gyration: true,
            displacement: true,
            rmsd: true,
            covariance: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.gyration || self.displacement || self.rmsd || self.covariance)
    }
}

/// Everything computed by [Analysis::run]
#[derive(Debug, Clone, Default)]
pub struct AnalysisResults {
    pub num_atoms: usize,
    /// Simulation timestep of every frame
    pub timesteps: Vec<u64>,
    pub gyration: Option<MetricSeries>,
    pub displacement: Option<MetricSeries>,
    pub rmsd: Option<MetricSeries>,
    pub peaks: Option<PeakTally>,
    /// Covariance matrices of the first windows, if requested
    pub covariance_frames: Vec<MatrixXd>,
}

/// Batch driver running the selected analyses over a loaded trajectory
pub struct Analysis<'a> {
    traj: &'a Trajectory,
    kinds: AnalysisKinds,
    cfg: AnalysisConfig,
    keep_frames: bool,
}

impl<'a> Analysis<'a> {
    pub fn new(traj: &'a Trajectory, kinds: AnalysisKinds) -> Self {
        Self {
            traj,
            kinds,
            cfg: Default::default(),
            keep_frames: false,
        }
    }

    pub fn with_config(mut self, cfg: AnalysisConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Keeps up to `max_frames` covariance matrices in the results
    pub fn with_covariance_frames(mut self, keep: bool) -> Self {
        self.keep_frames = keep;
        self
    }

    pub fn run(&self) -> Result<AnalysisResults, AnalysisError> {
        if self.kinds.is_empty() {
            return Err(AnalysisError::NothingSelected);
        }
        self.cfg.validate()?;

        let table = self.traj.table();
        let mut res = AnalysisResults {
            num_atoms: table.num_atoms(),
            timesteps: self.traj.timesteps().to_vec(),
            ..Default::default()
        };

        if self.kinds.gyration {
            res.gyration = Some(radius_of_gyration(table)?);
            info!("Radius of gyration computed");
        }

        if self.kinds.displacement {
            res.displacement = Some(average_self_displacement(table)?);
            info!("Average displacement computed");
        }

        if self.kinds.rmsd {
            res.rmsd = Some(rms_displacement(table)?);
            info!("Root-mean-square displacement computed");
        }

        if self.kinds.covariance {
            let (tally, frames) = self.covariance_peaks(table)?;
            res.peaks = Some(tally);
            res.covariance_frames = frames;
            info!("Covariance peaks computed");
        }

        Ok(res)
    }

    fn covariance_peaks(
        &self,
        table: &PositionTable,
    ) -> Result<(PeakTally, Vec<MatrixXd>), DomainError> {
        let windows = CovarianceWindows::new(table)?;
        let nwin = windows.len();
        let mut extractor = PeakExtractor::new(&self.cfg.peaks)?;

        let max_frames = match self.cfg.max_frames {
            0 => nwin,
            n => n.min(nwin),
        };
        let mut frames = vec![];

        info!("Processing {nwin} covariance windows...");
        for (i, cov) in windows.enumerate() {
            extractor.process(&cov);
            if self.keep_frames && frames.len() < max_frames {
                frames.push(cov);
            }
            if self.cfg.log_every > 0 && i % self.cfg.log_every == 0 {
                info!("At window {i} of {nwin}");
            }
        }
        Ok((extractor.finish(), frames))
    }
}
