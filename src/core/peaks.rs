use super::{
    fft_shift, ifft_shift, magnitude, Complex64, Connectivity, CovarianceWindows, DomainError,
    Fft2, MatrixXd, PeakConfig, PositionTable,
};
use log::{debug, info};
use nalgebra::DMatrix;

//==============================================================
// Frequency-domain filtering and peak counting
//==============================================================

/// Binary mask for a centered spectrum.
///
/// Elements closer than `cutoff` to the center are 0, all others are 1.
pub fn high_pass_mask(nr: usize, nc: usize, cutoff: f64) -> MatrixXd {
    let (cr, cc) = ((nr / 2) as f64, (nc / 2) as f64);
    MatrixXd::from_fn(nr, nc, |i, j| {
        let d = ((i as f64 - cr).powi(2) + (j as f64 - cc).powi(2)).sqrt();
        if d <= cutoff {
            0.0
        } else {
            1.0
        }
    })
}

/// Removes low spatial frequencies from a matrix
pub struct HighPassFilter {
    fft: Fft2,
    cutoff: f64,
    // Cached for the last seen shape
    mask: MatrixXd,
}

impl HighPassFilter {
    pub fn new(cutoff: f64) -> Result<Self, DomainError> {
        if !cutoff.is_finite() || cutoff < 0.0 {
            return Err(DomainError::Cutoff(cutoff));
        }
        Ok(Self {
            fft: Fft2::new(),
            cutoff,
            mask: MatrixXd::zeros(0, 0),
        })
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Transforms, masks the centered spectrum, transforms back and
    /// returns the magnitude of the result.
    pub fn apply(&mut self, m: &MatrixXd) -> MatrixXd {
        let (nr, nc) = m.shape();
        if self.mask.shape() != (nr, nc) {
            self.mask = high_pass_mask(nr, nc, self.cutoff);
        }

        let mut spectrum = fft_shift(&self.fft.forward(m));
        spectrum.zip_apply(&self.mask, |s, w| *s *= Complex64::new(w, 0.0));

        let filtered = self.fft.inverse(ifft_shift(&spectrum));
        magnitude(&filtered)
    }
}

/// Visits the neighbourhood of `(i,j)`. Out of range neighbours are
/// reported as `None`.
fn neighbours(
    shape: (usize, usize),
    i: usize,
    j: usize,
    conn: Connectivity,
) -> impl Iterator<Item = Option<(usize, usize)>> {
    conn.offsets().iter().map(move |&(di, dj)| {
        let ni = i.checked_add_signed(di).filter(|&v| v < shape.0)?;
        let nj = j.checked_add_signed(dj).filter(|&v| v < shape.1)?;
        Some((ni, nj))
    })
}

/// Elements equal to the maximum of their neighbourhood.
///
/// Borders are handled by reflection, which for a radius-one
/// neighbourhood is the same as ignoring out of range neighbours.
pub fn maximum_mask(img: &MatrixXd, conn: Connectivity) -> DMatrix<bool> {
    let shape = img.shape();
    DMatrix::from_fn(shape.0, shape.1, |i, j| {
        let max = neighbours(shape, i, j, conn)
            .flatten()
            .map(|(ni, nj)| img[(ni, nj)])
            .fold(f64::NEG_INFINITY, f64::max);
        img[(i, j)] == max
    })
}

/// Exact-zero background eroded once. Out of range elements count as
/// background.
pub fn eroded_background(img: &MatrixXd, conn: Connectivity) -> DMatrix<bool> {
    let shape = img.shape();
    DMatrix::from_fn(shape.0, shape.1, |i, j| {
        neighbours(shape, i, j, conn).all(|n| n.map_or(true, |(ni, nj)| img[(ni, nj)] == 0.0))
    })
}

/// Local maxima which are not a part of the flat zero background
pub fn local_maxima(img: &MatrixXd, conn: Connectivity) -> DMatrix<bool> {
    let local_max = maximum_mask(img, conn);
    let background = eroded_background(img, conn);
    local_max.zip_map(&background, |a, b| a ^ b)
}

pub fn count_peaks(mask: &DMatrix<bool>) -> usize {
    mask.iter().filter(|v| **v).count()
}

/// Rounds to two decimal places
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Peak counts of processed windows and their running mean
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakTally {
    counts: Vec<usize>,
    total: usize,
    rolling: Vec<f64>,
}

impl PeakTally {
    pub fn push(&mut self, count: usize) {
        self.counts.push(count);
        self.total += count;
        self.rolling
            .push(round2(self.total as f64 / self.counts.len() as f64));
    }

    /// Peak count of each window
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Entry `i` is the mean peak count over windows `0..=i`, rounded to 2 decimals
    pub fn rolling_average(&self) -> &[f64] {
        &self.rolling
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn into_rolling_average(self) -> Vec<f64> {
        self.rolling
    }
}

/// Runs the filtering and counting stages for consecutive windows
pub struct PeakExtractor {
    filter: HighPassFilter,
    connectivity: Connectivity,
    tally: PeakTally,
}

impl PeakExtractor {
    pub fn new(cfg: &PeakConfig) -> Result<Self, DomainError> {
        cfg.validate()?;
        Ok(Self {
            filter: HighPassFilter::new(cfg.cutoff)?,
            connectivity: cfg.connectivity,
            tally: PeakTally::default(),
        })
    }

    /// Processes the covariance matrix of the next window and returns its peak count
    pub fn process(&mut self, cov: &MatrixXd) -> usize {
        let filtered = self.filter.apply(cov);
        let n = count_peaks(&local_maxima(&filtered, self.connectivity));
        self.tally.push(n);
        debug!("window {}: {n} peaks", self.tally.len() - 1);
        n
    }

    pub fn tally(&self) -> &PeakTally {
        &self.tally
    }

    pub fn finish(self) -> PeakTally {
        self.tally
    }
}

/// Rolling average of peak counts over all covariance windows of the table
pub fn rolling_peak_average(
    table: &PositionTable,
    cfg: &PeakConfig,
) -> Result<PeakTally, DomainError> {
    let windows = CovarianceWindows::new(table)?;
    let mut extractor = PeakExtractor::new(cfg)?;
    info!("Extracting peaks from {} windows...", windows.len());
    for cov in windows {
        extractor.process(&cov);
    }
    Ok(extractor.finish())
}
