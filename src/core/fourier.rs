use super::{Complex64, MatrixXc, MatrixXd};
use rustfft::{FftDirection, FftPlanner};

//==============================================================
// Two-dimensional discrete Fourier transforms on dense matrices
//==============================================================

/// Planner for 2D transforms.
///
/// Keeps the `rustfft` planner alive so that repeated transforms of
/// equally sized matrices reuse the same plans.
pub struct Fft2 {
    planner: FftPlanner<f64>,
    scratch: Vec<Complex64>,
    line: Vec<Complex64>,
}

impl Default for Fft2 {
    fn default() -> Self {
        Self::new()
    }
}

impl Fft2 {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            scratch: vec![],
            line: vec![],
        }
    }

    /// Forward transform of a real matrix
    pub fn forward(&mut self, m: &MatrixXd) -> MatrixXc {
        let mut c = m.map(|v| Complex64::new(v, 0.0));
        self.process(&mut c, FftDirection::Forward);
        c
    }

    /// Inverse transform, normalized by the number of elements
    pub fn inverse(&mut self, mut c: MatrixXc) -> MatrixXc {
        self.process(&mut c, FftDirection::Inverse);
        let n = (c.nrows() * c.ncols()) as f64;
        if n > 0.0 {
            c /= Complex64::new(n, 0.0);
        }
        c
    }

    fn process(&mut self, c: &mut MatrixXc, dir: FftDirection) {
        let (nr, nc) = c.shape();
        if nr == 0 || nc == 0 {
            return;
        }

        // Storage is column-major, so columns are contiguous chunks
        let col_fft = self.planner.plan_fft(nr, dir);
        self.scratch
            .resize(col_fft.get_inplace_scratch_len(), Complex64::default());
        for col in c.as_mut_slice().chunks_exact_mut(nr) {
            col_fft.process_with_scratch(col, &mut self.scratch);
        }

        // Rows are strided, so copy them through a buffer
        let row_fft = self.planner.plan_fft(nc, dir);
        self.scratch
            .resize(row_fft.get_inplace_scratch_len(), Complex64::default());
        for i in 0..nr {
            self.line.clear();
            self.line.extend((0..nc).map(|j| c[(i, j)]));
            row_fft.process_with_scratch(&mut self.line, &mut self.scratch);
            for (j, v) in self.line.iter().enumerate() {
                c[(i, j)] = *v;
            }
        }
    }
}

/// Circular shift of both axes by `(sr, sc)` elements
fn roll<T: nalgebra::Scalar>(m: &nalgebra::DMatrix<T>, sr: usize, sc: usize) -> nalgebra::DMatrix<T> {
    let (nr, nc) = m.shape();
    nalgebra::DMatrix::from_fn(nr, nc, |i, j| {
        m[((i + nr - sr % nr.max(1)) % nr, (j + nc - sc % nc.max(1)) % nc)].clone()
    })
}

/// Moves the zero-frequency element to the center of the matrix
pub fn fft_shift<T: nalgebra::Scalar>(m: &nalgebra::DMatrix<T>) -> nalgebra::DMatrix<T> {
    let (nr, nc) = m.shape();
    roll(m, nr / 2, nc / 2)
}

/// Inverse of [fft_shift], also for odd sizes
pub fn ifft_shift<T: nalgebra::Scalar>(m: &nalgebra::DMatrix<T>) -> nalgebra::DMatrix<T> {
    let (nr, nc) = m.shape();
    roll(m, nr - nr / 2, nc - nc / 2)
}

/// Element-wise magnitude of a complex matrix
pub fn magnitude(c: &MatrixXc) -> MatrixXd {
    c.map(|v| v.norm())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_moves_origin_to_center() {
        let m = MatrixXd::from_fn(5, 4, |i, j| (i * 10 + j) as f64);
        let s = fft_shift(&m);
        assert_eq!(s[(2, 2)], m[(0, 0)]);
        assert_eq!(ifft_shift(&s), m);

        let m = MatrixXd::from_fn(4, 4, |i, j| (i * 10 + j) as f64);
        assert_eq!(fft_shift(&m)[(2, 2)], 0.0);
        assert_eq!(ifft_shift(&fft_shift(&m)), m);
    }

    #[test]
    fn dc_component_is_total_sum() {
        let m = MatrixXd::from_fn(3, 5, |i, j| (i + 2 * j) as f64 - 1.5);
        let mut fft = Fft2::new();
        let f = fft.forward(&m);
        assert!((f[(0, 0)].re - m.sum()).abs() < 1e-9);
        assert!(f[(0, 0)].im.abs() < 1e-9);
    }

    #[test]
    fn inverse_restores_input() {
        let m = MatrixXd::from_fn(6, 6, |i, j| ((i * 7 + j * 3) % 5) as f64 * 0.25);
        let mut fft = Fft2::new();
        let f = fft.forward(&m);
        let back = magnitude(&fft.inverse(f));
        for (a, b) in back.iter().zip(m.iter()) {
            assert!((a - b.abs()).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_matrix() {
        let mut fft = Fft2::new();
        let f = fft.forward(&MatrixXd::zeros(0, 0));
        assert_eq!(f.shape(), (0, 0));
        assert_eq!(fft.inverse(f).shape(), (0, 0));
    }
}
