mod config;
mod covariance;
mod fourier;
mod measure;
mod peaks;
mod position_table;

pub use {
    config::*,
    covariance::*,
    fourier::*,
    measure::*,
    peaks::*,
    position_table::*,
};

// Aliases for vectors, points and matrices
pub type Vector3d = nalgebra::Vector3<f64>;
pub type Pos = nalgebra::Point3<f64>; // Atom position
pub type MatrixXd = nalgebra::DMatrix<f64>;
pub type Complex64 = rustfft::num_complex::Complex<f64>;
pub type MatrixXc = nalgebra::DMatrix<Complex64>;

/// Ordered series of one scalar per timestep (or per pair of timesteps)
pub type MetricSeries = Vec<f64>;

// Define alias traits for iterators to make it less verbose
pub trait PosIterator<'a>: ExactSizeIterator<Item = &'a Pos> {}
impl<'a, T> PosIterator<'a> for T where T: ExactSizeIterator<Item = &'a Pos> {}
