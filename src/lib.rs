//! Structural and kinetic time series from LAMMPS text trajectories.
//!
//! The trajectory is read once into a flat [PositionTable](core::PositionTable),
//! which is then shared by all analyses: radius of gyration, mean
//! self-displacement, root-mean-square displacement and the rolling count
//! of high-pass filtered peaks in per-window displacement covariance
//! matrices.
//!
//! ```no_run
//! use molmotion::prelude::*;
//!
//! let traj = Trajectory::from_file("dump.lammpstrj").unwrap();
//! let rog = radius_of_gyration(traj.table()).unwrap();
//! let peaks = rolling_peak_average(traj.table(), &PeakConfig::default()).unwrap();
//! println!("{} {:?}", rog.len(), peaks.rolling_average());
//! ```

pub mod analysis;
pub mod core;
pub mod io;

pub mod prelude {
    pub use crate::analysis::*;
    pub use crate::core::*;
    pub use crate::io::*;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn greeting(tool: &str) {
    use comfy_table::modifiers::UTF8_ROUND_CORNERS;
    use comfy_table::presets::UTF8_FULL;
    use comfy_table::{Attribute, Cell, Table};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .add_row(vec![
            Cell::new("molmotion - trajectory motion analysis").add_attributes(vec![Attribute::Bold])
        ])
        .add_row(vec![format!("molmotion version: {VERSION}")])
        .add_row(vec![format!("Tool: {tool}")]);
    println!("{table}");
}
