use crate::core::PositionTable;
use log::info;
use std::{fmt::Display, io::BufRead, path::Path};
use thiserror::Error;

mod lammpstrj_handler;

// Reexports
pub use lammpstrj_handler::{LammpstrjFileHandler, ParseError, HEADER_LINES};

/// Parses a text trajectory into the position table and the atom count
pub fn parse(reader: impl BufRead) -> Result<(PositionTable, usize), ParseError> {
    let (table, _) = LammpstrjFileHandler::new(reader).read()?;
    let natoms = table.num_atoms();
    Ok((table, natoms))
}

//================================
// Loaded trajectory
//================================

/// Positions of all timesteps together with their simulation timesteps
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    table: PositionTable,
    timesteps: Vec<u64>,
    pub stats: FileStats,
}

impl Trajectory {
    /// Reads a trajectory from any buffered stream.
    /// Pass `&mut reader` to keep the stream owned by the caller.
    pub fn read(reader: impl BufRead) -> Result<Self, ParseError> {
        let t = std::time::Instant::now();
        let (table, timesteps) = LammpstrjFileHandler::new(reader).read()?;
        let stats = FileStats {
            elapsed_time: t.elapsed(),
            frames_processed: table.num_timesteps(),
        };
        Ok(Self {
            table,
            timesteps,
            stats,
        })
    }

    pub fn from_file(fname: impl AsRef<Path>) -> Result<Self, FileIoError> {
        let name = fname.as_ref().display().to_string();
        let t = std::time::Instant::now();
        let (table, timesteps) = LammpstrjFileHandler::open(fname.as_ref())
            .and_then(|h| h.read())
            .map_err(|e| FileIoError(name.clone(), e))?;
        let stats = FileStats {
            elapsed_time: t.elapsed(),
            frames_processed: table.num_timesteps(),
        };
        info!(
            "Loaded {} timesteps of {} atoms from '{name}' ({stats})",
            table.num_timesteps(),
            table.num_atoms()
        );
        Ok(Self {
            table,
            timesteps,
            stats,
        })
    }

    pub fn table(&self) -> &PositionTable {
        &self.table
    }

    pub fn num_atoms(&self) -> usize {
        self.table.num_atoms()
    }

    pub fn num_timesteps(&self) -> usize {
        self.table.num_timesteps()
    }

    /// Simulation timestep of every block, or the block index if the
    /// header has no `TIMESTEP` item
    pub fn timesteps(&self) -> &[u64] {
        &self.timesteps
    }

    pub fn into_table(self) -> PositionTable {
        self.table
    }
}

#[derive(Default, Debug, Clone)]
pub struct FileStats {
    pub elapsed_time: std::time::Duration,
    pub frames_processed: usize,
}

impl Display for FileStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IO time {:.4}s, {} frames, {:.4}s per frame",
            self.elapsed_time.as_secs_f32(),
            self.frames_processed,
            self.elapsed_time.as_secs_f32() / self.frames_processed.max(1) as f32
        )
    }
}

//--------------------------------------------------------
#[derive(Error, Debug)]
#[error("in file {0}:")]
pub struct FileIoError(String, #[source] ParseError);

impl FileIoError {
    pub fn file_name(&self) -> &str {
        &self.0
    }

    pub fn parse_error(&self) -> &ParseError {
        &self.1
    }
}
