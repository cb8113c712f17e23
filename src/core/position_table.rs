use super::{DomainError, Pos};
use std::slice::ChunksExact;

/// Flat table of atom positions for the whole trajectory.
///
/// Record `t * num_atoms + a` holds the position of atom `a` at timestep `t`.
/// The table is immutable once built, all analyses only borrow it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionTable {
    natoms: usize,
    coords: Vec<Pos>,
}

impl PositionTable {
    /// Creates a table from already flattened coordinates.
    ///
    /// Fails if the number of records is not a multiple of `natoms`.
    pub fn from_coords(coords: Vec<Pos>, natoms: usize) -> Result<Self, DomainError> {
        if natoms == 0 {
            if coords.is_empty() {
                return Ok(Self::default());
            }
            return Err(DomainError::ZeroAtoms);
        }
        if coords.len() % natoms != 0 {
            return Err(DomainError::NotDivisible {
                records: coords.len(),
                natoms,
            });
        }
        Ok(Self { natoms, coords })
    }

    /// Creates a table from per-timestep frames of equal size
    pub fn from_frames<F>(frames: impl IntoIterator<Item = F>) -> Result<Self, DomainError>
    where
        F: AsRef<[Pos]>,
    {
        let mut natoms = None;
        let mut coords = vec![];
        for (t, fr) in frames.into_iter().enumerate() {
            let fr = fr.as_ref();
            match natoms {
                None => natoms = Some(fr.len()),
                Some(n) if n != fr.len() => {
                    return Err(DomainError::FrameSize {
                        timestep: t,
                        expected: n,
                        found: fr.len(),
                    })
                }
                _ => {}
            }
            coords.extend_from_slice(fr);
        }
        Self::from_coords(coords, natoms.unwrap_or(0))
    }

    pub fn num_atoms(&self) -> usize {
        self.natoms
    }

    pub fn num_timesteps(&self) -> usize {
        if self.natoms == 0 {
            0
        } else {
            self.coords.len() / self.natoms
        }
    }

    /// Total number of records (atoms times timesteps)
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn coords(&self) -> &[Pos] {
        &self.coords
    }

    /// Positions of all atoms at timestep `t`.
    ///
    /// Panics if `t` is out of range, like slice indexing does.
    pub fn timestep(&self, t: usize) -> &[Pos] {
        &self.coords[t * self.natoms..(t + 1) * self.natoms]
    }

    pub fn get_timestep(&self, t: usize) -> Option<&[Pos]> {
        if t < self.num_timesteps() {
            Some(self.timestep(t))
        } else {
            None
        }
    }

    pub fn iter_timesteps(&self) -> ChunksExact<'_, Pos> {
        // chunks_exact panics on zero size
        self.coords.chunks_exact(self.natoms.max(1))
    }

    /// Checks that the table can feed an analysis needing `min_timesteps` frames
    pub fn require(&self, analysis: &'static str, min_timesteps: usize) -> Result<(), DomainError> {
        if self.natoms == 0 {
            return Err(DomainError::ZeroAtoms);
        }
        let found = self.num_timesteps();
        if found < min_timesteps {
            return Err(DomainError::TooShort {
                analysis,
                required: min_timesteps,
                found,
            });
        }
        Ok(())
    }
}

//==============================================================
// Growable storage used while the trajectory is being read
//==============================================================

/// Buffer grown one block at a time and frozen into [PositionTable]
#[derive(Debug, Default)]
pub(crate) struct PositionTableStorage {
    natoms: Option<usize>,
    coords: Vec<Pos>,
    filled: usize,
}

impl PositionTableStorage {
    pub(crate) fn num_atoms(&self) -> Option<usize> {
        self.natoms
    }

    /// Commits to the atom count. Only the first call has an effect.
    pub(crate) fn set_num_atoms(&mut self, natoms: usize) {
        self.natoms.get_or_insert(natoms);
    }

    /// Appends a zero-filled chunk for the upcoming block
    pub(crate) fn grow_block(&mut self) {
        let n = self.natoms.unwrap_or(0);
        self.coords.resize(self.coords.len() + n, Pos::origin());
    }

    /// Number of allocated but not yet written records
    pub(crate) fn unfilled(&self) -> usize {
        self.coords.len() - self.filled
    }

    /// Writes the next unfilled record, returns false if there is none
    pub(crate) fn push(&mut self, p: Pos) -> bool {
        match self.coords.get_mut(self.filled) {
            Some(slot) => {
                *slot = p;
                self.filled += 1;
                true
            }
            None => false,
        }
    }

    pub(crate) fn freeze(self) -> Result<PositionTable, DomainError> {
        PositionTable::from_coords(self.coords, self.natoms.unwrap_or(0))
    }
}
