use crate::core::{DomainError, Pos, PositionTable, PositionTableStorage};
use log::{debug, warn};
use regex::Regex;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    num::{ParseFloatError, ParseIntError},
    path::Path,
};
use thiserror::Error;

/// Number of header lines preceding the atoms of every block
pub const HEADER_LINES: usize = 9;

const NATOMS_ITEM: &str = "NUMBER OF ATOMS";
const TIMESTEP_ITEM: &str = "TIMESTEP";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected io error")]
    Io(#[from] std::io::Error),

    #[error("can't open trajectory file for reading")]
    OpenRead(#[source] std::io::Error),

    #[error("block {block}: no 'NUMBER OF ATOMS' item in the header")]
    MissingAtomCount { block: usize },

    #[error("block {block}, line {line}: invalid number of atoms")]
    AtomCount {
        block: usize,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("block {block}, line {line}: zero atoms")]
    ZeroAtoms { block: usize, line: usize },

    #[error("block {block}, line {line}: no space allocated for atom")]
    UnallocatedAtom { block: usize, line: usize },

    #[error("block {block}, line {line}: number of atoms changed from {expected} to {found}")]
    AtomCountChanged {
        block: usize,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("block {block}, line {line}: invalid timestep")]
    Timestep {
        block: usize,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("block {block}, line {line}: atom line has {found} fields, at least 4 expected")]
    TooFewFields {
        block: usize,
        line: usize,
        found: usize,
    },

    #[error("block {block}, line {line}: invalid {axis} coordinate")]
    Coordinate {
        block: usize,
        line: usize,
        axis: char,
        #[source]
        source: ParseFloatError,
    },

    #[error("block {block}: header truncated after {found} lines")]
    TruncatedHeader { block: usize, found: usize },

    #[error("block {block}: {found} atom lines instead of {expected}")]
    TruncatedBlock {
        block: usize,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Table(#[from] DomainError),
}

/// Value expected on the line following an item marker
#[derive(Clone, Copy, PartialEq)]
enum Pending {
    None,
    NumAtoms,
    Timestep,
}

/// Reader of LAMMPS text dumps (`.lammpstrj`).
///
/// Every block consists of [HEADER_LINES] header lines followed by one
/// line per atom. The atom count is taken from the first header and must
/// stay the same in all later blocks. On atom lines the second, third and
/// fourth whitespace-separated fields are x, y and z.
pub struct LammpstrjFileHandler<R> {
    reader: R,
    item_re: Regex,
    line_no: usize,
    block: usize,
}

impl LammpstrjFileHandler<BufReader<File>> {
    pub fn open(fname: impl AsRef<Path>) -> Result<Self, ParseError> {
        Ok(Self::new(BufReader::new(
            File::open(fname).map_err(ParseError::OpenRead)?,
        )))
    }
}

impl<R: BufRead> LammpstrjFileHandler<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            // Literal pattern, can't fail
            item_re: Regex::new(r"ITEM:\s*(.*?)\s*$").unwrap(),
            line_no: 0,
            block: 0,
        }
    }

    /// Reads the whole stream.
    ///
    /// Returns the position table and the simulation timestep of each block.
    /// Blocks without a `TIMESTEP` item are labelled by their index.
    pub fn read(mut self) -> Result<(PositionTable, Vec<u64>), ParseError> {
        let mut storage = PositionTableStorage::default();
        let mut timesteps = vec![];

        // Position inside the current block
        let mut b = 0;
        let mut pending = Pending::None;
        let mut have_natoms = false;
        let mut cur_timestep = None;
        let mut line = String::new();

        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                break;
            }
            self.line_no += 1;

            // Blank lines between blocks or at the end of file
            if b == 0 && line.trim().is_empty() {
                continue;
            }

            if b < HEADER_LINES {
                match pending {
                    Pending::NumAtoms => {
                        self.read_natoms(&line, &mut storage)?;
                        have_natoms = true;
                    }
                    Pending::Timestep => {
                        cur_timestep = Some(line.trim().parse::<u64>().map_err(|e| {
                            ParseError::Timestep {
                                block: self.block,
                                line: self.line_no,
                                source: e,
                            }
                        })?);
                    }
                    Pending::None => {}
                }

                pending = match self.item_re.captures(&line) {
                    Some(c) if &c[1] == NATOMS_ITEM => Pending::NumAtoms,
                    Some(c) if &c[1] == TIMESTEP_ITEM => Pending::Timestep,
                    _ => Pending::None,
                };

                b += 1;
                if b == HEADER_LINES && !have_natoms {
                    return Err(ParseError::MissingAtomCount { block: self.block });
                }
            } else {
                if !storage.push(self.read_atom(&line)?) {
                    return Err(ParseError::UnallocatedAtom {
                        block: self.block,
                        line: self.line_no,
                    });
                }
                b += 1;
            }

            // Block is complete
            if b == HEADER_LINES + storage.num_atoms().unwrap_or(0) && have_natoms {
                timesteps.push(cur_timestep.take().unwrap_or(self.block as u64));
                debug!("block {} read, timestep {}", self.block, timesteps[self.block]);
                self.block += 1;
                b = 0;
                have_natoms = false;
                pending = Pending::None;
            }
        }

        if b > 0 {
            if b < HEADER_LINES {
                return Err(ParseError::TruncatedHeader {
                    block: self.block,
                    found: b,
                });
            }
            return Err(ParseError::TruncatedBlock {
                block: self.block,
                expected: storage.num_atoms().unwrap_or(0),
                found: b - HEADER_LINES,
            });
        }

        if self.block == 0 {
            warn!("trajectory is empty");
        }

        Ok((storage.freeze()?, timesteps))
    }

    fn read_natoms(&self, line: &str, storage: &mut PositionTableStorage) -> Result<(), ParseError> {
        let n = line
            .trim()
            .parse::<usize>()
            .map_err(|e| ParseError::AtomCount {
                block: self.block,
                line: self.line_no,
                source: e,
            })?;
        if n == 0 {
            return Err(ParseError::ZeroAtoms {
                block: self.block,
                line: self.line_no,
            });
        }

        match storage.num_atoms() {
            Some(expected) if expected != n => {
                return Err(ParseError::AtomCountChanged {
                    block: self.block,
                    line: self.line_no,
                    expected,
                    found: n,
                })
            }
            Some(_) => {}
            None => {
                debug!("{n} atoms per block");
                storage.set_num_atoms(n);
            }
        }
        // Space for the upcoming block, once per header
        if storage.unfilled() == 0 {
            storage.grow_block();
        }
        Ok(())
    }

    fn read_atom(&self, line: &str) -> Result<Pos, ParseError> {
        let fields = line.split_whitespace().collect::<Vec<_>>();
        if fields.len() < 4 {
            return Err(ParseError::TooFewFields {
                block: self.block,
                line: self.line_no,
                found: fields.len(),
            });
        }

        let coord = |i: usize, axis: char| {
            fields[i]
                .parse::<f64>()
                .map_err(|e| ParseError::Coordinate {
                    block: self.block,
                    line: self.line_no,
                    axis,
                    source: e,
                })
        };

        Ok(Pos::new(coord(1, 'x')?, coord(2, 'y')?, coord(3, 'z')?))
    }
}
