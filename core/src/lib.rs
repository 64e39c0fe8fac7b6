#![no_std]

extern crate alloc;

use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use clock::*;
pub use error::*;
pub use generator::*;
pub use room::*;
pub use session::*;
pub use types::*;

mod clock;
mod error;
mod generator;
mod room;
mod session;
mod types;

/// Cell value marking a mine, shared by the board and the redacted view.
pub const MINE: i8 = -1;

pub const MIN_SIDE: Coord = 5;
pub const MAX_SIDE: Coord = 50;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[default]
    Custom,
}

impl Difficulty {
    /// Standard `(width, height, mines)` for the named levels.
    pub const fn preset(self) -> Option<(Coord, Coord, CellCount)> {
        use Difficulty::*;
        match self {
            Easy => Some((9, 9, 10)),
            Medium => Some((16, 16, 40)),
            Hard => Some((30, 16, 99)),
            Custom => None,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        use Difficulty::*;
        [Easy, Medium, Hard, Custom]
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value))
    }

    pub const fn as_str(self) -> &'static str {
        use Difficulty::*;
        match self {
            Easy => "EASY",
            Medium => "MEDIUM",
            Hard => "HARD",
            Custom => "CUSTOM",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub width: Coord,
    pub height: Coord,
    pub mines: CellCount,
    pub difficulty: Difficulty,
}

impl GameConfig {
    pub(crate) const fn new_unchecked(
        width: Coord,
        height: Coord,
        mines: CellCount,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            width,
            height,
            mines,
            difficulty,
        }
    }

    /// Validates wire-sized dimensions: both sides in `MIN_SIDE..=MAX_SIDE`, at least one mine and at
    /// least one safe cell.
    pub fn new(width: u32, height: u32, mines: u32, difficulty: Difficulty) -> Result<Self> {
        let side = |value: u32| {
            Coord::try_from(value)
                .ok()
                .filter(|side| (MIN_SIDE..=MAX_SIDE).contains(side))
                .ok_or(GameError::InvalidSize {
                    min: MIN_SIDE,
                    max: MAX_SIDE,
                })
        };
        let width = side(width)?;
        let height = side(height)?;

        let max = mult(width, height) - 1;
        let mines = CellCount::try_from(mines)
            .ok()
            .filter(|mines| (1..=max).contains(mines))
            .ok_or(GameError::InvalidMineCount { max })?;

        Ok(Self::new_unchecked(width, height, mines, difficulty))
    }

    pub fn from_difficulty(difficulty: Difficulty) -> Option<Self> {
        let (width, height, mines) = difficulty.preset()?;
        Some(Self::new_unchecked(width, height, mines, difficulty))
    }

    /// Board shape as `(rows, cols)`.
    pub const fn size(&self) -> Coord2 {
        (self.height, self.width)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.width, self.height)
    }
}

/// Mine layout plus precomputed adjacency counts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<i8>,
    mine_count: CellCount,
}

impl Board {
    pub(crate) fn from_mine_mask(mine_mask: &Array2<bool>) -> Self {
        let mut mine_count: CellCount = 0;
        let cells = Array2::from_shape_fn(mine_mask.dim(), |(row, col)| {
            if mine_mask[(row, col)] {
                mine_count += 1;
                return MINE;
            }
            // dims never exceed MAX_SIDE so the casts are lossless
            let adjacent = mine_mask
                .iter_neighbors((row as Coord, col as Coord))
                .filter(|&pos| mine_mask[pos.to_nd_index()])
                .count();
            adjacent as i8
        });

        Self { cells, mine_count }
    }

    /// Builds a board with mines at exactly the given `(row, col)` positions.
    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Ok(Self::from_mine_mask(&mine_mask))
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    /// `(rows, cols)`
    pub fn size(&self) -> Coord2 {
        let (rows, cols) = self.cells.dim();
        (
            rows.try_into().unwrap_or(Coord::MAX),
            cols.try_into().unwrap_or(Coord::MAX),
        )
    }

    pub fn width(&self) -> Coord {
        self.size().1
    }

    pub fn height(&self) -> Coord {
        self.size().0
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn total_cells(&self) -> CellCount {
        mult(self.height(), self.width())
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords] == MINE
    }

    pub fn cells(&self) -> &Array2<i8> {
        &self.cells
    }

    pub fn iter_mines(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.cells
            .indexed_iter()
            .filter(|&(_, &value)| value == MINE)
            .map(|((row, col), _)| (row as Coord, col as Coord))
    }

    /// Whether the stored counts agree with the mine layout, as they do for every board built here.
    pub(crate) fn is_consistent(&self) -> bool {
        let (rows, cols) = self.cells.dim();
        let in_range = |side: usize| (usize::from(MIN_SIDE)..=usize::from(MAX_SIDE)).contains(&side);
        in_range(rows)
            && in_range(cols)
            && *self == Self::from_mine_mask(&self.cells.mapv(|value| value == MINE))
    }

    pub(crate) fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }
}

impl Index<Coord2> for Board {
    type Output = i8;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        use RevealOutcome::*;
        match self {
            NoChange => false,
            Revealed => true,
            HitMine => true,
            Won => true,
        }
    }
}
