use super::*;

/// Purely random placement: draw uniform cells and keep the ones that are not mined yet. The first mine is
/// uniform over the whole board, later ones are skewed slightly by the rejection, which is the accepted
/// behavior. There is no safe first reveal.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomBoardGenerator {
    seed: u64,
}

impl RandomBoardGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(self, config: GameConfig) -> Board {
        use rand::prelude::*;

        let (rows, cols) = config.size();
        let total_cells = config.total_cells();

        // GameConfig::new guarantees a free cell, this only guards hand-built configs
        let target = if config.mines >= total_cells {
            log::warn!(
                "Board cannot hold {} mines with {} cells, capping to leave one safe cell",
                config.mines,
                total_cells
            );
            total_cells.saturating_sub(1)
        } else {
            config.mines
        };

        let mut mines: Array2<bool> = Array2::default(config.size().to_nd_index());
        let mut mines_placed: CellCount = 0;

        let mut rng = SmallRng::seed_from_u64(self.seed);
        while mines_placed < target {
            let row: Coord = rng.random_range(0..rows);
            let col: Coord = rng.random_range(0..cols);
            let tile = &mut mines[(row, col).to_nd_index()];
            if !*tile {
                *tile = true;
                mines_placed += 1;
            }
        }

        let board = Board::from_mine_mask(&mines);
        log::debug!(
            "Generated {}x{} board with {} mines (seed {})",
            cols,
            rows,
            board.mine_count(),
            self.seed
        );
        board
    }
}
