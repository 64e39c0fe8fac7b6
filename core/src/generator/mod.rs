use crate::*;
pub use random::*;

mod random;

pub trait BoardGenerator {
    fn generate(self, config: GameConfig) -> Board;
}

/// Validates the requested geometry and generates a seeded random board.
pub fn generate(width: u32, height: u32, mines: u32, seed: u64) -> Result<Board> {
    let config = GameConfig::new(width, height, mines, Difficulty::Custom)?;
    Ok(RandomBoardGenerator::new(seed).generate(config))
}
