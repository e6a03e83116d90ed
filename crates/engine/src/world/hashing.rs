use sha2::{Digest, Sha256};

use super::grid::Grid;
use super::motion::Direction;

pub(crate) fn hash_level_layout(grid: &Grid, start_direction: Direction) -> String {
    let mut hasher = Sha256::new();
    hasher.update((grid.width() as u32).to_le_bytes());
    hasher.update((grid.depth() as u32).to_le_bytes());
    hasher.update([start_direction.code()]);
    for row in grid.rows() {
        for cell in row {
            hasher.update([cell.code()]);
        }
    }
    to_hex_lower(&hasher.finalize())
}

fn to_hex_lower(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}
