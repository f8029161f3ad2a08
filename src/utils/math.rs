//! # Grid Mathematics
//!
//! Small geometric helpers shared by generation and placement.

use crate::{GridBounds, Position};

/// Iterates the `(2r+1)×(2r+1)` box centred on `center` in row-major order
/// (`dy` outer, `dx` inner). Tiles outside `bounds` are skipped.
///
/// # Examples
///
/// ```
/// use questgrid::{square_box, GridBounds, Position};
///
/// let tiles: Vec<Position> = square_box(Position::new(0, 0), 1, GridBounds::new(4, 4)).collect();
/// assert_eq!(
///     tiles,
///     vec![
///         Position::new(0, 0),
///         Position::new(1, 0),
///         Position::new(0, 1),
///         Position::new(1, 1),
///     ]
/// );
/// ```
pub fn square_box(
    center: Position,
    radius: i32,
    bounds: GridBounds,
) -> impl Iterator<Item = Position> {
    (-radius..=radius)
        .flat_map(move |dy| (-radius..=radius).map(move |dx| center + Position::new(dx, dy)))
        .filter(move |pos| bounds.contains(*pos))
}

/// Disk membership used for ponds: `dx² + dy² ≤ r² − 1`.
pub fn within_pond_disk(dx: i32, dy: i32, radius: i32) -> bool {
    dx * dx + dy * dy <= radius * radius - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_box_size() {
        let bounds = GridBounds::new(16, 12);
        assert_eq!(square_box(Position::new(8, 6), 2, bounds).count(), 25);
        assert_eq!(square_box(Position::new(0, 0), 2, bounds).count(), 9);
    }

    #[test]
    fn test_square_box_is_row_major() {
        let bounds = GridBounds::new(16, 12);
        let tiles: Vec<Position> = square_box(Position::new(5, 5), 1, bounds).collect();
        assert_eq!(tiles[0], Position::new(4, 4));
        assert_eq!(tiles[1], Position::new(5, 4));
        assert_eq!(tiles[3], Position::new(4, 5));
        assert_eq!(tiles[8], Position::new(6, 6));
    }

    #[test]
    fn test_pond_disk() {
        assert!(within_pond_disk(0, 0, 1));
        assert!(!within_pond_disk(1, 0, 1));
        assert!(within_pond_disk(2, 1, 3));
        assert!(!within_pond_disk(3, 0, 3));
        assert!(!within_pond_disk(2, 2, 3));
    }
}
