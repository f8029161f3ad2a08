//! # Building Interiors
//!
//! Fixed wall and furniture footprints for the enterable buildings. An
//! interior uses the same grid size as the outdoor level and replaces the
//! outdoor collision map wholesale while the player is inside.

use crate::{CollisionMap, GridBounds, Position, TileSet};
use serde::{Deserialize, Serialize};

/// Which furniture footprint an interior gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteriorTheme {
    Shop,
    InnLobby,
}

/// Static collision footprint of one interior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteriorLayout {
    pub theme: InteriorTheme,
    pub bounds: GridBounds,
    /// The doorway carved into the bottom wall
    pub exit: Position,
    pub walls: TileSet,
    pub furniture: TileSet,
}

impl InteriorLayout {
    /// Builds the interior for `theme` with its doorway at column `door_x`.
    ///
    /// # Examples
    ///
    /// ```
    /// use questgrid::{GridBounds, InteriorLayout, InteriorTheme, Position};
    ///
    /// let shop = InteriorLayout::for_theme(InteriorTheme::Shop, 8, GridBounds::new(16, 12));
    /// assert_eq!(shop.exit, Position::new(8, 11));
    /// assert!(!shop.solid_tiles().contains(&shop.exit));
    /// assert!(shop.solid_tiles().contains(&Position::new(0, 5)));
    /// ```
    pub fn for_theme(theme: InteriorTheme, door_x: i32, bounds: GridBounds) -> Self {
        let (w, h) = (bounds.width, bounds.height);
        let exit = Position::new(door_x.clamp(1, w - 2), h - 1);

        let mut walls = TileSet::new();
        for x in 0..w {
            walls.insert(Position::new(x, 0));
            walls.insert(Position::new(x, h - 1));
        }
        for y in 0..h {
            walls.insert(Position::new(0, y));
            walls.insert(Position::new(w - 1, y));
        }
        walls.remove(&exit);

        let mut furniture = TileSet::new();
        match theme {
            InteriorTheme::Shop => {
                // Counter
                let cx = w / 2;
                furniture.extend((cx - 2..cx + 2).map(|x| Position::new(x, 6)));
            }
            InteriorTheme::InnLobby => {
                let cx = w / 2;
                // Beds in both corners
                for x in (2..6).chain(w - 6..w - 2) {
                    furniture.insert(Position::new(x, 3));
                    furniture.insert(Position::new(x, 4));
                }
                furniture.insert(Position::new(cx, h / 2));
                // Reception counter with a gap for the host
                furniture.extend((cx - 2..cx).chain(cx + 1..cx + 2).map(|x| Position::new(x, 3)));
                // Tables
                furniture.extend((2..6).chain(w - 6..w - 2).map(|x| Position::new(x, h - 4)));
            }
        }
        furniture.retain(|pos| bounds.contains(*pos) && *pos != exit);

        Self {
            theme,
            bounds,
            exit,
            walls,
            furniture,
        }
    }

    /// Walls ∪ furniture.
    pub fn solid_tiles(&self) -> TileSet {
        self.walls.union(&self.furniture).copied().collect()
    }

    /// A fresh collision map for this interior with no occupants yet.
    pub fn collision_map(&self) -> CollisionMap {
        CollisionMap::new(self.bounds, self.solid_tiles())
    }

    /// Where the building's keeper stands.
    pub fn keeper_tile(&self) -> Position {
        let cx = self.bounds.width / 2;
        match self.theme {
            InteriorTheme::Shop => Position::new(cx + 2, 4),
            InteriorTheme::InnLobby => Position::new(cx, 3),
        }
    }

    /// Seats beside the tables for other occupants. Only the inn has any.
    pub fn guest_tiles(&self) -> Vec<Position> {
        let (w, h) = (self.bounds.width, self.bounds.height);
        match self.theme {
            InteriorTheme::Shop => Vec::new(),
            InteriorTheme::InnLobby => vec![Position::new(3, h - 3), Position::new(w - 5, h - 3)],
        }
    }

    /// Where the player stands after walking in: two tiles above the doorway.
    pub fn arrival_tile(&self) -> Position {
        Position::new(self.exit.x, self.exit.y - 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReachabilityAnalyzer;

    fn bounds() -> GridBounds {
        GridBounds::new(16, 12)
    }

    #[test]
    fn test_border_walls_with_doorway() {
        let layout = InteriorLayout::for_theme(InteriorTheme::Shop, 8, bounds());
        assert_eq!(layout.walls.len(), 2 * 16 + 2 * 12 - 4 - 1);
        assert!(!layout.walls.contains(&Position::new(8, 11)));
    }

    #[test]
    fn test_shop_counter() {
        let layout = InteriorLayout::for_theme(InteriorTheme::Shop, 8, bounds());
        let expected: TileSet = (6..10).map(|x| Position::new(x, 6)).collect();
        assert_eq!(layout.furniture, expected);
    }

    #[test]
    fn test_inn_lobby_footprint() {
        let layout = InteriorLayout::for_theme(InteriorTheme::InnLobby, 8, bounds());
        let solid = layout.solid_tiles();
        assert!(solid.contains(&Position::new(2, 3)));
        assert!(solid.contains(&Position::new(13, 4)));
        assert!(solid.contains(&Position::new(8, 6)));
        assert!(solid.contains(&Position::new(7, 3)));
        assert!(solid.contains(&Position::new(11, 8)));
        assert!(!solid.contains(&Position::new(8, 4)));
        assert!(!solid.contains(&Position::new(8, 8)));
    }

    #[test]
    fn test_occupants_stand_on_open_floor() {
        for size in [bounds(), GridBounds::new(24, 18)] {
            for theme in [InteriorTheme::Shop, InteriorTheme::InnLobby] {
                let layout = InteriorLayout::for_theme(theme, size.width / 2, size);
                let solid = layout.solid_tiles();
                let keeper = layout.keeper_tile();
                assert!(!solid.contains(&keeper), "{:?} keeper on furniture", theme);
                for guest in layout.guest_tiles() {
                    assert!(!solid.contains(&guest));
                    assert_ne!(guest, layout.arrival_tile());
                }
            }
        }
    }

    #[test]
    fn test_arrival_reaches_exit() {
        for theme in [InteriorTheme::Shop, InteriorTheme::InnLobby] {
            let layout = InteriorLayout::for_theme(theme, 8, bounds());
            let map = layout.collision_map();
            let arrival = layout.arrival_tile();
            assert!(!map.is_solid(arrival));
            let reach = ReachabilityAnalyzer::analyze(&map, arrival);
            assert!(reach.contains(layout.exit));
        }
    }

    #[test]
    fn test_door_column_is_clamped() {
        let layout = InteriorLayout::for_theme(InteriorTheme::Shop, 40, bounds());
        assert_eq!(layout.exit, Position::new(14, 11));
    }
}
