/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Floor,
    Wall,
    Door,            // Consumes a key to open
    // Key and Plutonium cells decode to collectibles over an Empty tile;
    // the variants exist for grid-level tooling only.
    #[allow(dead_code)]
    Key,
    #[allow(dead_code)]
    Plutonium,
    Container,       // Deposit point for carried plutonium
    Grass,           // Cleared when walked over
    Laser,           // Lethal while the hazard phase is on
    BlockadeStation, // Refills blockades to the cap
    Blockade,        // Placed by the player, recovered by walking into it
    Start,
}

impl Tile {
    /// Open ground: the only tiles enemies may enter,
    /// and the only tiles a blockade may be placed on.
    pub fn is_open(self) -> bool {
        matches!(self, Tile::Empty | Tile::Floor)
    }

    /// Does this tile stop an enemy? Everything except open ground does.
    pub fn blocks_enemy(self) -> bool {
        !self.is_open()
    }

    /// Does this tile unconditionally stop the player?
    /// Doors are conditional and handled by the move policy.
    pub fn blocks_player(self) -> bool {
        matches!(self, Tile::Wall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_open_ground_is_passable_for_enemies() {
        let all = [
            Tile::Empty, Tile::Floor, Tile::Wall, Tile::Door, Tile::Key,
            Tile::Plutonium, Tile::Container, Tile::Grass, Tile::Laser,
            Tile::BlockadeStation, Tile::Blockade, Tile::Start,
        ];
        for t in all {
            let expect_open = t == Tile::Empty || t == Tile::Floor;
            assert_eq!(!t.blocks_enemy(), expect_open, "{t:?}");
        }
    }

    #[test]
    fn only_walls_block_the_player_outright() {
        assert!(Tile::Wall.blocks_player());
        assert!(!Tile::Door.blocks_player());
        assert!(!Tile::Blockade.blocks_player());
        assert!(!Tile::Laser.blocks_player());
    }
}
