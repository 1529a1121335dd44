/// Everything an actor may touch while it updates, passed in explicitly.
/// Actors never hold references to the world or to each other.

use rand::rngs::StdRng;

use super::assets::AssetTable;
use super::effects::Effects;
use super::score::ScoreTracker;
use super::tile::TileQuery;

/// One-shot sound triggers. Playback is the caller's business.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sfx {
    Jump,
    Dash,
    Hit,
    Shoot,
}

pub struct Services<'a> {
    pub tiles: &'a dyn TileQuery,
    pub assets: &'a AssetTable,
    pub fx: &'a mut Effects,
    pub score: &'a mut ScoreTracker,
    pub sounds: &'a mut Vec<Sfx>,
    pub rng: &'a mut StdRng,
    /// World death counter. Nonzero means the player is dying.
    pub dead: &'a mut u32,
    /// Game clock in milliseconds, for the combo window.
    pub now_ms: u64,
}

impl Services<'_> {
    pub fn play(&mut self, sfx: Sfx) {
        self.sounds.push(sfx);
    }

    /// Start the player's death sequence unless it is already running.
    /// Returns `true` if this call started it.
    pub fn kill_player(&mut self) -> bool {
        if *self.dead != 0 {
            return false;
        }
        *self.dead += 1;
        true
    }
}

#[cfg(test)]
pub mod testing {
    //! Owned backing storage for a `Services` in tests.

    use rand::SeedableRng;

    use super::*;
    use crate::domain::tile::Tilemap;

    pub struct Harness {
        pub tiles: Tilemap,
        pub assets: AssetTable,
        pub fx: Effects,
        pub score: ScoreTracker,
        pub sounds: Vec<Sfx>,
        pub rng: StdRng,
        pub dead: u32,
        pub now_ms: u64,
    }

    impl Harness {
        pub fn new(tiles: Tilemap) -> Self {
            Harness {
                tiles,
                assets: AssetTable::builtin().unwrap(),
                fx: Effects::default(),
                score: ScoreTracker::new(),
                sounds: Vec::new(),
                rng: StdRng::seed_from_u64(42),
                dead: 0,
                now_ms: 0,
            }
        }

        pub fn services(&mut self) -> Services<'_> {
            Services {
                tiles: &self.tiles,
                assets: &self.assets,
                fx: &mut self.fx,
                score: &mut self.score,
                sounds: &mut self.sounds,
                rng: &mut self.rng,
                dead: &mut self.dead,
                now_ms: self.now_ms,
            }
        }
    }
}
