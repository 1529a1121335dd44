//! Pure game rules: geometry, physics, actors, effects and scoring.
//! Nothing in here touches the terminal, the clock or the filesystem.

pub mod ai;
pub mod animation;
pub mod assets;
pub mod context;
pub mod draw;
pub mod effects;
pub mod entity;
pub mod geom;
pub mod physics;
pub mod player;
pub mod score;
pub mod tile;
