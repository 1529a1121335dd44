//! World state and the per-frame step, plus level files and the score store.

pub mod event;
pub mod highscore;
pub mod level;
pub mod step;
pub mod world;
