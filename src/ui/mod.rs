//! Terminal front end: drawing, keyboard and gamepad input, sound.

pub mod canvas;
pub mod gamepad;
pub mod input;
pub mod renderer;
pub mod sound;
