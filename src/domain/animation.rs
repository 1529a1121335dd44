/// Frame-timed sprite cursor.
///
/// Frame data is shared behind an `Arc`; the cursor (`elapsed`, `done`) is
/// per-clone, so two entities playing the same template never step each
/// other's frames.

use std::sync::Arc;

use anyhow::{bail, Result};

use super::draw::Sprite;

#[derive(Clone, Debug)]
pub struct Animation {
    frames: Arc<[Sprite]>,
    frame_ticks: u32,
    looping: bool,
    /// Ticks since the start of the cycle.
    elapsed: u32,
    done: bool,
}

impl Animation {
    pub fn new(frames: Vec<Sprite>, frame_ticks: u32, looping: bool) -> Result<Self> {
        if frames.is_empty() {
            bail!("animation needs at least one frame");
        }
        if frame_ticks == 0 {
            bail!("animation frame duration must be positive");
        }
        Ok(Animation {
            frames: frames.into(),
            frame_ticks,
            looping,
            elapsed: 0,
            done: false,
        })
    }

    /// Fresh cursor on the same frames, starting `ticks` into the cycle.
    pub fn starting_at(&self, ticks: u32) -> Animation {
        let mut anim = Animation {
            frames: Arc::clone(&self.frames),
            frame_ticks: self.frame_ticks,
            looping: self.looping,
            elapsed: 0,
            done: false,
        };
        anim.elapsed = if self.looping { ticks % anim.cycle_ticks() } else { ticks.min(anim.last_tick()) };
        anim
    }

    fn cycle_ticks(&self) -> u32 {
        self.frame_ticks * self.frames.len() as u32
    }

    fn last_tick(&self) -> u32 {
        self.cycle_ticks() - 1
    }

    pub fn update(&mut self) {
        if self.looping {
            self.elapsed = (self.elapsed + 1) % self.cycle_ticks();
        } else {
            self.elapsed = (self.elapsed + 1).min(self.last_tick());
            if self.elapsed >= self.last_tick() {
                self.done = true;
            }
        }
    }

    pub fn current_frame_index(&self) -> usize {
        ((self.elapsed / self.frame_ticks) as usize).min(self.frames.len() - 1)
    }

    pub fn image(&self) -> &Sprite {
        &self.frames[self.current_frame_index()]
    }

    pub fn elapsed(&self) -> u32 { self.elapsed }
    pub fn is_done(&self) -> bool { self.done }
    #[cfg(test)]
    pub fn frame_count(&self) -> usize { self.frames.len() }

    #[cfg(test)]
    pub fn shares_frames_with(&self, other: &Animation) -> bool {
        Arc::ptr_eq(&self.frames, &other.frames)
    }
}
