/// Score and combo tracking.
///
/// A kill within `COMBO_WINDOW_MS` of the previous one grows the combo and
/// refreshes the combo timer; otherwise the combo restarts at 1. The timer
/// also runs down once per frame, and when it is out the combo drops to 0
/// with the multiplier back at 1. The two resets disagree on the combo
/// count (1 vs 0); both are kept as they are.

use super::draw::Rgb;
use super::geom::Vec2;

pub const COMBO_WINDOW_MS: u64 = 2000;
pub const COMBO_TIMER_TICKS: u32 = 180;
pub const MAX_MULTIPLIER: u32 = 5;
pub const POPUP_TICKS: u32 = 60;
const POPUP_RISE: f32 = 0.5;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScoreKind {
    Enemy,
    /// Pays 1.5x. No enemy awards it yet; dashers score as `Enemy`.
    #[allow(dead_code)]
    DashEnemy,
}

/// Floating "+N" above the player after a kill.
#[derive(Clone, Debug)]
pub struct ScorePopup {
    pub text: String,
    pub pos: Vec2,
    pub timer: u32,
    pub color: Rgb,
}

#[derive(Clone, Debug)]
pub struct ScoreTracker {
    pub total: u32,
    pub combo_count: u32,
    pub multiplier: u32,
    pub combo_timer: u32,
    pub last_kill_ms: Option<u64>,
    pub popups: Vec<ScorePopup>,
}

impl Default for ScoreTracker {
    fn default() -> Self {
        ScoreTracker {
            total: 0,
            combo_count: 0,
            multiplier: 1,
            combo_timer: 0,
            last_kill_ms: None,
            popups: Vec::new(),
        }
    }
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Award `points` for a kill at `now_ms`, returning what was added.
    /// The popup is placed 20px above `player_pos`.
    pub fn add_score(&mut self, points: u32, kind: ScoreKind, now_ms: u64, player_pos: Vec2) -> u32 {
        let in_window = self
            .last_kill_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < COMBO_WINDOW_MS);
        if in_window {
            self.combo_count += 1;
            self.combo_timer = COMBO_TIMER_TICKS;
            self.multiplier = (1 + self.combo_count / 3).min(MAX_MULTIPLIER);
        } else {
            self.combo_count = 1;
            self.multiplier = 1;
            self.combo_timer = COMBO_TIMER_TICKS;
        }
        self.last_kill_ms = Some(now_ms);

        let mut award = points * self.multiplier;
        if kind == ScoreKind::DashEnemy {
            award = award * 3 / 2;
        }
        self.total += award;

        self.popups.push(ScorePopup {
            text: format!("+{}", award),
            pos: player_pos + Vec2::new(0.0, -20.0),
            timer: POPUP_TICKS,
            color: if self.multiplier > 1 { Rgb::YELLOW } else { Rgb::WHITE },
        });
        award
    }

    /// Once per frame.
    pub fn update_combo(&mut self) {
        if self.combo_timer > 0 {
            self.combo_timer -= 1;
        } else {
            self.combo_count = 0;
            self.multiplier = 1;
        }
    }

    pub fn update_popups(&mut self) {
        for p in &mut self.popups {
            p.timer = p.timer.saturating_sub(1);
            p.pos.y -= POPUP_RISE;
        }
        self.popups.retain(|p| p.timer > 0);
    }

    /// Fresh run after a game over. The multiplier settles on the next
    /// `update_combo`.
    pub fn reset_run(&mut self) {
        self.total = 0;
        self.combo_count = 0;
        self.combo_timer = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kill(s: &mut ScoreTracker, now: u64) -> u32 {
        s.add_score(100, ScoreKind::Enemy, now, Vec2::ZERO)
    }

    #[test]
    fn first_kill_takes_reset_path() {
        let mut s = ScoreTracker::new();
        assert_eq!(kill(&mut s, 0), 100);
        assert_eq!(s.combo_count, 1);
        assert_eq!(s.multiplier, 1);
        assert_eq!(s.combo_timer, COMBO_TIMER_TICKS);
    }

    #[test]
    fn two_quick_kills_stay_at_x1() {
        let mut s = ScoreTracker::new();
        kill(&mut s, 1000);
        assert_eq!(kill(&mut s, 1500), 100);
        assert_eq!(s.combo_count, 2);
        assert_eq!(s.multiplier, 1);
        assert_eq!(s.total, 200);
    }

    #[test]
    fn multiplier_grows_every_third_and_caps() {
        let mut s = ScoreTracker::new();
        let mut last = 1;
        for i in 0..20u64 {
            kill(&mut s, i * 100);
            assert!(s.multiplier >= last);
            last = s.multiplier;
        }
        assert_eq!(s.combo_count, 20);
        assert_eq!(s.multiplier, MAX_MULTIPLIER);

        let mut s = ScoreTracker::new();
        kill(&mut s, 0);
        kill(&mut s, 10);
        assert_eq!(kill(&mut s, 20), 200);
    }

    #[test]
    fn gap_outside_window_resets_multiplier() {
        let mut s = ScoreTracker::new();
        for i in 0..6u64 {
            kill(&mut s, i * 100);
        }
        assert_eq!(s.multiplier, 3);
        kill(&mut s, 500 + COMBO_WINDOW_MS);
        assert_eq!(s.multiplier, 1);
        assert_eq!(s.combo_count, 1);
    }

    #[test]
    fn dash_enemy_bonus_truncates() {
        let mut s = ScoreTracker::new();
        assert_eq!(s.add_score(150, ScoreKind::DashEnemy, 0, Vec2::ZERO), 225);
        assert_eq!(s.add_score(1, ScoreKind::DashEnemy, 5000, Vec2::ZERO), 1);
    }

    #[test]
    fn timer_expiry_zeroes_combo_keeps_asymmetry() {
        let mut s = ScoreTracker::new();
        for i in 0..3u64 {
            kill(&mut s, i);
        }
        assert_eq!(s.multiplier, 2);
        for _ in 0..COMBO_TIMER_TICKS {
            s.update_combo();
        }
        assert_eq!(s.combo_timer, 0);
        assert_eq!(s.multiplier, 2);
        s.update_combo();
        assert_eq!(s.combo_count, 0);
        assert_eq!(s.multiplier, 1);
    }

    #[test]
    fn popup_placement_and_color() {
        let mut s = ScoreTracker::new();
        s.add_score(100, ScoreKind::Enemy, 0, Vec2::new(40.0, 60.0));
        assert_eq!(s.popups[0].text, "+100");
        assert_eq!(s.popups[0].pos, Vec2::new(40.0, 40.0));
        assert_eq!(s.popups[0].color, Rgb::WHITE);
        kill(&mut s, 1);
        kill(&mut s, 2);
        assert_eq!(s.popups[2].color, Rgb::YELLOW);
    }

    #[test]
    fn popups_rise_and_expire() {
        let mut s = ScoreTracker::new();
        kill(&mut s, 0);
        s.update_popups();
        assert_eq!(s.popups[0].pos.y, -20.5);
        for _ in 1..POPUP_TICKS {
            s.update_popups();
        }
        assert!(s.popups.is_empty());
    }

    #[test]
    fn reset_run_clears_score_and_combo() {
        let mut s = ScoreTracker::new();
        kill(&mut s, 0);
        s.reset_run();
        assert_eq!((s.total, s.combo_count, s.combo_timer), (0, 0, 0));
    }
}
