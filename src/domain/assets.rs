/// Enum-keyed asset table.
///
/// Every (actor kind, action) pair is resolved when the table is built, so
/// a lookup during play can only miss for an action the kind does not
/// support, and such an action is rejected at build time.
///
/// The built-in art is authored as ASCII grids; see `AssetTable::builtin`.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use super::animation::Animation;
use super::draw::{Rgb, Sprite};
use super::geom::Vec2;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ActorKind {
    Player,
    Enemy,
}

impl ActorKind {
    pub const ALL: [ActorKind; 2] = [ActorKind::Player, ActorKind::Enemy];

    /// Actions this kind can play. All of them are required at build time.
    pub fn actions(self) -> &'static [Action] {
        match self {
            ActorKind::Player => &[Action::Idle, Action::Run, Action::Jump, Action::WallSlide],
            ActorKind::Enemy => &[Action::Idle, Action::Run],
        }
    }

    /// Sprite origin relative to the body's top-left corner.
    pub fn render_offset(self) -> Vec2 {
        Vec2::new(-2.0, -5.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Idle,
    Run,
    Jump,
    WallSlide,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ParticleKind {
    Leaf,
    Dust,
}

impl ParticleKind {
    pub const ALL: [ParticleKind; 2] = [ParticleKind::Leaf, ParticleKind::Dust];
}

/// Static single-image props.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Prop {
    Gun,
    Projectile,
    Grass,
    Stone,
    Tree,
}

impl Prop {
    pub const ALL: [Prop; 5] = [Prop::Gun, Prop::Projectile, Prop::Grass, Prop::Stone, Prop::Tree];
}

/// All animations for one actor kind. Shared between entities of that kind;
/// each entity clones the cursor it plays.
///
/// `anims[i]` plays `kind.actions()[i]`.
#[derive(Debug)]
pub struct ActorAnimations {
    kind: ActorKind,
    anims: Vec<Animation>,
}

impl ActorAnimations {
    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    pub fn get(&self, action: Action) -> Option<&Animation> {
        self.kind
            .actions()
            .iter()
            .position(|a| *a == action)
            .map(|i| &self.anims[i])
    }

    /// Animation an actor starts with (the kind's first action, idle).
    pub fn initial(&self) -> (Action, &Animation) {
        (self.kind.actions()[0], &self.anims[0])
    }
}

pub struct AssetTable {
    actors: Vec<Arc<ActorAnimations>>,
    particles: Vec<Animation>,
    props: Vec<Sprite>,
}

#[derive(Default)]
pub struct AssetTableBuilder {
    actors: Vec<(ActorKind, Action, Animation)>,
    particles: Vec<(ParticleKind, Animation)>,
    props: Vec<(Prop, Sprite)>,
}

impl AssetTableBuilder {
    pub fn actor(mut self, kind: ActorKind, action: Action, anim: Animation) -> Self {
        self.actors.push((kind, action, anim));
        self
    }

    pub fn particle(mut self, kind: ParticleKind, anim: Animation) -> Self {
        self.particles.push((kind, anim));
        self
    }

    pub fn prop(mut self, prop: Prop, sprite: Sprite) -> Self {
        self.props.push((prop, sprite));
        self
    }

    pub fn build(self) -> Result<AssetTable> {
        let mut grouped: HashMap<ActorKind, HashMap<Action, Animation>> = HashMap::new();
        for (kind, action, anim) in self.actors {
            if !kind.actions().contains(&action) {
                bail!("{:?} has no {:?} action", kind, action);
            }
            if grouped.entry(kind).or_default().insert(action, anim).is_some() {
                bail!("duplicate {:?}/{:?} animation", kind, action);
            }
        }

        let mut actors = Vec::with_capacity(ActorKind::ALL.len());
        for kind in ActorKind::ALL {
            let mut by_action = grouped.remove(&kind).unwrap_or_default();
            let anims = kind
                .actions()
                .iter()
                .map(|action| {
                    by_action
                        .remove(action)
                        .with_context(|| format!("missing {:?}/{:?} animation", kind, action))
                })
                .collect::<Result<Vec<_>>>()?;
            actors.push(Arc::new(ActorAnimations { kind, anims }));
        }

        let mut particles = Vec::with_capacity(ParticleKind::ALL.len());
        for kind in ParticleKind::ALL {
            let anim = self
                .particles
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, a)| a.clone())
                .with_context(|| format!("missing {:?} particle animation", kind))?;
            particles.push(anim);
        }

        let mut props = Vec::with_capacity(Prop::ALL.len());
        for prop in Prop::ALL {
            let sprite = self
                .props
                .iter()
                .find(|(p, _)| *p == prop)
                .map(|(_, s)| s.clone())
                .with_context(|| format!("missing {:?} sprite", prop))?;
            props.push(sprite);
        }

        Ok(AssetTable { actors, particles, props })
    }
}

impl AssetTable {
    pub fn builder() -> AssetTableBuilder {
        AssetTableBuilder::default()
    }

    pub fn actor(&self, kind: ActorKind) -> Arc<ActorAnimations> {
        Arc::clone(&self.actors[kind as usize])
    }

    /// Fresh particle cursor starting `start_tick` ticks in.
    pub fn particle(&self, kind: ParticleKind, start_tick: u32) -> Animation {
        self.particles[kind as usize].starting_at(start_tick)
    }

    pub fn prop(&self, prop: Prop) -> &Sprite {
        &self.props[prop as usize]
    }

    /// The art the game ships with.
    pub fn builtin() -> Result<AssetTable> {
        let dust = [
            Rgb(255, 255, 255),
            Rgb(200, 200, 200),
            Rgb(140, 140, 140),
            Rgb(80, 80, 80),
        ]
        .into_iter()
        .map(Sprite::dot)
        .collect();
        let leaf = [
            Rgb(70, 160, 60),
            Rgb(90, 170, 60),
            Rgb(110, 180, 60),
            Rgb(130, 170, 50),
            Rgb(150, 160, 50),
            Rgb(160, 140, 50),
            Rgb(150, 110, 40),
            Rgb(120, 80, 30),
        ]
        .into_iter()
        .map(Sprite::dot)
        .collect();

        AssetTable::builder()
            .actor(ActorKind::Player, Action::Idle, anim(&[PLAYER_IDLE_0, PLAYER_IDLE_1], 6, true)?)
            .actor(
                ActorKind::Player,
                Action::Run,
                anim(&[PLAYER_RUN_0, PLAYER_RUN_1, PLAYER_RUN_2, PLAYER_RUN_3], 4, true)?,
            )
            .actor(ActorKind::Player, Action::Jump, anim(&[PLAYER_JUMP], 5, true)?)
            .actor(ActorKind::Player, Action::WallSlide, anim(&[PLAYER_WALL], 5, true)?)
            .actor(ActorKind::Enemy, Action::Idle, anim(&[ENEMY_IDLE_0, ENEMY_IDLE_1], 6, true)?)
            .actor(
                ActorKind::Enemy,
                Action::Run,
                anim(&[ENEMY_RUN_0, ENEMY_RUN_1, ENEMY_RUN_0, ENEMY_RUN_2], 4, true)?,
            )
            .particle(ParticleKind::Leaf, Animation::new(leaf, 20, false)?)
            .particle(ParticleKind::Dust, Animation::new(dust, 6, false)?)
            .prop(Prop::Gun, sprite(&["gw"])?)
            .prop(Prop::Projectile, Sprite::dot(Rgb(255, 230, 120)))
            .prop(Prop::Grass, sprite(&["GGGG", "dGdd", "dddd", "dddd"])?)
            .prop(Prop::Stone, sprite(&["SSSs", "SsSS", "SSSs", "sSSS"])?)
            .prop(Prop::Tree, sprite(TREE)?)
            .build()
            .context("building built-in assets")
    }
}

// ── Built-in art ──

fn anim(rows: &[&[&str]], ticks: u32, looping: bool) -> Result<Animation> {
    let frames = rows
        .iter()
        .map(|r| Sprite::from_rows(r, PALETTE))
        .collect::<Result<Vec<_>>>()?;
    Animation::new(frames, ticks, looping)
}

fn sprite(rows: &[&str]) -> Result<Sprite> {
    Sprite::from_rows(rows, PALETTE)
}

const PALETTE: &[(char, Rgb)] = &[
    ('k', Rgb(30, 30, 45)),
    ('r', Rgb(220, 40, 40)),
    ('s', Rgb(240, 200, 160)),
    ('m', Rgb(120, 120, 135)),
    ('e', Rgb(255, 80, 80)),
    ('g', Rgb(90, 90, 90)),
    ('w', Rgb(200, 200, 200)),
    ('G', Rgb(60, 170, 60)),
    ('d', Rgb(120, 80, 40)),
    ('S', Rgb(110, 110, 120)),
    ('L', Rgb(40, 120, 50)),
    ('l', Rgb(70, 150, 60)),
    ('t', Rgb(100, 70, 40)),
];

const PLAYER_IDLE_0: &[&str] = &["kkr", "ksk", "kkk", "kkk", "k.k"];
const PLAYER_IDLE_1: &[&str] = &["kk.", "ksr", "kkk", "kkk", "k.k"];
const PLAYER_RUN_0: &[&str] = &["kkr", "ksk", "kkk", "kk.", "k.k"];
const PLAYER_RUN_1: &[&str] = &["kkr", "ksk", "kkk", ".k.", ".k."];
const PLAYER_RUN_2: &[&str] = &["kkr", "ksk", "kkk", ".kk", "k.k"];
const PLAYER_RUN_3: &[&str] = &["kkr", "ksk", "kkk", ".k.", "kk."];
const PLAYER_JUMP: &[&str] = &["kkr", "ksk", "kkk", "kkk", "kk."];
const PLAYER_WALL: &[&str] = &["rkk", "ksk", "kkk", "kk.", "kk."];

const ENEMY_IDLE_0: &[&str] = &["mmm", "mme", "mmm", "mmm", "m.m"];
const ENEMY_IDLE_1: &[&str] = &["...", "mmm", "mme", "mmm", "m.m"];
const ENEMY_RUN_0: &[&str] = &["mmm", "mme", "mmm", "mmm", "m.m"];
const ENEMY_RUN_1: &[&str] = &["mmm", "mme", "mmm", "mm.", ".m."];
const ENEMY_RUN_2: &[&str] = &["mmm", "mme", "mmm", ".mm", ".m."];

const TREE: &[&str] = &[
    "..LLLL..",
    ".LLLLLL.",
    "LLLlLLLL",
    ".LLLLlL.",
    "...tt...",
    "...tt...",
];
