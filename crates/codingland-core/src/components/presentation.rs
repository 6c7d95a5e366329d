//! Presentation handle. A node is visible exactly while it has one.
//!
//! Cosmetic effects are declarative: each lasts a fixed duration and is aged
//! by the presentation pass. Logical state never depends on them.

use codingland_logic::Vector;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectKind {
    /// Render offset toward a refused move.
    Nudge { offset: Vector },
    /// Under-attack highlight.
    UnderAttack,
    /// Fade before the handle is released on disposal.
    FadeOut,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Effect {
    pub kind: EffectKind,
    pub remaining: Duration,
}

/// Handle owned by the presentation collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub element_id: String,
    /// Element of the parent this handle is mounted under, `None` for the stage root.
    pub mounted_under: Option<String>,
    pub mounted: bool,
    pub opacity: f64,
    pub effects: Vec<Effect>,
}

impl Presentation {
    pub fn new(element_id: String) -> Self {
        Self {
            element_id,
            mounted_under: None,
            mounted: false,
            opacity: 1.0,
            effects: Vec::new(),
        }
    }

    /// Add an effect. An under-attack highlight already showing is restarted
    /// instead of stacked.
    pub fn push_effect(&mut self, kind: EffectKind, duration: Duration) {
        if kind == EffectKind::UnderAttack {
            self.effects.retain(|e| e.kind != EffectKind::UnderAttack);
        }
        self.effects.push(Effect {
            kind,
            remaining: duration,
        });
    }

    /// Sum of active nudges.
    pub fn offset(&self) -> Vector {
        self.effects
            .iter()
            .filter_map(|e| match e.kind {
                EffectKind::Nudge { offset } => Some(offset),
                _ => None,
            })
            .fold(Vector::ZERO, |acc, v| acc + v)
    }

    pub fn has(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn is_fading(&self) -> bool {
        self.has(EffectKind::FadeOut)
    }

    /// Age every effect by `elapsed`, dropping the expired ones.
    pub fn age(&mut self, elapsed: Duration) {
        for effect in &mut self.effects {
            effect.remaining = effect.remaining.saturating_sub(elapsed);
        }
        self.effects.retain(|e| !e.remaining.is_zero());
    }
}
