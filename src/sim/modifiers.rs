//! Timed combat modifiers
//!
//! Each buff is a token in a multiset. The effective multiplier for a kind
//! is the product over the tokens currently alive, so overlapping boosts of
//! different magnitudes expire independently and exactly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    DamageBoost,
    SpeedBoost,
    /// Blocks all incoming damage while any token is alive
    Invincible,
}

/// Handle returned by [`ModifierStack::push`], used to remove that one buff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModifierToken(u32);

#[derive(Debug, Clone)]
struct ActiveModifier {
    token: ModifierToken,
    kind: ModifierKind,
    value: f32,
}

#[derive(Debug, Clone, Default)]
pub struct ModifierStack {
    active: Vec<ActiveModifier>,
    next_token: u32,
}

impl ModifierStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a modifier. Multiplier values must be positive and finite.
    pub fn push(&mut self, kind: ModifierKind, value: f32) -> Option<ModifierToken> {
        if !(value > 0.0) || !value.is_finite() {
            log::trace!("rejecting {:?} modifier with value {}", kind, value);
            return None;
        }
        let token = ModifierToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.active.push(ActiveModifier { token, kind, value });
        Some(token)
    }

    /// Remove one modifier. Removing an unknown or already-removed token is a no-op.
    pub fn remove(&mut self, token: ModifierToken) -> bool {
        let before = self.active.len();
        self.active.retain(|m| m.token != token);
        self.active.len() != before
    }

    /// Effective multiplier for `kind` (1.0 when nothing is active)
    pub fn product(&self, kind: ModifierKind) -> f32 {
        self.active
            .iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.value)
            .product()
    }

    pub fn has(&self, kind: ModifierKind) -> bool {
        self.active.iter().any(|m| m.kind == kind)
    }

    pub fn count(&self, kind: ModifierKind) -> usize {
        self.active.iter().filter(|m| m.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_boosts_revert_exactly() {
        let mut stack = ModifierStack::new();
        let a = stack.push(ModifierKind::DamageBoost, 2.0).unwrap();
        let b = stack.push(ModifierKind::DamageBoost, 1.5).unwrap();
        assert!((stack.product(ModifierKind::DamageBoost) - 3.0).abs() < 1e-6);

        assert!(stack.remove(a));
        assert!((stack.product(ModifierKind::DamageBoost) - 1.5).abs() < 1e-6);

        // Double expiry of the same token changes nothing
        assert!(!stack.remove(a));
        assert!((stack.product(ModifierKind::DamageBoost) - 1.5).abs() < 1e-6);

        assert!(stack.remove(b));
        assert_eq!(stack.product(ModifierKind::DamageBoost), 1.0);
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut stack = ModifierStack::new();
        stack.push(ModifierKind::SpeedBoost, 1.3).unwrap();
        assert_eq!(stack.product(ModifierKind::DamageBoost), 1.0);
        assert!(!stack.has(ModifierKind::Invincible));
        stack.push(ModifierKind::Invincible, 1.0).unwrap();
        assert!(stack.has(ModifierKind::Invincible));
        assert_eq!(stack.count(ModifierKind::SpeedBoost), 1);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut stack = ModifierStack::new();
        assert!(stack.push(ModifierKind::DamageBoost, 0.0).is_none());
        assert!(stack.push(ModifierKind::DamageBoost, f32::NAN).is_none());
        assert!(stack.push(ModifierKind::DamageBoost, f32::INFINITY).is_none());
        assert!(stack.is_empty());
    }
}
