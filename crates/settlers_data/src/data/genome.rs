use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inclusive range an inheritable trait must stay within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitBounds {
    pub min: f32,
    pub max: f32,
}

impl TraitBounds {
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp into range. NaN collapses to the midpoint.
    #[must_use]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return (self.min + self.max) * 0.5;
        }
        value.clamp(self.min, self.max)
    }

    #[must_use]
    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

/// Inheritable scalar traits carried alongside the policy weights.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct Traits {
    /// Movement speed multiplier.
    pub speed: f32,
    /// Body size; children are rendered and move smaller.
    pub size: f32,
    /// Divides stamina drain while moving.
    pub stamina_modifier: f32,
    /// Radius used for food and threat queries.
    pub vision_range: f32,
}

impl Traits {
    pub const SPEED: TraitBounds = TraitBounds::new(0.5, 2.0);
    pub const SIZE: TraitBounds = TraitBounds::new(0.5, 1.5);
    pub const STAMINA_MODIFIER: TraitBounds = TraitBounds::new(0.5, 1.5);
    pub const VISION_RANGE: TraitBounds = TraitBounds::new(5.0, 30.0);

    pub const NAMES: [&'static str; 4] = ["speed", "size", "stamina_modifier", "vision_range"];

    #[must_use]
    pub fn bounds(name: &str) -> Option<TraitBounds> {
        match name {
            "speed" => Some(Self::SPEED),
            "size" => Some(Self::SIZE),
            "stamina_modifier" => Some(Self::STAMINA_MODIFIER),
            "vision_range" => Some(Self::VISION_RANGE),
            _ => None,
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f32> {
        match name {
            "speed" => Some(self.speed),
            "size" => Some(self.size),
            "stamina_modifier" => Some(self.stamina_modifier),
            "vision_range" => Some(self.vision_range),
            _ => None,
        }
    }

    /// Returns `false` when `name` is not a known trait.
    pub fn set(&mut self, name: &str, value: f32) -> bool {
        match name {
            "speed" => self.speed = value,
            "size" => self.size = value,
            "stamina_modifier" => self.stamina_modifier = value,
            "vision_range" => self.vision_range = value,
            _ => return false,
        }
        true
    }

    /// `(name, value)` pairs in declaration order.
    #[must_use]
    pub fn named(&self) -> [(&'static str, f32); 4] {
        [
            ("speed", self.speed),
            ("size", self.size),
            ("stamina_modifier", self.stamina_modifier),
            ("vision_range", self.vision_range),
        ]
    }

    #[must_use]
    pub fn is_within_bounds(&self) -> bool {
        self.named().iter().all(|(name, value)| {
            Self::bounds(name)
                .map(|b| b.contains(*value))
                .unwrap_or(false)
        })
    }

    /// Clamps every trait into its bounds, returning the names that were out of range.
    pub fn clamp_in_place(&mut self) -> Vec<(&'static str, f32)> {
        let mut clamped = Vec::new();
        for (name, value) in self.named() {
            if let Some(bounds) = Self::bounds(name) {
                if !bounds.contains(value) {
                    clamped.push((name, value));
                    self.set(name, bounds.clamp(value));
                }
            }
        }
        clamped
    }
}

impl Default for Traits {
    fn default() -> Self {
        Self {
            speed: 1.0,
            size: 1.0,
            stamina_modifier: 1.0,
            vision_range: 10.0,
        }
    }
}

/// Complete inheritable policy of one agent: network weights plus traits.
///
/// A genome is exclusively owned by the agent carrying it. Offspring always
/// receive a freshly built genome, never a shared one.
#[derive(
    Clone, Debug, Serialize, Deserialize, PartialEq, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct Genome {
    /// Flattened decision network parameters.
    pub weights: Vec<f32>,
    /// Inheritable scalar traits.
    pub traits: Traits,
    /// Identifier of the founding genome this one descends from.
    pub lineage_id: Uuid,
}

impl Genome {
    #[must_use]
    pub fn new(weights: Vec<f32>, traits: Traits, lineage_id: Uuid) -> Self {
        Self {
            weights,
            traits,
            lineage_id,
        }
    }

    /// Genome whose weights are all zero. Evaluates to the first action for any input.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0.0; len], Traits::default(), Uuid::nil())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_reports_out_of_range_traits() {
        let mut traits = Traits {
            speed: 9.0,
            size: 1.0,
            stamina_modifier: -1.0,
            vision_range: 12.0,
        };
        let clamped = traits.clamp_in_place();
        assert_eq!(clamped.len(), 2);
        assert_eq!(traits.speed, Traits::SPEED.max);
        assert_eq!(traits.stamina_modifier, Traits::STAMINA_MODIFIER.min);
        assert!(traits.is_within_bounds());
    }

    #[test]
    fn test_nan_trait_clamps_to_midpoint() {
        assert_eq!(Traits::SIZE.clamp(f32::NAN), 1.0);
    }

    #[test]
    fn test_unknown_trait_name() {
        let mut traits = Traits::default();
        assert!(!traits.set("wingspan", 2.0));
        assert_eq!(traits.get("wingspan"), None);
        assert!(Traits::bounds("wingspan").is_none());
    }
}
