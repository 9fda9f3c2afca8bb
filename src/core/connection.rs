use hashbrown::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{BrainConfig, Strength};

/// Grid address of a neuron: layer number plus column/row inside that layer.
///
/// Connections store this instead of a reference, so the neuron graph can be
/// cyclic while each layer still owns its neurons outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NeuronId {
    pub layer: u16,
    pub y: u16,
    pub x: u16,
}

impl NeuronId {
    pub fn new(layer: usize, x: usize, y: usize) -> Self {
        Self {
            layer: layer as u16,
            x: x as u16,
            y: y as u16,
        }
    }

    #[inline]
    pub fn layer(&self) -> usize {
        self.layer as usize
    }

    #[inline]
    pub fn x(&self) -> usize {
        self.x as usize
    }

    #[inline]
    pub fn y(&self) -> usize {
        self.y as usize
    }

    /// Chebyshev distance within a layer.
    pub fn grid_distance(&self, other: &NeuronId) -> usize {
        let dx = (self.x as i64 - other.x as i64).unsigned_abs();
        let dy = (self.y as i64 - other.y as i64).unsigned_abs();
        dx.max(dy) as usize
    }
}

/// Indices of the connections in one delay bucket that currently predict firing.
pub type PredictiveSet = HashSet<u32>;

/// How an adjustment changed predictive-set membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entered,
    Left,
    Unchanged,
}

/// Directed, delay-tuned edge owned by its source neuron.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    target: NeuronId,
    strength: Strength,
}

impl Connection {
    pub fn new(target: NeuronId) -> Self {
        Self {
            target,
            strength: 0,
        }
    }

    #[inline]
    pub fn target(&self) -> NeuronId {
        self.target
    }

    #[inline]
    pub fn strength(&self) -> Strength {
        self.strength
    }

    /// STDP step for the channel tuned to `delay`.
    ///
    /// Boosts when the target last fired exactly `delay` ticks ago and decays
    /// otherwise, then puts `key` in `predictive` iff the new strength reaches
    /// the predictive threshold. Removing an absent key is a no-op.
    pub fn adjust_strength(
        &mut self,
        key: u32,
        delay: u8,
        target_last_on: u8,
        predictive: &mut PredictiveSet,
        cfg: &BrainConfig,
    ) -> Transition {
        self.strength = if target_last_on == delay {
            self.strength
                .saturating_add(cfg.stdp_increment)
                .min(cfg.max_connection_strength)
        } else {
            self.strength
                .saturating_sub(cfg.stdp_decrement)
                .max(cfg.min_connection_strength)
        };

        if self.strength >= cfg.predictive_connection_threshold {
            if predictive.insert(key) {
                return Transition::Entered;
            }
        } else if predictive.remove(&key) {
            return Transition::Left;
        }
        Transition::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> BrainConfig {
        BrainConfig::default()
            .with_predictive_threshold(15)
            .with_stdp(10, 1)
    }

    #[test]
    fn boost_crosses_threshold_and_joins_set() {
        let cfg = cfg();
        let mut c = Connection::new(NeuronId::new(0, 1, 1));
        let mut set = PredictiveSet::new();

        assert_eq!(c.adjust_strength(0, 1, 1, &mut set, &cfg), Transition::Unchanged);
        assert_eq!(c.strength(), 10);
        assert!(set.is_empty());

        assert_eq!(c.adjust_strength(0, 1, 1, &mut set, &cfg), Transition::Entered);
        assert_eq!(c.strength(), 20);
        assert!(set.contains(&0));

        // Same outcome again: membership is stable.
        assert_eq!(c.adjust_strength(0, 1, 1, &mut set, &cfg), Transition::Unchanged);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn decay_below_threshold_leaves_set() {
        let cfg = cfg();
        let mut c = Connection::new(NeuronId::new(0, 0, 0));
        let mut set = PredictiveSet::new();
        c.adjust_strength(3, 2, 2, &mut set, &cfg);
        c.adjust_strength(3, 2, 2, &mut set, &cfg);
        assert!(set.contains(&3));

        let mut transitions = Vec::new();
        for _ in 0..6 {
            transitions.push(c.adjust_strength(3, 2, 0, &mut set, &cfg));
        }
        assert_eq!(c.strength(), 14);
        assert!(!set.contains(&3));
        assert_eq!(
            transitions.iter().filter(|t| **t == Transition::Left).count(),
            1
        );
    }

    #[test]
    fn removal_miss_is_silent() {
        let cfg = cfg();
        let mut c = Connection::new(NeuronId::new(0, 0, 0));
        let mut set = PredictiveSet::new();
        set.insert(99);
        assert_eq!(c.adjust_strength(7, 1, 0, &mut set, &cfg), Transition::Unchanged);
        assert_eq!(c.strength(), -1);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn strength_saturates_at_bounds() {
        let mut cfg = cfg();
        cfg.max_connection_strength = 25;
        cfg.min_connection_strength = -3;
        let mut c = Connection::new(NeuronId::new(0, 0, 0));
        let mut set = PredictiveSet::new();
        for _ in 0..10 {
            c.adjust_strength(0, 1, 1, &mut set, &cfg);
        }
        assert_eq!(c.strength(), 25);
        for _ in 0..100 {
            c.adjust_strength(0, 1, 0, &mut set, &cfg);
        }
        assert_eq!(c.strength(), -3);
        assert!(set.is_empty());
    }

    #[test]
    fn extreme_default_bounds_do_not_overflow() {
        let cfg = BrainConfig::default().with_stdp(Strength::MAX, Strength::MAX);
        let mut c = Connection::new(NeuronId::new(0, 0, 0));
        let mut set = PredictiveSet::new();
        c.adjust_strength(0, 1, 1, &mut set, &cfg);
        c.adjust_strength(0, 1, 1, &mut set, &cfg);
        assert_eq!(c.strength(), Strength::MAX);
        for _ in 0..3 {
            c.adjust_strength(0, 1, 0, &mut set, &cfg);
        }
        assert_eq!(c.strength(), -Strength::MAX);
    }
}
