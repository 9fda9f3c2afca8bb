#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::activity::{Feed, LayerActivity};
use crate::config::{BrainConfig, Strength};
use crate::connection::{Connection, NeuronId, PredictiveSet, Transition};
use crate::prng::Prng;

/// Which neighbourhood an outgoing connection reaches into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConnectionKind {
    /// Same layer.
    Sibling,
    /// One layer closer to the input (feedforward source).
    Child,
    /// One layer further from the input (feedback source).
    Parent,
}

#[derive(Debug, Clone, Default)]
struct DelayBucket {
    connections: Vec<Connection>,
    predictive: PredictiveSet,
}

/// Outgoing connections of one kind.
///
/// Every target edge has one connection per delay `1..=max_history`; bucket
/// `d - 1` holds the channels tuned to delay `d`, in edge order, together with
/// the subset currently strong enough to predict.
#[derive(Debug, Clone)]
pub struct ConnectionGroup {
    targets: Vec<NeuronId>,
    buckets: Vec<DelayBucket>,
}

/// Counters from one LEARN pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LearnTally {
    pub neurons: usize,
    pub adjusted: usize,
    pub entered: usize,
    pub left: usize,
}

impl core::ops::Add for LearnTally {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            neurons: self.neurons + rhs.neurons,
            adjusted: self.adjusted + rhs.adjusted,
            entered: self.entered + rhs.entered,
            left: self.left + rhs.left,
        }
    }
}

impl core::iter::Sum for LearnTally {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |a, b| a + b)
    }
}

impl ConnectionGroup {
    pub fn new(max_history: u8) -> Self {
        Self {
            targets: Vec::new(),
            buckets: vec![DelayBucket::default(); max_history as usize],
        }
    }

    /// Add an edge to `target`. Returns false if the edge already exists.
    pub fn connect(&mut self, target: NeuronId) -> bool {
        if self.targets.contains(&target) {
            return false;
        }
        self.targets.push(target);
        for bucket in &mut self.buckets {
            bucket.connections.push(Connection::new(target));
        }
        true
    }

    #[inline]
    pub fn targets(&self) -> &[NeuronId] {
        &self.targets
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Number of distinct target neurons.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.targets.len()
    }

    /// Number of delay-tuned connections (edges x delays).
    pub fn connection_count(&self) -> usize {
        self.buckets.iter().map(|b| b.connections.len()).sum()
    }

    pub fn predictive_count(&self) -> usize {
        self.buckets.iter().map(|b| b.predictive.len()).sum()
    }

    /// Connection to the `edge`-th target tuned to `delay` (1-based).
    pub fn connection(&self, delay: u8, edge: usize) -> Option<&Connection> {
        self.buckets
            .get((delay as usize).checked_sub(1)?)?
            .connections
            .get(edge)
    }

    /// Connections currently predictive at `delay` (1-based).
    pub fn predictive(&self, delay: u8) -> impl Iterator<Item = &Connection> + '_ {
        let bucket = (delay as usize)
            .checked_sub(1)
            .and_then(|d| self.buckets.get(d));
        bucket.into_iter().flat_map(|b| {
            b.predictive
                .iter()
                .map(move |&i| &b.connections[i as usize])
        })
    }

    pub fn is_predictive(&self, delay: u8, edge: usize) -> bool {
        (delay as usize)
            .checked_sub(1)
            .and_then(|d| self.buckets.get(d))
            .is_some_and(|b| b.predictive.contains(&(edge as u32)))
    }

    /// Add to `potential` the predictive strengths whose target's lag matches
    /// the channel delay.
    ///
    /// Stops once the running total passes `cutoff`; predictive strengths are
    /// never negative, so the remaining terms could only push it higher.
    fn accumulate(&self, view: &[LayerActivity], max_history: u8, mut potential: f64, cutoff: f64) -> f64 {
        for (d, bucket) in self.buckets.iter().enumerate() {
            let delay = d as u8 + 1;
            for &i in &bucket.predictive {
                let c = &bucket.connections[i as usize];
                let t = c.target();
                if view[t.layer()].lag(t.x(), t.y(), max_history) == Some(delay) {
                    potential += c.strength() as f64;
                    if potential > cutoff {
                        return potential;
                    }
                }
            }
        }
        potential
    }

    fn learn(&mut self, view: &[LayerActivity], cfg: &BrainConfig) -> LearnTally {
        let mut tally = LearnTally::default();
        for (d, bucket) in self.buckets.iter_mut().enumerate() {
            let delay = d as u8 + 1;
            let DelayBucket {
                connections,
                predictive,
            } = bucket;
            for (i, c) in connections.iter_mut().enumerate() {
                let t = c.target();
                let last_on = view[t.layer()].last_on(t.x(), t.y());
                match c.adjust_strength(i as u32, delay, last_on, predictive, cfg) {
                    Transition::Entered => tally.entered += 1,
                    Transition::Left => tally.left += 1,
                    Transition::Unchanged => {}
                }
                tally.adjusted += 1;
            }
        }
        tally
    }
}

/// Diagnostic split of a neuron's connections by the configured ratios.
///
/// Derived from the sibling edge count; it never limits how many edges the
/// locality windows actually create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConnectionBudget {
    pub total_connections: usize,
    pub total_siblings: usize,
    pub total_children: usize,
    pub total_parents: usize,
}

impl core::ops::Add for ConnectionBudget {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            total_connections: self.total_connections + rhs.total_connections,
            total_siblings: self.total_siblings + rhs.total_siblings,
            total_children: self.total_children + rhs.total_children,
            total_parents: self.total_parents + rhs.total_parents,
        }
    }
}

// Neurons follow a PREDICT | OBSERVE | LEARN cycle each tick:
//
// PREDICT  guess from parent, sibling and child history whether we fire next.
// OBSERVE  take the actual state: the input bit for the leaf layer, an
//          OR-pool of child neurons above it.
// LEARN    if we fired and nobody saw it coming, tune every delay channel
//          toward the neighbours that fired at that delay before us.
#[derive(Debug, Clone)]
pub struct Neuron {
    id: NeuronId,
    is_on: bool,
    last_on: u8,
    max_history: u8,
    predicted: bool,
    potential: f64,

    siblings: ConnectionGroup,
    children: ConnectionGroup,
    parents: ConnectionGroup,

    rng: Prng,
}

impl Neuron {
    pub fn new(id: NeuronId, max_history: u8, seed: u64) -> Self {
        Self {
            id,
            is_on: false,
            last_on: 0,
            max_history,
            predicted: false,
            potential: 0.0,
            siblings: ConnectionGroup::new(max_history),
            children: ConnectionGroup::new(max_history),
            parents: ConnectionGroup::new(max_history),
            rng: Prng::for_neuron(seed, id.layer(), id.x(), id.y()),
        }
    }

    #[inline]
    pub fn id(&self) -> NeuronId {
        self.id
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Ticks since this neuron last fired, excluding the current tick; 0 when
    /// that is outside the history window.
    #[inline]
    pub fn last_on(&self) -> u8 {
        self.last_on
    }

    /// Result of the most recent PREDICT.
    #[inline]
    pub fn predicted(&self) -> bool {
        self.predicted
    }

    #[inline]
    pub fn potential(&self) -> f64 {
        self.potential
    }

    pub fn group(&self, kind: ConnectionKind) -> &ConnectionGroup {
        match kind {
            ConnectionKind::Sibling => &self.siblings,
            ConnectionKind::Child => &self.children,
            ConnectionKind::Parent => &self.parents,
        }
    }

    /// Add an outgoing edge. The neuron never connects to itself.
    pub fn connect(&mut self, kind: ConnectionKind, target: NeuronId) -> bool {
        if target == self.id {
            return false;
        }
        match kind {
            ConnectionKind::Sibling => self.siblings.connect(target),
            ConnectionKind::Child => self.children.connect(target),
            ConnectionKind::Parent => self.parents.connect(target),
        }
    }

    pub fn edge_count(&self) -> usize {
        self.siblings.edge_count() + self.children.edge_count() + self.parents.edge_count()
    }

    pub fn connection_count(&self) -> usize {
        self.siblings.connection_count()
            + self.children.connection_count()
            + self.parents.connection_count()
    }

    pub fn predictive_count(&self) -> usize {
        self.siblings.predictive_count()
            + self.children.predictive_count()
            + self.parents.predictive_count()
    }

    pub fn connection_budget(&self, cfg: &BrainConfig) -> ConnectionBudget {
        let siblings = self.siblings.edge_count();
        let total = (siblings as f64 / cfg.sibling_connection_ratio).round() as usize;
        ConnectionBudget {
            total_connections: total,
            total_siblings: siblings,
            total_children: (total as f64 * cfg.child_connection_ratio).round() as usize,
            total_parents: (total as f64 * cfg.parent_connection_ratio).round() as usize,
        }
    }

    /// Apply a new state, ageing `last_on` from the state being replaced.
    pub fn set(&mut self, state: bool) {
        if self.is_on {
            self.last_on = 1;
        } else if self.last_on != 0 {
            self.last_on = if self.last_on >= self.max_history {
                0
            } else {
                self.last_on + 1
            };
        }
        self.is_on = state;
    }

    /// Forecast whether this neuron fires on the next tick.
    ///
    /// Parents are checked first: they are few, and when they already predict
    /// firing the sibling pass is skipped.
    pub fn predict(&mut self, view: &[LayerActivity], cfg: &BrainConfig) -> bool {
        let groups = [
            (&self.parents, cfg.parent_triggering_threshold),
            (&self.siblings, cfg.sibling_triggering_threshold),
            (&self.children, cfg.child_triggering_threshold),
        ];

        // Potential carries over from group to group; a group without edges
        // is not tested.
        let mut potential = 0.0;
        let mut fire = false;
        for (group, threshold) in groups {
            if group.is_empty() {
                continue;
            }
            potential = group.accumulate(view, cfg.max_history, potential, threshold * cfg.threshold_size);
            if potential > threshold {
                fire = true;
                break;
            }
        }

        self.potential = potential;
        self.predicted = fire;
        fire
    }

    /// Take this tick's actual state from `feed`.
    pub fn observe(&mut self, feed: Feed<'_>) {
        let state = match feed {
            Feed::Signal(frame) => frame.get(self.id.x(), self.id.y()),
            Feed::Pool(child) => self
                .children
                .targets()
                .iter()
                .any(|t| child.is_on(t.x(), t.y())),
        };
        self.set(state);
    }

    /// STDP over every group and delay, if this firing is worth learning from.
    ///
    /// Unpredicted firings always learn; predicted ones only win the
    /// reinforcement lottery now and then. Returns `None` when nothing ran.
    pub fn learn(&mut self, view: &[LayerActivity], cfg: &BrainConfig) -> Option<LearnTally> {
        let active = self.is_on && (!self.predicted || self.rng.chance(cfg.reinforce_fraction));
        let tally = active.then(|| {
            let mut tally = self.siblings.learn(view, cfg)
                + self.children.learn(view, cfg)
                + self.parents.learn(view, cfg);
            tally.neurons = 1;
            tally
        });
        self.potential = 0.0;
        tally
    }

    /// Strength of the strongest predictive channel of `kind` at `delay`.
    pub fn strongest(&self, kind: ConnectionKind, delay: u8) -> Option<Strength> {
        self.group(kind).predictive(delay).map(|c| c.strength()).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn neuron(x: usize, y: usize) -> Neuron {
        Neuron::new(NeuronId::new(0, x, y), 5, 1)
    }

    #[test]
    fn set_tracks_recency() {
        let mut n = neuron(0, 0);
        assert_eq!(n.last_on(), 0);
        n.set(true);
        assert_eq!(n.last_on(), 0); // on now, but not before
        n.set(false);
        assert_eq!(n.last_on(), 1);
        n.set(false);
        assert_eq!(n.last_on(), 2);
        n.set(true);
        assert_eq!(n.last_on(), 3);
        n.set(false);
        assert_eq!(n.last_on(), 1);
        for _ in 0..5 {
            n.set(false);
        }
        assert_eq!(n.last_on(), 0);
    }

    #[test]
    fn never_connects_to_itself_or_twice() {
        let mut n = neuron(2, 2);
        assert!(!n.connect(ConnectionKind::Sibling, NeuronId::new(0, 2, 2)));
        assert!(n.connect(ConnectionKind::Sibling, NeuronId::new(0, 1, 2)));
        assert!(!n.connect(ConnectionKind::Sibling, NeuronId::new(0, 1, 2)));
        assert_eq!(n.edge_count(), 1);
        assert_eq!(n.connection_count(), 5);
    }

    fn view_with(width: usize, on: &[(usize, usize)], last: &[(usize, usize, u8)]) -> LayerActivity {
        let mut a = LayerActivity::new(width, width);
        for &(x, y) in on {
            a.record(y * width + x, true, 0);
        }
        for &(x, y, l) in last {
            a.record(y * width + x, false, l);
        }
        a
    }

    #[test]
    fn learns_then_predicts_from_sibling_at_matching_delay() {
        let cfg = BrainConfig::with_size(1, 16).with_predictive_threshold(1);
        let mut n = neuron(1, 0);
        n.connect(ConnectionKind::Sibling, NeuronId::new(0, 0, 0));
        n.connect(ConnectionKind::Sibling, NeuronId::new(0, 2, 0));

        // (0,0) fired one tick before n fires.
        n.set(true);
        let view = [view_with(4, &[(1, 0)], &[(0, 0, 1)])];
        let tally = n.learn(&view, &cfg).unwrap();
        assert_eq!(tally.neurons, 1);
        assert_eq!(tally.adjusted, 10);
        assert_eq!(tally.entered, 1);
        assert!(n.group(ConnectionKind::Sibling).is_predictive(1, 0));
        assert!(!n.group(ConnectionKind::Sibling).is_predictive(2, 0));
        assert_eq!(n.strongest(ConnectionKind::Sibling, 1), Some(10));

        // (0,0) on now: n should fire next tick.
        let view = [view_with(4, &[(0, 0)], &[])];
        assert!(n.predict(&view, &cfg));
        assert!(n.potential() > 1.0);

        // (0,0) on two ticks back does not match the delay-1 channel.
        let view = [view_with(4, &[], &[(0, 0, 1)])];
        assert!(!n.predict(&view, &cfg));
    }

    #[test]
    fn idle_or_predicted_neurons_skip_learning() {
        let mut cfg = BrainConfig::with_size(1, 16);
        cfg.reinforce_fraction = 0.0;
        let mut n = neuron(1, 0);
        n.connect(ConnectionKind::Sibling, NeuronId::new(0, 0, 0));
        let view = [view_with(4, &[], &[(0, 0, 1)])];

        assert!(n.learn(&view, &cfg).is_none());

        n.set(true);
        n.predicted = true;
        assert!(n.learn(&view, &cfg).is_none());
        assert_eq!(n.potential(), 0.0);

        cfg.reinforce_fraction = 1.0;
        assert!(n.learn(&view, &cfg).is_some());
    }

    #[test]
    fn observe_pools_children_and_reads_signal() {
        let mut parent = Neuron::new(NeuronId::new(1, 0, 0), 5, 1);
        parent.connect(ConnectionKind::Child, NeuronId::new(0, 0, 0));
        parent.connect(ConnectionKind::Child, NeuronId::new(0, 1, 1));

        let child = view_with(2, &[(1, 1)], &[]);
        parent.observe(Feed::Pool(&child));
        assert!(parent.is_on());

        let child = view_with(2, &[(1, 0)], &[]);
        parent.observe(Feed::Pool(&child));
        assert!(!parent.is_on());
        assert_eq!(parent.last_on(), 1);

        let mut leaf = neuron(1, 0);
        let frame = Frame::from_rows(&[vec![0u8, 1], vec![0, 0]]).unwrap();
        leaf.observe(Feed::Signal(&frame));
        assert!(leaf.is_on());
    }

    #[test]
    fn potential_carries_over_into_later_groups() {
        let cfg = BrainConfig::with_size(2, 16)
            .with_predictive_threshold(1)
            .with_stdp(1, 1);
        let mut n = Neuron::new(NeuronId::new(1, 1, 1), 5, 1);
        n.connect(ConnectionKind::Sibling, NeuronId::new(1, 0, 0));
        n.connect(ConnectionKind::Child, NeuronId::new(0, 0, 0));

        n.set(true);
        let view = [view_with(4, &[], &[]), view_with(2, &[(1, 1)], &[(0, 0, 1)])];
        n.learn(&view, &cfg).unwrap();
        assert_eq!(n.strongest(ConnectionKind::Sibling, 1), Some(1));
        assert_eq!(n.strongest(ConnectionKind::Child, 1), None);

        // Siblings alone reach 1, not above their threshold of 1.0; the
        // silent child group is then tested against the running total.
        let view = [view_with(4, &[], &[]), view_with(2, &[(0, 0)], &[])];
        assert!(n.predict(&view, &cfg));
        assert_eq!(n.potential(), 1.0);
    }

    #[test]
    fn parent_channel_alone_predicts_and_skips_siblings() {
        let cfg = BrainConfig::with_size(2, 16).with_predictive_threshold(1);
        let mut n = neuron(1, 0);
        n.connect(ConnectionKind::Sibling, NeuronId::new(0, 0, 0));
        n.connect(ConnectionKind::Parent, NeuronId::new(1, 0, 0));

        n.set(true);
        let view = [
            view_with(4, &[(1, 0)], &[(0, 0, 1)]),
            view_with(2, &[], &[(0, 0, 1)]),
        ];
        n.learn(&view, &cfg).unwrap();
        assert_eq!(n.strongest(ConnectionKind::Parent, 1), Some(10));
        assert_eq!(n.strongest(ConnectionKind::Sibling, 1), Some(10));

        // Both channels match, but the parent pass already fires.
        let view = [view_with(4, &[(0, 0)], &[]), view_with(2, &[(0, 0)], &[])];
        assert!(n.predict(&view, &cfg));
        assert_eq!(n.potential(), 10.0);

        // Parent quiet: the sibling pass fires on its own.
        let view = [view_with(4, &[(0, 0)], &[]), view_with(2, &[], &[])];
        assert!(n.predict(&view, &cfg));
        assert_eq!(n.potential(), 10.0);
    }

    #[test]
    fn child_channel_predicts_upper_neuron() {
        let cfg = BrainConfig::with_size(2, 16).with_predictive_threshold(1);
        let mut n = Neuron::new(NeuronId::new(1, 0, 0), 5, 1);
        n.connect(ConnectionKind::Child, NeuronId::new(0, 1, 1));

        n.set(true);
        let view = [view_with(4, &[], &[(1, 1, 2)]), view_with(2, &[(0, 0)], &[])];
        n.learn(&view, &cfg).unwrap();
        assert!(n.group(ConnectionKind::Child).is_predictive(2, 0));

        // Child on one tick ago: lag 2 next tick.
        let view = [view_with(4, &[], &[(1, 1, 1)]), view_with(2, &[], &[])];
        assert!(n.predict(&view, &cfg));
        assert_eq!(n.potential(), 10.0);

        let view = [view_with(4, &[(1, 1)], &[]), view_with(2, &[], &[])];
        assert!(!n.predict(&view, &cfg));
        assert_eq!(n.potential(), 0.0);
    }

    #[test]
    fn accumulation_stops_past_the_cutoff() {
        let cfg = BrainConfig::with_size(1, 256).with_predictive_threshold(1);
        let mut n = Neuron::new(NeuronId::new(0, 0, 1), 5, 1);
        let targets: Vec<(usize, usize)> = (1..9).map(|x| (x, 0)).collect();
        for &(x, y) in &targets {
            n.connect(ConnectionKind::Sibling, NeuronId::new(0, x, y));
        }

        n.set(true);
        let recent: Vec<(usize, usize, u8)> = targets.iter().map(|&(x, y)| (x, y, 1)).collect();
        let view = [view_with(16, &[(0, 1)], &recent)];
        let tally = n.learn(&view, &cfg).unwrap();
        assert_eq!(tally.entered, 8);

        // Eight matching channels of 10, but the cutoff is 1.0 * 2.0.
        let view = [view_with(16, &targets, &[])];
        assert!(n.predict(&view, &cfg));
        assert_eq!(n.potential(), 10.0);

        let mut wide = cfg.clone();
        wide.threshold_size = 100.0;
        assert!(n.predict(&view, &wide));
        assert_eq!(n.potential(), 80.0);
    }

    #[test]
    fn budget_follows_ratios() {
        let cfg = BrainConfig::default();
        let mut n = neuron(0, 0);
        for x in 1..10 {
            n.connect(ConnectionKind::Sibling, NeuronId::new(0, x, 0));
        }
        let b = n.connection_budget(&cfg);
        assert_eq!(b.total_siblings, 9);
        assert_eq!(b.total_connections, 10);
        assert_eq!(b.total_children, 1);
        assert_eq!(b.total_parents, 1);
    }
}
