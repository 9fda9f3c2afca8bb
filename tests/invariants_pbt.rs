use neocortex::connection::PredictiveSet;
use neocortex::prelude::*;
use proptest::prelude::*;

prop_compose! {
    fn arb_stdp_config()(
        min in -50i32..=0,
        max in 1i32..50,
        increment in 1i32..15,
        decrement in 0i32..5,
    )(
        threshold in 0..=max,
        min in Just(min),
        max in Just(max),
        increment in Just(increment),
        decrement in Just(decrement),
    ) -> BrainConfig {
        BrainConfig {
            min_connection_strength: min,
            max_connection_strength: max,
            predictive_connection_threshold: threshold,
            stdp_increment: increment,
            stdp_decrement: decrement,
            ..BrainConfig::default()
        }
    }
}

prop_compose! {
    fn arb_frames(width: usize, max_len: usize)(
        cells in prop::collection::vec(
            prop::collection::vec(any::<bool>(), width * width),
            1..max_len,
        )
    ) -> Vec<Frame> {
        cells
            .into_iter()
            .map(|c| {
                let rows: Vec<Vec<u8>> = c.chunks(width).map(|r| r.iter().map(|&b| b as u8).collect()).collect();
                Frame::from_rows(&rows).unwrap()
            })
            .collect()
    }
}

const KINDS: [ConnectionKind; 3] = [
    ConnectionKind::Sibling,
    ConnectionKind::Child,
    ConnectionKind::Parent,
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn last_on_counts_ticks_since_firing(
        max_history in 1u8..8,
        states in prop::collection::vec(any::<bool>(), 1..40),
    ) {
        let mut n = Neuron::new(NeuronId::new(0, 0, 0), max_history, 0);
        // Ticks since the most recent firing among already-replaced states.
        let mut since: Option<usize> = None;
        for &state in &states {
            let was_on = n.is_on();
            n.set(state);
            since = if was_on { Some(1) } else { since.map(|s| s + 1) };

            prop_assert!(n.last_on() <= max_history);
            let expected = match since {
                Some(s) if s <= max_history as usize => s as u8,
                _ => 0,
            };
            prop_assert_eq!(n.last_on(), expected);
            prop_assert_eq!(n.is_on(), state);
        }
    }

    #[test]
    fn stdp_keeps_strength_bounded_and_set_consistent(
        cfg in arb_stdp_config(),
        delay in 1u8..=5,
        timings in prop::collection::vec(0u8..=6, 1..60),
    ) {
        let mut c = Connection::new(NeuronId::new(0, 1, 0));
        let mut set = PredictiveSet::new();
        for &last_on in &timings {
            let before = c.strength();
            let t = c.adjust_strength(7, delay, last_on, &mut set, &cfg);

            prop_assert!(c.strength() >= cfg.min_connection_strength);
            prop_assert!(c.strength() <= cfg.max_connection_strength);
            let member = c.strength() >= cfg.predictive_connection_threshold;
            prop_assert_eq!(set.contains(&7), member);
            prop_assert!(set.len() <= 1);

            if last_on == delay {
                prop_assert!(c.strength() >= before.min(cfg.max_connection_strength));
            } else {
                prop_assert!(c.strength() <= before.max(cfg.min_connection_strength));
            }
            if t == Transition::Entered {
                prop_assert!(member);
            }
            if t == Transition::Left {
                prop_assert!(!member);
            }
        }
    }

    #[test]
    fn siblings_stay_local_and_exclude_self(
        width in 1usize..10,
        distance in 0usize..5,
    ) {
        let cfg = BrainConfig::with_size(1, width * width).with_locality(distance, 2, 2);
        let brain = Brain::new(cfg).unwrap();
        for n in brain.layers()[0].neurons() {
            let id = n.id();
            let siblings = n.group(ConnectionKind::Sibling).targets();
            for t in siblings {
                prop_assert!(*t != id);
                prop_assert_eq!(t.layer(), 0);
                prop_assert!(id.grid_distance(t) <= distance);
            }
            let span = |c: usize| (c + distance).min(width - 1) - c.saturating_sub(distance) + 1;
            prop_assert_eq!(siblings.len(), span(id.x()) * span(id.y()) - 1);
        }
    }

    #[test]
    fn perceiving_never_grows_the_graph(frames in arb_frames(8, 24), learn in any::<bool>()) {
        let cfg = BrainConfig::with_size(2, 64).with_predictive_threshold(5).with_seed(11);
        let max_history = cfg.max_history;
        let mut brain = Brain::new(cfg).unwrap();
        let before = brain.diagnostics();

        for frame in &frames {
            brain.perceive(frame, learn).unwrap();
            brain.predict();
        }

        let after = brain.diagnostics();
        prop_assert_eq!(after.edge_count, before.edge_count);
        prop_assert_eq!(after.connection_count, before.connection_count);
        prop_assert!(after.predictive_connection_count <= after.connection_count);
        prop_assert_eq!(after.tick, frames.len() as u64);

        let threshold = brain.config().predictive_connection_threshold;
        for layer in brain.layers() {
            for n in layer.neurons() {
                prop_assert!(n.last_on() <= max_history);
                for kind in KINDS {
                    let group = n.group(kind);
                    for delay in 1..=max_history {
                        for edge in 0..group.edge_count() {
                            let c = group.connection(delay, edge).unwrap();
                            prop_assert_eq!(group.is_predictive(delay, edge), c.strength() >= threshold);
                        }
                    }
                }
            }
        }
    }
}
