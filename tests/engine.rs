mod tests {
    use embassy_time::{Duration, Instant};
    use myrtio_segment_controller::engine::{
        DEFAULT_UPDATE_RATE_HZ, EngineError, REGISTRY_CAPACITY, TransitionEngine,
        TransitionStore,
    };
    use myrtio_segment_controller::transition::Transition;

    #[test]
    fn test_init_is_idempotent() {
        let mut engine = TransitionEngine::<usize>::new();
        assert!(!engine.is_initialized());

        let period = engine.init(200);
        assert_eq!(period, Duration::from_millis(5));
        assert!(engine.is_initialized());

        assert_eq!(engine.init(50), period);
        assert_eq!(engine.period(), period);
    }

    #[test]
    fn test_init_zero_uses_default_rate() {
        let mut engine = TransitionEngine::<usize>::new();
        let period = engine.init(0);
        assert_eq!(
            period,
            Duration::from_micros(1_000_000 / u64::from(DEFAULT_UPDATE_RATE_HZ))
        );
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut engine = TransitionEngine::<usize>::new();
        engine.register(3).unwrap();
        engine.register(3).unwrap();
        assert_eq!(engine.len(), 1);
        assert!(engine.is_registered(3));
        assert!(!engine.is_registered(4));
    }

    #[test]
    fn test_registry_capacity() {
        let mut engine = TransitionEngine::<usize>::new();
        for id in 0..REGISTRY_CAPACITY {
            engine.register(id).unwrap();
        }
        assert_eq!(engine.register(REGISTRY_CAPACITY), Err(EngineError::RegistryFull));
        assert_eq!(engine.len(), REGISTRY_CAPACITY);

        // Existing entries are untouched and re-registering still succeeds
        assert_eq!(engine.register(0), Ok(()));
        let expected: Vec<usize> = (0..REGISTRY_CAPACITY).collect();
        assert_eq!(engine.handles(), expected.as_slice());
    }

    #[test]
    fn test_tick_advances_registered_active_transitions_only() {
        let mut transitions = [Transition::new(0); 3];
        let mut engine = TransitionEngine::<usize, 4>::new();
        engine.register(0).unwrap();
        engine.register(1).unwrap();

        let start = Instant::from_millis(0);
        transitions.start_transition(0, 100, Duration::from_millis(100), start);
        transitions.start_transition(2, 100, Duration::from_millis(100), start);

        let advanced = engine.tick(&mut transitions, Instant::from_millis(50));
        assert_eq!(advanced, 1);
        assert_eq!(transitions.transition_value(0), 50);
        assert_eq!(transitions.transition_value(1), 0);
        // Not registered: never animates
        assert_eq!(transitions.transition_value(2), 0);
        assert!(transitions.is_transition_active(2));

        engine.tick(&mut transitions, Instant::from_millis(100));
        assert_eq!(transitions.transition_value(0), 100);
        assert!(!transitions.is_transition_active(0));
        assert_eq!(engine.tick(&mut transitions, Instant::from_millis(150)), 0);
    }

    #[test]
    fn test_unregistered_transition_still_snaps() {
        let mut transitions = [Transition::new(0); 1];
        transitions.start_transition(0, 90, Duration::from_ticks(0), Instant::from_millis(0));
        assert_eq!(transitions.transition_value(0), 90);
    }

    #[test]
    fn test_unknown_handles_are_noops() {
        let mut transitions = [Transition::new(7); 2];
        let mut engine = TransitionEngine::<usize, 4>::new();
        engine.register(9).unwrap();

        transitions.start_transition(9, 100, Duration::from_millis(10), Instant::from_millis(0));
        transitions.cancel_transition(9);
        assert_eq!(transitions.transition_value(9), 0);
        assert!(!transitions.is_transition_active(9));
        assert_eq!(engine.tick(&mut transitions, Instant::from_millis(5)), 0);
    }

    #[test]
    fn test_cancel_through_store() {
        let mut transitions = [Transition::new(0); 1];
        let mut engine = TransitionEngine::<usize, 1>::new();
        engine.register(0).unwrap();

        transitions.start_transition(0, 200, Duration::from_millis(100), Instant::from_millis(0));
        engine.tick(&mut transitions, Instant::from_millis(25));
        transitions.cancel_transition(0);
        engine.tick(&mut transitions, Instant::from_millis(75));
        assert_eq!(transitions.transition_value(0), 50);
    }
}
