mod tests {
    use embassy_time::{Duration, Instant};
    use myrtio_segment_controller::transition::Transition;

    const MS_100: Duration = Duration::from_millis(100);

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn test_linear_increase() {
        let mut transition = Transition::new(0);
        transition.start(100, MS_100, at(0));
        assert!(transition.is_active());
        assert_eq!(transition.value(), 0);

        transition.tick(at(50));
        assert_eq!(transition.value(), 50);

        transition.tick(at(100));
        assert_eq!(transition.value(), 100);
        assert!(!transition.is_active());
    }

    #[test]
    fn test_linear_decrease() {
        let mut transition = Transition::new(254);
        transition.start(0, Duration::from_millis(200), at(1_000));

        transition.tick(at(1_100));
        assert_eq!(transition.value(), 127);

        transition.tick(at(1_150));
        assert!(transition.value() < 127);
        assert!(transition.value() > 0);
    }

    #[test]
    fn test_midpoint_is_exact_within_one() {
        let mut transition = Transition::new(1_000);
        transition.start(60_000, Duration::from_secs(30), at(0));
        transition.tick(at(15_000));
        assert!(transition.value().abs_diff(30_500) <= 1);
    }

    #[test]
    fn test_full_range_long_duration_does_not_overflow() {
        let mut transition = Transition::new(0);
        transition.start(u16::MAX, Duration::from_secs(60), at(0));
        transition.tick(at(59_999));
        assert!(transition.value() > 65_000);
        assert!(transition.is_active());
    }

    #[test]
    fn test_zero_duration_snaps() {
        let mut transition = Transition::new(10);
        transition.start(200, MS_100, at(0));
        transition.tick(at(50));

        transition.start(42, Duration::from_ticks(0), at(60));
        assert_eq!(transition.value(), 42);
        assert_eq!(transition.target(), 42);
        assert!(!transition.is_active());

        transition.tick(at(500));
        assert_eq!(transition.value(), 42);
    }

    #[test]
    fn test_interruption_continues_from_current_value() {
        let mut transition = Transition::new(0);
        transition.start(200, MS_100, at(0));
        transition.tick(at(25));
        let before = transition.value();
        assert_eq!(before, 50);

        transition.start(0, MS_100, at(25));
        assert_eq!(transition.value(), before);

        let mut last = before;
        for ms in [35, 50, 75, 100, 125] {
            transition.tick(at(ms));
            assert!(transition.value() <= last);
            last = transition.value();
        }
        assert_eq!(transition.value(), 0);
        assert!(!transition.is_active());
    }

    #[test]
    fn test_completion_is_pinned() {
        let mut transition = Transition::new(5);
        transition.start(80, MS_100, at(0));
        transition.tick(at(150));
        for ms in [150, 200, 10_000] {
            transition.tick(at(ms));
            assert_eq!(transition.value(), 80);
            assert!(!transition.is_active());
        }
    }

    #[test]
    fn test_cancel_freezes_in_place() {
        let mut transition = Transition::new(0);
        transition.start(100, MS_100, at(0));
        transition.tick(at(30));
        assert_eq!(transition.value(), 30);

        transition.cancel();
        assert!(!transition.is_active());
        assert_eq!(transition.value(), 30);
        assert_eq!(transition.target(), 30);

        transition.tick(at(100));
        assert_eq!(transition.value(), 30);
    }

    #[test]
    fn test_clock_before_start_counts_as_zero_elapsed() {
        let mut transition = Transition::new(10);
        transition.start(110, MS_100, at(1_000));
        transition.tick(at(900));
        assert_eq!(transition.value(), 10);
        assert!(transition.is_active());
    }

    #[test]
    fn test_set_instant_overrides_running_transition() {
        let mut transition = Transition::new(0);
        transition.start(100, MS_100, at(0));
        transition.set_instant(77);
        assert_eq!(transition.value(), 77);
        assert!(!transition.is_active());
    }

    #[test]
    fn test_clock_stepping_back_holds_value() {
        let mut transition = Transition::new(0);
        transition.start(1_000, MS_100, at(0));
        transition.tick(at(60));
        assert_eq!(transition.value(), 600);

        transition.tick(at(40));
        assert_eq!(transition.value(), 600);
        assert!(transition.is_active());

        transition.tick(at(80));
        assert_eq!(transition.value(), 800);
    }

    #[test]
    fn test_restart_resets_elapsed_time() {
        let mut transition = Transition::new(0);
        transition.start(100, MS_100, at(0));
        transition.tick(at(90));
        transition.start(0, MS_100, at(50));
        transition.tick(at(100));
        assert_eq!(transition.value(), 45);
    }
}
