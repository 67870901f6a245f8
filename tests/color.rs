mod tests {
    use embassy_time::{Duration, Instant};
    use myrtio_segment_controller::color::{
        Rgb, Rgbw, degrees_to_enhanced_hue, enhanced_hue_to_degrees, hsv_to_rgb,
        normalize_hue, rgb_to_xy, shortest_arc, start_hue_transition, xy_to_rgb,
    };
    use myrtio_segment_controller::transition::Transition;

    fn rgb(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(0, 254, 255), rgb(255, 0, 0));
        assert_eq!(hsv_to_rgb(60, 254, 255), rgb(255, 255, 0));
        assert_eq!(hsv_to_rgb(120, 254, 255), rgb(0, 255, 0));
        assert_eq!(hsv_to_rgb(240, 254, 255), rgb(0, 0, 255));
        assert_eq!(hsv_to_rgb(30, 254, 255), rgb(255, 127, 0));
    }

    #[test]
    fn test_hsv_grey_and_black() {
        assert_eq!(hsv_to_rgb(200, 0, 90), rgb(90, 90, 90));
        assert_eq!(hsv_to_rgb(200, 254, 0), rgb(0, 0, 0));
    }

    #[test]
    fn test_hsv_saturation_above_scale_is_clamped() {
        assert_eq!(hsv_to_rgb(120, 255, 200), hsv_to_rgb(120, 254, 200));
    }

    #[test]
    fn test_hsv_wrapped_hue() {
        // 360 is 0 and a wrapped -60 is 300
        assert_eq!(hsv_to_rgb(360, 254, 255), hsv_to_rgb(0, 254, 255));
        assert_eq!(hsv_to_rgb(65_476, 254, 255), hsv_to_rgb(300, 254, 255));
        assert_eq!(hsv_to_rgb(370, 254, 255), hsv_to_rgb(10, 254, 255));
    }

    #[test]
    fn test_normalize_hue() {
        assert_eq!(normalize_hue(0), 0);
        assert_eq!(normalize_hue(359), 359);
        assert_eq!(normalize_hue(360), 0);
        assert_eq!(normalize_hue(370), 10);
        assert_eq!(normalize_hue(65_476), 300);
        assert_eq!(normalize_hue(u16::MAX), 359);
    }

    #[test]
    fn test_shortest_arc() {
        assert_eq!(shortest_arc(350, 10), 370);
        assert_eq!(shortest_arc(10, 350), -10);
        assert_eq!(shortest_arc(10, 100), 100);
        assert_eq!(shortest_arc(100, 10), 10);
        assert_eq!(shortest_arc(0, 180), 180);
    }

    #[test]
    fn test_hue_transition_crosses_zero_forward() {
        let mut transition = Transition::new(350);
        start_hue_transition(
            &mut transition,
            10,
            Duration::from_millis(100),
            Instant::from_millis(0),
        );

        for ms in (0..=100).step_by(10) {
            transition.tick(Instant::from_millis(ms));
            let raw = transition.value();
            assert!((350..=370).contains(&raw), "{raw} left the short arc");
        }
        assert_eq!(normalize_hue(transition.value()), 10);
    }

    #[test]
    fn test_hue_transition_crosses_zero_backward() {
        let mut transition = Transition::new(10);
        start_hue_transition(
            &mut transition,
            350,
            Duration::from_millis(100),
            Instant::from_millis(0),
        );

        for ms in (0..=100).step_by(10) {
            transition.tick(Instant::from_millis(ms));
            let hue = normalize_hue(transition.value());
            assert!(hue <= 10 || hue >= 350, "{hue} left the short arc");
        }
        assert_eq!(normalize_hue(transition.value()), 350);
    }

    #[test]
    fn test_hue_transition_without_wrap() {
        let mut transition = Transition::new(100);
        start_hue_transition(
            &mut transition,
            200,
            Duration::from_millis(100),
            Instant::from_millis(0),
        );
        transition.tick(Instant::from_millis(50));
        assert_eq!(transition.value(), 150);
    }

    #[test]
    fn test_instant_hue_change_settles_in_range() {
        let mut transition = Transition::new(350);
        start_hue_transition(
            &mut transition,
            10,
            Duration::from_ticks(0),
            Instant::from_millis(0),
        );
        assert_eq!(transition.value(), 10);
        assert!(!transition.is_active());

        start_hue_transition(
            &mut transition,
            360,
            Duration::from_ticks(0),
            Instant::from_millis(0),
        );
        assert_eq!(transition.value(), 0);
    }

    #[test]
    fn test_rgb_to_xy_black_is_white_point() {
        assert_eq!(rgb_to_xy(0, 0, 0), (20_493, 21_562));
    }

    #[test]
    fn test_rgb_to_xy_white() {
        let (x, y) = rgb_to_xy(255, 255, 255);
        assert!(x.abs_diff(20_493) < 20);
        assert!(y.abs_diff(21_562) < 20);
    }

    #[test]
    fn test_xy_round_trip() {
        let samples = [
            (255, 0, 0),
            (0, 255, 0),
            (0, 0, 255),
            (255, 255, 255),
            (255, 128, 0),
            (255, 0, 255),
            (60, 255, 200),
            (128, 64, 255),
        ];
        for (r, g, b) in samples {
            let (x, y) = rgb_to_xy(r, g, b);
            let back = xy_to_rgb(x, y, 255);
            assert!(back.r.abs_diff(r) <= 2, "{:?} -> {:?}", (r, g, b), back);
            assert!(back.g.abs_diff(g) <= 2, "{:?} -> {:?}", (r, g, b), back);
            assert!(back.b.abs_diff(b) <= 2, "{:?} -> {:?}", (r, g, b), back);
        }
    }

    #[test]
    fn test_xy_to_rgb_zero_level_is_black() {
        assert_eq!(xy_to_rgb(20_493, 21_562, 0), rgb(0, 0, 0));
    }

    #[test]
    fn test_xy_to_rgb_degenerate_y() {
        // Must not blow up on y == 0
        let color = xy_to_rgb(30_000, 0, 255);
        assert!(color.r == 255 || color.g == 255 || color.b == 255 || color == rgb(0, 0, 0));
    }

    #[test]
    fn test_enhanced_hue_conversion() {
        assert_eq!(enhanced_hue_to_degrees(0), 0);
        assert_eq!(enhanced_hue_to_degrees(u16::MAX), 360);
        assert_eq!(degrees_to_enhanced_hue(180), 32_767);
        assert_eq!(enhanced_hue_to_degrees(degrees_to_enhanced_hue(90)), 89);
    }

    #[test]
    fn test_rgbw_helpers() {
        assert!(Rgbw::OFF.is_off());
        assert_eq!(Rgbw::white(40), Rgbw::new(0, 0, 0, 40));
        assert_eq!(Rgbw::from(rgb(1, 2, 3)), Rgbw::new(1, 2, 3, 0));
        assert_eq!(Rgbw::new(1, 2, 3, 4).rgb(), rgb(1, 2, 3));
    }
}
