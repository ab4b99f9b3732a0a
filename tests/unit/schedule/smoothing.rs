use super::*;

fn smoother(strength: f64, threshold: f64) -> FrameSmoother {
    FrameSmoother::new(strength, threshold).unwrap()
}

#[test]
fn rejects_out_of_range_parameters() {
    assert!(FrameSmoother::new(0.5, 1.0).is_err());
    assert!(FrameSmoother::new(f64::INFINITY, 1.0).is_err());
    assert!(FrameSmoother::new(20.0, 0.0).is_err());
    assert!(FrameSmoother::new(20.0, f64::NAN).is_err());
    let s = FrameSmoother::from_config(&SchedulerConfig::default()).unwrap();
    assert_eq!(s.filter_strength(), 20.0);
    assert_eq!(s.threshold_ms(), 1.0);
}

#[test]
fn converges_toward_the_true_mean_interval() {
    // Threshold out of reach so the estimate is never reset.
    let mut s = smoother(20.0, 1e12);
    let pattern = [15.0, 17.0, 16.0, 18.0, 14.0];
    let mean = pattern.iter().sum::<f64>() / pattern.len() as f64;

    let mut prev_err = f64::INFINITY;
    for round in 0..60 {
        for &dt in &pattern {
            assert!(!s.observe(dt));
        }
        let err = (s.frame_time_ms() - mean).abs();
        if round > 0 && round % 10 == 0 {
            assert!(err <= prev_err + 1e-9, "round {round}: {err} > {prev_err}");
            prev_err = err;
        }
    }
    assert!((s.frame_time_ms() - mean).abs() < 1.0);
}

#[test]
fn ema_step_matches_closed_form() {
    let mut s = smoother(20.0, 1e12);
    let dt = 16.0;
    for n in 1..=50 {
        s.observe(dt);
        let expected = dt * (1.0 - (19.0f64 / 20.0).powi(n));
        assert!((s.frame_time_ms() - expected).abs() < 1e-9);
    }
}

#[test]
fn steady_sixty_hz_draws_every_second_tick_with_default_threshold() {
    let mut s = smoother(20.0, 1.0);
    // 16/20 = 0.8 does not cross; 0.8 + (16 - 0.8)/20 = 1.56 does.
    assert!(!s.observe(16.0));
    assert!((s.frame_time_ms() - 0.8).abs() < 1e-12);
    assert!(s.observe(16.0));
    assert_eq!(s.frame_time_ms(), 0.0);
    assert!(!s.observe(16.0));
    assert!(s.observe(16.0));
}

#[test]
fn never_draws_before_crossing_and_resets_after() {
    let mut s = smoother(20.0, 5.0);
    let mut fired = 0;
    for _ in 0..500 {
        let before = s.frame_time_ms();
        let draw = s.observe(16.0);
        if draw {
            fired += 1;
            assert_eq!(s.frame_time_ms(), 0.0);
            assert!(before + (16.0 - before) / 20.0 > 5.0);
        } else {
            assert!(s.frame_time_ms() <= 5.0);
        }
    }
    assert!(fired > 0);
}

#[test]
fn short_burst_stays_below_a_one_second_threshold() {
    let mut s = smoother(20.0, 1000.0);
    let mut prev = s.frame_time_ms();
    for dt in [16.0, 16.0, 16.0, 17.0, 16.0] {
        assert!(!s.observe(dt));
        assert!(s.frame_time_ms() > prev);
        prev = s.frame_time_ms();
    }
    assert!(prev < 1000.0);
}

#[test]
fn negative_and_non_finite_intervals_count_as_zero() {
    let mut s = smoother(4.0, 1e12);
    s.observe(8.0);
    assert_eq!(s.frame_time_ms(), 2.0);
    s.observe(-100.0);
    assert_eq!(s.frame_time_ms(), 1.5);
    s.observe(f64::NAN);
    assert_eq!(s.frame_time_ms(), 1.125);
    s.reset();
    assert_eq!(s.frame_time_ms(), 0.0);
}
