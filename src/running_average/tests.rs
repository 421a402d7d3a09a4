use super::RunningAverage;

#[test]
fn test_empty_average_is_none() {
    let avg: RunningAverage<f32, 4> = RunningAverage::new();
    assert_eq!(avg.average(), None);
    assert!(avg.is_empty());
}

#[test]
fn test_partial_fill_averages_held_samples() {
    let mut avg: RunningAverage<f32, 4> = RunningAverage::new();
    avg.add_value(1.0);
    avg.add_value(2.0);
    assert_eq!(avg.average(), Some(1.5));
    assert_eq!(avg.len(), 2);
}

#[test]
fn test_overflow_keeps_only_last_n() {
    let mut avg: RunningAverage<f32, 4> = RunningAverage::new();
    // N + 3 pushes: 1..=7, window should hold 4,5,6,7
    for v in 1..=7 {
        avg.add_value(v as f32);
    }
    assert!(avg.is_full());
    assert_eq!(avg.average(), Some(5.5));
    assert_eq!(avg.latest(), Some(7.0));
}

#[test]
fn test_clear_returns_to_no_data() {
    let mut avg: RunningAverage<f32, 4> = RunningAverage::new();
    avg.add_value(10.0);
    avg.clear();
    assert_eq!(avg.average(), None);
    avg.clear();
    assert_eq!(avg.average(), None);

    avg.add_value(3.0);
    assert_eq!(avg.average(), Some(3.0));
}

#[test]
fn test_zero_samples_are_real_data() {
    let mut avg: RunningAverage<f32, 4> = RunningAverage::new();
    avg.add_value(0.0);
    assert_eq!(avg.average(), Some(0.0));
}

#[test]
fn test_integer_average_truncates() {
    let mut avg: RunningAverage<u16, 10> = RunningAverage::new();
    avg.add_value(1429);
    avg.add_value(1430);
    // 1429.5 truncates
    assert_eq!(avg.average(), Some(1429));

    let mut neg: RunningAverage<i32, 2> = RunningAverage::new();
    neg.add_value(-3);
    neg.add_value(-4);
    assert_eq!(neg.average(), Some(-3));
}

#[test]
fn test_capacity_one_tracks_latest() {
    let mut avg: RunningAverage<f64, 1> = RunningAverage::new();
    avg.add_value(1.0);
    avg.add_value(9.0);
    assert_eq!(avg.average(), Some(9.0));
    assert_eq!(avg.capacity(), 1);
}
