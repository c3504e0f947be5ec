use config_tree::ConfigValue;
use training::search::eval_points;

#[test]
fn evaluations_are_evenly_spaced() {
    assert_eq!(eval_points(100, 5), vec![0, 25, 50, 75, 100]);
    assert_eq!(eval_points(100, 1), vec![100]);
    assert!(eval_points(100, 0).is_empty());
}

#[test]
fn repeated_points_collapse() {
    assert_eq!(eval_points(2, 5), vec![0, 1, 2]);
    assert_eq!(eval_points(0, 3), vec![0]);
}

#[test]
fn huge_step_counts_do_not_overflow() {
    assert_eq!(ConfigValue::from(u64::MAX), ConfigValue::Int(i64::MAX));
    let total = i64::MAX.unsigned_abs();

    let points = eval_points(total, 5);
    assert_eq!(points.len(), 5);
    assert_eq!(points[0], 0);
    assert_eq!(points[2], total / 2);
    assert_eq!(points[4], total);
    assert!(points.windows(2).all(|w| w[0] < w[1]));

    assert_eq!(eval_points(u64::MAX, 3), vec![0, u64::MAX / 2, u64::MAX]);
}
