/// Integer percentage of `part` in `whole`, rounded half-up. Defined as 0 when
/// `whole` is 0 so empty collections never divide by zero.
pub fn ratio_percent(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.).round() as u8
}

/// Percentage of `value` towards a fixed goal, clamped to 100. Used for the
/// focus-time progress bars where overshooting the goal still reads as "done".
pub fn goal_percent(value: f64, goal: f64) -> u8 {
    if goal <= 0. {
        return 0;
    }
    ((value / goal * 100.).round() as i64).clamp(0, 100) as u8
}
