#[derive(Debug, Clone, Copy)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// argsort returns the indices that would sort an array. The sort is stable, i.e. equal values
/// keep their original relative order. NaN values are ordered using the IEEE 754 total order.
pub fn argsort(x: &[f64], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..x.len()).collect();
    match order {
        SortOrder::Ascending => indices.sort_by(|&a, &b| x[a].total_cmp(&x[b])),
        SortOrder::Descending => indices.sort_by(|&a, &b| x[b].total_cmp(&x[a])),
    }
    indices
}

/// Splits a (non-negative) duration into minutes, seconds and milliseconds. Rounding happens on
/// the millisecond level such that 59.9996s becomes 1:00.000 instead of 0:60.000.
fn split_millis(t: f64) -> (u64, u64, u64) {
    let ms_tot = (t.max(0.0) * 1000.0).round() as u64;
    (ms_tot / 60_000, (ms_tot % 60_000) / 1000, ms_tot % 1000)
}

/// format_lap_time formats a lap time as M:SS.mmm.
pub fn format_lap_time(t: f64) -> String {
    let (min, s, ms) = split_millis(t);
    format!("{}:{:02}.{:03}", min, s, ms)
}

/// format_race_time formats a race time as H:MM:SS.mmm, or M:SS.mmm below one hour.
pub fn format_race_time(t: f64) -> String {
    let (min_tot, s, ms) = split_millis(t);
    let (h, min) = (min_tot / 60, min_tot % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}.{:03}", h, min, s, ms)
    } else {
        format!("{}:{:02}.{:03}", min, s, ms)
    }
}

/// format_gap formats a time gap as seconds (e.g. 12.345s) below one minute and as M:SS.mmm
/// otherwise.
pub fn format_gap(t: f64) -> String {
    let (min, s, ms) = split_millis(t);
    if min == 0 {
        format!("{}.{:03}s", s, ms)
    } else {
        format!("{}:{:02}.{:03}", min, s, ms)
    }
}
