/// X (seconds) and Y (WPM) bounds for the results chart.
///
/// With no samples the x axis spans the session's elapsed time instead.
pub fn compute_chart_params(points: &[(f64, f64)], elapsed_secs: f64) -> (f64, f64) {
    let highest_wpm = points
        .iter()
        .map(|&(_, wpm)| wpm)
        .fold(0.0_f64, f64::max);

    let overall_duration = points
        .last()
        .map_or(elapsed_secs, |&(t, _)| t)
        .max(1.0);

    (overall_duration, highest_wpm.round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
