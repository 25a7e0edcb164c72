use crate::metrics::raw_words_per_minute;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.wpm)
    }
}

/// Speed over time, sampled once per whole elapsed second.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WpmSeries {
    points: Vec<TimeSeriesPoint>,
    last_second: u64,
}

impl WpmSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample if the clock crossed into a new whole second.
    pub fn observe(&mut self, elapsed_secs: f64, typed_len: usize) {
        let whole = elapsed_secs.floor();
        if whole < 1.0 || (whole as u64) <= self.last_second {
            return;
        }
        self.last_second = whole as u64;
        self.points.push(TimeSeriesPoint::new(
            whole,
            raw_words_per_minute(typed_len, elapsed_secs),
        ));
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Standard deviation of the sampled speeds; lower is steadier.
    /// Zero with fewer than two samples.
    pub fn consistency(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        let speeds: Vec<f64> = self.points.iter().map(|p| p.wpm).collect();
        std_dev(&speeds).unwrap_or(0.0)
    }
}

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let avg = mean(data)?;
    let variance = data.iter().map(|v| (avg - v).powi(2)).sum::<f64>() / data.len() as f64;
    Some(variance.sqrt())
}
