use serde::Serialize;

/// Standard typing-test convention: five characters make one word.
pub const CHARS_PER_WORD: u64 = 5;

/// Point-in-time speed/accuracy readout. Always replaced, never patched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub words_per_minute: u32,
    pub accuracy_percent: u8,
    pub error_count: usize,
}

impl MetricsSnapshot {
    /// Metrics of a session nobody has typed into yet.
    pub fn initial() -> Self {
        Self {
            words_per_minute: 0,
            accuracy_percent: 100,
            error_count: 0,
        }
    }

    pub fn calculate(typed_len: usize, correct_count: usize, elapsed_secs: f64) -> Self {
        Self {
            words_per_minute: words_per_minute(typed_len, elapsed_secs),
            accuracy_percent: accuracy_percent(typed_len, correct_count),
            error_count: error_count(typed_len, correct_count),
        }
    }
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

/// `round(100 * correct / typed)`, or 100 when nothing has been typed.
pub fn accuracy_percent(typed_len: usize, correct_count: usize) -> u8 {
    if typed_len == 0 {
        return 100;
    }
    let typed = typed_len as u64;
    let correct = (correct_count as u64).min(typed);
    // round-half-up of 100c/t in integers: floor((200c + t) / 2t)
    ((200 * correct + typed) / (2 * typed)) as u8
}

pub fn error_count(typed_len: usize, correct_count: usize) -> usize {
    typed_len.saturating_sub(correct_count)
}

/// `round((typed / 5) / (elapsed / 60))`, 0 until any time has passed.
pub fn words_per_minute(typed_len: usize, elapsed_secs: f64) -> u32 {
    if !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
        return 0;
    }
    // (t / 5) / (s / 60) == 12t / s, which keeps whole-second cases exact
    let per_minute = 60.0 / CHARS_PER_WORD as f64;
    round_half_up(per_minute * typed_len as f64 / elapsed_secs) as u32
}

/// Raw (unrounded) wpm, used for the results chart.
pub fn raw_words_per_minute(typed_len: usize, elapsed_secs: f64) -> f64 {
    if !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
        return 0.0;
    }
    typed_len as f64 * 60.0 / (CHARS_PER_WORD as f64 * elapsed_secs)
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
