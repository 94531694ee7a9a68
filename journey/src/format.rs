/// Formats seconds for the elapsed/total clock: `M:SS` under an hour, `H:MM:SS` otherwise.
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// "elapsed / total", like under a video player
pub fn format_progress(elapsed: f64, total: f64) -> String {
    format!("{} / {}", format_clock(elapsed), format_clock(total))
}
