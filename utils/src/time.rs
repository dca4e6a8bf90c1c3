//! Duration formatting for operator output.

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Render seconds as the two most significant non-zero units, e.g.
/// `"6d 23h"` or `"5m 12s"`. Zero renders as `"0s"`.
pub fn format_duration(secs: u64) -> String {
    let mut remaining = secs;
    let parts: Vec<String> = UNITS
        .iter()
        .filter_map(|&(size, suffix)| {
            let count = remaining / size;
            remaining %= size;
            (count > 0).then(|| format!("{count}{suffix}"))
        })
        .take(2)
        .collect();
    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}
