//! Human-readable sizes
//!
//! Decimal units (base 1000, not 1024), the way file managers report them.

/// Base for each unit step
const K: u64 = 1000;

/// Unit labels, smallest first
const UNITS: [&str; 6] = ["Bytes", "KB", "MB", "GB", "TB", "PB"];

/// Format a byte count such as `1500` as `"1.5 KB"`.
///
/// The value is rounded to `decimals` places and trailing zeros are dropped.
/// Counts past the largest unit stay in PB (`10^18` is `"1000 PB"`).
pub fn format_file_size(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut index = 0;
    let mut divisor = 1u64;
    while index < UNITS.len() - 1 && bytes / divisor >= K {
        divisor *= K;
        index += 1;
    }

    let value = bytes as f64 / divisor as f64;
    format!("{} {}", trim_fraction(format!("{:.*}", decimals, value)), UNITS[index])
}

/// `format_file_size` with two decimals
pub fn format_file_size_default(bytes: u64) -> String {
    format_file_size(bytes, 2)
}

/// "1.50" -> "1.5", "5.00" -> "5"
fn trim_fraction(mut formatted: String) -> String {
    if formatted.contains('.') {
        let trimmed_len = formatted.trim_end_matches('0').trim_end_matches('.').len();
        formatted.truncate(trimmed_len);
    }
    formatted
}
