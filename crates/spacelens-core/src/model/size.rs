/// Human-readable byte counts.
///
/// All internal sizes are `u64` bytes; floating point appears only at the
/// display-formatting boundary.

/// Format a byte count with an appropriate unit.
///
/// Binary units (1 KB = 1024 B) with the short labels users expect from a
/// disk tool. One decimal for KB/MB, two for GB/TB.
pub fn format_size(bytes: u64) -> String {
    const STEP: f64 = 1024.0;
    let b = bytes as f64;
    if b < STEP {
        return format!("{bytes} B");
    }
    let kb = b / STEP;
    if kb < STEP {
        return format!("{kb:.1} KB");
    }
    let mb = kb / STEP;
    if mb < STEP {
        return format!("{mb:.1} MB");
    }
    let gb = mb / STEP;
    if gb < STEP {
        return format!("{gb:.2} GB");
    }
    format!("{:.2} TB", gb / STEP)
}

/// Format an entry count with thousand separators.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}
