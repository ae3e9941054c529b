use chrono::NaiveDate;

/// Placeholder shown for missing values
pub const EMPTY_CELL: &str = "-";

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Left-align `s` in a column of `width` characters, truncating if needed
pub fn pad(s: &str, width: usize) -> String {
    let cell = truncate_string(s, width);
    let len = cell.chars().count();
    format!("{}{}", cell, " ".repeat(width.saturating_sub(len)))
}

/// Format an optional string, returning a default if None or empty
pub fn format_optional(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => EMPTY_CELL.to_string(),
    }
}

/// Format a date as e.g. `Mar 01, 2024`
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%b %d, %Y").to_string(),
        None => EMPTY_CELL.to_string(),
    }
}

/// Format an amount with thousands separators and two decimals
pub fn format_money(amount: Option<f64>) -> String {
    let Some(amount) = amount else {
        return EMPTY_CELL.to_string();
    };
    let formatted = format!("{:.2}", amount.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, cents)
}
