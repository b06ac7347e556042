use chrono::NaiveDate;

/// Placeholder shown wherever a value is absent.
pub const UNKNOWN: &str = "Unknown";

fn group_thousands(digits: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    let sign = if val < 0.0 { "-" } else { "" };
    format!("{sign}${}.{dec_part}", group_thousands(int_part))
}

pub fn count(val: u64) -> String {
    group_thousands(&val.to_string())
}

pub fn date_or_unknown(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn or_unknown(val: Option<&str>) -> &str {
    val.unwrap_or(UNKNOWN)
}
