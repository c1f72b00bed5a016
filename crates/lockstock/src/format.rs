//! Display formatting for financial values

use crate::model::NOT_AVAILABLE;

/// Format a currency amount with a T/B/M suffix.
///
/// Missing or zero values become "N/A". Amounts below one million are written
/// out with thousands separators.
pub fn format_large_number(value: Option<f64>) -> String {
    let Some(num) = value.filter(|n| *n != 0.0 && n.is_finite()) else {
        return NOT_AVAILABLE.to_string();
    };

    if num >= 1e12 {
        format!("${:.2}T", num / 1e12)
    } else if num >= 1e9 {
        format!("${:.2}B", num / 1e9)
    } else if num >= 1e6 {
        format!("${:.2}M", num / 1e6)
    } else {
        format!("${}", group_thousands(num))
    }
}

/// Two-decimal ratio, "N/A" when missing or zero
pub fn format_ratio(value: Option<f64>) -> String {
    match value.filter(|n| *n != 0.0 && n.is_finite()) {
        Some(num) => format!("{num:.2}"),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Two-decimal dollar amount, "N/A" when missing or zero
pub fn format_eps(value: Option<f64>) -> String {
    match value.filter(|n| *n != 0.0 && n.is_finite()) {
        Some(num) => format!("${num:.2}"),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn group_thousands(num: f64) -> String {
    let fixed = format!("{:.2}", num.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if num < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_large_number_suffixes() {
        assert_eq!(format_large_number(Some(2_500_000_000.0)), "$2.50B");
        assert_eq!(format_large_number(Some(3_100_000_000_000.0)), "$3.10T");
        assert_eq!(format_large_number(Some(12_340_000.0)), "$12.34M");
        assert_eq!(format_large_number(Some(1_000_000.0)), "$1.00M");
    }

    #[test]
    fn test_format_large_number_small_values() {
        assert_eq!(format_large_number(Some(999_999.0)), "$999,999.00");
        assert_eq!(format_large_number(Some(1234.5)), "$1,234.50");
        assert_eq!(format_large_number(Some(12.0)), "$12.00");
        assert_eq!(format_large_number(Some(-5_000_000_000.0)), "$-5,000,000,000.00");
    }

    #[test]
    fn test_format_missing_values() {
        assert_eq!(format_large_number(None), "N/A");
        assert_eq!(format_large_number(Some(0.0)), "N/A");
        assert_eq!(format_ratio(None), "N/A");
        assert_eq!(format_eps(Some(0.0)), "N/A");
    }

    #[test]
    fn test_format_ratios() {
        assert_eq!(format_ratio(Some(15.666)), "15.67");
        assert_eq!(format_ratio(Some(-3.2)), "-3.20");
        assert_eq!(format_eps(Some(6.4321)), "$6.43");
    }
}
