//! Display helpers.

/// Format an amount with two decimals and thousands separators.
///
/// Non-finite values render as `"0.00"`.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "0.00".to_string();
    }

    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = amount < 0.0 && fixed != "0.00";
    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "0.00");
        assert_eq!(format_currency(5.0), "5.00");
        assert_eq!(format_currency(999.999), "1,000.00");
        assert_eq!(format_currency(1234.5), "1,234.50");
        assert_eq!(format_currency(1234567.891), "1,234,567.89");
        assert_eq!(format_currency(-42.1), "-42.10");
        assert_eq!(format_currency(-0.001), "0.00");
        assert_eq!(format_currency(f64::NAN), "0.00");
        assert_eq!(format_currency(f64::INFINITY), "0.00");
    }
}
