/// Percentage saved against the list price, rounded to the nearest whole percent.
///
/// Returns 0 when there is no list price or it does not exceed the selling price.
pub fn discount_percentage(price_cents: i64, mrp_cents: Option<i64>) -> u8 {
    match mrp_cents {
        Some(mrp) if mrp > price_cents && mrp > 0 => {
            let saved = (mrp - price_cents) as f64 / mrp as f64 * 100.0;
            saved.round().clamp(0.0, 100.0) as u8
        }
        _ => 0,
    }
}

/// `percent` of `amount_cents`, rounded half-up to the cent
pub fn percent_of(amount_cents: i64, percent: f64) -> i64 {
    if amount_cents <= 0 || percent <= 0.0 {
        return 0;
    }
    // Work in hundredths of a cent so 0.5 cent boundaries round predictably
    let scaled = (amount_cents as f64 * percent).round() as i64;
    let whole = scaled / 100;
    let remainder = scaled % 100;
    if remainder >= 50 {
        whole + 1
    } else {
        whole
    }
}

/// Render cents as a dollar amount, e.g. `1299` -> `$12.99`
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_percentage() {
        assert_eq!(discount_percentage(1500, Some(2000)), 25);
        assert_eq!(discount_percentage(1999, Some(2999)), 33);
        assert_eq!(discount_percentage(1500, None), 0);
        assert_eq!(discount_percentage(2500, Some(2000)), 0);
    }

    #[test]
    fn test_percent_of_rounds_half_up() {
        // 8% of $12.50 = 100 cents exactly
        assert_eq!(percent_of(1250, 8.0), 100);
        // 8% of $0.06 = 0.48 cents
        assert_eq!(percent_of(6, 8.0), 0);
        // 10% of $0.05 = 0.5 cents
        assert_eq!(percent_of(5, 10.0), 1);
        assert_eq!(percent_of(-100, 10.0), 0);
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(1299), "$12.99");
        assert_eq!(format_cents(5), "$0.05");
        assert_eq!(format_cents(-250), "-$2.50");
    }
}
