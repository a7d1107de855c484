//! Amounts travel as integer cents inside the service and as decimal
//! currency units at the edges (checkout bodies, AI drafts, emails).

/// Decimal currency units to cents, rounded half away from zero.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// `10800` -> `"108.00"`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_decimal_amounts() {
        assert_eq!(to_cents(108.0), 10_800);
        assert_eq!(to_cents(19.99), 1_999);
    }

    #[test]
    fn formats_with_two_decimals() {
        assert_eq!(format_cents(10_800), "108.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-1_250), "-12.50");
    }
}
