//! Display helpers for money amounts.

/// Weekly cost of one engineer, in currency-agnostic units.
pub const WEEKLY_ENGINEER_COST: u64 = 5_000;

/// `$x.xxB`, `$x.xxM`, `$x.xxK` or `$x.xx`.
pub fn format_tvl(tvl: f64) -> String {
    if tvl >= 1_000_000_000.0 {
        format!("${:.2}B", tvl / 1_000_000_000.0)
    } else if tvl >= 1_000_000.0 {
        format!("${:.2}M", tvl / 1_000_000.0)
    } else if tvl >= 1_000.0 {
        format!("${:.2}K", tvl / 1_000.0)
    } else {
        format!("${:.2}", tvl)
    }
}

/// An amount rendered in whole thousands: `$85K`. Halves round up.
pub fn thousands(amount: u64) -> String {
    format!("${}K", (amount as f64 / 1_000.0).round() as u64)
}

/// Thousands-separated integer: `85,000`.
pub fn group_digits(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Cost of `engineers` working `weeks`, with its derivation:
/// `$30K (2 eng × 3 weeks)`.
pub fn estimated_cost(weeks: u32, engineers: u32) -> String {
    let total = weeks as u64 * engineers as u64 * WEEKLY_ENGINEER_COST;
    format!("{} ({} eng × {} weeks)", thousands(total), engineers, weeks)
}
