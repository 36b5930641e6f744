use chrono::{DateTime, FixedOffset, Utc};

/// Business timezone for overtime accrual. The branch runs on UTC+3
/// regardless of where the server clock sits; note the day-boundary test in
/// the presence handler uses the naive UTC date instead, which is the
/// historical behavior and is kept as-is.
const BUSINESS_OFFSET_SECS: i32 = 3 * 3600;

/// Overtime starts at 16:00 business time.
const THRESHOLD_HOUR: u32 = 16;

/// Ariary paid per full overtime hour, fractions pro-rata, truncated.
const HOURLY_RATE_AR: i64 = 10_000;

pub fn business_offset() -> FixedOffset {
    FixedOffset::east_opt(BUSINESS_OFFSET_SECS).unwrap()
}

/// Calendar date of `now` in the business timezone, `YYYY-MM-DD`.
pub fn business_date(now: DateTime<Utc>) -> String {
    now.with_timezone(&business_offset())
        .date_naive()
        .format("%Y-%m-%d")
        .to_string()
}

/// Whole minutes worked past today's 16:00 threshold in the business
/// timezone. Never negative.
pub fn overtime_minutes(now: DateTime<Utc>) -> i64 {
    let local = now.with_timezone(&business_offset());
    let threshold = local
        .date_naive()
        .and_hms_opt(THRESHOLD_HOUR, 0, 0)
        .unwrap();
    (local.naive_local() - threshold).num_minutes().max(0)
}

pub fn overtime_amount(minutes: i64) -> i64 {
    minutes * HOURLY_RATE_AR / 60
}

/// Renders minutes as the `{H}H{MM}` form the frontend displays.
pub fn format_hm(minutes: i64) -> String {
    format!("{}H{:02}", minutes / 60, minutes % 60)
}

/// Parses a stored `{H}H{M}` total back to minutes. Malformed totals are
/// treated as zero rather than failing the checkout.
pub fn parse_hm(value: &str) -> i64 {
    let Some((h, m)) = value.split_once(['H', 'h']) else {
        return 0;
    };
    let hours: i64 = h.trim().parse().unwrap_or(0);
    let mins: i64 = m.trim().parse().unwrap_or(0);
    hours * 60 + mins
}
