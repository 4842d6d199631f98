//! Per-request context passed into every core operation.

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};

use crate::domain::Domain;

/// Who the request is for, which domain conversation it belongs to, and the
/// instant it is evaluated at.
///
/// Every window ("today", "last 24 hours", "last 14 days") is measured from
/// `now`, so a context built with [`RequestContext::at`] makes every operation
/// deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: i64,
    pub domain: Option<Domain>,
    pub now: DateTime<Utc>,
}

impl RequestContext {
    /// Context for `user_id` evaluated at the current wall-clock time.
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            domain: None,
            now: Utc::now(),
        }
    }

    /// Scope the request to a domain conversation.
    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Evaluate the request at a fixed instant.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// First date of a `days`-day window ending today. Windows that reach past
    /// [`HISTORY_START`] cover the whole history.
    pub fn days_back(&self, days: u32) -> NaiveDate {
        let floor = HISTORY_START.date_naive();
        self.today()
            .checked_sub_days(Days::new(u64::from(days)))
            .map_or(floor, |date| date.max(floor))
    }

    /// Start of the trailing `window`. A negative window is empty.
    pub fn since(&self, window: Duration) -> DateTime<Utc> {
        if window <= Duration::zero() {
            return self.now;
        }
        self.now
            .checked_sub_signed(window)
            .map_or(HISTORY_START, |start| start.max(HISTORY_START))
    }
}

/// Earliest instant any window reaches back to.
pub const HISTORY_START: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// `hours` as a window length, saturating instead of overflowing.
pub fn hours_window(hours: i64) -> Duration {
    match Duration::try_hours(hours) {
        Some(window) => window,
        None if hours < 0 => Duration::zero(),
        None => Duration::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn builder_sets_fields() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap();
        let ctx = RequestContext::new(7).with_domain(Domain::Health).at(now);
        assert_eq!(ctx.user_id, 7);
        assert_eq!(ctx.domain, Some(Domain::Health));
        assert_eq!(ctx.today(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn windows_saturate_at_history_start() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap();
        let ctx = RequestContext::new(1).at(now);

        assert_eq!(ctx.days_back(9), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(ctx.days_back(u32::MAX), HISTORY_START.date_naive());

        assert_eq!(ctx.since(Duration::hours(3)), now - Duration::hours(3));
        assert_eq!(ctx.since(hours_window(9_000_000_000)), HISTORY_START);
        assert_eq!(ctx.since(hours_window(i64::MAX)), HISTORY_START);
        assert_eq!(ctx.since(Duration::hours(-5)), now);
        assert_eq!(hours_window(i64::MIN), Duration::zero());
    }
}
