//! Elapsed-time accumulator with server clock-skew correction

use chrono::{DateTime, Duration, Utc};
use tracing::error;

/// Running decomposition of an elapsed duration into hours/minutes/seconds.
///
/// The accumulator keeps the decomposition canonical (seconds and minutes
/// stay inside [0, 60) with carries propagating upward) and can translate
/// local wall-clock readings into approximate server time through a cached
/// clock offset, so repeated refreshes never need another round trip.
#[derive(Debug, Clone)]
pub struct TimeAccumulator {
    /// Whole hours, unbounded above
    hours: i64,
    /// Minutes in [0, 60); fractional after a coarse float seed
    minutes: f64,
    /// Seconds in [0, 60), carries sub-second precision
    seconds: f64,
    /// Cached `HH:MM:SS` rendering, refreshed by `format_time`
    time: String,
    /// Total seconds snapshotted at the last `set_timer` seed
    time_elapsed: i64,
    /// Signed server-minus-local gap in seconds, set by `compute_offset`
    server_offset: Option<f64>,
}

impl TimeAccumulator {
    /// Create a new accumulator at zero
    pub fn new() -> Self {
        let mut accumulator = Self {
            hours: 0,
            minutes: 0.0,
            seconds: 0.0,
            time: String::new(),
            time_elapsed: 0,
            server_offset: None,
        };
        accumulator.clear_timer();
        accumulator
    }

    /// Whole hours of the current decomposition
    pub fn hours(&self) -> i64 {
        self.hours
    }

    /// Minutes of the current decomposition
    pub fn minutes(&self) -> f64 {
        self.minutes
    }

    /// Seconds of the current decomposition
    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    /// Cached formatted time string
    pub fn time(&self) -> &str {
        &self.time
    }

    /// Total-seconds baseline captured by the last `set_timer`
    pub fn time_elapsed(&self) -> i64 {
        self.time_elapsed
    }

    /// Cached server clock offset in seconds, if one has been measured
    pub fn server_offset(&self) -> Option<f64> {
        self.server_offset
    }

    /// Inject an offset measured elsewhere (shared coordinator cache)
    pub fn set_server_offset(&mut self, offset: f64) {
        self.server_offset = Some(offset);
    }

    /// Total elapsed seconds represented by the current decomposition
    pub fn to_seconds(&self) -> f64 {
        (self.hours as f64 * 60.0 + self.minutes) * 60.0 + self.seconds
    }

    /// Elapsed time as fractional hours, the persistence representation
    pub fn float_value(&self) -> f64 {
        self.to_seconds() / 3600.0
    }

    /// Add seconds, carrying overflow upward into minutes.
    ///
    /// Negative deltas borrow downward the same way, so the decomposition
    /// stays normalized for any signed input.
    pub fn add_seconds(&mut self, seconds: f64) {
        let total = self.seconds + seconds;
        let carry = (total / 60.0).floor();
        if carry != 0.0 {
            self.add_minutes(carry);
        }
        self.seconds = total - carry * 60.0;
    }

    /// Add minutes, carrying overflow upward into hours
    pub fn add_minutes(&mut self, minutes: f64) {
        let total = self.minutes + minutes;
        let carry = (total / 60.0).floor();
        if carry != 0.0 {
            self.add_hours(carry as i64);
        }
        self.minutes = total - carry * 60.0;
    }

    /// Add whole hours; no upper bound
    pub fn add_hours(&mut self, hours: i64) {
        self.hours += hours;
    }

    /// Coarse seed from a fractional-hour value: truncated whole hours plus
    /// the remainder expressed as (possibly fractional) minutes.
    ///
    /// This is deliberately distinct from the modular-carry mutators above:
    /// the fraction is never decomposed into seconds, so the seeded value
    /// round-trips exactly through `float_value`. A seed of exactly 0 resets
    /// all three fields.
    pub fn add_float_time(&mut self, hours_float: f64) {
        if hours_float == 0.0 {
            self.hours = 0;
            self.minutes = 0.0;
            self.seconds = 0.0;
            return;
        }
        self.hours = hours_float.trunc() as i64;
        self.minutes = hours_float.fract() * 60.0;
    }

    /// Zero the decomposition and drop the cached time string
    pub fn reset_timer(&mut self) {
        self.hours = 0;
        self.minutes = 0.0;
        self.seconds = 0.0;
        self.time.clear();
    }

    /// Reset used at construction and when a timer is discarded
    pub fn clear_timer(&mut self) {
        self.reset_timer();
    }

    /// Recompute the cached `HH:MM:SS` string. Each field is zero-padded to
    /// at least two digits; hours may grow wider and are never truncated.
    pub fn format_time(&mut self) {
        self.time = format!(
            "{:02}:{:02}:{:02}",
            self.hours,
            self.minutes.floor() as i64,
            self.seconds.floor() as i64
        );
    }

    /// Absolute interval between two timestamps, regardless of argument
    /// order. Callers never need to pre-sort.
    pub fn get_interval(a: DateTime<Utc>, b: DateTime<Utc>) -> Duration {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        end - start
    }

    /// Measure and cache the signed gap between the authoritative server
    /// clock and the local clock, in seconds. Returns the measured offset.
    pub fn compute_offset(&mut self, server_time: DateTime<Utc>) -> f64 {
        let gap = server_time - Utc::now();
        let offset = gap.num_milliseconds() as f64 / 1000.0;
        self.server_offset = Some(offset);
        offset
    }

    /// Local "now" shifted by the cached offset: an approximation of the
    /// server's current wall clock without another round trip. Falls back
    /// to the unshifted local clock while no offset is cached.
    pub fn get_current_time(&self) -> DateTime<Utc> {
        let offset_ms = (self.server_offset.unwrap_or(0.0) * 1000.0).round() as i64;
        Utc::now() + Duration::milliseconds(offset_ms)
    }

    /// Composite seed used when mounting against an in-progress remote
    /// timer: reset, seed the previously accrued `elapsed_hours`, snapshot
    /// the baseline for later `update_timer` recomputation, then fold in
    /// the interval the remote timer has already been running.
    ///
    /// When `server_time` is absent it is derived from `timer_start` plus
    /// the cached offset, if both are available. Supplying exactly one of
    /// `timer_start`/`server_time` is a caller error: it is logged and the
    /// accumulator is left with only the seed applied.
    pub fn set_timer(
        &mut self,
        elapsed_hours: f64,
        timer_start: Option<DateTime<Utc>>,
        server_time: Option<DateTime<Utc>>,
    ) {
        self.reset_timer();
        self.add_float_time(elapsed_hours);
        self.time_elapsed = self.to_seconds().round() as i64;

        let server_time = server_time.or_else(|| match (self.server_offset, timer_start) {
            (Some(offset), Some(start)) => {
                Some(start + Duration::milliseconds((offset * 1000.0).round() as i64))
            }
            _ => None,
        });

        match (timer_start, server_time) {
            (Some(start), Some(now)) => {
                let interval = Self::get_interval(start, now);
                let minutes = interval.num_minutes() - interval.num_hours() * 60;
                let seconds = interval.num_milliseconds() as f64 / 1000.0
                    - interval.num_minutes() as f64 * 60.0;
                self.add_hours(interval.num_hours());
                self.add_minutes(minutes as f64);
                self.add_seconds(seconds);
            }
            (None, None) => {}
            _ => {
                error!("set_timer requires both a start timestamp and a server time, got only one");
            }
        }

        self.format_time();
    }

    /// Periodic refresh: recompute total elapsed time from scratch as the
    /// interval since `timer_start` (on the server clock) plus the baseline
    /// captured at seeding. The delta is fed through `add_seconds` so the
    /// carry logic re-normalizes the decomposition.
    ///
    /// Because each call is a full recomputation rather than a cumulative
    /// add, skipped or repeated ticks are self-correcting.
    pub fn update_timer(&mut self, timer_start: DateTime<Utc>) {
        let current_time = self.get_current_time();
        let interval = Self::get_interval(timer_start, current_time);
        let interval_seconds = interval.num_milliseconds() as f64 / 1000.0;
        self.add_seconds(interval_seconds - self.to_seconds() + self.time_elapsed as f64);
        self.format_time();
    }
}

impl Default for TimeAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn seconds_carry_into_minutes_and_hours() {
        let mut t = TimeAccumulator::new();
        t.add_seconds(3725.0);

        assert_eq!(t.hours(), 1);
        assert!((t.minutes() - 2.0).abs() < EPSILON);
        assert!((t.seconds() - 5.0).abs() < EPSILON);
        assert!((t.to_seconds() - 3725.0).abs() < EPSILON);
    }

    #[test]
    fn fractional_seconds_survive_repeated_adds() {
        let mut t = TimeAccumulator::new();
        t.add_seconds(59.5);
        t.add_seconds(0.75);

        assert!((t.minutes() - 1.0).abs() < EPSILON);
        assert!((t.seconds() - 0.25).abs() < 1e-6);
        assert!((t.to_seconds() - 60.25).abs() < 1e-6);
    }

    #[test]
    fn negative_seconds_borrow_from_minutes() {
        let mut t = TimeAccumulator::new();
        t.add_seconds(120.0);
        t.add_seconds(-30.0);

        assert_eq!(t.hours(), 0);
        assert!((t.minutes() - 1.0).abs() < EPSILON);
        assert!((t.seconds() - 30.0).abs() < EPSILON);
    }

    #[test]
    fn minutes_carry_into_hours() {
        let mut t = TimeAccumulator::new();
        t.add_minutes(125.0);

        assert_eq!(t.hours(), 2);
        assert!((t.minutes() - 5.0).abs() < EPSILON);
    }

    #[test]
    fn float_seed_round_trips() {
        let mut t = TimeAccumulator::new();
        t.add_float_time(2.5);

        assert_eq!(t.hours(), 2);
        assert!((t.minutes() - 30.0).abs() < EPSILON);
        assert!(t.seconds().abs() < EPSILON);
        assert!((t.float_value() - 2.5).abs() < EPSILON);
    }

    #[test]
    fn float_seed_keeps_fractional_minutes() {
        let mut t = TimeAccumulator::new();
        t.add_float_time(1.01);

        assert_eq!(t.hours(), 1);
        assert!((t.minutes() - 0.6).abs() < 1e-9);
        assert!((t.float_value() - 1.01).abs() < 1e-9);
    }

    #[test]
    fn zero_float_seed_resets_everything() {
        let mut t = TimeAccumulator::new();
        t.add_seconds(4000.0);
        t.add_float_time(0.0);

        assert_eq!(t.hours(), 0);
        assert!(t.minutes().abs() < EPSILON);
        assert!(t.seconds().abs() < EPSILON);
    }

    #[test]
    fn format_pads_fields_without_truncating_hours() {
        let mut t = TimeAccumulator::new();
        t.format_time();
        assert_eq!(t.time(), "00:00:00");

        t.add_seconds(3725.25);
        t.format_time();
        assert_eq!(t.time(), "01:02:05");

        t.add_hours(122);
        t.format_time();
        assert_eq!(t.time(), "123:02:05");
    }

    #[test]
    fn reset_clears_decomposition_and_time_string() {
        let mut t = TimeAccumulator::new();
        t.add_seconds(90.0);
        t.format_time();
        t.reset_timer();

        assert_eq!(t.hours(), 0);
        assert!(t.minutes().abs() < EPSILON);
        assert!(t.seconds().abs() < EPSILON);
        assert_eq!(t.time(), "");
    }

    #[test]
    fn interval_is_order_independent() {
        let a = Utc::now();
        let b = a + Duration::seconds(4242);

        assert_eq!(
            TimeAccumulator::get_interval(a, b),
            TimeAccumulator::get_interval(b, a)
        );
        assert_eq!(TimeAccumulator::get_interval(a, b).num_seconds(), 4242);
    }

    #[test]
    fn offset_shifts_current_time_toward_server_clock() {
        let mut t = TimeAccumulator::new();
        let server_time = Utc::now() + Duration::seconds(120);
        let offset = t.compute_offset(server_time);

        assert!((offset - 120.0).abs() < 1.0);

        let drift = (t.get_current_time() - Utc::now()).num_milliseconds() as f64 / 1000.0;
        assert!((drift - 120.0).abs() < 1.0);
    }

    #[test]
    fn set_timer_seeds_and_folds_in_elapsed_interval() {
        let mut t = TimeAccumulator::new();
        let start = Utc::now();
        t.set_timer(1.0, Some(start), Some(start + Duration::seconds(3600)));

        assert_eq!(t.time_elapsed(), 3600);
        assert!((t.to_seconds() - 7200.0).abs() < EPSILON);
        assert_eq!(t.time(), "02:00:00");
    }

    #[test]
    fn set_timer_with_only_start_leaves_seed_intact() {
        let mut t = TimeAccumulator::new();
        t.set_timer(1.0, Some(Utc::now()), None);

        // No offset cached, so no server time can be derived: seed only.
        assert!((t.to_seconds() - 3600.0).abs() < EPSILON);
        assert_eq!(t.time_elapsed(), 3600);
    }

    #[test]
    fn set_timer_derives_server_time_from_cached_offset() {
        let mut t = TimeAccumulator::new();
        t.set_server_offset(90.0);
        t.set_timer(0.0, Some(Utc::now()), None);

        // Derived server time sits 90s past the start timestamp.
        assert!((t.to_seconds() - 90.0).abs() < EPSILON);
    }

    #[test]
    fn update_timer_recomputes_from_start_and_baseline() {
        let mut t = TimeAccumulator::new();
        t.set_timer(1.0, None, None);
        assert_eq!(t.time_elapsed(), 3600);

        let timer_start = Utc::now() - Duration::minutes(90);
        t.update_timer(timer_start);

        // 90 minutes of interval plus the 3600s baseline.
        assert!((t.to_seconds() - 9000.0).abs() < 2.0);
        assert_eq!(t.hours(), 2);
    }

    #[test]
    fn update_timer_is_idempotent_for_a_fixed_start() {
        let mut t = TimeAccumulator::new();
        let timer_start = Utc::now() - Duration::seconds(300);

        t.update_timer(timer_start);
        let first = t.to_seconds();
        t.update_timer(timer_start);
        let second = t.to_seconds();

        assert!((second - first).abs() < 1.5);
        assert!((first - 300.0).abs() < 2.0);
    }
}
