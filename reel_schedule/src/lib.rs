//! The age-decaying metric-sampling cadence: a pure function from a
//! video's publish time and the current instant to its next due time.
//!
//! No I/O, no shared state: every caller gets the same answer for the
//! same two inputs, which is what lets the Scheduler treat this as a
//! drop-in replacement for a stored `interval_seconds` column.

use chrono::{DateTime, Duration, Utc};

/// One row of the age-to-interval table. Upper bounds are exclusive
/// (half-open): a video exactly at a boundary age belongs to the bucket
/// the boundary opens, not the one it closes.
struct Bucket {
    max_age: Duration,
    interval: Duration,
}

fn buckets() -> [Bucket; 4] {
    [
        Bucket { max_age: Duration::hours(1), interval: Duration::hours(1) },
        Bucket { max_age: Duration::hours(7), interval: Duration::hours(2) },
        Bucket { max_age: Duration::hours(31), interval: Duration::hours(12) },
        Bucket { max_age: Duration::days(36_500), interval: Duration::hours(24) },
    ]
}

/// The interval until the next sample for a video of the given `age`.
fn interval_for_age(age: Duration) -> Duration {
    buckets()
        .into_iter()
        .find(|b| age < b.max_age)
        .map(|b| b.interval)
        .unwrap_or_else(|| Duration::hours(24))
}

/// Computes the next due time for a video published at `published_at`,
/// evaluated at `now`. Used both at schedule creation (for an
/// already-published video) and at reschedule time; the same formula
/// either way, always `now + interval(age)`, never `published_at + interval`.
pub fn next_due(published_at: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let age = now - published_at;
    now + interval_for_age(age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(hours: i64) -> DateTime<Utc> {
        Utc::now() + Duration::hours(hours)
    }

    #[test]
    fn brand_new_video_gets_one_hour_interval() {
        let published = Utc::now();
        let now = published + Duration::minutes(30);
        let due = next_due(published, now);
        assert_eq!(due, now + Duration::hours(1));
    }

    #[test]
    fn one_hour_boundary_moves_into_the_two_hour_bucket() {
        let published = at(0);
        let now = published + Duration::hours(1);
        let due = next_due(published, now);
        assert_eq!(due, now + Duration::hours(2), "age == 1h is not < 1h, so it's in the second bucket");
    }

    #[test]
    fn seven_hour_boundary_moves_into_the_twelve_hour_bucket() {
        let published = at(0);
        let now = published + Duration::hours(7);
        let due = next_due(published, now);
        assert_eq!(due, now + Duration::hours(12));
    }

    #[test]
    fn thirty_one_hour_boundary_moves_into_the_day_bucket() {
        let published = at(0);
        let now = published + Duration::hours(31);
        let due = next_due(published, now);
        assert_eq!(due, now + Duration::hours(24));
    }

    #[test]
    fn just_under_each_boundary_stays_in_the_smaller_bucket() {
        let published = at(0);

        let due_59m = next_due(published, published + Duration::minutes(59));
        assert_eq!(due_59m, published + Duration::minutes(59) + Duration::hours(1));

        let due_6h59m = next_due(published, published + Duration::minutes(6 * 60 + 59));
        assert_eq!(
            due_6h59m,
            published + Duration::minutes(6 * 60 + 59) + Duration::hours(2)
        );
    }

    #[test]
    fn very_old_video_uses_the_terminal_day_bucket() {
        let published = at(0);
        let now = published + Duration::days(365);
        let due = next_due(published, now);
        assert_eq!(due, now + Duration::hours(24));
    }

    proptest! {
        #[test]
        fn monotone_in_now_for_a_fixed_published_at(
            published_offset_secs in 0i64..1_000_000,
            now1_offset_secs in 0i64..10_000_000,
            delta_secs in 0i64..10_000_000,
        ) {
            let published_at = Utc::now() - Duration::seconds(published_offset_secs);
            let now1 = published_at + Duration::seconds(now1_offset_secs);
            let now2 = now1 + Duration::seconds(delta_secs);

            let due1 = next_due(published_at, now1);
            let due2 = next_due(published_at, now2);

            prop_assert!(due2 >= due1, "next_due must be monotone in now: {due1} -> {due2}");
        }
    }
}
