use time::OffsetDateTime;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

const UNITS: [(i64, &str, &str); 6] = [
    (365 * DAY, "year", "years"),
    (30 * DAY, "month", "months"),
    (7 * DAY, "week", "weeks"),
    (DAY, "day", "days"),
    (HOUR, "hour", "hours"),
    (MINUTE, "minute", "minutes"),
];

/// Elapsed time from `then` to `now` in its largest whole unit, e.g. `"3 days"`.
/// Anything under a minute, or in the future, reads `"0 minutes"`.
pub fn timesince(then: OffsetDateTime, now: OffsetDateTime) -> String {
    let seconds = (now - then).whole_seconds();

    UNITS
        .iter()
        .find_map(|&(size, singular, plural)| {
            let count = seconds / size;
            (count > 0).then(|| format!("{count} {}", if count == 1 { singular } else { plural }))
        })
        .unwrap_or_else(|| "0 minutes".to_owned())
}
