use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A timestamp rendered in a particular zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTime {
    /// The zone that was actually used, which differs from the requested one
    /// when that could not be parsed.
    pub zone: String,
    pub formatted: String,
}

/// IANA name of the host timezone, `UTC` when it cannot be determined.
pub fn host_timezone() -> String {
    match iana_time_zone::get_timezone() {
        Ok(name) => name,
        Err(e) => {
            warn!("Could not determine the host timezone, using UTC: {e}");
            "UTC".to_string()
        },
    }
}

pub fn parse_zone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

/// Renders `timestamp` as `YYYY-MM-DD HH:mm:ss` in `zone`.
pub fn format_in_zone(timestamp: DateTime<Utc>, zone: Tz) -> String {
    timestamp
        .with_timezone(&zone)
        .format(LOCAL_TIME_FORMAT)
        .to_string()
}

/// Formats `timestamp` in the zone called `zone_name`.
///
/// An unknown zone never fails the request: the host zone is tried next,
/// then `UTC`.
pub fn format_local_time(timestamp: DateTime<Utc>, zone_name: &str) -> LocalTime {
    let zone = parse_zone(zone_name).unwrap_or_else(|| {
        let host = host_timezone();
        let fallback = parse_zone(&host).unwrap_or(Tz::UTC);

        warn!(
            requested = %zone_name,
            using = %fallback.name(),
            "Unknown timezone, falling back"
        );

        fallback
    });

    LocalTime {
        zone: zone.name().to_string(),
        formatted: format_in_zone(timestamp, zone),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("America/New_York", "2024-01-15 07:00:00")]
    #[case("UTC", "2024-01-15 12:00:00")]
    #[case("Asia/Kolkata", "2024-01-15 17:30:00")]
    #[case("Pacific/Auckland", "2024-01-16 01:00:00")]
    fn test_format_local_time(#[case] zone: &str, #[case] expected: &str) {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();

        let local = format_local_time(timestamp, zone);

        assert_eq!(local.formatted, expected);
        assert_eq!(local.zone, zone);
    }

    #[test]
    fn test_daylight_saving_is_applied() {
        let timestamp = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();

        assert_eq!(
            format_local_time(timestamp, "America/New_York").formatted,
            "2024-07-15 08:00:00"
        );
    }

    #[test]
    fn test_single_digit_fields_are_zero_padded() {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 5, 4, 3, 2).unwrap();

        assert_eq!(
            format_local_time(timestamp, "UTC").formatted,
            "2024-03-05 04:03:02"
        );
    }

    #[test]
    fn test_unknown_zone_falls_back() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();

        let local = format_local_time(timestamp, "Mars/Olympus_Mons");
        let zone = parse_zone(&local.zone).expect("fallback zone must be valid");

        assert_ne!(local.zone, "Mars/Olympus_Mons");
        assert_eq!(local.formatted, format_in_zone(timestamp, zone));
    }
}
