//! Cadence translation.
//!
//! Turns a human cadence description (frequency, time of day, weekday set)
//! into the trigger service's six-field expression. The translation is a
//! pure function: the same inputs always produce the same expression, which
//! keeps trigger updates idempotent.

use thiserror::Error;

use super::Frequency;

/// Errors produced while translating a cadence.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CadenceError {
    /// The time of day is not a 24-hour `HH:MM`.
    #[error("invalid time of day '{0}', expected 24-hour HH:MM")]
    InvalidTime(String),
    /// A weekly cadence needs at least one weekday.
    #[error("weekly schedules require a non-empty set of days")]
    EmptyDays,
    /// A day name the trigger service has no token for.
    #[error("unknown day name '{0}'")]
    UnknownDay(String),
}

/// Parsed `HH:MM`, validated to 24-hour ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimeOfDay {
    hour: u32,
    minute: u32,
}

fn parse_time(time: &str) -> Result<TimeOfDay, CadenceError> {
    let invalid = || CadenceError::InvalidTime(time.to_string());

    let (hour, minute) = time.split_once(':').ok_or_else(invalid)?;
    if hour.is_empty() || minute.is_empty() || minute.contains(':') {
        return Err(invalid());
    }

    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }

    Ok(TimeOfDay { hour, minute })
}

/// Map a weekday name to the trigger service's day token.
///
/// Unknown names are a validation error, never silently dropped.
fn day_token(name: &str) -> Result<&'static str, CadenceError> {
    match name.to_ascii_lowercase().as_str() {
        "sunday" => Ok("SUN"),
        "monday" => Ok("MON"),
        "tuesday" => Ok("TUE"),
        "wednesday" => Ok("WED"),
        "thursday" => Ok("THU"),
        "friday" => Ok("FRI"),
        "saturday" => Ok("SAT"),
        _ => Err(CadenceError::UnknownDay(name.to_string())),
    }
}

/// Translate a cadence into the trigger service's expression.
///
/// - daily: fires every day at `time`.
/// - weekly: fires on each named day at `time`; `days` must be non-empty.
/// - monthly: fires on the 1st of the month at `time`; `days` is ignored.
///
/// Validation happens here, before anything is persisted.
pub fn build_trigger_expression(
    frequency: Frequency,
    time: &str,
    days: &[String],
) -> Result<String, CadenceError> {
    let t = parse_time(time)?;

    let expression = match frequency {
        Frequency::Daily => format!("cron({} {} * * ? *)", t.minute, t.hour),
        Frequency::Weekly => {
            if days.is_empty() {
                return Err(CadenceError::EmptyDays);
            }
            let tokens = days
                .iter()
                .map(|d| day_token(d))
                .collect::<Result<Vec<_>, _>>()?;
            format!("cron({} {} ? * {} *)", t.minute, t.hour, tokens.join(","))
        }
        // Monthly always anchors on day 1 of the month.
        Frequency::Monthly => format!("cron({} {} 1 * ? *)", t.minute, t.hour),
    };

    Ok(expression)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn daily_fires_at_the_given_time() {
        let expr = build_trigger_expression(Frequency::Daily, "09:05", &[]).unwrap();
        assert_eq!(expr, "cron(5 9 * * ? *)");
    }

    #[test]
    fn weekly_fires_only_on_named_days() {
        let expr = build_trigger_expression(
            Frequency::Weekly,
            "18:30",
            &days(&["monday", "wednesday"]),
        )
        .unwrap();
        assert_eq!(expr, "cron(30 18 ? * MON,WED *)");
    }

    #[test]
    fn weekly_rejects_empty_days() {
        let err = build_trigger_expression(Frequency::Weekly, "18:30", &[]).unwrap_err();
        assert_eq!(err, CadenceError::EmptyDays);
    }

    #[test]
    fn weekly_rejects_unknown_day_names() {
        let err =
            build_trigger_expression(Frequency::Weekly, "18:30", &days(&["moonday"])).unwrap_err();
        assert_eq!(err, CadenceError::UnknownDay("moonday".to_string()));
    }

    #[test]
    fn weekly_day_names_are_case_insensitive() {
        let expr =
            build_trigger_expression(Frequency::Weekly, "07:00", &days(&["Friday"])).unwrap();
        assert_eq!(expr, "cron(0 7 ? * FRI *)");
    }

    #[test]
    fn monthly_always_anchors_on_day_one() {
        // Any caller-supplied day set is irrelevant for monthly cadences.
        let expr = build_trigger_expression(
            Frequency::Monthly,
            "00:15",
            &days(&["thursday", "saturday"]),
        )
        .unwrap();
        assert_eq!(expr, "cron(15 0 1 * ? *)");
    }

    #[test]
    fn malformed_times_are_rejected() {
        for bad in ["", "9", "25:00", "09:60", "nine:05", "09:05:30", ":", "12:"] {
            let err = build_trigger_expression(Frequency::Daily, bad, &[]).unwrap_err();
            assert_eq!(err, CadenceError::InvalidTime(bad.to_string()), "{bad}");
        }
    }

    #[test]
    fn translation_is_deterministic() {
        let a = build_trigger_expression(Frequency::Weekly, "06:45", &days(&["sunday"])).unwrap();
        let b = build_trigger_expression(Frequency::Weekly, "06:45", &days(&["sunday"])).unwrap();
        assert_eq!(a, b);
    }
}
