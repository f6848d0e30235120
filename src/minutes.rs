//! Conversion of minutes-played values to fractional minutes.
//!
//! Box scores report minutes as a clock string (`"30:45"`), a bare number, or nothing at
//! all. [`convert_to_decimal`] maps all of them to a non-negative `f64`; anything it cannot
//! read becomes `0.0` with a warning instead of an error.

use std::borrow::Cow;

/// A raw minutes cell
#[derive(Debug, Clone, PartialEq)]
pub enum MinutesValue<'a> {
    Missing,
    Number(f64),
    Text(Cow<'a, str>),
}

impl From<f64> for MinutesValue<'_> {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for MinutesValue<'_> {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl<'a> From<&'a str> for MinutesValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }
}

impl<'a, T> From<Option<T>> for MinutesValue<'a>
where
    T: Into<MinutesValue<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

/// Why a minutes value was replaced by `0.0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinutesWarning {
    pub raw: String,
    pub reason: String,
}

/// Converts a minutes value to decimal minutes (`M + S/60`).
///
/// ```
/// use boxscore_cleaner::minutes::convert_to_decimal;
///
/// assert_eq!(convert_to_decimal("30:45"), 30.75);
/// assert_eq!(convert_to_decimal(30.0), 30.0);
/// assert_eq!(convert_to_decimal(None::<&str>), 0.0);
/// ```
pub fn convert_to_decimal<'a>(value: impl Into<MinutesValue<'a>>) -> f64 {
    match try_convert(&value.into()) {
        Ok(minutes) => minutes,
        Err(warning) => {
            tracing::warn!(
                "Could not convert minutes value '{}': {}",
                warning.raw,
                warning.reason
            );
            0.0
        }
    }
}

/// Like [`convert_to_decimal`] but hands the warning back instead of logging it.
///
/// Absent and empty values are not warnings: they are a legitimate "did not play" and give
/// `Ok(0.0)`.
pub fn try_convert(value: &MinutesValue<'_>) -> Result<f64, MinutesWarning> {
    match value {
        MinutesValue::Missing => Ok(0.0),
        MinutesValue::Number(n) => check_minutes(*n, &n.to_string()),
        MinutesValue::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }

            let minutes = match trimmed.split_once(':') {
                Some((mins, rest)) => {
                    // "M:S:..." keeps the first two fields
                    let secs = rest.split(':').next().unwrap_or_default();
                    let mins = parse_part(mins, trimmed)?;
                    let secs = if secs.trim().is_empty() {
                        0.0
                    } else {
                        parse_part(secs, trimmed)?
                    };
                    mins + secs / 60.0
                }
                None => parse_part(trimmed, trimmed)?,
            };
            check_minutes(minutes, trimmed)
        }
    }
}

fn parse_part(part: &str, raw: &str) -> Result<f64, MinutesWarning> {
    part.trim().parse::<f64>().map_err(|e| MinutesWarning {
        raw: raw.to_owned(),
        reason: e.to_string(),
    })
}

fn check_minutes(minutes: f64, raw: &str) -> Result<f64, MinutesWarning> {
    if minutes.is_nan() {
        return Ok(0.0);
    }
    if !minutes.is_finite() || minutes < 0.0 {
        return Err(MinutesWarning {
            raw: raw.to_owned(),
            reason: "minutes must be a finite, non-negative number".to_owned(),
        });
    }
    Ok(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_clock_strings() {
        assert!(approx(convert_to_decimal("30:45"), 30.75));
        assert!(approx(convert_to_decimal("12:06"), 12.1));
        assert!(approx(convert_to_decimal(" 0:30 "), 0.5));
        for (m, s) in [(0_u32, 0_u32), (5, 59), (48, 0), (61, 1)] {
            let raw = format!("{m}:{s:02}");
            assert!(approx(
                convert_to_decimal(raw.as_str()),
                f64::from(m) + f64::from(s) / 60.0
            ));
        }
    }

    #[test]
    fn test_missing_seconds_default_to_zero() {
        assert!(approx(convert_to_decimal("30"), 30.0));
        assert!(approx(convert_to_decimal("30:"), 30.0));
    }

    #[test]
    fn test_numeric_input() {
        assert!(approx(convert_to_decimal(30_i64), 30.0));
        assert!(approx(convert_to_decimal(30.5), 30.5));
        assert!(approx(convert_to_decimal(f64::NAN), 0.0));
    }

    #[test]
    fn test_absent_and_empty_give_zero() {
        assert!(approx(convert_to_decimal(None::<&str>), 0.0));
        assert!(approx(convert_to_decimal(""), 0.0));
        assert_eq!(try_convert(&MinutesValue::Missing), Ok(0.0));
    }

    #[test]
    fn test_unparsable_degrades_to_zero_with_warning() {
        assert!(approx(convert_to_decimal("DNP"), 0.0));
        assert!(approx(convert_to_decimal("ab:cd"), 0.0));

        let warning = try_convert(&MinutesValue::from("DNP")).unwrap_err();
        assert_eq!(warning.raw, "DNP");
        assert!(try_convert(&MinutesValue::from(-3.0)).is_err());
    }
}
