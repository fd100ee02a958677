//! Five-field cron validation for pipeline schedules

use std::fmt;
use std::str::FromStr;

/// Why a cron expression was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("expected 5 fields (minute hour day-of-month month day-of-week), found {0}")]
    FieldCount(usize),
    #[error("{field}: empty list entry")]
    EmptyEntry { field: &'static str },
    #[error("{field}: '{value}' is not a number or name")]
    InvalidValue { field: &'static str, value: String },
    #[error("{field}: {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
    #[error("{field}: range {start}-{end} runs backwards")]
    ReversedRange {
        field: &'static str,
        start: u32,
        end: u32,
    },
    #[error("{field}: step '{step}' must be a positive number")]
    InvalidStep { field: &'static str, step: String },
}

struct Field {
    name: &'static str,
    min: u32,
    max: u32,
    /// Symbolic names, the first one standing for `name_base`
    names: &'static [&'static str],
    name_base: u32,
}

const MONTH_NAMES: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const DAY_NAMES: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

const FIELDS: [Field; 5] = [
    Field {
        name: "minute",
        min: 0,
        max: 59,
        names: &[],
        name_base: 0,
    },
    Field {
        name: "hour",
        min: 0,
        max: 23,
        names: &[],
        name_base: 0,
    },
    Field {
        name: "day-of-month",
        min: 1,
        max: 31,
        names: &[],
        name_base: 0,
    },
    Field {
        name: "month",
        min: 1,
        max: 12,
        names: MONTH_NAMES,
        name_base: 1,
    },
    // 7 is accepted as a second spelling of Sunday
    Field {
        name: "day-of-week",
        min: 0,
        max: 7,
        names: DAY_NAMES,
        name_base: 0,
    },
];

/// Plain decimal digits only; `str::parse` would also take a leading `+`
fn parse_number(token: &str) -> Option<u32> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

impl Field {
    fn value(&self, token: &str) -> Result<u32, ScheduleError> {
        let value = if let Some(number) = parse_number(token) {
            number
        } else {
            let position = self
                .names
                .iter()
                .position(|name| name.eq_ignore_ascii_case(token))
                .ok_or_else(|| ScheduleError::InvalidValue {
                    field: self.name,
                    value: token.to_string(),
                })?;
            self.name_base + u32::try_from(position).unwrap_or(u32::MAX)
        };

        if (self.min..=self.max).contains(&value) {
            Ok(value)
        } else {
            Err(ScheduleError::OutOfRange {
                field: self.name,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }

    fn check_entry(&self, entry: &str) -> Result<(), ScheduleError> {
        if entry.is_empty() {
            return Err(ScheduleError::EmptyEntry { field: self.name });
        }

        let (base, step) = match entry.split_once('/') {
            Some((base, step)) => (base, Some(step)),
            None => (entry, None),
        };

        if let Some(step) = step {
            match parse_number(step) {
                Some(n) if n > 0 => {}
                _ => {
                    return Err(ScheduleError::InvalidStep {
                        field: self.name,
                        step: step.to_string(),
                    });
                }
            }
        }

        if base == "*" {
            return Ok(());
        }

        if let Some((start, end)) = base.split_once('-') {
            let start = self.value(start)?;
            let end = self.value(end)?;
            if start > end {
                return Err(ScheduleError::ReversedRange {
                    field: self.name,
                    start,
                    end,
                });
            }
            return Ok(());
        }

        self.value(base).map(|_| ())
    }
}

/// A validated five-field cron expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != FIELDS.len() {
            return Err(ScheduleError::FieldCount(fields.len()));
        }

        for (spec, text) in FIELDS.iter().zip(&fields) {
            for entry in text.split(',') {
                spec.check_entry(entry)?;
            }
        }

        // Normalised to single spaces so rendering is stable
        Ok(Self {
            expression: fields.join(" "),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.expression
    }
}

impl FromStr for CronSchedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_expressions() {
        for expr in [
            "0 0 * * *",
            "*/15 * * * *",
            "0 9-17 * * MON-FRI",
            "30 2 1,15 * *",
            "0 0 1 jan,jul sun",
            "5/10 * * * 7",
            "0 12 * DEC 0-6/2",
        ] {
            assert!(CronSchedule::parse(expr).is_ok(), "{expr} should parse");
        }
    }

    #[test]
    fn test_normalises_whitespace() {
        let schedule = CronSchedule::parse("  0   0 * *\t* ").expect("valid");
        assert_eq!(schedule.as_str(), "0 0 * * *");
    }

    #[test]
    fn test_rejects_wrong_field_count() {
        assert_eq!(
            CronSchedule::parse("not a cron"),
            Err(ScheduleError::FieldCount(3))
        );
        assert_eq!(
            CronSchedule::parse("0 0 * * * *"),
            Err(ScheduleError::FieldCount(6))
        );
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert_eq!(
            CronSchedule::parse("60 0 * * *"),
            Err(ScheduleError::OutOfRange {
                field: "minute",
                value: 60,
                min: 0,
                max: 59
            })
        );
        assert!(matches!(
            CronSchedule::parse("0 0 0 * *"),
            Err(ScheduleError::OutOfRange {
                field: "day-of-month",
                ..
            })
        ));
        assert!(matches!(
            CronSchedule::parse("0 0 * 13 *"),
            Err(ScheduleError::OutOfRange { field: "month", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_syntax() {
        assert!(matches!(
            CronSchedule::parse("+5 * * * *"),
            Err(ScheduleError::InvalidValue { field: "minute", .. })
        ));
        assert!(matches!(
            CronSchedule::parse("*/+2 * * * *"),
            Err(ScheduleError::InvalidStep { .. })
        ));
        assert!(matches!(
            CronSchedule::parse("0 0 * * FUNDAY"),
            Err(ScheduleError::InvalidValue { .. })
        ));
        assert!(matches!(
            CronSchedule::parse("*/0 * * * *"),
            Err(ScheduleError::InvalidStep { .. })
        ));
        assert!(matches!(
            CronSchedule::parse("0 17-9 * * *"),
            Err(ScheduleError::ReversedRange { .. })
        ));
        assert!(matches!(
            CronSchedule::parse("0,,5 0 * * *"),
            Err(ScheduleError::EmptyEntry { field: "minute" })
        ));
        // Names only make sense in the month and weekday fields
        assert!(matches!(
            CronSchedule::parse("MON 0 * * *"),
            Err(ScheduleError::InvalidValue { .. })
        ));
    }
}
