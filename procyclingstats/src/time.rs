//! Race time arithmetic.
//!
//! Times shown on the site come in a handful of shapes (`M:SS`, `H:MM:SS`,
//! `MM.SS,hh`, with or without a leading `+`). Everything is converted to a
//! signed millisecond count and printed back as `H:MM:SS` or `H:MM:SS.fff`.
//! Hours are never rolled over into days, `27:03:10` stays `27:03:10`.

use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use log::trace;

use crate::error::{Error, Result};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RaceTime {
    millis: i64,
}

impl RaceTime {
    pub const ZERO: RaceTime = RaceTime { millis: 0 };

    pub fn from_millis(millis: i64) -> Self {
        RaceTime { millis }
    }

    pub fn from_secs(secs: i64) -> Result<Self> {
        secs.checked_mul(1000)
            .map(RaceTime::from_millis)
            .ok_or_else(|| Error::unexpected(format!("time of {} seconds is out of range", secs)))
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }

    pub fn checked_add(self, rhs: RaceTime) -> Result<RaceTime> {
        self.millis
            .checked_add(rhs.millis)
            .map(RaceTime::from_millis)
            .ok_or_else(|| Error::unexpected(format!("{} + {} is out of range", self, rhs)))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let (negative, body) = match cleaned.as_bytes().first() {
            Some(b'-') => (true, &cleaned[1..]),
            Some(b'+') => (false, &cleaned[1..]),
            _ => (false, cleaned.as_str()),
        };
        if body.is_empty() {
            return Err(Error::unexpected(format!("empty time value {:?}", text)));
        }

        // European notation: MM.SS,hh
        let (main, fraction) = match body.split_once(',') {
            Some((main, fraction)) => (main.replace('.', ":"), Some(fraction.to_string())),
            None if body.contains(':') => match body.rsplit_once('.') {
                Some((main, fraction)) => (main.to_string(), Some(fraction.to_string())),
                None => (body.to_string(), None),
            },
            None => (body.replace('.', ":"), None),
        };

        let parts = main
            .split(':')
            .map(|p| {
                p.parse::<i64>()
                    .map_err(|_| Error::unexpected(format!("invalid time value {:?}", text)))
            })
            .collect::<Result<Vec<i64>>>()?;

        let (hours, minutes, seconds) = match parts.as_slice() {
            [s] => (0, 0, *s),
            [m, s] => (0, *m, *s),
            [h, m, s] => (*h, *m, *s),
            _ => return Err(Error::unexpected(format!("invalid time value {:?}", text))),
        };
        // the leading component may overflow (75:00 is a valid M:SS), the others may not
        if (parts.len() > 1 && seconds >= 60) || (parts.len() > 2 && minutes >= 60) {
            return Err(Error::unexpected(format!("invalid time value {:?}", text)));
        }

        let millis = match fraction {
            Some(f) if !f.is_empty() => {
                if !f.chars().all(|c| c.is_ascii_digit()) {
                    return Err(Error::unexpected(format!("invalid time fraction {:?}", text)));
                }
                let mut digits: String = f.chars().take(3).collect();
                while digits.len() < 3 {
                    digits.push('0');
                }
                digits.parse::<i64>().unwrap_or(0)
            }
            _ => 0,
        };

        let total = hours
            .checked_mul(60)
            .and_then(|t| t.checked_add(minutes))
            .and_then(|t| t.checked_mul(60))
            .and_then(|t| t.checked_add(seconds))
            .and_then(|t| t.checked_mul(1000))
            .and_then(|t| t.checked_add(millis))
            .ok_or_else(|| Error::unexpected(format!("time value {:?} is out of range", text)))?;
        Ok(RaceTime {
            millis: if negative { -total } else { total },
        })
    }
}

impl fmt::Display for RaceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.millis < 0 { "-" } else { "" };
        let total = self.millis.unsigned_abs();
        let ms = total % 1000;
        let secs = total / 1000;
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        if ms == 0 {
            write!(f, "{}{}:{:02}:{:02}", sign, h, m, s)
        } else {
            write!(f, "{}{}:{:02}:{:02}.{:03}", sign, h, m, s, ms)
        }
    }
}

impl FromStr for RaceTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RaceTime::parse(s)
    }
}

impl Neg for RaceTime {
    type Output = RaceTime;

    fn neg(self) -> RaceTime {
        RaceTime {
            millis: self.millis.saturating_neg(),
        }
    }
}

/// Canonical form of a displayed time
pub fn format_time(text: &str) -> Result<String> {
    Ok(RaceTime::parse(text)?.to_string())
}

pub fn add_times(a: &str, b: &str) -> Result<String> {
    Ok(RaceTime::parse(a)?.checked_add(RaceTime::parse(b)?)?.to_string())
}

/// Converts a time column of leader time + deltas into absolute times.
///
/// The first row is taken as absolute. Null rows carry forward the previous
/// row's absolute value. A column whose first row is null is left untouched.
pub fn make_times_absolute(column: &mut [Value]) -> Result<()> {
    if column.len() < 2 {
        return Ok(());
    }
    let first = match &column[0] {
        Value::Text(t) => RaceTime::parse(t)?,
        _ => {
            trace!("first time value is empty, keeping deltas");
            return Ok(());
        }
    };
    column[0] = Value::Text(first.to_string());

    let mut previous = first;
    for value in column.iter_mut().skip(1) {
        let absolute = match value {
            Value::Text(t) => first.checked_add(RaceTime::parse(t)?)?,
            _ => previous,
        };
        *value = Value::Text(absolute.to_string());
        previous = absolute;
    }

    Ok(())
}
