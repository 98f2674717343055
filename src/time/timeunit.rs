use crate::time::error::Error;
use core::str::FromStr;
use lazy_static::*;
use regex::Regex;
use std::fmt;
use std::time::Duration;

lazy_static! {
    static ref DURATION_REGEX: Regex =
        Regex::new(r"^\s*(?P<value>\d+)\s*(?P<unit>[a-z]+)\s*$").expect("Regex compilation error");
}

/// Duration written the way manifests write it: an integer and a unit suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationUnit {
    value: u64,
    unit: TimeUnit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeUnit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
}

impl DurationUnit {
    pub fn new(value: u64, unit: TimeUnit) -> Self {
        Self { value, unit }
    }

    /// Converts into a std duration, rejecting values that overflow it.
    pub fn to_duration(&self) -> Result<Duration, Error> {
        let overflow = || Error::Overflow(self.to_string());
        let duration = match self.unit {
            TimeUnit::Nanosecond => Duration::from_nanos(self.value),
            TimeUnit::Microsecond => Duration::from_micros(self.value),
            TimeUnit::Millisecond => Duration::from_millis(self.value),
            TimeUnit::Second => Duration::from_secs(self.value),
            TimeUnit::Minute => Duration::from_secs(self.value.checked_mul(60).ok_or_else(overflow)?),
            TimeUnit::Hour => {
                Duration::from_secs(self.value.checked_mul(60 * 60).ok_or_else(overflow)?)
            }
        };
        Ok(duration)
    }
}

impl FromStr for DurationUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DURATION_REGEX
            .captures(s)
            .ok_or_else(|| Error::Syntax(s.to_owned()))?;
        let value = caps["value"]
            .parse::<u64>()
            .map_err(|_| Error::Overflow(s.to_owned()))?;
        let unit = caps["unit"].parse::<TimeUnit>()?;
        Ok(Self { value, unit })
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let suffix = match self.unit {
            TimeUnit::Nanosecond => "ns",
            TimeUnit::Microsecond => "us",
            TimeUnit::Millisecond => "ms",
            TimeUnit::Second => "s",
            TimeUnit::Minute => "m",
            TimeUnit::Hour => "h",
        };
        write!(f, "{}{}", self.value, suffix)
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ns" | "nanosecond" | "nanos" | "nanoseconds" => Ok(TimeUnit::Nanosecond),
            "us" | "microsecond" | "micros" | "microseconds" => Ok(TimeUnit::Microsecond),
            "ms" | "millisecond" | "millis" | "milliseconds" => Ok(TimeUnit::Millisecond),
            "s" | "second" | "secs" | "seconds" => Ok(TimeUnit::Second),
            "m" | "minute" | "mins" | "minutes" => Ok(TimeUnit::Minute),
            "h" | "hour" | "hours" => Ok(TimeUnit::Hour),
            _ => Err(Error::UnitNotSupported(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsing_time_unit_aliases() {
        assert_eq!("us".parse::<TimeUnit>(), Ok(TimeUnit::Microsecond));
        assert_eq!("millis".parse::<TimeUnit>(), Ok(TimeUnit::Millisecond));
        assert_eq!("seconds".parse::<TimeUnit>(), Ok(TimeUnit::Second));
        assert_eq!("h".parse::<TimeUnit>(), Ok(TimeUnit::Hour));
        assert_eq!(
            "fortnight".parse::<TimeUnit>(),
            Err(Error::UnitNotSupported("fortnight".to_owned()))
        );
    }

    #[test]
    fn test_conversion_duration_unit_to_duration() {
        let unit = "200ms".parse::<DurationUnit>().unwrap();

        assert_eq!(unit.to_duration(), Ok(Duration::from_millis(200)));
        assert_eq!(unit.to_string(), "200ms");
    }

    #[test]
    fn test_duration_unit_tolerates_whitespace_between_value_and_unit() {
        let unit = " 3 s ".parse::<DurationUnit>().unwrap();

        assert_eq!(unit, DurationUnit::new(3, TimeUnit::Second));
    }

    #[test]
    fn test_malformed_duration_is_rejected() {
        assert!(matches!("ms".parse::<DurationUnit>(), Err(Error::Syntax(_))));
        assert!(matches!("-5ms".parse::<DurationUnit>(), Err(Error::Syntax(_))));
        assert!(matches!("5 days".parse::<DurationUnit>(), Err(Error::UnitNotSupported(_))));
    }

    #[test]
    fn test_overflowing_duration_is_rejected() {
        let unit = DurationUnit::new(u64::MAX, TimeUnit::Hour);

        assert!(matches!(unit.to_duration(), Err(Error::Overflow(_))));
    }
}
