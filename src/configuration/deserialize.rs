pub mod duration {
    use crate::time::timeunit::DurationUnit;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value
            .parse::<DurationUnit>()
            .and_then(|unit| unit.to_duration())
            .map_err(|err| D::Error::custom(err.to_string()))
    }
}

pub mod destination {
    use crate::reporter::Destination;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Destination>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(value) => value.parse::<Destination>().map(Some).map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}

pub mod report_format {
    use crate::reporter::ReportFormat;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<ReportFormat>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(value) => value.parse::<ReportFormat>().map(Some).map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}
