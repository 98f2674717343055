pub mod millis {
    use crate::time::as_millis_f64;
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(as_millis_f64(*duration))
    }
}

pub mod optional_millis {
    use crate::time::as_millis_f64;
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(duration) => serializer.serialize_some(&as_millis_f64(*duration)),
            None => serializer.serialize_none(),
        }
    }
}
