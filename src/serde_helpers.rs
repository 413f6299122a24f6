use serde::Serializer;
use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339};

use crate::time_utils::DATE_FORMAT;

/// Serde helpers for `time::OffsetDateTime`.
///
/// Serialized as RFC 3339 (e.g. `2024-06-01T10:00:00+02:00`), keeping the offset.
pub mod offset_datetime {
    use super::*;

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.format(&Rfc3339).map_err(serde::ser::Error::custom)?)
    }

    #[cfg(test)]
    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
        OffsetDateTime::parse(&raw, &Rfc3339).map_err(serde::de::Error::custom)
    }
}

/// Serde helpers for `time::Date` as `YYYY-MM-DD`.
pub mod date {
    use super::*;

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?)
    }

    #[cfg(test)]
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
        Date::parse(&raw, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
