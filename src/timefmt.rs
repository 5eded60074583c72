use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

/// Canonical wire form: RFC 3339 UTC with millisecond precision, e.g.
/// `2025-01-15T10:30:00.000Z`. Fixed width, so lexical order is time order.
pub fn format(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(value))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawTimestamp::deserialize(deserializer)?;
    parse_raw(raw).map_err(D::Error::custom)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Whole(i64),
    Fractional(f64),
}

fn parse_raw(raw: RawTimestamp) -> Result<DateTime<Utc>, String> {
    match raw {
        RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(&text)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|err| format!("unparseable timestamp {:?}: {}", text, err)),
        RawTimestamp::Whole(value) => {
            // below this magnitude the number can only be epoch seconds
            let millis = if value.abs() >= 100_000_000_000 {
                value
            } else {
                value.saturating_mul(1000)
            };
            Utc.timestamp_millis_opt(millis)
                .single()
                .ok_or_else(|| format!("timestamp out of range: {}", value))
        }
        RawTimestamp::Fractional(value) => {
            let millis = (value * 1000.0) as i64;
            Utc.timestamp_millis_opt(millis)
                .single()
                .ok_or_else(|| format!("timestamp out of range: {}", value))
        }
    }
}

pub mod option {
    use super::{parse_raw, RawTimestamp};
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => serializer.serialize_str(&super::format(inner)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<RawTimestamp>::deserialize(deserializer)? {
            Some(raw) => parse_raw(raw).map(Some).map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}
