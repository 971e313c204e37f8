//! `HH:MM:SS` serde representation for `NaiveTime` fields.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serializer};

const FORMAT: &str = "%H:%M:%S";

pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format(FORMAT))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => serializer.serialize_some(&t.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Slot {
        #[serde(with = "super")]
        start: NaiveTime,
        #[serde(default, with = "super::option")]
        end: Option<NaiveTime>,
    }

    #[test]
    fn test_serializes_without_fraction() {
        let slot = Slot {
            start: NaiveTime::from_hms_milli_opt(7, 5, 9, 250).unwrap(),
            end: None,
        };
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["start"], "07:05:09");
        assert!(json["end"].is_null());
    }

    #[test]
    fn test_missing_optional_is_none() {
        let slot: Slot = serde_json::from_str(r#"{"start":"23:59:00"}"#).unwrap();
        assert_eq!(slot.start, NaiveTime::from_hms_opt(23, 59, 0).unwrap());
        assert_eq!(slot.end, None);
    }

    #[test]
    fn test_rejects_other_formats() {
        assert!(serde_json::from_str::<Slot>(r#"{"start":"7:05"}"#).is_err());
        assert!(serde_json::from_str::<Slot>(r#"{"start":"25:00:00"}"#).is_err());
        assert!(serde_json::from_str::<Slot>(r#"{"start":"08:00:00","end":"noon"}"#).is_err());
    }
}
