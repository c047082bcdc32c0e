//! Serde helper for optional `std::time::Duration`, persisted as milliseconds.

use serde::{ser, Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

pub mod option {
    use super::*;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = match duration {
            Some(d) => Some(u64::try_from(d.as_millis()).map_err(|_| {
                <S::Error as ser::Error>::custom(format!(
                    "duration {d:?} does not fit in u64 milliseconds"
                ))
            })?),
            None => None,
        };
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}
