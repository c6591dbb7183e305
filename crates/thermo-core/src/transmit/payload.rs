use serde::{Deserialize, Serialize};

use crate::reading::Reading;

/// Wire shape of a reading as the collector expects it.
///
/// Field names are part of the collector contract and must not change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Payload {
    pub key: String,
    pub outside_temperature: f32,
    pub outside_humidity: f32,
    pub inside_temperature: f32,
    pub inside_humidity: f32,
}

impl From<&Reading> for Payload {
    fn from(reading: &Reading) -> Self {
        Self {
            key: reading.identity_key().to_owned(),
            outside_temperature: reading.outside().temperature,
            outside_humidity: reading.outside().humidity,
            inside_temperature: reading.inside().temperature,
            inside_humidity: reading.inside().humidity,
        }
    }
}

impl Payload {
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
