//! Deserializers that read BSON-native values (ObjectId, BSON datetimes) into the
//! plain types the JSON API exposes. Views built by aggregation pipelines use
//! these so the same struct can be decoded from the database and serialized
//! to clients.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

pub fn object_id_as_hex<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    ObjectId::deserialize(deserializer).map(|id| id.to_hex())
}

pub fn object_ids_as_hex<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<ObjectId>::deserialize(deserializer).map(|ids| ids.iter().map(|id| id.to_hex()).collect())
}

pub fn bson_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    bson::DateTime::deserialize(deserializer).map(|dt| dt.to_chrono())
}

pub fn hex_ids(ids: &[ObjectId]) -> Vec<String> {
    ids.iter().map(|id| id.to_hex()).collect()
}
