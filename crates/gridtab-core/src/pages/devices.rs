use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Page, iso_timestamp};
use crate::error::TabSetError;
use crate::field::{Field, FilterFields};
use crate::tab::{Tab, TabSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub imei: String,
    #[serde(default)]
    pub serial_farm: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub label: String,
    pub serial: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub job_status: String,
    #[serde(default)]
    pub adb: Option<String>,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub create_time: String,
    #[serde(default)]
    pub update_time: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn job() -> Field<Device> {
    Field::text("job", |d: &Device| d.job.as_str())
}

fn adb() -> Field<Device> {
    Field::optional("adb", |d: &Device| d.adb.as_deref())
}

fn node() -> Field<Device> {
    Field::optional("node", |d: &Device| d.node.as_deref())
}

fn owner() -> Field<Device> {
    Field::text("owner", |d: &Device| d.owner.as_str())
}

fn columns() -> Vec<Field<Device>> {
    vec![
        Field::text("serial", |d: &Device| d.serial.as_str()),
        Field::text("model", |d: &Device| d.model.as_str()),
        owner(),
        job(),
        adb(),
        Field::text("note", |d: &Device| d.note.as_str()),
        Field::text("serial_farm", |d: &Device| d.serial_farm.as_str()),
        Field::text("host", |d: &Device| d.host.as_str()),
    ]
}

/// Running devices, devices awaiting audit (no node assigned) and
/// devices whose adb status is blank.
pub fn page() -> Result<Page<Device>, TabSetError> {
    let tabs = TabSet::new(vec![
        Tab::equals("running", "Running", job(), "Running").with_color("#3B82F6"),
        Tab::blank("audit", "Audit", node()).with_color("#F59E0B"),
        Tab::blank("adb-not-found", "adb error", adb()).with_color("#EF4444"),
    ])?;

    Ok(Page {
        name: "devices".to_string(),
        tabs,
        fields: FilterFields::new(columns()).with_owner(owner()),
        columns: columns(),
    })
}

pub fn mock(count: usize, now: DateTime<Utc>) -> Vec<Device> {
    let stamp = iso_timestamp(now);
    (0..count)
        .map(|i| Device {
            id: format!("device-{i}"),
            imei: format!("IMEI{i}"),
            serial_farm: format!("SF{i}"),
            model: "Pixel 7".to_string(),
            host: format!("host-{}", i % 10),
            note: String::new(),
            label: format!("Label {i}"),
            serial: format!("SERIAL{i}"),
            job: if i % 5 == 0 { "Running" } else { "Idle" }.to_string(),
            job_status: if i % 5 == 0 { "Active" } else { "Inactive" }.to_string(),
            adb: Some(if i % 10 == 0 { "Offline" } else { "Online" }.to_string()),
            owner: if i % 2 == 0 { "Team A" } else { "Team B" }.to_string(),
            node: None,
            create_time: stamp.clone(),
            update_time: stamp.clone(),
            extra: BTreeMap::new(),
        })
        .collect()
}
