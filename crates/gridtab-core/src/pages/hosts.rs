use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Page, iso_timestamp};
use crate::error::TabSetError;
use crate::field::{Field, FilterFields};
use crate::tab::{Tab, TabSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerialHr {
    #[serde(rename = "_no")]
    pub no: String,
}

/// Asset-register row. Only the columns the grid filters or searches on
/// are typed; the long tail of asset metadata rides along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Host {
    #[serde(rename = "_id")]
    pub id: String,
    pub asset_no: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub jenkins_url: Option<String>,
    #[serde(default)]
    pub town_status: Option<String>,
    #[serde(default)]
    pub zabbix_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_hr: Option<SerialHr>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn town_status() -> Field<Host> {
    Field::optional("town_status", |h: &Host| h.town_status.as_deref())
}

fn owner() -> Field<Host> {
    Field::optional("owner", |h: &Host| h.owner.as_deref())
}

fn columns() -> Vec<Field<Host>> {
    vec![
        Field::text("asset_no", |h: &Host| h.asset_no.as_str()),
        Field::optional("hostname", |h: &Host| h.hostname.as_deref()),
        Field::optional("ip", |h: &Host| h.ip.as_deref()),
        Field::optional("mac", |h: &Host| h.mac.as_deref()),
        Field::optional("serial", |h: &Host| h.serial.as_deref()),
        Field::optional("os", |h: &Host| h.os.as_deref()),
        Field::optional("comment", |h: &Host| h.comment.as_deref()),
        town_status(),
        Field::optional("zabbix_status", |h: &Host| h.zabbix_status.as_deref()),
        Field::optional("status", |h: &Host| h.status.as_deref()),
        owner(),
        Field::optional("model", |h: &Host| h.model.as_deref()),
        Field::optional("serial_hr._no", |h: &Host| {
            h.serial_hr.as_ref().map(|s| s.no.as_str())
        }),
    ]
}

pub fn page() -> Result<Page<Host>, TabSetError> {
    let tabs = TabSet::new(vec![
        Tab::equals("Active", "Active", town_status(), "Active").with_color("#22C55E"),
        Tab::equals("Inactive", "Inactive", town_status(), "Inactive").with_color("#FF5630"),
    ])?;

    Ok(Page {
        name: "hosts".to_string(),
        tabs,
        fields: FilterFields::new(columns()).with_owner(owner()),
        columns: columns(),
    })
}

pub fn mock(count: usize, now: DateTime<Utc>) -> Vec<Host> {
    let stamp = iso_timestamp(now);
    (0..count)
        .map(|i| {
            let mut extra = BTreeMap::new();
            extra.insert("asset_name".to_string(), Value::from(format!("Workstation-{i}")));
            extra.insert("pic".to_string(), Value::from(format!("Manager {}", i % 5)));
            extra.insert("floor".to_string(), Value::from(format!("{}", (i % 5) + 1)));
            extra.insert("create_time".to_string(), Value::from(stamp.clone()));

            Host {
                id: format!("host-{i}"),
                asset_no: format!("ASSET{i}"),
                hostname: Some(format!("host-{i}.local")),
                ip: Some(format!("192.168.1.{i}")),
                mac: Some(format!("00:11:22:33:44:{i:02}")),
                serial: Some(format!("SN-{}", 1000 + i)),
                os: Some(if i % 2 == 0 { "Windows 10" } else { "Ubuntu 20.04" }.to_string()),
                comment: Some(
                    if i % 3 == 0 { "Needs maintenance" } else { "Operational" }.to_string(),
                ),
                jenkins_url: Some(format!("http://jenkins/job/build-{i}")),
                town_status: Some(if i % 2 == 0 { "Active" } else { "Inactive" }.to_string()),
                zabbix_status: Some("Monitored".to_string()),
                status: Some("In Use".to_string()),
                owner: Some(format!("User {i}")),
                model: Some("Dell Precision 5550".to_string()),
                serial_hr: Some(SerialHr {
                    no: format!("HR-SN-{i}"),
                }),
                extra,
            }
        })
        .collect()
}
