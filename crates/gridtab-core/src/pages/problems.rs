use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Page, iso_timestamp};
use crate::error::TabSetError;
use crate::field::{Field, FilterFields};
use crate::tab::{Tab, TabSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Problem {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub issue_time: String,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub task_name: String,
    #[serde(default)]
    pub issue_message: String,
    #[serde(default)]
    pub issue_url: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub farm_url: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub qb_id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub owner: String,
}

pub const STATUSES: [&str; 3] = ["Pending", "Resolved", "Ignored"];

fn status() -> Field<Problem> {
    Field::text("status", |p: &Problem| p.status.as_str())
}

fn owner() -> Field<Problem> {
    Field::text("owner", |p: &Problem| p.owner.as_str())
}

// The grid shows model and serial as one "device" cell.
fn device() -> Field<Problem> {
    Field::new("device", |p: &Problem| {
        Some(Cow::Owned(format!("{} ({})", p.model, p.serial)))
    })
}

fn columns() -> Vec<Field<Problem>> {
    vec![
        Field::text("issue_time", |p: &Problem| p.issue_time.as_str()),
        Field::text("server", |p: &Problem| p.server.as_str()),
        Field::text("task_name", |p: &Problem| p.task_name.as_str()),
        Field::text("issue_message", |p: &Problem| p.issue_message.as_str()),
        Field::text("note", |p: &Problem| p.note.as_str()),
        status(),
        owner(),
        device(),
    ]
}

pub fn page() -> Result<Page<Problem>, TabSetError> {
    let colors = ["#F59E0B", "#22C55E", "#637381"];
    let tabs = STATUSES
        .iter()
        .zip(colors)
        .map(|(s, color)| Tab::equals(*s, *s, status(), *s).with_color(color))
        .collect();

    Ok(Page {
        name: "problems".to_string(),
        tabs: TabSet::new(tabs)?,
        fields: FilterFields::new(columns()).with_owner(owner()),
        columns: columns(),
    })
}

pub fn mock(count: usize, now: DateTime<Utc>) -> Vec<Problem> {
    let stamp = iso_timestamp(now);
    (0..count)
        .map(|i| Problem {
            id: format!("problem-{i}"),
            issue_time: stamp.clone(),
            server: format!("server-{}", i % 5),
            task_name: format!("Task {i}"),
            issue_message: format!("Error in task {i}"),
            issue_url: format!("http://logs/issue/{i}"),
            note: if i % 2 == 0 { "Investigating" } else { "" }.to_string(),
            job: format!("job-{i}"),
            model: "Pixel 6".to_string(),
            farm_url: "http://farm/1".to_string(),
            serial: format!("SERIAL{i}"),
            os: "Android 14".to_string(),
            qb_id: format!("qb-{i}"),
            kind: "Infrastructure".to_string(),
            status: if i % 3 == 0 { "Resolved" } else { "Pending" }.to_string(),
            owner: if i % 2 == 0 { "Team A" } else { "Team B" }.to_string(),
        })
        .collect()
}
