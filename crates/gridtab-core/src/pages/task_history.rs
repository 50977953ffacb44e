use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Page, iso_timestamp};
use crate::error::TabSetError;
use crate::field::{Field, FilterFields};
use crate::tab::{Tab, TabSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskRun {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub create_time: String,
    #[serde(default)]
    pub task_name: String,
    #[serde(default)]
    pub task_status: String,
    #[serde(default)]
    pub harvester: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub android_serial: String,
    #[serde(default)]
    pub ssid: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub ts_user: String,
    #[serde(default)]
    pub domains_blocked: Vec<String>,
    #[serde(default)]
    pub end_time: String,
}

fn task_status() -> Field<TaskRun> {
    Field::text("task_status", |t: &TaskRun| t.task_status.as_str())
}

fn columns() -> Vec<Field<TaskRun>> {
    vec![
        Field::text("create_time", |t: &TaskRun| t.create_time.as_str()),
        Field::text("task_name", |t: &TaskRun| t.task_name.as_str()),
        task_status(),
        Field::new("domains_blocked", |t: &TaskRun| {
            Some(Cow::Owned(t.domains_blocked.join(", ")))
        }),
        Field::text("harvester", |t: &TaskRun| t.harvester.as_str()),
        Field::text("model", |t: &TaskRun| t.model.as_str()),
    ]
}

/// Task history has no owner column, so "only mine" never narrows it.
pub fn page() -> Result<Page<TaskRun>, TabSetError> {
    let tabs = TabSet::new(vec![
        Tab::equals("Success", "Success", task_status(), "Success").with_color("#22C55E"),
        Tab::equals("Failed", "Failed", task_status(), "Failed").with_color("#FF5630"),
    ])?;

    Ok(Page {
        name: "task-history".to_string(),
        tabs,
        fields: FilterFields::new(columns()),
        columns: columns(),
    })
}

pub fn mock(count: usize, now: DateTime<Utc>) -> Vec<TaskRun> {
    let stamp = iso_timestamp(now);
    (0..count)
        .map(|i| TaskRun {
            id: format!("task-{i}"),
            create_time: stamp.clone(),
            task_name: format!("Task {i}"),
            task_status: if i % 4 == 0 { "Failed" } else { "Success" }.to_string(),
            harvester: format!("Harvester {}", i % 3),
            model: "Pixel 8".to_string(),
            os: "Android 14".to_string(),
            android_serial: format!("SERIAL{i}"),
            ssid: "WiFi-Guest".to_string(),
            url: "http://task/1".to_string(),
            ip: format!("10.0.0.{i}"),
            mac: format!("00:00:00:00:00:{i}"),
            ts_user: "admin".to_string(),
            domains_blocked: if i % 5 == 0 {
                vec!["google.com".to_string(), "facebook.com".to_string()]
            } else {
                vec![]
            },
            end_time: stamp.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{mock, page};
    use crate::filter::{FilterState, compute_predicate};

    #[test]
    fn failed_runs_every_fourth_task() {
        let mut page = page().expect("task history page");
        let runs = mock(50, Utc::now());
        page.tabs.recount(&runs);

        assert_eq!(page.tabs.get("Failed").map(|t| t.count), Some(13));
        assert_eq!(page.tabs.get("Success").map(|t| t.count), Some(37));
    }

    #[test]
    fn only_mine_is_inert_without_owner_column() {
        let page = page().expect("task history page");
        let runs = mock(8, Utc::now());

        let mut state = FilterState::default();
        state.set_only_mine(true);
        let pred = compute_predicate(&state, &page.tabs, &page.fields, Some("admin"));
        assert_eq!(pred.count(&runs), 8);
        assert_eq!(state.active_filter_count(), 1);
    }

    #[test]
    fn blocked_domains_are_searchable() {
        let page = page().expect("task history page");
        let runs = mock(20, Utc::now());

        let mut state = FilterState::default();
        state.set_search_text("FACEBOOK");
        let pred = compute_predicate(&state, &page.tabs, &page.fields, None);
        assert_eq!(pred.count(&runs), 4);
    }
}
