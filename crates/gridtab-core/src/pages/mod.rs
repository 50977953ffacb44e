//! The built-in list pages: typed records, their tab strips, search
//! fields and mock collections.

pub mod devices;
pub mod hosts;
pub mod problems;
pub mod task_history;

use std::fmt;

use chrono::{
  DateTime,
  SecondsFormat,
  Utc
};
use clap::ValueEnum;
use serde::{
  Deserialize,
  Serialize
};

use crate::field::{
  Field,
  FilterFields
};
use crate::tab::TabSet;
use crate::view::FilterView;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
  Devices,
  Hosts,
  Problems,
  TaskHistory
}

impl PageKind {
  pub const ALL: [PageKind; 4] = [
    PageKind::Devices,
    PageKind::Hosts,
    PageKind::Problems,
    PageKind::TaskHistory
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      | PageKind::Devices => "devices",
      | PageKind::Hosts => "hosts",
      | PageKind::Problems => "problems",
      | PageKind::TaskHistory => {
        "task-history"
      }
    }
  }

  pub fn parse(
    raw: &str
  ) -> Option<PageKind> {
    let wanted =
      raw.trim().to_ascii_lowercase();
    Self::ALL.into_iter().find(|kind| {
      kind.as_str() == wanted
        || kind
          .as_str()
          .replace('-', "_")
          == wanted
    })
  }
}

impl fmt::Display for PageKind {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Everything a list page contributes to the filter machinery.
pub struct Page<R> {
  pub name:    String,
  pub tabs:    TabSet<R>,
  pub fields:  FilterFields<R>,
  /// Grid columns, in display order.
  pub columns: Vec<Field<R>>
}

impl<R> fmt::Debug for Page<R> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("Page")
      .field("name", &self.name)
      .field("tabs", &self.tabs)
      .field("fields", &self.fields)
      .field(
        "columns",
        &self
          .columns
          .iter()
          .map(Field::name)
          .collect::<Vec<_>>()
      )
      .finish()
  }
}

impl<R> Page<R> {
  pub fn into_view(
    self,
    records: Vec<R>,
    current_user: Option<String>
  ) -> FilterView<R> {
    let mut view = FilterView::new(
      self.tabs,
      self.fields
    );
    view.set_current_user(current_user);
    view.set_records(records);
    view
  }
}

pub(crate) fn iso_timestamp(
  now: DateTime<Utc>
) -> String {
  now.to_rfc3339_opts(
    SecondsFormat::Millis,
    true
  )
}

#[cfg(test)]
mod tests {
  use super::PageKind;

  #[test]
  fn parses_kebab_and_snake_names() {
    assert_eq!(
      PageKind::parse("task-history"),
      Some(PageKind::TaskHistory)
    );
    assert_eq!(
      PageKind::parse("Task_History"),
      Some(PageKind::TaskHistory)
    );
    assert_eq!(
      PageKind::parse("hosts"),
      Some(PageKind::Hosts)
    );
    assert_eq!(
      PageKind::parse("servers"),
      None
    );
  }
}
