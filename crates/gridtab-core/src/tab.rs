use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{
  Deserialize,
  Serialize
};
use tracing::trace;

use crate::error::TabSetError;
use crate::field::Field;

pub const ALL_TAB_ID: &str = "all";

type RowTest<R> =
  dyn Fn(&R) -> bool + Send + Sync;

/// How a tab decides membership. `Equals` and `Blank` are the two column
/// filter types the list pages drive their tabs with.
pub enum TabRule<R> {
  Always,
  Equals {
    field: Field<R>,
    value: String
  },
  Blank {
    field: Field<R>
  },
  Custom(Arc<RowTest<R>>)
}

impl<R> Clone for TabRule<R> {
  fn clone(&self) -> Self {
    match self {
      | Self::Always => Self::Always,
      | Self::Equals {
        field,
        value
      } => {
        Self::Equals {
          field: field.clone(),
          value: value.clone()
        }
      }
      | Self::Blank {
        field
      } => {
        Self::Blank {
          field: field.clone()
        }
      }
      | Self::Custom(test) => {
        Self::Custom(Arc::clone(test))
      }
    }
  }
}

impl<R> fmt::Debug for TabRule<R> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | Self::Always => {
        f.write_str("Always")
      }
      | Self::Equals {
        field,
        value
      } => {
        write!(
          f,
          "Equals({} == {value:?})",
          field.name()
        )
      }
      | Self::Blank {
        field
      } => {
        write!(
          f,
          "Blank({})",
          field.name()
        )
      }
      | Self::Custom(_) => {
        f.write_str("Custom")
      }
    }
  }
}

impl<R> TabRule<R> {
  pub fn matches(
    &self,
    record: &R
  ) -> bool {
    match self {
      | Self::Always => true,
      | Self::Equals {
        field,
        value
      } => {
        field.value(record).as_deref()
          == Some(value.as_str())
      }
      | Self::Blank {
        field
      } => {
        field
          .value(record)
          .map(|v| v.trim().is_empty())
          .unwrap_or(true)
      }
      | Self::Custom(test) => test(record)
    }
  }
}

pub struct Tab<R> {
  pub id:    String,
  pub label: String,
  pub color: Option<String>,
  pub count: usize,
  rule:      TabRule<R>
}

impl<R> Clone for Tab<R> {
  fn clone(&self) -> Self {
    Self {
      id:    self.id.clone(),
      label: self.label.clone(),
      color: self.color.clone(),
      count: self.count,
      rule:  self.rule.clone()
    }
  }
}

impl<R> fmt::Debug for Tab<R> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("Tab")
      .field("id", &self.id)
      .field("label", &self.label)
      .field("color", &self.color)
      .field("count", &self.count)
      .field("rule", &self.rule)
      .finish()
  }
}

impl<R> Tab<R> {
  pub fn new(
    id: impl Into<String>,
    label: impl Into<String>,
    rule: TabRule<R>
  ) -> Self {
    Self {
      id: id.into(),
      label: label.into(),
      color: None,
      count: 0,
      rule
    }
  }

  pub fn all(
    label: impl Into<String>
  ) -> Self {
    Self::new(
      ALL_TAB_ID,
      label,
      TabRule::Always
    )
  }

  pub fn equals(
    id: impl Into<String>,
    label: impl Into<String>,
    field: Field<R>,
    value: impl Into<String>
  ) -> Self {
    Self::new(id, label, TabRule::Equals {
      field,
      value: value.into()
    })
  }

  pub fn blank(
    id: impl Into<String>,
    label: impl Into<String>,
    field: Field<R>
  ) -> Self {
    Self::new(id, label, TabRule::Blank {
      field
    })
  }

  pub fn custom<F>(
    id: impl Into<String>,
    label: impl Into<String>,
    test: F
  ) -> Self
  where
    F: Fn(&R) -> bool
      + Send
      + Sync
      + 'static
  {
    Self::new(
      id,
      label,
      TabRule::Custom(Arc::new(test))
    )
  }

  pub fn with_color(
    mut self,
    color: impl Into<String>
  ) -> Self {
    self.color = Some(color.into());
    self
  }

  pub fn rule(&self) -> &TabRule<R> {
    &self.rule
  }

  pub fn matches(
    &self,
    record: &R
  ) -> bool {
    self.rule.matches(record)
  }

  pub fn summary(&self) -> TabSummary {
    TabSummary {
      id:    self.id.clone(),
      label: self.label.clone(),
      color: self.color.clone(),
      count: self.count
    }
  }
}

/// Record-free view of a tab, suitable for rendering and JSON output.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct TabSummary {
  pub id:    String,
  pub label: String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub color: Option<String>,
  pub count: usize
}

/// Returns `tabs` with every `count` recomputed over the whole of
/// `records`. Counts never look at the filter state.
pub fn compute_tab_counts<R>(
  tabs: &[Tab<R>],
  records: &[R]
) -> Vec<Tab<R>> {
  tabs
    .iter()
    .map(|tab| {
      let count = records
        .iter()
        .filter(|record| {
          tab.matches(record)
        })
        .count();
      let mut tab = tab.clone();
      tab.count = count;
      trace!(tab = %tab.id, count = tab.count, "recounted tab");
      tab
    })
    .collect()
}

/// Ordered tabs with the synthetic `all` tab always first.
pub struct TabSet<R> {
  tabs: Vec<Tab<R>>
}

impl<R> Clone for TabSet<R> {
  fn clone(&self) -> Self {
    Self {
      tabs: self.tabs.clone()
    }
  }
}

impl<R> fmt::Debug for TabSet<R> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_list()
      .entries(self.tabs.iter())
      .finish()
  }
}

impl<R> TabSet<R> {
  pub fn new(
    tabs: Vec<Tab<R>>
  ) -> Result<Self, TabSetError> {
    Self::with_all_label("All", tabs)
  }

  pub fn with_all_label(
    all_label: impl Into<String>,
    tabs: Vec<Tab<R>>
  ) -> Result<Self, TabSetError> {
    let mut seen = HashSet::new();
    for tab in &tabs {
      if tab.id == ALL_TAB_ID {
        return Err(
          TabSetError::ReservedId(
            tab.id.clone()
          )
        );
      }
      if !seen.insert(tab.id.as_str()) {
        return Err(
          TabSetError::DuplicateId(
            tab.id.clone()
          )
        );
      }
    }

    let mut out =
      Vec::with_capacity(tabs.len() + 1);
    out.push(Tab::all(all_label));
    out.extend(tabs);
    Ok(Self {
      tabs: out
    })
  }

  pub fn contains(
    &self,
    id: &str
  ) -> bool {
    self.get(id).is_some()
  }

  pub fn get(
    &self,
    id: &str
  ) -> Option<&Tab<R>> {
    self
      .tabs
      .iter()
      .find(|tab| tab.id == id)
  }

  /// The synthetic always-true tab.
  pub fn all_tab(&self) -> &Tab<R> {
    &self.tabs[0]
  }

  pub fn set_all_label(
    &mut self,
    label: impl Into<String>
  ) {
    if let Some(all) = self.tabs.first_mut()
    {
      all.label = label.into();
    }
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = &Tab<R>> {
    self.tabs.iter()
  }

  pub fn as_slice(&self) -> &[Tab<R>] {
    &self.tabs
  }

  pub fn len(&self) -> usize {
    self.tabs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tabs.is_empty()
  }

  pub fn recount(
    &mut self,
    records: &[R]
  ) {
    self.tabs = compute_tab_counts(
      &self.tabs, records
    );
  }

  pub fn summaries(
    &self
  ) -> Vec<TabSummary> {
    self
      .tabs
      .iter()
      .map(Tab::summary)
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::{
    ALL_TAB_ID,
    Tab,
    TabSet,
    compute_tab_counts
  };
  use crate::error::TabSetError;
  use crate::field::Field;

  struct Row {
    status: &'static str,
    adb:    Option<&'static str>
  }

  fn status() -> Field<Row> {
    Field::text("status", |r: &Row| {
      r.status
    })
  }

  fn status_tabs() -> TabSet<Row> {
    TabSet::new(vec![
      Tab::equals(
        "Pending",
        "Pending",
        status(),
        "Pending"
      ),
      Tab::equals(
        "Resolved",
        "Resolved",
        status(),
        "Resolved"
      ),
    ])
    .expect("valid tabs")
  }

  fn count_of(
    tabs: &TabSet<Row>,
    id: &str
  ) -> usize {
    tabs
      .get(id)
      .map(|tab| tab.count)
      .expect("tab present")
  }

  #[test]
  fn counts_reflect_whole_collection() {
    let rows = vec![
      Row {
        status: "Pending",
        adb:    None
      },
      Row {
        status: "Resolved",
        adb:    None
      },
      Row {
        status: "Pending",
        adb:    None
      },
    ];

    let mut tabs = status_tabs();
    tabs.recount(&rows);

    assert_eq!(count_of(&tabs, ALL_TAB_ID), 3);
    assert_eq!(count_of(&tabs, "Pending"), 2);
    assert_eq!(count_of(&tabs, "Resolved"), 1);
  }

  #[test]
  fn empty_collection_zeroes_every_tab() {
    let tabs = status_tabs();
    let counted = compute_tab_counts(
      tabs.as_slice(),
      &[]
    );
    assert!(
      counted
        .iter()
        .all(|tab| tab.count == 0)
    );
  }

  #[test]
  fn blank_rule_matches_missing_and_whitespace()
   {
    let adb = Field::optional(
      "adb",
      |r: &Row| r.adb
    );
    let tab =
      Tab::blank("adb-not-found", "adb error", adb);

    let missing = Row {
      status: "x",
      adb:    None
    };
    let spaces = Row {
      status: "x",
      adb:    Some("  ")
    };
    let online = Row {
      status: "x",
      adb:    Some("Online")
    };

    assert!(tab.matches(&missing));
    assert!(tab.matches(&spaces));
    assert!(!tab.matches(&online));
  }

  #[test]
  fn rejects_reserved_and_duplicate_ids() {
    let reserved = TabSet::new(vec![
      Tab::<Row>::custom(
        ALL_TAB_ID,
        "Everything",
        |_| true
      ),
    ]);
    assert_eq!(
      reserved.err(),
      Some(TabSetError::ReservedId(
        ALL_TAB_ID.to_string()
      ))
    );

    let duplicate = TabSet::new(vec![
      Tab::equals("a", "A", status(), "A"),
      Tab::equals("a", "A2", status(), "B"),
    ]);
    assert_eq!(
      duplicate.err(),
      Some(TabSetError::DuplicateId(
        "a".to_string()
      ))
    );
  }

  #[test]
  fn all_tab_is_first_and_labelled() {
    let tabs = TabSet::<Row>::with_all_label(
      "Everything",
      vec![]
    )
    .expect("valid tabs");
    assert_eq!(tabs.len(), 1);
    assert_eq!(tabs.all_tab().id, ALL_TAB_ID);
    assert_eq!(
      tabs.all_tab().label,
      "Everything"
    );
  }
}
