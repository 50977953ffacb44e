use serde::Serialize;
use tracing::{
  debug,
  trace,
  warn
};

use crate::error::InvalidTabError;
use crate::field::{
  Field,
  FilterFields
};
use crate::tab::{
  ALL_TAB_ID,
  TabRule,
  TabSet
};

/// Toolbar state of one list view: selected tab, quick-search text and
/// the "only mine" toggle.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct FilterState {
  active_tab_id:    String,
  search_text:      String,
  only_mine_active: bool
}

impl Default for FilterState {
  fn default() -> Self {
    Self {
      active_tab_id:    ALL_TAB_ID
        .to_string(),
      search_text:      String::new(),
      only_mine_active: false
    }
  }
}

impl FilterState {
  pub fn active_tab_id(&self) -> &str {
    &self.active_tab_id
  }

  pub fn search_text(&self) -> &str {
    &self.search_text
  }

  pub fn only_mine_active(
    &self
  ) -> bool {
    self.only_mine_active
  }

  #[tracing::instrument(skip(self, tabs))]
  pub fn set_active_tab<R>(
    &mut self,
    tab_id: &str,
    tabs: &TabSet<R>
  ) -> Result<(), InvalidTabError> {
    if !tabs.contains(tab_id) {
      return Err(InvalidTabError {
        id: tab_id.to_string()
      });
    }
    debug!(from = %self.active_tab_id, to = %tab_id, "switching tab");
    self.active_tab_id =
      tab_id.to_string();
    Ok(())
  }

  /// Like `set_active_tab`, but an unknown id is logged and ignored.
  /// Returns whether the selection changed.
  pub fn select_tab<R>(
    &mut self,
    tab_id: &str,
    tabs: &TabSet<R>
  ) -> bool {
    let before = self.clone();
    match self
      .set_active_tab(tab_id, tabs)
    {
      | Ok(()) => *self != before,
      | Err(err) => {
        warn!(
          error = %err,
          kept = %self.active_tab_id,
          "ignoring tab selection"
        );
        false
      }
    }
  }

  /// Stored verbatim; trimming happens when matching.
  pub fn set_search_text(
    &mut self,
    text: impl Into<String>
  ) {
    self.search_text = text.into();
    trace!(search = %self.search_text, "search text updated");
  }

  pub fn set_only_mine(
    &mut self,
    flag: bool
  ) {
    self.only_mine_active = flag;
  }

  pub fn clear_all(&mut self) {
    *self = Self::default();
  }

  /// Falls back to the all tab when the selected id no longer exists.
  /// Returns true if the selection was reset.
  pub fn retain_valid_tab<R>(
    &mut self,
    tabs: &TabSet<R>
  ) -> bool {
    if tabs.contains(&self.active_tab_id)
    {
      return false;
    }
    debug!(
      stale = %self.active_tab_id,
      "active tab vanished; resetting to all"
    );
    self.active_tab_id =
      ALL_TAB_ID.to_string();
    true
  }

  /// Trimmed, lower-cased search text, or `None` when blank.
  pub fn search_needle(
    &self
  ) -> Option<String> {
    let trimmed =
      self.search_text.trim();
    if trimmed.is_empty() {
      None
    } else {
      Some(trimmed.to_lowercase())
    }
  }

  pub fn active_filter_count(
    &self
  ) -> usize {
    active_filter_count(self)
  }
}

/// Number of toolbar dimensions that differ from their defaults.
pub fn active_filter_count(
  state: &FilterState
) -> usize {
  let mut count = 0;
  if state.active_tab_id != ALL_TAB_ID {
    count += 1;
  }
  if !state.search_text.trim().is_empty()
  {
    count += 1;
  }
  if state.only_mine_active {
    count += 1;
  }
  count
}

/// The combined row test for one filter state: tab, then search, then
/// owner.
pub struct RowPredicate<R> {
  tab:    TabRule<R>,
  needle: Option<String>,
  search: Vec<Field<R>>,
  owner:  Option<(Field<R>, String)>
}

impl<R> RowPredicate<R> {
  pub fn matches(
    &self,
    record: &R
  ) -> bool {
    if !self.tab.matches(record) {
      return false;
    }

    if let Some(needle) = &self.needle
      && !self.search.iter().any(|field| {
        field.contains_ignore_case(
          record, needle
        )
      })
    {
      return false;
    }

    if let Some((field, user)) =
      &self.owner
      && !field.contains(record, user)
    {
      return false;
    }

    true
  }

  /// Matching rows, in collection order.
  pub fn apply<'a>(
    &self,
    records: &'a [R]
  ) -> Vec<&'a R> {
    records
      .iter()
      .filter(|record| self.matches(record))
      .collect()
  }

  pub fn count(
    &self,
    records: &[R]
  ) -> usize {
    records
      .iter()
      .filter(|record| self.matches(record))
      .count()
  }

  pub fn into_fn(
    self
  ) -> impl Fn(&R) -> bool {
    move |record: &R| self.matches(record)
  }
}

#[tracing::instrument(skip(
  state, tabs, fields
))]
pub fn compute_predicate<R>(
  state: &FilterState,
  tabs: &TabSet<R>,
  fields: &FilterFields<R>,
  current_user_id: Option<&str>
) -> RowPredicate<R> {
  let tab = tabs
    .get(&state.active_tab_id)
    .unwrap_or_else(|| tabs.all_tab())
    .rule()
    .clone();

  let owner = if state.only_mine_active {
    let user = current_user_id
      .map(str::trim)
      .filter(|user| !user.is_empty());
    match (&fields.owner, user) {
      | (Some(field), Some(user)) => {
        Some((
          field.clone(),
          user.to_string()
        ))
      }
      | (None, _) => {
        debug!(
          "only-mine requested but no \
           owner field is configured"
        );
        None
      }
      | (_, None) => {
        debug!(
          "only-mine requested without \
           a current user"
        );
        None
      }
    }
  } else {
    None
  };

  RowPredicate {
    tab,
    needle: state.search_needle(),
    search: fields.search.clone(),
    owner
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
  SelectTab(String),
  Search(String),
  OnlyMine(bool),
  ClearAll
}

/// Applies one action and reports whether the state changed. Unknown
/// tab ids leave the state as it was.
pub fn reduce<R>(
  mut state: FilterState,
  action: &FilterAction,
  tabs: &TabSet<R>
) -> (FilterState, bool) {
  let before = state.clone();
  match action {
    | FilterAction::SelectTab(id) => {
      state.select_tab(id, tabs);
    }
    | FilterAction::Search(text) => {
      state.set_search_text(text.clone());
    }
    | FilterAction::OnlyMine(flag) => {
      state.set_only_mine(*flag);
    }
    | FilterAction::ClearAll => {
      state.clear_all();
    }
  }
  let changed = state != before;
  (state, changed)
}

#[cfg(test)]
mod tests {
  use serde_json::{
    Value,
    json
  };

  use super::{
    FilterAction,
    FilterState,
    active_filter_count,
    compute_predicate,
    reduce
  };
  use crate::field::{
    Field,
    FilterFields
  };
  use crate::tab::{
    ALL_TAB_ID,
    Tab,
    TabSet
  };

  fn tabs() -> TabSet<Value> {
    TabSet::new(vec![
      Tab::equals(
        "Pending",
        "Pending",
        Field::json("status"),
        "Pending"
      ),
      Tab::equals(
        "Resolved",
        "Resolved",
        Field::json("status"),
        "Resolved"
      ),
    ])
    .expect("valid tabs")
  }

  fn owner_fields() -> FilterFields<Value> {
    FilterFields::new(vec![
      Field::json("owner"),
    ])
    .with_owner(Field::json("owner"))
  }

  #[test]
  fn unknown_tab_keeps_previous_selection()
  {
    let tabs = tabs();
    let mut state =
      FilterState::default();
    state
      .set_active_tab("Pending", &tabs)
      .expect("known tab");

    let err = state
      .set_active_tab("Archived", &tabs)
      .expect_err("unknown tab");
    assert_eq!(err.id, "Archived");
    assert_eq!(
      state.active_tab_id(),
      "Pending"
    );

    assert!(
      !state.select_tab("Archived", &tabs)
    );
    assert_eq!(
      state.active_tab_id(),
      "Pending"
    );
  }

  #[test]
  fn stale_tab_id_falls_back_to_all() {
    let mut state =
      FilterState::default();
    state
      .set_active_tab("Pending", &tabs())
      .expect("known tab");

    let narrower = TabSet::new(vec![
      Tab::equals(
        "Resolved",
        "Resolved",
        Field::json("status"),
        "Resolved"
      ),
    ])
    .expect("valid tabs");
    let pred = compute_predicate(
      &state,
      &narrower,
      &owner_fields(),
      None
    );

    assert_eq!(
      state.active_tab_id(),
      "Pending"
    );
    assert!(pred.matches(
      &json!({ "status": "Resolved" })
    ));
    assert!(pred.matches(
      &json!({ "status": "Pending" })
    ));
  }

  #[test]
  fn default_state_has_no_active_filters()
  {
    assert_eq!(
      active_filter_count(
        &FilterState::default()
      ),
      0
    );
  }

  #[test]
  fn every_dimension_counts_once() {
    let tabs = tabs();
    let mut state =
      FilterState::default();
    state
      .set_active_tab("Resolved", &tabs)
      .expect("known tab");
    state.set_search_text("  disk ");
    state.set_only_mine(true);
    assert_eq!(
      state.active_filter_count(),
      3
    );

    state.clear_all();
    assert_eq!(
      state.active_filter_count(),
      0
    );
    assert_eq!(
      state,
      FilterState::default()
    );
  }

  #[test]
  fn whitespace_search_is_inactive() {
    let mut state =
      FilterState::default();
    state.set_search_text("   \t");
    assert_eq!(state.search_text(), "   \t");
    assert_eq!(
      state.active_filter_count(),
      0
    );
    assert!(state.search_needle().is_none());

    let rows = vec![
      json!({ "owner": "Team A" }),
      json!({ "owner": "Team B" }),
    ];
    let pred = compute_predicate(
      &state,
      &tabs(),
      &owner_fields(),
      None
    );
    assert_eq!(pred.count(&rows), 2);
  }

  #[test]
  fn search_is_case_insensitive_substring()
  {
    let mut state =
      FilterState::default();
    state.set_search_text("team a");

    let pred = compute_predicate(
      &state,
      &tabs(),
      &owner_fields(),
      None
    );
    assert!(
      pred.matches(
        &json!({ "owner": "Team A" })
      )
    );
    assert!(
      !pred.matches(
        &json!({ "owner": "Team B" })
      )
    );
  }

  #[test]
  fn search_with_no_fields_matches_nothing()
  {
    let mut state =
      FilterState::default();
    state.set_search_text("anything");
    let pred = compute_predicate(
      &state,
      &tabs(),
      &FilterFields::default(),
      None
    );
    assert!(
      !pred.matches(
        &json!({ "owner": "anything" })
      )
    );
  }

  #[test]
  fn repeated_search_text_is_idempotent()
  {
    let mut once =
      FilterState::default();
    once.set_search_text("pixel");

    let mut twice =
      FilterState::default();
    twice.set_search_text("pixel");
    twice.set_search_text("pixel");

    assert_eq!(once, twice);
  }

  #[test]
  fn only_mine_uses_substring_contains() {
    let mut state =
      FilterState::default();
    state.set_only_mine(true);

    let pred = compute_predicate(
      &state,
      &tabs(),
      &owner_fields(),
      Some("alice")
    );
    assert!(pred.matches(
      &json!({ "owner": "alice.smith" })
    ));
    assert!(
      !pred.matches(
        &json!({ "owner": "Alice" })
      )
    );
    assert!(
      !pred
        .matches(&json!({ "note": "x" }))
    );
  }

  #[test]
  fn only_mine_without_user_does_not_restrict()
   {
    let mut state =
      FilterState::default();
    state.set_only_mine(true);

    let pred = compute_predicate(
      &state,
      &tabs(),
      &owner_fields(),
      None
    );
    assert!(
      pred.matches(
        &json!({ "owner": "bob" })
      )
    );
    assert_eq!(
      state.active_filter_count(),
      1
    );
  }

  #[test]
  fn predicate_combines_tab_search_and_owner()
   {
    let tabs = tabs();
    let mut state =
      FilterState::default();
    state
      .set_active_tab("Pending", &tabs)
      .expect("known tab");
    state.set_search_text("disk");
    state.set_only_mine(true);

    let fields = FilterFields::new(vec![
      Field::json("message"),
    ])
    .with_owner(Field::json("owner"));

    let rows = vec![
      json!({ "status": "Pending", "message": "Disk full", "owner": "alice" }),
      json!({ "status": "Resolved", "message": "Disk full", "owner": "alice" }),
      json!({ "status": "Pending", "message": "CPU hot", "owner": "alice" }),
      json!({ "status": "Pending", "message": "disk slow", "owner": "bob" }),
    ];

    let pred = compute_predicate(
      &state,
      &tabs,
      &fields,
      Some("alice")
    );
    let hits = pred.apply(&rows);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["message"], "Disk full");
  }

  #[test]
  fn predicate_into_fn_filters_like_apply() {
    let mut state =
      FilterState::default();
    state.set_search_text("b");
    let rows = vec![
      json!({ "owner": "Team A" }),
      json!({ "owner": "Team B" }),
    ];
    let test = compute_predicate(
      &state,
      &tabs(),
      &owner_fields(),
      None
    )
    .into_fn();
    let kept: Vec<&Value> =
      rows.iter().filter(|r| test(*r)).collect();
    assert_eq!(kept, vec![&rows[1]]);
  }

  #[test]
  fn reducer_reports_changes() {
    let tabs = tabs();
    let state = FilterState::default();

    let (state, changed) = reduce(
      state,
      &FilterAction::SelectTab(
        "Resolved".to_string()
      ),
      &tabs
    );
    assert!(changed);
    assert_eq!(
      state.active_tab_id(),
      "Resolved"
    );

    let (state, changed) = reduce(
      state,
      &FilterAction::SelectTab(
        "nope".to_string()
      ),
      &tabs
    );
    assert!(!changed);
    assert_eq!(
      state.active_tab_id(),
      "Resolved"
    );

    let (state, changed) = reduce(
      state,
      &FilterAction::OnlyMine(true),
      &tabs
    );
    assert!(changed);

    let (state, changed) = reduce(
      state,
      &FilterAction::ClearAll,
      &tabs
    );
    assert!(changed);
    assert_eq!(
      state.active_tab_id(),
      ALL_TAB_ID
    );
    assert_eq!(
      state.active_filter_count(),
      0
    );
  }
}
