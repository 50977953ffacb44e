use std::fmt;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::InvalidTabError;
use crate::field::FilterFields;
use crate::filter::{FilterAction, FilterState, RowPredicate, compute_predicate, reduce};
use crate::tab::{TabSet, TabSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ViewEvent {
    RecordsChanged { total: usize },
    TabsChanged { reset_to_all: bool },
    FilterChanged { active_filters: usize },
}

/// What a toolbar and grid need to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    pub tabs: Vec<TabSummary>,
    pub state: FilterState,
    pub active_filters: usize,
    pub total: usize,
    pub visible: usize,
}

type Listener = Box<dyn FnMut(&ViewEvent, &ViewSnapshot)>;

/// One open list view: the collection, its tabs and the filter state,
/// kept consistent after every mutation.
///
/// Tab counts are refreshed whenever the records or the tabs change;
/// subscribers hear about every effective change. A view is owned by a
/// single page and is not meant to be shared across threads.
pub struct FilterView<R> {
    records: Vec<R>,
    tabs: TabSet<R>,
    state: FilterState,
    fields: FilterFields<R>,
    current_user: Option<String>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<R> fmt::Debug for FilterView<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterView")
            .field("records", &self.records.len())
            .field("tabs", &self.tabs)
            .field("state", &self.state)
            .field("fields", &self.fields)
            .field("current_user", &self.current_user)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<R> FilterView<R> {
    pub fn new(tabs: TabSet<R>, fields: FilterFields<R>) -> Self {
        Self {
            records: Vec::new(),
            tabs,
            state: FilterState::default(),
            fields,
            current_user: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn tabs(&self) -> &TabSet<R> {
        &self.tabs
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn fields(&self) -> &FilterFields<R> {
        &self.fields
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&ViewEvent, &ViewSnapshot) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    pub fn set_records(&mut self, records: Vec<R>) {
        self.records = records;
        self.tabs.recount(&self.records);
        debug!(total = self.records.len(), "records replaced; tab counts refreshed");
        self.notify(ViewEvent::RecordsChanged {
            total: self.records.len(),
        });
    }

    /// Swaps the tab strip. An active tab that no longer exists falls
    /// back to `all`.
    pub fn replace_tabs(&mut self, tabs: TabSet<R>) {
        self.tabs = tabs;
        self.tabs.recount(&self.records);
        let reset_to_all = self.state.retain_valid_tab(&self.tabs);
        self.notify(ViewEvent::TabsChanged { reset_to_all });
    }

    pub fn set_active_tab(&mut self, tab_id: &str) -> Result<(), InvalidTabError> {
        let before = self.state.clone();
        self.state.set_active_tab(tab_id, &self.tabs)?;
        self.after_state_change(&before);
        Ok(())
    }

    /// Unknown ids are logged and ignored.
    pub fn select_tab(&mut self, tab_id: &str) -> bool {
        self.dispatch(&FilterAction::SelectTab(tab_id.to_string()))
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) -> bool {
        self.dispatch(&FilterAction::Search(text.into()))
    }

    pub fn set_only_mine(&mut self, flag: bool) -> bool {
        self.dispatch(&FilterAction::OnlyMine(flag))
    }

    pub fn clear_all(&mut self) -> bool {
        self.dispatch(&FilterAction::ClearAll)
    }

    /// Runs one action through the reducer. Returns whether the state
    /// changed.
    pub fn dispatch(&mut self, action: &FilterAction) -> bool {
        let (next, changed) = reduce(self.state.clone(), action, &self.tabs);
        if changed {
            let before = std::mem::replace(&mut self.state, next);
            self.after_state_change(&before);
        }
        changed
    }

    pub fn set_current_user(&mut self, user: Option<String>) {
        if self.current_user == user {
            return;
        }
        self.current_user = user;
        if self.state.only_mine_active() {
            self.notify(ViewEvent::FilterChanged {
                active_filters: self.state.active_filter_count(),
            });
        }
    }

    pub fn predicate(&self) -> RowPredicate<R> {
        compute_predicate(&self.state, &self.tabs, &self.fields, self.current_user.as_deref())
    }

    pub fn visible(&self) -> Vec<&R> {
        self.predicate().apply(&self.records)
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            tabs: self.tabs.summaries(),
            state: self.state.clone(),
            active_filters: self.state.active_filter_count(),
            total: self.records.len(),
            visible: self.predicate().count(&self.records),
        }
    }

    fn after_state_change(&mut self, before: &FilterState) {
        if *before == self.state {
            return;
        }
        debug!(?before, after = ?self.state, "filter state changed");
        self.notify(ViewEvent::FilterChanged {
            active_filters: self.state.active_filter_count(),
        });
    }

    fn notify(&mut self, event: ViewEvent) {
        if self.listeners.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event, &snapshot);
        }
    }
}
