use std::fs;
use std::path::Path;

use anyhow::{
  Context,
  bail
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{
  debug,
  info
};

use crate::field::{
  Field,
  FilterFields
};
use crate::pages::Page;
use crate::tab::{
  Tab,
  TabSet
};

/// A list page described in TOML, filtering untyped JSON rows.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preset {
  pub name:          String,
  #[serde(default)]
  pub all_label:     Option<String>,
  #[serde(default)]
  pub owner_field:   Option<String>,
  #[serde(default)]
  pub search_fields: Vec<String>,
  #[serde(default)]
  pub columns:       Vec<String>,
  #[serde(default)]
  pub tabs:          Vec<PresetTab>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetTab {
  pub id:     String,
  #[serde(default)]
  pub label:  Option<String>,
  #[serde(default)]
  pub color:  Option<String>,
  pub field:  String,
  #[serde(default)]
  pub equals: Option<String>,
  #[serde(default)]
  pub blank:  bool
}

impl Preset {
  #[tracing::instrument]
  pub fn load(
    path: &Path
  ) -> anyhow::Result<Self> {
    let text = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read preset {}",
          path.display()
        )
      })?;
    let preset = Self::parse(&text)
      .with_context(|| {
        format!(
          "invalid preset {}",
          path.display()
        )
      })?;
    info!(
      preset = %preset.name,
      tabs = preset.tabs.len(),
      "loaded preset"
    );
    Ok(preset)
  }

  pub fn parse(
    text: &str
  ) -> anyhow::Result<Self> {
    toml::from_str(text)
      .context("invalid preset TOML")
  }

  pub fn into_page(
    self
  ) -> anyhow::Result<Page<Value>> {
    let mut tabs =
      Vec::with_capacity(self.tabs.len());
    for tab in self.tabs {
      tabs.push(tab.into_tab()?);
    }
    let tabs = match self.all_label {
      | Some(label) => {
        TabSet::with_all_label(label, tabs)
      }
      | None => TabSet::new(tabs)
    }
    .with_context(|| {
      format!(
        "preset '{}' has an invalid tab \
         strip",
        self.name
      )
    })?;

    let column_names =
      if self.columns.is_empty() {
        self.search_fields.clone()
      } else {
        self.columns
      };
    debug!(
      preset = %self.name,
      search = ?self.search_fields,
      columns = ?column_names,
      "building preset page"
    );

    let mut fields = FilterFields::new(
      self
        .search_fields
        .into_iter()
        .map(Field::json)
        .collect()
    );
    if let Some(owner) = self.owner_field
    {
      fields =
        fields.with_owner(Field::json(owner));
    }

    Ok(Page {
      name: self.name,
      tabs,
      fields,
      columns: column_names
        .into_iter()
        .map(Field::json)
        .collect()
    })
  }
}

impl PresetTab {
  fn into_tab(
    self
  ) -> anyhow::Result<Tab<Value>> {
    let label = self
      .label
      .unwrap_or_else(|| self.id.clone());
    let field = Field::json(self.field);

    let tab = match (self.equals, self.blank)
    {
      | (Some(value), false) => {
        Tab::equals(
          self.id, label, field, value
        )
      }
      | (None, true) => {
        Tab::blank(self.id, label, field)
      }
      | (Some(_), true) => {
        bail!(
          "tab '{}' sets both `equals` \
           and `blank`",
          self.id
        )
      }
      | (None, false) => {
        bail!(
          "tab '{}' needs either \
           `equals` or `blank = true`",
          self.id
        )
      }
    };

    Ok(match self.color {
      | Some(color) => {
        tab.with_color(color)
      }
      | None => tab
    })
  }
}
