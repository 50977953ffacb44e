use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

type Getter<R> = dyn Fn(&R) -> Option<Cow<'_, str>>
  + Send
  + Sync;

/// A named string projection of a record.
///
/// Search and "only mine" matching only ever see records through these,
/// so the reducer never needs to know what a device or a host looks
/// like.
pub struct Field<R> {
  name: String,
  get:  Arc<Getter<R>>
}

impl<R> Clone for Field<R> {
  fn clone(&self) -> Self {
    Self {
      name: self.name.clone(),
      get:  Arc::clone(&self.get)
    }
  }
}

impl<R> fmt::Debug for Field<R> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("Field")
      .field("name", &self.name)
      .finish_non_exhaustive()
  }
}

impl<R> Field<R> {
  pub fn new<F>(
    name: impl Into<String>,
    get: F
  ) -> Self
  where
    F: Fn(&R) -> Option<Cow<'_, str>>
      + Send
      + Sync
      + 'static
  {
    Self {
      name: name.into(),
      get:  Arc::new(get)
    }
  }

  /// Field backed by a plain `&str` member that is always present.
  pub fn text<F>(
    name: impl Into<String>,
    get: F
  ) -> Self
  where
    F: Fn(&R) -> &str
      + Send
      + Sync
      + 'static
  {
    Self::new(name, move |record: &R| {
      Some(Cow::Borrowed(get(record)))
    })
  }

  /// Field backed by an optional member.
  pub fn optional<F>(
    name: impl Into<String>,
    get: F
  ) -> Self
  where
    F: Fn(&R) -> Option<&str>
      + Send
      + Sync
      + 'static
  {
    Self::new(name, move |record: &R| {
      get(record).map(Cow::Borrowed)
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn value<'a>(
    &self,
    record: &'a R
  ) -> Option<Cow<'a, str>> {
    (self.get)(record)
  }

  /// `needle` must already be lower-cased.
  pub fn contains_ignore_case(
    &self,
    record: &R,
    needle: &str
  ) -> bool {
    self
      .value(record)
      .map(|value| {
        value
          .to_lowercase()
          .contains(needle)
      })
      .unwrap_or(false)
  }

  pub fn contains(
    &self,
    record: &R,
    needle: &str
  ) -> bool {
    self
      .value(record)
      .map(|value| value.contains(needle))
      .unwrap_or(false)
  }
}

impl Field<Value> {
  /// Reads a dotted path such as `serial_hr._no` out of a JSON object.
  ///
  /// A key that literally contains the dots wins over the nested
  /// lookup.
  pub fn json(
    path: impl Into<String>
  ) -> Self {
    let path = path.into();
    let key = path.clone();
    let segments: Vec<String> = path
      .split('.')
      .map(str::to_string)
      .collect();

    Self::new(path, move |record: &Value| {
      if let Some(direct) =
        record.get(key.as_str())
      {
        return json_text(direct);
      }

      let mut current = record;
      for segment in &segments {
        current =
          current.get(segment.as_str())?;
      }
      json_text(current)
    })
  }
}

fn json_text(
  value: &Value
) -> Option<Cow<'_, str>> {
  match value {
    | Value::Null => None,
    | Value::String(text) => {
      Some(Cow::Borrowed(text.as_str()))
    }
    | Value::Number(n) => {
      Some(Cow::Owned(n.to_string()))
    }
    | Value::Bool(b) => {
      Some(Cow::Owned(b.to_string()))
    }
    | Value::Array(items) => {
      let parts: Vec<String> = items
        .iter()
        .filter_map(|item| {
          json_text(item)
            .map(Cow::into_owned)
        })
        .collect();
      Some(Cow::Owned(parts.join(", ")))
    }
    | Value::Object(_) => {
      Some(Cow::Owned(value.to_string()))
    }
  }
}

/// The fields a page exposes to the quick search and to the
/// "only mine" toggle.
pub struct FilterFields<R> {
  pub search: Vec<Field<R>>,
  pub owner:  Option<Field<R>>
}

impl<R> Clone for FilterFields<R> {
  fn clone(&self) -> Self {
    Self {
      search: self.search.clone(),
      owner:  self.owner.clone()
    }
  }
}

impl<R> fmt::Debug for FilterFields<R> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("FilterFields")
      .field(
        "search",
        &self
          .search
          .iter()
          .map(Field::name)
          .collect::<Vec<_>>()
      )
      .field(
        "owner",
        &self.owner.as_ref().map(Field::name)
      )
      .finish()
  }
}

impl<R> Default for FilterFields<R> {
  fn default() -> Self {
    Self {
      search: Vec::new(),
      owner:  None
    }
  }
}

impl<R> FilterFields<R> {
  pub fn new(
    search: Vec<Field<R>>
  ) -> Self {
    Self {
      search,
      owner: None
    }
  }

  pub fn with_owner(
    mut self,
    owner: Field<R>
  ) -> Self {
    self.owner = Some(owner);
    self
  }

  pub fn search_names(
    &self
  ) -> Vec<&str> {
    self
      .search
      .iter()
      .map(Field::name)
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::Field;

  #[test]
  fn json_field_reads_nested_and_scalar_values()
  {
    let record = json!({
      "owner": "Team A",
      "qty": 3,
      "serial_hr": { "_no": "HR-SN-4" },
      "domains_blocked": ["google.com", "facebook.com"],
      "node": null
    });

    assert_eq!(
      Field::json("owner")
        .value(&record)
        .as_deref(),
      Some("Team A")
    );
    assert_eq!(
      Field::json("qty")
        .value(&record)
        .as_deref(),
      Some("3")
    );
    assert_eq!(
      Field::json("serial_hr._no")
        .value(&record)
        .as_deref(),
      Some("HR-SN-4")
    );
    assert_eq!(
      Field::json("domains_blocked")
        .value(&record)
        .as_deref(),
      Some("google.com, facebook.com")
    );
    assert!(
      Field::json("node")
        .value(&record)
        .is_none()
    );
    assert!(
      Field::json("missing.path")
        .value(&record)
        .is_none()
    );
  }

  #[test]
  fn literal_dotted_key_wins() {
    let record = json!({
      "a.b": "literal",
      "a": { "b": "nested" }
    });
    assert_eq!(
      Field::json("a.b")
        .value(&record)
        .as_deref(),
      Some("literal")
    );
  }

  #[test]
  fn contains_is_case_sensitive_but_search_is_not()
   {
    let record =
      json!({ "owner": "alice.smith" });
    let owner = Field::json("owner");

    assert!(
      owner.contains(&record, "alice")
    );
    assert!(
      !owner.contains(&record, "Alice")
    );
    assert!(
      owner.contains_ignore_case(
        &record, "alice"
      )
    );
  }
}
