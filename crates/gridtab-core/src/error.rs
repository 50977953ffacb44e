use thiserror::Error;

/// Returned when a tab id is not part of the current tab set.
///
/// Callers normally swallow this and keep the previous tab selected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tab id: {id}")]
pub struct InvalidTabError {
  pub id: String
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TabSetError {
  #[error(
    "tab id '{0}' is reserved for the \
     synthetic all tab"
  )]
  ReservedId(String),

  #[error("duplicate tab id: {0}")]
  DuplicateId(String)
}
