use std::collections::BTreeMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow,
  bail
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::pages::PageKind;

pub const RC_ENV: &str = "GRIDTABRC";
const RC_FILE_NAME: &str = ".gridtabrc";
const DEFAULT_MOCK_SIZE: usize = 50;

/// Flat `key = value` settings, layered as built-in defaults, then the
/// rc file (with its includes), then command-line overrides.
#[derive(Debug, Clone)]
pub struct Config {
  map:              BTreeMap<String, String>,
  pub loaded_files: Vec<PathBuf>,
  /// Canonical paths of the files currently being read, outermost
  /// first.
  include_stack:    Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = BTreeMap::new();
    map.insert(
      "color".to_string(),
      "on".to_string()
    );
    map.insert(
      "page".to_string(),
      PageKind::Problems.to_string()
    );
    map.insert(
      "mock.size".to_string(),
      DEFAULT_MOCK_SIZE.to_string()
    );
    Self {
      map,
      loaded_files: vec![],
      include_stack: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::default();

    match resolve_rc_path(rc_override)? {
      | Some(path) => {
        info!(rc = %path.display(), "loading rc file");
        cfg.load_file(&path)?;
      }
      | None => {
        debug!(
          "no rc file found; using \
           defaults"
        );
      }
    }

    Ok(cfg)
  }

  /// Parses rc text directly; `include` lines resolve against `base`.
  pub fn from_text(
    text: &str,
    base: &Path
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::default();
    cfg.apply_text(
      text,
      base,
      Path::new("<inline>")
    )?;
    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<&str> {
    self.map.get(key).map(String::as_str)
  }

  /// `None` when unset; an unrecognised value is an error.
  pub fn get_bool(
    &self,
    key: &str
  ) -> anyhow::Result<Option<bool>> {
    match self.get(key) {
      | Some(raw) => {
        parse_bool(raw)
          .map(Some)
          .ok_or_else(|| {
            anyhow!(
              "invalid {key} setting: {raw}"
            )
          })
      }
      | None => Ok(None)
    }
  }

  /// Current user for the "only mine" toggle; blank means anonymous.
  pub fn user(&self) -> Option<&str> {
    self
      .get("user")
      .map(str::trim)
      .filter(|user| !user.is_empty())
  }

  pub fn page(
    &self
  ) -> anyhow::Result<PageKind> {
    let raw = self
      .get("page")
      .unwrap_or("problems");
    PageKind::parse(raw).ok_or_else(|| {
      anyhow!(
        "unknown page in config: {raw}"
      )
    })
  }

  pub fn mock_size(
    &self
  ) -> anyhow::Result<usize> {
    match self.get("mock.size") {
      | Some(raw) => {
        raw.trim().parse().with_context(
          || {
            format!(
              "invalid mock.size: {raw}"
            )
          }
        )
      }
      | None => Ok(DEFAULT_MOCK_SIZE)
    }
  }

  pub fn all_label(
    &self
  ) -> Option<&str> {
    self.get("all.label")
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    let canonical = fs::canonicalize(&path)
      .unwrap_or_else(|_| path.clone());
    if self
      .include_stack
      .contains(&canonical)
    {
      bail!(
        "include cycle: {}",
        path.display()
      );
    }

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    self.include_stack.push(canonical);
    let applied = self.apply_text(
      &text, &base_dir, &path
    );
    self.include_stack.pop();
    applied
  }

  fn apply_text(
    &mut self,
    text: &str,
    base_dir: &Path,
    origin: &Path
  ) -> anyhow::Result<()> {
    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let line = match raw_line
        .split_once('#')
      {
        | Some((before, _)) => before,
        | None => raw_line
      }
      .trim();

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            base_dir,
            include_rest.trim()
          )?;

        if include_path.exists() {
          debug!(
            file = %origin.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
          );
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            origin.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV)
  {
    if rc_env == "/dev/null"
      || rc_env.trim().is_empty()
    {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping rc lookup"
    );
    return Ok(None);
  };
  let candidate = home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let expanded =
    expand_tilde(Path::new(include));
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on" | "true" => {
      Some(true)
    }
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}
