pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod field;
pub mod filter;
pub mod pages;
pub mod preset;
pub mod render;
pub mod source;
pub mod tab;
pub mod view;

use std::ffi::OsString;

use clap::Parser;
use tracing::{
  debug,
  info
};

pub use crate::error::{
  InvalidTabError,
  TabSetError
};
pub use crate::field::{
  Field,
  FilterFields
};
pub use crate::filter::{
  FilterAction,
  FilterState,
  RowPredicate,
  active_filter_count,
  compute_predicate,
  reduce
};
pub use crate::tab::{
  ALL_TAB_ID,
  Tab,
  TabSet,
  compute_tab_counts
};
pub use crate::view::{
  FilterView,
  ViewEvent,
  ViewSnapshot
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args);
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting gridtab"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.rcfile.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let renderer =
    render::Renderer::new(&cfg)?;

  commands::dispatch(
    &cfg,
    &renderer,
    cli.command
  )?;

  info!("done");
  Ok(())
}
