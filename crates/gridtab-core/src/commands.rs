use std::io::{self, Write};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::cli::{Command, ViewArgs};
use crate::config::Config;
use crate::pages::{PageKind, Page, devices, hosts, problems, task_history};
use crate::preset::Preset;
use crate::render::Renderer;
use crate::source::{JsonFileSource, MockSource, RecordSource};
use crate::view::FilterView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Listing,
    TabsOnly,
}

type MockFn<R> = fn(usize, DateTime<Utc>) -> Vec<R>;

#[instrument(skip(cfg, renderer, command))]
pub fn dispatch(cfg: &Config, renderer: &Renderer, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List(args) => cmd_view(cfg, renderer, &args, Output::Listing),
        Command::Tabs(args) => cmd_view(cfg, renderer, &args, Output::TabsOnly),
        Command::Pages => cmd_pages(),
    }
}

fn cmd_view(cfg: &Config, renderer: &Renderer, args: &ViewArgs, output: Output) -> anyhow::Result<()> {
    if let Some(preset_path) = &args.preset {
        let page = Preset::load(preset_path)?.into_page()?;
        let data = args
            .data
            .as_deref()
            .context("--preset needs --data <JSON>")?;
        let records: Vec<Value> = JsonFileSource::new(data).load()?;
        return show(cfg, renderer, page, records, args, output);
    }

    let kind = match args.page {
        Some(kind) => kind,
        None => cfg.page()?,
    };
    debug!(page = %kind, "resolved page");

    match kind {
        PageKind::Devices => show_page(cfg, renderer, devices::page()?, devices::mock, args, output),
        PageKind::Hosts => show_page(cfg, renderer, hosts::page()?, hosts::mock, args, output),
        PageKind::Problems => show_page(cfg, renderer, problems::page()?, problems::mock, args, output),
        PageKind::TaskHistory => show_page(cfg, renderer, task_history::page()?, task_history::mock, args, output),
    }
}

fn show_page<R>(
    cfg: &Config,
    renderer: &Renderer,
    mut page: Page<R>,
    mock: MockFn<R>,
    args: &ViewArgs,
    output: Output,
) -> anyhow::Result<()>
where
    R: Serialize + DeserializeOwned + 'static,
{
    if let Some(label) = cfg.all_label() {
        page.tabs.set_all_label(label);
    }

    let source: Box<dyn RecordSource<R>> = match &args.data {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => {
            let count = match args.mock_size {
                Some(count) => count,
                None => cfg.mock_size()?,
            };
            Box::new(MockSource::new(count, Utc::now(), mock))
        }
    };
    info!(page = %page.name, source = %source.describe(), "loading records");
    let records = source.load()?;

    show(cfg, renderer, page, records, args, output)
}

fn show<R: Serialize>(
    cfg: &Config,
    renderer: &Renderer,
    page: Page<R>,
    records: Vec<R>,
    args: &ViewArgs,
    output: Output,
) -> anyhow::Result<()> {
    let columns = page.columns.clone();
    let view = build_view(cfg, page, records, args);
    let snapshot = view.snapshot();

    match (output, args.json) {
        (Output::Listing, true) => renderer.print_json(&snapshot, Some(view.visible().as_slice())),
        (Output::Listing, false) => renderer.print_listing(&snapshot, &columns, &view.visible()),
        (Output::TabsOnly, true) => renderer.print_json::<R>(&snapshot, None),
        (Output::TabsOnly, false) => renderer.print_tabs(&snapshot),
    }
}

/// Builds the view and replays the command-line toolbar onto it. Flags
/// win over config; an unknown `--tab` leaves the `all` tab selected.
pub fn build_view<R>(cfg: &Config, page: Page<R>, records: Vec<R>, args: &ViewArgs) -> FilterView<R> {
    let user = args
        .user
        .as_deref()
        .or_else(|| cfg.user())
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .map(str::to_string);

    let mut view = page.into_view(records, user);
    view.subscribe(|event, snapshot| {
        debug!(?event, visible = snapshot.visible, total = snapshot.total, "view updated");
    });

    if let Some(tab) = &args.tab {
        view.select_tab(tab);
    }
    if let Some(text) = &args.search {
        view.set_search_text(text.as_str());
    }
    if args.mine {
        view.set_only_mine(true);
    }
    view
}

fn cmd_pages() -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    describe_page(&mut out, PageKind::Devices, &devices::page()?)?;
    describe_page(&mut out, PageKind::Hosts, &hosts::page()?)?;
    describe_page(&mut out, PageKind::Problems, &problems::page()?)?;
    describe_page(&mut out, PageKind::TaskHistory, &task_history::page()?)?;
    Ok(())
}

fn describe_page<W: Write, R>(mut out: W, kind: PageKind, page: &Page<R>) -> anyhow::Result<()> {
    writeln!(out, "{kind}")?;
    let tabs: Vec<&str> = page.tabs.iter().map(|tab| tab.id.as_str()).collect();
    writeln!(out, "  tabs:   {}", tabs.join(", "))?;
    writeln!(out, "  search: {}", page.fields.search_names().join(", "))?;
    match &page.fields.owner {
        Some(owner) => writeln!(out, "  owner:  {}", owner.name())?,
        None => writeln!(out, "  owner:  -")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::Utc;

    use super::{build_view, describe_page};
    use crate::cli::ViewArgs;
    use crate::config::Config;
    use crate::pages::{PageKind, hosts, problems, task_history};

    fn cfg(text: &str) -> Config {
        Config::from_text(text, Path::new(".")).expect("valid rc")
    }

    #[test]
    fn flags_replay_onto_the_view() {
        let args = ViewArgs {
            tab: Some("Resolved".to_string()),
            search: Some("team a".to_string()),
            ..ViewArgs::default()
        };
        let page = problems::page().expect("problems page");
        let view = build_view(&cfg(""), page, problems::mock(50, Utc::now()), &args);

        assert_eq!(view.state().active_tab_id(), "Resolved");
        assert_eq!(view.state().active_filter_count(), 2);
        let visible = view.visible();
        assert_eq!(visible.len(), 9);
        assert!(visible.iter().all(|p| p.status == "Resolved" && p.owner == "Team A"));
    }

    #[test]
    fn unknown_tab_flag_keeps_all() {
        let args = ViewArgs {
            tab: Some("Archived".to_string()),
            ..ViewArgs::default()
        };
        let page = problems::page().expect("problems page");
        let view = build_view(&cfg(""), page, problems::mock(6, Utc::now()), &args);
        assert_eq!(view.state().active_tab_id(), "all");
        assert_eq!(view.visible().len(), 6);
    }

    #[test]
    fn user_flag_beats_config() {
        let args = ViewArgs {
            mine: true,
            user: Some("User 2".to_string()),
            ..ViewArgs::default()
        };
        let page = hosts::page().expect("hosts page");
        let view = build_view(&cfg("user = User 1\n"), page, hosts::mock(10, Utc::now()), &args);
        assert_eq!(view.current_user(), Some("User 2"));
        let visible = view.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].owner.as_deref(), Some("User 2"));

        let page = hosts::page().expect("hosts page");
        let view = build_view(
            &cfg("user = User 1\n"),
            page,
            hosts::mock(10, Utc::now()),
            &ViewArgs {
                mine: true,
                ..ViewArgs::default()
            },
        );
        assert_eq!(view.current_user(), Some("User 1"));
    }

    #[test]
    fn page_description_lists_tabs_and_owner() {
        let mut buf = Vec::new();
        let page = task_history::page().expect("task history page");
        describe_page(&mut buf, PageKind::TaskHistory, &page).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("task-history\n"));
        assert!(text.contains("tabs:   all, Success, Failed"));
        assert!(text.contains("owner:  -"));
    }
}
