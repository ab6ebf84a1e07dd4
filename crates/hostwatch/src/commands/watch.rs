//! Live dashboard: follows the status stream and redraws on every change.
//!
//! On a terminal, typing `all`, `active` or `unreachable` followed by Enter
//! switches the status filter and reloads the snapshot.

use std::io::{self, BufRead, IsTerminal};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;

use hostwatch_core::view;
use hostwatch_core::{ConnectionState, HostList, StateController, StatusFilter};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::hosts::HostRow;

/// Relative "last seen" times go stale without a redraw.
const REDRAW_INTERVAL: Duration = Duration::from_secs(5);

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const FILTER_HINT: &str = "Type all, active or unreachable and press Enter to filter.";

pub async fn handle(
    controller: &StateController,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    controller.connect().await?;
    let result = follow(controller, session, global).await;
    controller.disconnect().await;
    result
}

async fn follow(
    controller: &StateController,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let dashboard = session.output == OutputFormat::Table;
    let color = output::should_color(session.color);
    let clear = dashboard && io::stdout().is_terminal();
    let interactive = dashboard && io::stdin().is_terminal();

    // Yields the current list first, then each published change.
    let mut hosts = controller.hosts().into_stream();
    let mut state = controller.connection_state();
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
    redraw.set_missed_tick_behavior(MissedTickBehavior::Delay);
    redraw.tick().await;

    let mut input = filter_input(interactive);
    let mut input_open = interactive;
    let mut notice: Option<String> = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut list = HostList::default();
    loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c => break,
            next = hosts.next() => match next {
                Some(latest) => list = latest,
                None => break,
            },
            res = state.changed(), if dashboard => {
                if res.is_err() {
                    break;
                }
            }
            line = input.recv(), if input_open => match line {
                Some(text) => notice = switch_filter(controller, &text).await,
                None => input_open = false,
            },
            _ = redraw.tick(), if dashboard => {}
        }

        let mut frame = render(controller, &list, session, color, Utc::now())?;
        if let Some(notice) = &notice {
            frame.push('\n');
            frame.push_str(notice);
        }
        if input_open {
            frame.push_str("\n\n");
            frame.push_str(FILTER_HINT);
        }
        if clear {
            frame.insert_str(0, CLEAR_SCREEN);
        }
        output::print_output(&frame, global.quiet);
    }

    tracing::debug!("watch interrupted");
    Ok(())
}

// ── Filter input ────────────────────────────────────────────────────

/// Lines typed on stdin. Read on a plain thread: a pending tokio stdin
/// read would hold up runtime shutdown after Ctrl-C.
fn filter_input(enabled: bool) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    if enabled {
        std::thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    }
    rx
}

/// The filter named by a typed line, or `None` if it names none.
fn parse_filter_command(text: &str) -> Option<StatusFilter> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse().ok()
}

/// Apply a typed filter change. Returns the notice to show, if any.
async fn switch_filter(controller: &StateController, text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    let Some(filter) = parse_filter_command(text) else {
        return Some(format!(
            "Unknown filter '{}'. Expected all, active or unreachable.",
            text.trim()
        ));
    };
    match controller.set_filter(filter).await {
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(%filter, error = %e, "filter change failed");
            Some(format!("Filter change failed: {e}"))
        }
    }
}

fn render(
    controller: &StateController,
    hosts: &HostList,
    session: &Session,
    color: bool,
    now: DateTime<Utc>,
) -> Result<String, CliError> {
    let body = output::render_list(
        session.output,
        hosts.as_slice(),
        |h| HostRow::new(h, now),
        |h| h.id.to_string(),
    )?;
    if session.output != OutputFormat::Table {
        return Ok(body);
    }

    let header = header_line(controller, hosts, color, now);
    if view::shows_no_records(hosts) {
        return Ok(format!("{header}\n\nNo hosts match the current filter."));
    }
    Ok(format!("{header}\n{body}"))
}

fn header_line(
    controller: &StateController,
    hosts: &HostList,
    color: bool,
    now: DateTime<Utc>,
) -> String {
    let state = *controller.connection_state().borrow();
    let mut badge = output::paint_badge(state, view::connection_badge(state), color);
    let attempts = controller.reconnect_attempts();
    if state != ConnectionState::Open && attempts > 0 {
        badge.push_str(&format!(" (retry {attempts})"));
    }

    let summary = view::summarize(hosts);
    let refreshed = controller
        .last_refresh()
        .map_or_else(|| "never".to_owned(), |t| view::format_last_seen(Some(t), now));

    format!(
        "[{badge}]  {} hosts: {} active, {} unreachable  filter: {}  refreshed {refreshed}",
        summary.total,
        summary.active,
        summary.unreachable,
        controller.status_filter(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostwatch_core::HostStatus;

    #[test]
    fn typed_filter_names_parse() {
        assert_eq!(parse_filter_command("all\n"), Some(StatusFilter::ALL));
        assert_eq!(
            parse_filter_command("  Active "),
            Some(StatusFilter::only(HostStatus::Active))
        );
        assert_eq!(
            parse_filter_command("unreachable"),
            Some(StatusFilter::only(HostStatus::Unreachable))
        );
    }

    #[test]
    fn blank_or_unknown_lines_select_nothing() {
        assert_eq!(parse_filter_command(""), None);
        assert_eq!(parse_filter_command("   "), None);
        assert_eq!(parse_filter_command("down"), None);
    }
}
