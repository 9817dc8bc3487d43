use std::fmt::Write;

use chrono::{DateTime, Local, Utc};
use tracker_core::{AppViewModel, Draft, RecordView, SessionMode, SessionView};

/// Renders the whole board as plain text.
pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();

    if let Some(error) = &view.last_error {
        let _ = writeln!(out, "! {error}  (`dismiss` to clear)");
    }

    if !view.signed_in {
        out.push_str("Not signed in. Use `login <user>`.\n");
        return out;
    }

    let refreshing = if view.refreshing { "  [refreshing]" } else { "" };
    let _ = writeln!(
        out,
        "Jobs ({} of {}){refreshing}",
        view.records.len(),
        view.total_count
    );
    out.push_str(&filter_line(view));
    out.push('\n');

    if view.loading {
        out.push_str("  Loading jobs...\n");
    } else if view.records.is_empty() {
        if view.total_count == 0 {
            out.push_str("  No jobs yet. Use `add` to track one.\n");
        } else {
            out.push_str("  No jobs match the filter.\n");
        }
    } else {
        for (index, row) in view.records.iter().enumerate() {
            render_row(&mut out, index + 1, row);
        }
    }

    if let SessionView::Open { mode, draft } = &view.session {
        render_form(&mut out, mode, draft);
    }
    out
}

fn filter_line(view: &AppViewModel) -> String {
    let mut line = format!("Filter: {} All", mark(view.filter.all));
    for option in &view.filter.options {
        let _ = write!(
            line,
            "  {} {} ({})",
            mark(option.selected),
            option.status.label(),
            option.count
        );
    }
    line
}

fn mark(selected: bool) -> &'static str {
    if selected {
        "[x]"
    } else {
        "[ ]"
    }
}

fn render_row(out: &mut String, number: usize, row: &RecordView) {
    let record = &row.record;
    let editing = if row.editing { "  <editing>" } else { "" };
    let _ = writeln!(
        out,
        "{number:>3}. {} @ {}  [{}]  Added {}{editing}",
        record.title,
        record.company,
        record.status.label(),
        added_date(record.created_at)
    );
    if let Some(url) = &record.url {
        let _ = writeln!(out, "     {url}");
    }
    if let Some(notes) = &record.notes {
        let _ = writeln!(out, "     {notes}");
    }
}

pub fn added_date(created_at: DateTime<Utc>) -> String {
    created_at.with_timezone(&Local).format("%b %-d, %Y").to_string()
}

fn render_form(out: &mut String, mode: &SessionMode, draft: &Draft) {
    let heading = match mode {
        SessionMode::Create => "New job",
        SessionMode::Edit(_) => "Edit job",
    };
    let _ = writeln!(out, "\n-- {heading} --");
    let _ = writeln!(out, "  title:   {}", draft.title);
    let _ = writeln!(out, "  company: {}", draft.company);
    let _ = writeln!(out, "  status:  {}", draft.status.label());
    let _ = writeln!(out, "  url:     {}", draft.url);
    let _ = writeln!(out, "  notes:   {}", draft.notes);
    if draft.saving {
        out.push_str("  saving...\n");
    }
    if let Some(error) = &draft.error {
        let _ = writeln!(out, "  ! {error}");
    }
    out.push_str("  (`set <field> <value>`, `save`, `cancel`)\n");
}
