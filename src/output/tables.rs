use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::providers::azdo::{
    PerformanceSummary, PullRequestStatus, ReviewerVote, RunResult, Vote,
};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn status_cell(status: PullRequestStatus, is_draft: bool, is_abandoning: bool) -> Cell {
    if is_abandoning {
        return Cell::new("abandoning…").fg(TableColor::Yellow);
    }

    match status {
        PullRequestStatus::Active if is_draft => {
            Cell::new("active (draft)").fg(TableColor::DarkGrey)
        }
        PullRequestStatus::Active => Cell::new("active").fg(TableColor::Cyan),
        PullRequestStatus::Completed => Cell::new("completed").fg(TableColor::Green),
        PullRequestStatus::Abandoned => Cell::new("abandoned").fg(TableColor::DarkGrey),
    }
}

/// One line per reviewer, colored by the least favorable vote.
pub fn reviewers_cell(reviewers: &[ReviewerVote]) -> Cell {
    if reviewers.is_empty() {
        return Cell::new("-").fg(TableColor::DarkGrey);
    }

    let text = reviewers
        .iter()
        .map(|r| format!("{} ({})", r.display_name, r.vote))
        .collect::<Vec<_>>()
        .join("\n");

    let has = |vote: Vote| reviewers.iter().any(|r| r.vote == vote);
    let color = if has(Vote::Rejected) {
        TableColor::Red
    } else if has(Vote::WaitingForAuthor) {
        TableColor::Yellow
    } else if has(Vote::NoVote) {
        TableColor::Reset
    } else {
        TableColor::Green
    };

    Cell::new(text).fg(color)
}

/// Cell for one performance lane.
///
/// `summary` is `None` when resolution was never requested.
pub fn run_cell(
    summary: Option<&PerformanceSummary>,
    lane: fn(&PerformanceSummary) -> Option<RunResult>,
) -> Cell {
    let Some(summary) = summary else {
        return Cell::new("-").fg(TableColor::DarkGrey);
    };
    if !summary.loaded {
        return Cell::new("loading…").fg(TableColor::DarkGrey);
    }

    match lane(summary) {
        None => Cell::new("not started").fg(TableColor::DarkGrey),
        Some(run) => Cell::new(format_run(&run)).fg(run_color(&run)),
    }
}

pub fn format_run(run: &RunResult) -> String {
    if run.in_progress {
        "running".to_string()
    } else if run.is_clean() {
        "passed".to_string()
    } else {
        format!(
            "{} regressions, {} broken tests",
            format_count(run.regressions),
            format_count(run.broken_tests)
        )
    }
}

fn run_color(run: &RunResult) -> TableColor {
    if run.in_progress {
        TableColor::Yellow
    } else if run.is_clean() {
        TableColor::Green
    } else {
        TableColor::Red
    }
}

fn format_count(count: i32) -> String {
    if count == RunResult::UNPARSEABLE {
        "?".to_string()
    } else {
        count.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(in_progress: bool, regressions: i32, broken_tests: i32) -> RunResult {
        RunResult {
            in_progress,
            regressions,
            broken_tests,
        }
    }

    #[test]
    fn test_format_run() {
        assert_eq!(format_run(&run(true, 0, 0)), "running");
        assert_eq!(format_run(&run(false, 0, 0)), "passed");
        assert_eq!(
            format_run(&run(false, 3, 1)),
            "3 regressions, 1 broken tests"
        );
        assert_eq!(
            format_run(&run(false, RunResult::UNPARSEABLE, 0)),
            "? regressions, 0 broken tests"
        );
    }

    #[test]
    fn test_run_color() {
        assert_eq!(run_color(&run(true, 0, 0)), TableColor::Yellow);
        assert_eq!(run_color(&run(false, 0, 0)), TableColor::Green);
        assert_eq!(run_color(&run(false, 0, 2)), TableColor::Red);
    }
}
