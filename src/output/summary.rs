use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};

use crate::providers::azdo::{CommitDetails, InsertionSnapshot, PullRequestStatus};
use crate::providers::BranchInformation;

use super::styling::{paint, Tone};
use super::tables::{create_table, cyan_header, reviewers_cell, run_cell, status_cell};

/// Prints the tracked branch catalog to stdout.
pub fn print_branches(branches: &[BranchInformation]) {
    println!("{}", render_branches(branches));
}

/// Prints insertion PRs into `target_branch` as a table.
///
/// Status and reviewer votes are color coded; the DDRIT and Speedometer
/// columns show `-` for records whose performance summary was not requested.
pub fn print_insertions(target_branch: &str, insertions: &[InsertionSnapshot]) {
    println!("{}", render_insertions(target_branch, insertions));
}

pub fn print_last_insertion(target_branch: &str, commit: Option<&CommitDetails>) {
    println!("{}", render_last_insertion(target_branch, commit));
}

pub fn print_abandoned(insertion: &InsertionSnapshot) {
    println!("{}", render_abandoned(insertion));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{emoji} {}", paint(Tone::Heading, title));
}

fn render_branches(branches: &[BranchInformation]) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🌿", "Tracked Branches");

    if branches.is_empty() {
        let message = paint(Tone::Highlight, "No tracked branches found.");
        let _ = writeln!(output, "{message}");
        return output;
    }

    let mut table = create_table();
    table.set_header(cyan_header(&["#", "Source Branch", "VS Branch"]));
    for (idx, branch) in branches.iter().enumerate() {
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(&branch.source_branch),
            Cell::new(&branch.target_branch),
        ]);
    }

    let _ = writeln!(output, "{table}");
    output
}

fn render_insertions(target_branch: &str, insertions: &[InsertionSnapshot]) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "📦", "Insertions");

    let active = insertions
        .iter()
        .filter(|i| i.status == PullRequestStatus::Active)
        .count();
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n",
        paint(Tone::Label, "Target branch:"),
        paint(Tone::Value, target_branch),
        paint(Tone::Label, "Insertions:"),
        paint(Tone::Highlight, insertions.len()),
        paint(Tone::Label, "Active:"),
        paint(Tone::Highlight, active),
    );

    if insertions.is_empty() {
        let _ = writeln!(output, "{}", paint(Tone::Highlight, "No insertions found."));
        return output;
    }

    let mut table = create_table();
    table.set_header(cyan_header(&[
        "PR",
        "Build",
        "Source",
        "Status",
        "Reviewers",
        "DDRIT",
        "Speedometer",
        "Link",
    ]));

    for insertion in insertions {
        let summary = insertion.performance.as_ref();
        table.add_row(vec![
            Cell::new(&insertion.pull_request_id),
            Cell::new(&insertion.build_number),
            Cell::new(&insertion.source_branch),
            status_cell(insertion.status, insertion.is_draft, insertion.is_abandoning),
            reviewers_cell(&insertion.reviewers),
            run_cell(summary, |s| s.ddrit),
            run_cell(summary, |s| s.speedometer),
            Cell::new(&insertion.url).fg(TableColor::DarkGrey),
        ]);
    }

    let _ = writeln!(output, "{table}");
    output
}

fn render_last_insertion(target_branch: &str, commit: Option<&CommitDetails>) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🕒", "Last Insertion");

    let Some(commit) = commit else {
        let _ = writeln!(
            output,
            "{}",
            paint(
                Tone::Highlight,
                format!("No matching insertion found on {target_branch}.")
            )
        );
        return output;
    };

    let date = commit.date.map_or_else(
        || "unknown".to_string(),
        |d| d.format("%Y-%m-%d %H:%M %:z").to_string(),
    );
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}",
        paint(Tone::Label, "Branch:"),
        paint(Tone::Value, target_branch),
        paint(Tone::Label, "Commit:"),
        paint(Tone::Highlight, commit.commit_id.as_deref().unwrap_or("unknown")),
        paint(Tone::Label, "Date:"),
        date,
        paint(Tone::Label, "Message:"),
        commit.comment.lines().next().unwrap_or_default(),
        paint(Tone::Label, "Link:"),
        paint(Tone::Label, &commit.url),
    );

    output
}

fn render_abandoned(insertion: &InsertionSnapshot) -> String {
    let headline = if insertion.status == PullRequestStatus::Abandoned {
        paint(Tone::Success, format!("Abandoned PR {}", insertion.pull_request_id))
    } else {
        let message = format!(
            "PR {} is still {}",
            insertion.pull_request_id, insertion.status
        );
        paint(Tone::Failure, message)
    };

    format!(
        "{headline}\n  {} {}\n  {} {}",
        paint(Tone::Label, "Title:"),
        insertion.title,
        paint(Tone::Label, "Link:"),
        paint(Tone::Label, &insertion.url)
    )
}
