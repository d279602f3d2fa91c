mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::StepProgress;
use styling::{paint, Tone};
pub use summary::{print_abandoned, print_branches, print_insertions, print_last_insertion};

/// Prints the `vsinsertions` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        paint(Tone::Brand, "📦 VS Insertions"),
        paint(Tone::Label, env!("CARGO_PKG_VERSION")),
        paint(Tone::Label, "Visual Studio insertion tracker")
    );
}
