use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{paint, Tone};

/// Spinner for one remote step, drawn on stderr so stdout stays parseable.
pub struct StepProgress {
    pb: ProgressBar,
}

impl StepProgress {
    pub fn start(message: &str) -> Self {
        let pb = create_spinner(paint(Tone::Highlight, message).to_string());
        Self { pb }
    }

    pub fn finish(self, done: &str) {
        let message = paint(Tone::Success, format!("{done} ✓"));
        self.pb.finish_with_message(message.to_string());
    }

    pub fn fail(self, message: &str) {
        let message = paint(Tone::Failure, format!("{message} ✗"));
        self.pb.abandon_with_message(message.to_string());
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .expect("spinner template is valid"),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
