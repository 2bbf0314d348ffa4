use indicatif::{ProgressBar, ProgressStyle};
use playtally_core::AvailabilityProgress;
use playtally_models::ShowSummary;
use std::io::IsTerminal;

/// Progress bar over the per-show episode count lookups. Hidden when not
/// attached to a terminal, where the per-show log lines carry the progress.
pub struct ExportUI {
    bar: ProgressBar,
    interactive: bool,
}

impl ExportUI {
    pub fn new(quiet: bool) -> Self {
        let interactive = is_interactive() && !quiet;
        let bar = if interactive {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }

        if !interactive {
            tracing::info!(
                operation = "ui_init",
                mode = "non_interactive",
                "Running in non-interactive mode - progress bars disabled, using structured logging"
            );
        }

        Self { bar, interactive }
    }
}

impl AvailabilityProgress for ExportUI {
    fn start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_message("Counting available episodes...");
    }

    fn advance(&self, row: &ShowSummary) {
        if self.interactive {
            self.bar.set_message(row.title.clone());
        }
        self.bar.inc(1);
    }

    fn finish(&self) {
        if self.interactive {
            self.bar.finish_with_message("Available episodes resolved");
        }
    }

    fn draws_progress(&self) -> bool {
        self.interactive
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
