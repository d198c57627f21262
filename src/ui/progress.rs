use crate::ui::progress_message::{ProgressMessage, ProgressPhase};
use crate::ui::Icons;
use crossbeam::channel::{Receiver, Sender};
use indicatif::{MultiProgress, ProgressBar};
use std::thread;
use std::time::Duration;

/// Terminal progress for one or more concurrent repository builds.
///
/// Parsing gets a bar whose length grows as each repository announces its
/// file count; every later phase shares one spinner showing its label.
pub struct BuildProgress {
    mp: MultiProgress,
    handle: Option<thread::JoinHandle<()>>,
}

impl BuildProgress {
    pub fn new() -> (Self, Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();
        let visible = console::Term::stdout().is_term();

        let mp = MultiProgress::new();
        let (parsing, linking) = if visible {
            (
                mp.add(ProgressBar::new(0).with_message("Parsing files")),
                mp.add(ProgressBar::new_spinner()),
            )
        } else {
            (ProgressBar::hidden(), ProgressBar::hidden())
        };

        let handle = thread::spawn(move || drive(rx, parsing, linking));

        (Self { mp, handle: Some(handle) }, tx)
    }

    /// Wait for every sender to hang up, then remove the bars
    pub fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.mp.clear().ok();
    }
}

fn drive(rx: Receiver<ProgressMessage>, parsing: ProgressBar, linking: ProgressBar) {
    for msg in rx {
        match msg {
            ProgressMessage::Started { phase: ProgressPhase::Parsing, total } => {
                parsing.inc_length(total as u64);
            }
            ProgressMessage::Progress { phase: ProgressPhase::Parsing, file, .. } => {
                parsing.inc(1);
                if let Some(f) = file {
                    parsing.set_message(format!("Parsing: {}", f));
                }
            }
            ProgressMessage::Finished { phase: ProgressPhase::Parsing } => {
                if parsing.position() >= parsing.length().unwrap_or(0) {
                    parsing.finish_with_message("Done");
                }
            }
            ProgressMessage::Started { phase, .. } => {
                linking.set_message(format!("{} {}", Icons::GEAR, phase.label()));
                linking.enable_steady_tick(Duration::from_millis(100));
            }
            ProgressMessage::Finished { phase: ProgressPhase::Finalizing } => {
                linking.set_message("Done");
            }
            ProgressMessage::Error(e) => {
                linking.println(format!("{} {}", Icons::WARN, e));
            }
            _ => {}
        }
    }
    parsing.finish_and_clear();
    linking.finish_and_clear();
}
