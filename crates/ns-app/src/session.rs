//! Interactive browsing session over a dataset navigator

use std::io::{BufRead, Write};
use std::sync::Arc;
use anyhow::Result;
use tracing::{info, warn};

use ns_core::{DatasetNavigator, NavigatorSnapshot, NavigatorSubscriber};
use crate::commands::{parse_line, Input, HELP};

/// Logs every state change of the navigator
pub struct LogSubscriber;

impl NavigatorSubscriber for LogSubscriber {
    fn on_state_changed(&self, snapshot: &NavigatorSnapshot) {
        info!(
            "{} scene={} timestamp={}",
            snapshot.category,
            snapshot.scene.as_deref().unwrap_or("-"),
            snapshot.timestamp.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string()),
        );
    }
}

/// Drives a navigator from text commands, one per line
pub struct Session {
    navigator: DatasetNavigator,
    // The navigator only keeps a weak reference
    _logger: Arc<LogSubscriber>,
}

impl Session {
    pub fn new(navigator: DatasetNavigator) -> Self {
        let logger = Arc::new(LogSubscriber);
        navigator.add_subscriber(logger.clone());
        Self {
            navigator,
            _logger: logger,
        }
    }

    #[cfg(test)]
    pub fn navigator(&self) -> &DatasetNavigator {
        &self.navigator
    }

    /// Read commands until end of input or `quit`.
    /// Command failures are reported and the session goes on.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        for line in input.lines() {
            let line = line?;
            let parsed = match parse_line(&line) {
                Ok(Some(parsed)) => parsed,
                Ok(None) => continue,
                Err(e) => {
                    writeln!(output, "error: {e:#}")?;
                    continue;
                }
            };
            if parsed == Input::Quit {
                break;
            }
            if let Err(e) = self.execute(parsed, &mut output) {
                warn!("Command failed: {e:#}");
                writeln!(output, "error: {e:#}")?;
            }
        }
        output.flush()?;
        Ok(())
    }

    fn execute<W: Write>(&mut self, input: Input, output: &mut W) -> Result<()> {
        match input {
            Input::Navigate(command) => {
                if self.navigator.apply(command)? {
                    self.print_state(output)?;
                } else {
                    writeln!(output, "unchanged")?;
                }
            }
            Input::Lookup(kind, timestamp) => {
                writeln!(output, "{}", self.navigator.lookup(kind, timestamp)?)?;
            }
            Input::Prefetch { kind, count, step } => {
                for uri in self.navigator.prefetch_window(kind, count, step)? {
                    writeln!(output, "{uri}")?;
                }
            }
            Input::State => self.print_state(output)?,
            Input::Scenes => {
                for (index, scene) in self.navigator.scenes().iter().enumerate() {
                    writeln!(output, "{index}\t{scene}")?;
                }
            }
            Input::Help => writeln!(output, "{HELP}")?,
            Input::Quit => {}
        }
        Ok(())
    }

    fn print_state<W: Write>(&self, output: &mut W) -> Result<()> {
        writeln!(output, "{}", serde_json::to_string(&self.navigator.snapshot())?)?;
        Ok(())
    }
}
