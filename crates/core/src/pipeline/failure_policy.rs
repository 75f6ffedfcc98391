use std::fmt;
use std::str::FromStr;

use crossbeam_channel::Sender;

use crate::overlay::overlay_event::OverlayEvent;

/// What to do with a failure the pipeline recovers from on its own
/// (a camera that will not open, a detection pass that errors).
///
/// Either way the pipeline carries on: no retries, no crash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Debug-level log only.
    #[default]
    Silent,
    /// Warn-level log plus a diagnostic for the UI.
    Report,
}

impl FailurePolicy {
    pub fn handle(
        self,
        context: &str,
        error: &dyn std::error::Error,
        events: &Sender<OverlayEvent>,
    ) {
        match self {
            FailurePolicy::Silent => log::debug!("{context}: {error}"),
            FailurePolicy::Report => {
                log::warn!("{context}: {error}");
                let _ = events.send(OverlayEvent::Diagnostic(format!("{context}: {error}")));
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FailurePolicy::Silent => "silent",
            FailurePolicy::Report => "report",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "silent" => Ok(FailurePolicy::Silent),
            "report" => Ok(FailurePolicy::Report),
            other => Err(format!("unknown failure policy: {other}")),
        }
    }
}
