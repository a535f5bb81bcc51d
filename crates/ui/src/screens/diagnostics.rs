//! Diagnostic screen: one button per probe.

use parking_lot::Mutex;
use sims_application::{Diagnostics, InFlight, OperationKey, Probe, ProbeReport};
use sims_domain::ScreenState;
use tracing::debug;

use crate::state::DiagnosticsState;

/// Presentation model of the diagnostic screen.
#[derive(Debug)]
pub struct DiagnosticsScreen {
    diagnostics: Diagnostics,
    in_flight: InFlight,
    state: Mutex<DiagnosticsState>,
}

impl DiagnosticsScreen {
    /// Creates a screen with no reports yet.
    #[must_use]
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            in_flight: InFlight::new(),
            state: Mutex::new(DiagnosticsState::default()),
        }
    }

    /// Runs `probe` and keeps its report.
    ///
    /// Returns `None` when the same probe is already running.
    pub async fn run(&self, probe: Probe) -> Option<ProbeReport> {
        let Some(_guard) = self
            .in_flight
            .try_begin(OperationKey::Probe(probe.name().to_string()))
        else {
            debug!(probe = probe.name(), "Probe already running");
            return None;
        };
        self.state.lock().status = ScreenState::loading();

        let report = self.diagnostics.run(probe).await;
        let status = match &report {
            ProbeReport::Success { status, .. } => {
                ScreenState::success(format!("{probe}: {status}"))
            }
            ProbeReport::Error { error, .. } => ScreenState::error(format!("{probe} failed: {error}")),
        };

        let mut state = self.state.lock();
        state.reports.insert(probe, report.clone());
        state.status = status;
        Some(report)
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsState {
        self.state.lock().clone()
    }

    /// Last report of `probe`.
    #[must_use]
    pub fn report(&self, probe: Probe) -> Option<ProbeReport> {
        self.state.lock().report(probe).cloned()
    }
}
