//! UI state for the diagnostic screen.

use std::collections::HashMap;

use sims_application::{Probe, ProbeReport};
use sims_domain::ScreenState;

/// Last report per probe plus the status line.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsState {
    /// Most recent report of each probe that ran.
    pub reports: HashMap<Probe, ProbeReport>,
    /// Status line.
    pub status: ScreenState,
}

impl DiagnosticsState {
    /// Last report of `probe`.
    #[must_use]
    pub fn report(&self, probe: Probe) -> Option<&ProbeReport> {
        self.reports.get(&probe)
    }

    /// Reports in display order.
    #[must_use]
    pub fn ordered(&self) -> Vec<(Probe, &ProbeReport)> {
        Probe::ALL
            .into_iter()
            .filter_map(|probe| self.reports.get(&probe).map(|report| (probe, report)))
            .collect()
    }
}
