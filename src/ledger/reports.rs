use tracing::{debug, info};

use crate::error::PopupError;

use super::entities::WeeklyReport;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReportState {
    #[default]
    NotLoaded,
    Loading,
    Loaded(Vec<WeeklyReport>),
    Failed(String),
}

/// Handed out when a fetch starts. Only the most recent ticket is allowed to write into the
/// cache.
#[derive(Debug, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

/// Weekly reports for the current session. Nothing here outlives the session.
#[derive(Debug, Default)]
pub struct ReportCache {
    state: ReportState,
    generation: u64,
}

impl ReportCache {
    pub fn state(&self) -> &ReportState {
        &self.state
    }

    pub fn reports(&self) -> &[WeeklyReport] {
        match &self.state {
            ReportState::Loaded(reports) => reports,
            _ => &[],
        }
    }

    /// Replaces the cached list. Reports are ordered by week, newest first.
    pub fn ingest(&mut self, mut reports: Vec<WeeklyReport>) {
        reports.sort_by(|a, b| b.week_start.cmp(&a.week_start));
        info!("Ingested {} weekly reports", reports.len());
        self.state = ReportState::Loaded(reports);
    }

    /// Starts a new fetch. Whichever fetch was still running loses its right to write.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        if self.state == ReportState::Loading {
            debug!("Superseding report fetch {}", self.generation);
        }
        self.generation += 1;
        self.state = ReportState::Loading;
        FetchTicket {
            generation: self.generation,
        }
    }

    /// Applies the outcome of a fetch. Returns `Ok(false)` when the ticket was superseded and the
    /// outcome got discarded. A failure that was applied is handed back to the caller.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<WeeklyReport>, PopupError>,
    ) -> Result<bool, PopupError> {
        if ticket.generation != self.generation {
            debug!(
                "Discarding report fetch {} in favour of {}",
                ticket.generation, self.generation
            );
            return Ok(false);
        }
        match result {
            Ok(reports) => {
                self.ingest(reports);
                Ok(true)
            }
            Err(e) => {
                self.state = ReportState::Failed("Failed to load reports".into());
                Err(e)
            }
        }
    }
}
