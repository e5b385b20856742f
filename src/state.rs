use crate::error::DashboardError;
use crate::schema::PerformanceRecord;
use log::{debug, warn};

/// Handle for one fetch. Tickets are ordered: a later `begin_fetch` always
/// yields a larger ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Loaded { records: usize },
    Failed,
    Superseded,
}

/// Latest successfully loaded record set plus the error of the most recent
/// failed fetch. Each successful fetch replaces the records wholesale; a
/// failure leaves them in place.
#[derive(Debug, Default)]
pub struct DatasetState {
    records: Vec<PerformanceRecord>,
    error: Option<String>,
    next_ticket: u64,
    applied: Option<FetchTicket>,
    in_flight: usize,
}

impl DatasetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.next_ticket += 1;
        self.in_flight += 1;
        FetchTicket(self.next_ticket)
    }

    /// Applies the result of the fetch behind `ticket`, unless a newer fetch
    /// has already been applied.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<PerformanceRecord>, DashboardError>,
    ) -> ApplyOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        if self.applied.is_some_and(|applied| applied > ticket) {
            debug!("Discarding result of superseded fetch {:?}", ticket);
            return ApplyOutcome::Superseded;
        }
        self.applied = Some(ticket);

        match result {
            Ok(records) => {
                let count = records.len();
                self.records = records;
                self.error = None;
                ApplyOutcome::Loaded { records: count }
            }
            Err(err) => {
                warn!("Fetch {:?} failed: {}", ticket, err);
                self.error = Some(err.to_string());
                ApplyOutcome::Failed
            }
        }
    }

    pub fn records(&self) -> &[PerformanceRecord] {
        &self.records
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}
