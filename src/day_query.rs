// src/day_query.rs
use crate::api::{RemoteWorkout, WorkoutApi};
use crate::error::{RemoteError, StaleResult};
use crate::models::{Session, WorkoutId};
use crate::store::OptimisticStore;
use chrono::NaiveDate;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayStatus {
    Idle,
    Loading,
    Ready,
    /// The fetch failed; whatever was loaded before stays visible.
    Failed(String),
}

/// One issued fetch. Only the most recently issued ticket may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "pass the fetch result to DayQueryCoordinator::resolve"]
pub struct FetchTicket {
    pub token: u64,
    pub date: NaiveDate,
}

/// Drives fetch-on-date-change for the store. Last request wins: every date
/// change issues a new token and answers carrying an older one are dropped.
#[derive(Debug)]
pub struct DayQueryCoordinator {
    selected: Option<NaiveDate>,
    latest_token: u64,
    status: DayStatus,
}

impl Default for DayQueryCoordinator {
    fn default() -> Self {
        Self {
            selected: None,
            latest_token: 0,
            status: DayStatus::Idle,
        }
    }
}

impl DayQueryCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected
    }

    pub fn status(&self) -> &DayStatus {
        &self.status
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.token == self.latest_token
    }

    /// Selects `date` and enters `Loading`. The caller issues the fetch.
    pub fn select_date(&mut self, date: NaiveDate, store: &mut OptimisticStore) -> FetchTicket {
        self.latest_token += 1;
        self.selected = Some(date);
        self.status = DayStatus::Loading;
        store.set_loading(true);
        debug!("Fetch #{} issued for {}", self.latest_token, date);
        FetchTicket {
            token: self.latest_token,
            date,
        }
    }

    /// Re-fetches the selected day, if any, under a fresh token.
    pub fn refresh(&mut self, store: &mut OptimisticStore) -> Option<FetchTicket> {
        let date = self.selected?;
        Some(self.select_date(date, store))
    }

    /// Applies a fetch result if `ticket` is still the latest one.
    ///
    /// Every record is given an id (`temp-<index>` when the server sent none)
    /// so the whole snapshot stays addressable by edit and remove.
    /// # Errors
    /// `StaleResult` when a newer fetch has been issued since; nothing is touched.
    pub fn resolve(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<RemoteWorkout>, RemoteError>,
        store: &mut OptimisticStore,
    ) -> Result<DayStatus, StaleResult> {
        if !self.is_current(&ticket) {
            debug!(
                "Dropping fetch #{} for {}, #{} is current",
                ticket.token, ticket.date, self.latest_token
            );
            return Err(StaleResult {
                token: ticket.token,
                current: self.latest_token,
            });
        }

        store.set_loading(false);
        match result {
            Ok(remote) => {
                let records = remote
                    .into_iter()
                    .enumerate()
                    .map(|(index, w)| w.into_record(WorkoutId::placeholder(index), ticket.date))
                    .collect::<Vec<_>>();
                info!("Loaded {} workouts for {}", records.len(), ticket.date);
                store.replace_snapshot(ticket.date, records);
                self.status = DayStatus::Ready;
            }
            Err(e) => {
                error!("Error fetching workouts for {}: {}", ticket.date, e);
                self.status = DayStatus::Failed(e.to_string());
            }
        }
        Ok(self.status.clone())
    }

    /// Selects `date`, fetches it and applies the answer.
    pub async fn change_date(
        &mut self,
        api: &dyn WorkoutApi,
        session: &Session,
        store: &mut OptimisticStore,
        date: NaiveDate,
    ) -> DayStatus {
        let ticket = self.select_date(date, store);
        let result = api.fetch_day(session, Some(date)).await;
        self.resolve(ticket, result, store)
            .unwrap_or_else(|_| self.status.clone())
    }
}
