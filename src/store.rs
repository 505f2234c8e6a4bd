// src/store.rs
//! The locally held workout list for the selected day.
//!
//! Edits and removals are applied to the snapshot before the server answers
//! and undone if it refuses. Creation waits for the server, since the record
//! is only addressable once it has a server-assigned id.
//!
//! Each operation comes in two shapes: a one-shot `async` method, and a
//! `begin_*` / `resolve` pair for an event loop that needs to interleave other
//! events (a date change, another edit) while the remote call is out.
use crate::api::{RemoteWorkout, WorkoutApi};
use crate::codec::{self, FormatError, PartialRecord};
use crate::duplicate;
use crate::error::{MutationError, RemoteError, SubmitError};
use crate::models::{Session, WorkoutFields, WorkoutId, WorkoutRecord};
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Result of an optimistic edit or removal once the server has answered.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Committed,
    RolledBack(RemoteError),
}

impl MutationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationOutcome::Committed)
    }
}

/// What has to be sent to the server for a pending mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingRequest {
    Update(WorkoutFields),
    Delete,
}

/// Handle for an edit/removal that has been applied locally and awaits the
/// server. Must be passed back to [`OptimisticStore::resolve`].
#[derive(Debug)]
#[must_use = "an unresolved mutation keeps its workout locked"]
pub struct MutationTicket {
    pub id: WorkoutId,
    pub request: PendingRequest,
    generation: u64,
}

impl MutationTicket {
    /// Issues the remote call this ticket stands for.
    /// # Errors
    /// Whatever `RemoteError` the API reports.
    pub async fn send(&self, api: &dyn WorkoutApi, session: &Session) -> Result<(), RemoteError> {
        match &self.request {
            PendingRequest::Update(fields) => api.update(session, &self.id, fields).await,
            PendingRequest::Delete => api.delete(session, &self.id).await,
        }
    }
}

/// Handle for a creation that passed the local checks.
#[derive(Debug)]
#[must_use = "pass the server's answer to OptimisticStore::commit_add"]
pub struct AddTicket {
    pub workout_string: String,
    parsed: PartialRecord,
    day: Option<NaiveDate>,
    generation: u64,
}

impl AddTicket {
    /// # Errors
    /// Whatever `RemoteError` the API reports.
    pub async fn send(
        &self,
        api: &dyn WorkoutApi,
        session: &Session,
    ) -> Result<RemoteWorkout, RemoteError> {
        api.create(session, &self.workout_string).await
    }
}

// The server may answer a create with little more than the id; whatever it
// leaves out is taken from the submitted text.
fn fill_from_text(created: &mut RemoteWorkout, ticket: &AddTicket) {
    if created.category.trim().is_empty() {
        created.category = ticket.parsed.category.clone();
    }
    if created.workout_name.trim().is_empty() {
        created.workout_name = ticket.parsed.workout_name.clone();
    }
    if let Ok(fields) = codec::decode_strict(&ticket.workout_string) {
        created.sets = created.sets.or(Some(fields.sets));
        created.reps = created.reps.or(Some(fields.reps));
        created.weight = created.weight.or(Some(fields.weight));
        created.duration = created.duration.or(Some(fields.duration));
    }
}

#[derive(Debug)]
struct PendingMutation {
    previous: WorkoutRecord,
    request: PendingRequest,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct OptimisticStore {
    day: Option<NaiveDate>,
    snapshot: Vec<WorkoutRecord>,
    // Bumped on every wholesale replacement; tickets from an older
    // generation never touch the current snapshot.
    generation: u64,
    loading: bool,
    pending: HashMap<WorkoutId, PendingMutation>,
    strict_text: bool,
}

impl OptimisticStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject workout text whose detail lines are not numeric.
    pub fn with_strict_text(mut self, strict: bool) -> Self {
        self.strict_text = strict;
        self
    }

    pub fn snapshot(&self) -> &[WorkoutRecord] {
        &self.snapshot
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.day
    }

    pub fn get(&self, id: &WorkoutId) -> Option<&WorkoutRecord> {
        self.snapshot.iter().find(|w| &w.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// True while any edit or removal is waiting on the server.
    pub fn action_in_flight(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_pending(&self, id: &WorkoutId) -> bool {
        self.pending.contains_key(id)
    }

    /// Swaps in a freshly fetched day. Mutations still pending against the
    /// old snapshot are forgotten; their answers will not be applied here.
    pub fn replace_snapshot(&mut self, day: NaiveDate, records: Vec<WorkoutRecord>) {
        if !self.pending.is_empty() {
            debug!(
                "Replacing snapshot with {} mutation(s) still pending, they will not roll back",
                self.pending.len()
            );
            self.pending.clear();
        }
        self.generation += 1;
        self.day = Some(day);
        self.snapshot = records;
    }

    // --- Add ---

    /// Format check alone, under this store's strictness. No snapshot access.
    /// # Errors
    /// `FormatError` if the text is malformed.
    pub fn check_text(&self, text: &str) -> Result<PartialRecord, FormatError> {
        if self.strict_text {
            codec::decode_strict(text)?;
        }
        codec::decode(text)
    }

    /// Runs the local checks for a new workout.
    /// # Errors
    /// - `SubmitError::Format` if the text is malformed.
    /// - `SubmitError::Duplicate` if the day already holds the same category and name.
    pub fn begin_add(&self, text: &str) -> Result<AddTicket, SubmitError> {
        let parsed = self.check_text(text)?;
        if duplicate::is_duplicate(text, &self.snapshot) {
            return Err(SubmitError::Duplicate);
        }
        Ok(AddTicket {
            workout_string: text.trim().to_string(),
            parsed,
            day: self.day,
            generation: self.generation,
        })
    }

    /// Appends the server's record, provided it belongs to the loaded day.
    /// Nothing is added on failure.
    /// # Errors
    /// `SubmitError::Remote` if the server refused or its answer lacks an id.
    pub fn commit_add(
        &mut self,
        ticket: AddTicket,
        result: Result<RemoteWorkout, RemoteError>,
    ) -> Result<WorkoutRecord, SubmitError> {
        let mut created = result.map_err(|e| {
            warn!("Server rejected new workout: {e}");
            SubmitError::Remote(e)
        })?;
        if created.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
            return Err(SubmitError::Remote(RemoteError::Decode(
                "created workout has no id".to_string(),
            )));
        }

        fill_from_text(&mut created, &ticket);
        let day = ticket.day.unwrap_or_else(|| Utc::now().date_naive());
        let record = created.into_record(WorkoutId::placeholder(self.snapshot.len()), day);

        if ticket.generation != self.generation || ticket.day != self.day {
            debug!(
                "Workout {} created after the day changed, not appending",
                record.id
            );
        } else if self.day != Some(record.date) {
            // The server files new workouts under its own today.
            warn!(
                "Workout {} was filed under {}, not the loaded day {:?}; not appending",
                record.id, record.date, self.day
            );
        } else {
            info!("Added workout {} ({})", record.id, record.workout_name());
            self.snapshot.push(record.clone());
        }
        Ok(record)
    }

    /// Validates, checks for duplicates, creates remotely, then appends.
    /// # Errors
    /// See [`Self::begin_add`] and [`Self::commit_add`].
    pub async fn add(
        &mut self,
        api: &dyn WorkoutApi,
        session: &Session,
        text: &str,
    ) -> Result<WorkoutRecord, SubmitError> {
        let ticket = self.begin_add(text)?;
        let result = ticket.send(api, session).await;
        self.commit_add(ticket, result)
    }

    // --- Edit / remove ---

    fn check_available(&self, id: &WorkoutId) -> Result<usize, MutationError> {
        if self.pending.contains_key(id) {
            return Err(MutationError::MutationPending(id.clone()));
        }
        self.snapshot
            .iter()
            .position(|w| &w.id == id)
            .ok_or_else(|| MutationError::UnknownWorkout(id.clone()))
    }

    /// Replaces the record in place right away.
    /// # Errors
    /// - `MutationError::Invalid` if `fields` are out of range.
    /// - `MutationError::UnknownWorkout` / `MutationPending`.
    pub fn begin_edit(
        &mut self,
        id: &WorkoutId,
        fields: WorkoutFields,
    ) -> Result<MutationTicket, MutationError> {
        fields.validate()?;
        let pos = self.check_available(id)?;

        let previous = self.snapshot[pos].clone();
        self.snapshot[pos] = previous.with_fields(fields.clone());
        Ok(self.track(previous, PendingRequest::Update(fields)))
    }

    /// Takes the record out of the snapshot right away.
    /// # Errors
    /// `MutationError::UnknownWorkout` / `MutationPending`.
    pub fn begin_remove(&mut self, id: &WorkoutId) -> Result<MutationTicket, MutationError> {
        let pos = self.check_available(id)?;
        let previous = self.snapshot.remove(pos);
        Ok(self.track(previous, PendingRequest::Delete))
    }

    fn track(&mut self, previous: WorkoutRecord, request: PendingRequest) -> MutationTicket {
        let id = previous.id.clone();
        debug!("Optimistic {:?} applied to {}", request, id);
        self.pending.insert(
            id.clone(),
            PendingMutation {
                previous,
                request: request.clone(),
                generation: self.generation,
            },
        );
        MutationTicket {
            id,
            request,
            generation: self.generation,
        }
    }

    /// Settles a pending mutation with the server's answer. A failed edit is
    /// put back where it was; a failed removal is appended at the end.
    pub fn resolve(
        &mut self,
        ticket: MutationTicket,
        result: Result<(), RemoteError>,
    ) -> MutationOutcome {
        let pending = match self.pending.remove(&ticket.id) {
            Some(p) if p.generation == ticket.generation && p.generation == self.generation => {
                Some(p)
            }
            Some(p) => {
                // Belongs to some other ticket; leave it alone.
                self.pending.insert(ticket.id.clone(), p);
                None
            }
            None => None,
        };

        let err = match result {
            Ok(()) => {
                info!("Workout {} {:?} confirmed", ticket.id, ticket.request);
                return MutationOutcome::Committed;
            }
            Err(e) => e,
        };

        let Some(pending) = pending else {
            debug!(
                "Workout {} failed after its day was replaced, nothing to roll back",
                ticket.id
            );
            return MutationOutcome::RolledBack(err);
        };

        warn!("Rolling back {:?} on workout {}: {err}", pending.request, ticket.id);
        match pending.request {
            PendingRequest::Update(_) => {
                match self.snapshot.iter().position(|w| w.id == ticket.id) {
                    Some(pos) => self.snapshot[pos] = pending.previous,
                    None => self.snapshot.push(pending.previous),
                }
            }
            PendingRequest::Delete => self.snapshot.push(pending.previous),
        }
        MutationOutcome::RolledBack(err)
    }

    /// Optimistic edit followed by the remote update.
    /// # Errors
    /// Local precondition failures only; a server refusal is reported as
    /// `MutationOutcome::RolledBack`.
    pub async fn edit(
        &mut self,
        api: &dyn WorkoutApi,
        session: &Session,
        id: &WorkoutId,
        fields: WorkoutFields,
    ) -> Result<MutationOutcome, MutationError> {
        let ticket = self.begin_edit(id, fields)?;
        let result = ticket.send(api, session).await;
        Ok(self.resolve(ticket, result))
    }

    /// Optimistic removal followed by the remote delete.
    /// # Errors
    /// Local precondition failures only, as for [`Self::edit`].
    pub async fn remove(
        &mut self,
        api: &dyn WorkoutApi,
        session: &Session,
        id: &WorkoutId,
    ) -> Result<MutationOutcome, MutationError> {
        let ticket = self.begin_remove(id)?;
        let result = ticket.send(api, session).await;
        Ok(self.resolve(ticket, result))
    }
}
