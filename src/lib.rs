use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use std::path::PathBuf;

// --- Declare modules ---
pub mod api;
pub mod codec;
mod config;
pub mod day_query;
pub mod duplicate;
pub mod error;
pub mod models;
pub mod store;

// --- Expose public types ---
pub use api::{HttpWorkoutApi, RemoteWorkout, WorkoutApi};
pub use codec::{FormatError, PartialRecord};
pub use config::{
    get_config_path as get_config_path_util, load as load_config_util, parse_color,
    save as save_config_util, Config, ConfigError, StandardColor, ThemeConfig,
};
pub use day_query::{DayQueryCoordinator, DayStatus, FetchTicket};
pub use error::{MutationError, RemoteError, StaleResult, SubmitError};
pub use models::{Category, Session, ValidationError, WorkoutFields, WorkoutId, WorkoutRecord};
pub use store::{MutationOutcome, MutationTicket, OptimisticStore, PendingRequest};

/// Field overrides for an edit; `None` keeps the current value.
#[derive(Default, Debug, Clone)]
pub struct EditWorkoutParams {
    pub id: WorkoutId,
    pub new_category: Option<Category>,
    pub new_workout_name: Option<String>,
    pub new_sets: Option<u32>,
    pub new_reps: Option<u32>,
    pub new_weight: Option<f64>,
    pub new_duration: Option<f64>,
}

impl EditWorkoutParams {
    fn apply_to(&self, current: &WorkoutFields) -> WorkoutFields {
        WorkoutFields {
            category: self.new_category.unwrap_or(current.category),
            workout_name: self
                .new_workout_name
                .as_deref()
                .map(str::trim)
                .map_or_else(|| current.workout_name.clone(), str::to_string),
            sets: self.new_sets.unwrap_or(current.sets),
            reps: self.new_reps.unwrap_or(current.reps),
            weight: self.new_weight.unwrap_or(current.weight),
            duration: self.new_duration.unwrap_or(current.duration),
        }
    }
}

/// Ties the store and the day coordinator to one backend and one session.
pub struct AppService {
    pub config: Config,
    pub config_path: PathBuf,
    api: Box<dyn WorkoutApi>,
    session: Session,
    store: OptimisticStore,
    days: DayQueryCoordinator,
    // Fixed "today" for tests; the system clock otherwise.
    pinned_today: Option<NaiveDate>,
}

impl AppService {
    /// Loads the config and connects to the configured server.
    /// # Errors
    /// Returns `anyhow::Error` if the config cannot be loaded or the HTTP client cannot be built.
    pub fn initialize(session: Session) -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;
        let api = HttpWorkoutApi::new(&config.server_url, config.request_timeout())
            .with_context(|| format!("Failed to set up client for {}", config.server_url))?;

        Ok(Self::with_api(config, config_path, Box::new(api), session))
    }

    /// Builds a service around any backend, e.g. an in-memory one.
    pub fn with_api(
        config: Config,
        config_path: PathBuf,
        api: Box<dyn WorkoutApi>,
        session: Session,
    ) -> Self {
        let store = OptimisticStore::new().with_strict_text(config.strict_text_validation);
        Self {
            config,
            config_path,
            api,
            session,
            store,
            days: DayQueryCoordinator::new(),
            pinned_today: None,
        }
    }

    /// Uses `day` instead of the system clock as the day new workouts land on.
    pub fn with_today(mut self, day: NaiveDate) -> Self {
        self.pinned_today = Some(day);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.pinned_today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(&self.config_path, &self.config)
    }

    /// # Errors
    /// - `ConfigError::InvalidServerUrl` for a non-http(s) URL.
    /// - `ConfigError` variants if saving fails.
    pub fn set_server_url(&mut self, url: &str) -> Result<(), ConfigError> {
        self.config.set_server_url(url)?;
        self.save_config()
    }

    pub fn snapshot(&self) -> &[WorkoutRecord] {
        self.store.snapshot()
    }

    pub fn store(&self) -> &OptimisticStore {
        &self.store
    }

    pub fn status(&self) -> &DayStatus {
        self.days.status()
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.days.selected_date()
    }

    /// Selects `date` and loads its workouts.
    /// # Errors
    /// Returns `anyhow::Error` carrying the readable message if the fetch failed.
    pub async fn load_day(&mut self, date: NaiveDate) -> Result<&[WorkoutRecord]> {
        let status = self
            .days
            .change_date(self.api.as_ref(), &self.session, &mut self.store, date)
            .await;
        if let DayStatus::Failed(message) = status {
            bail!("Failed to fetch workouts for {date}: {message}");
        }
        Ok(self.store.snapshot())
    }

    /// Loads `date` unless it is already the selected, loaded day.
    /// # Errors
    /// As [`Self::load_day`].
    pub async fn ensure_day(&mut self, date: NaiveDate) -> Result<&[WorkoutRecord]> {
        if self.days.selected_date() == Some(date) && *self.days.status() == DayStatus::Ready {
            return Ok(self.store.snapshot());
        }
        self.load_day(date).await
    }

    /// Local duplicate check against the loaded day.
    pub fn is_duplicate(&self, text: &str) -> bool {
        duplicate::is_duplicate(text, self.store.snapshot())
    }

    // The server files a new workout under its own today, so that is the
    // day the duplicate check and the append must run against.
    async fn ensure_today(&mut self) -> Result<(), SubmitError> {
        let today = self.today();
        if self.days.selected_date() == Some(today) && *self.days.status() == DayStatus::Ready {
            return Ok(());
        }
        let ticket = self.days.select_date(today, &mut self.store);
        let result = self.api.fetch_day(&self.session, Some(today)).await;
        let failure = result.as_ref().err().cloned();
        // `&mut self` is held across the fetch, so the ticket cannot go stale.
        self.days.resolve(ticket, result, &mut self.store).ok();
        match failure {
            Some(e) => Err(SubmitError::Remote(e)),
            None => Ok(()),
        }
    }

    /// Submits workout text for today, switching the loaded day to today
    /// first if needed.
    /// # Errors
    /// `SubmitError` for malformed text, a local duplicate, or a server refusal
    /// (including failing to load today's workouts).
    pub async fn add_workout(&mut self, text: &str) -> Result<WorkoutRecord, SubmitError> {
        self.store.check_text(text)?;
        self.ensure_today().await?;
        self.store
            .add(self.api.as_ref(), &self.session, text)
            .await
    }

    /// Encodes structured fields and submits them.
    /// # Errors
    /// `SubmitError::Format` if the fields are out of range, otherwise as [`Self::add_workout`].
    pub async fn add_workout_fields(
        &mut self,
        fields: &WorkoutFields,
    ) -> Result<WorkoutRecord, SubmitError> {
        fields.validate().map_err(FormatError::from)?;
        let text = codec::encode(fields);
        self.add_workout(&text).await
    }

    /// Applies the overrides to the current record, optimistically.
    /// # Errors
    /// `MutationError` for an unknown or busy id, or out-of-range fields.
    pub async fn edit_workout(
        &mut self,
        params: &EditWorkoutParams,
    ) -> Result<MutationOutcome, MutationError> {
        let current = self
            .store
            .get(&params.id)
            .ok_or_else(|| MutationError::UnknownWorkout(params.id.clone()))?;
        let fields = params.apply_to(&current.fields);
        self.store
            .edit(self.api.as_ref(), &self.session, &params.id, fields)
            .await
    }

    /// # Errors
    /// `MutationError` for an unknown or busy id.
    pub async fn delete_workout(&mut self, id: &WorkoutId) -> Result<MutationOutcome, MutationError> {
        self.store
            .remove(self.api.as_ref(), &self.session, id)
            .await
    }
}
