// src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

/// Fixed set of workout categories offered by the tracker.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, Display,
)]
pub enum Category {
    Legs,
    Chest,
    Back,
    Shoulders,
    Arms,
    Core,
    Cardio,
    #[serde(rename = "Full Body")]
    #[strum(serialize = "Full Body")]
    FullBody,
    Other,
}

impl Category {
    /// Looks a category up by its display label, ignoring surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        Self::iter().find(|c| c.to_string() == trimmed)
    }

    pub fn labels() -> Vec<String> {
        Self::iter().map(|c| c.to_string()).collect()
    }
}

/// Server-assigned identifier. Opaque to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Placeholder for fetched records that arrive without an id.
    pub fn placeholder(index: usize) -> Self {
        Self(format!("temp-{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with("temp-")
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkoutId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The editable part of a workout. Sent as the body of an update and used as
/// the structured input to the text encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutFields {
    pub category: Category,
    pub workout_name: String,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
    pub duration: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid workout: {}", .problems.join("; "))]
pub struct ValidationError {
    pub problems: Vec<String>,
}

impl WorkoutFields {
    /// Checks the same bounds the structured entry form enforces.
    /// # Errors
    /// Returns a `ValidationError` listing every field that is out of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut problems = Vec::new();
        if self.workout_name.trim().is_empty() {
            problems.push("Workout name is required".to_string());
        }
        if self.sets < 1 {
            problems.push("Enter valid number of sets".to_string());
        }
        if self.reps < 1 {
            problems.push("Enter valid number of reps".to_string());
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            problems.push("Enter valid weight".to_string());
        }
        if !self.duration.is_finite() || self.duration < 1.0 {
            problems.push("Enter valid duration".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { problems })
        }
    }
}

/// A workout as held in a day snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: WorkoutId,
    #[serde(flatten)]
    pub fields: WorkoutFields,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<f64>,
}

impl WorkoutRecord {
    pub fn category(&self) -> Category {
        self.fields.category
    }

    pub fn workout_name(&self) -> &str {
        &self.fields.workout_name
    }

    /// Same record with its editable fields swapped out; id and date are kept.
    pub fn with_fields(&self, fields: WorkoutFields) -> Self {
        Self {
            id: self.id.clone(),
            fields,
            date: self.date,
            calories_burned: self.calories_burned,
        }
    }
}

/// Credential passed explicitly into every remote call.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn bearer_token(&self) -> &str {
        &self.token
    }
}

// Never print the token itself.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}
