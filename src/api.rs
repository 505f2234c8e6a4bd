// src/api.rs
use crate::error::RemoteError;
use crate::models::{Category, Session, WorkoutFields, WorkoutId, WorkoutRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// A workout as the server reports it. Older documents may lack numeric
/// fields or an id, and the name arrives as either `workoutName` or `name`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteWorkout {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, alias = "name")]
    pub workout_name: String,
    #[serde(default)]
    pub sets: Option<u32>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub calories_burned: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
}

impl RemoteWorkout {
    fn parsed_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.date_naive())
            .ok()
            .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
    }

    /// Converts to a snapshot record. `fallback_id` is used when the server
    /// sent none; `day` stands in for a missing or unreadable date.
    pub fn into_record(self, fallback_id: WorkoutId, day: NaiveDate) -> WorkoutRecord {
        let date = self.parsed_date().unwrap_or(day);
        let category = Category::from_label(&self.category).unwrap_or_else(|| {
            warn!(
                "Unknown category '{}' for workout '{}', filing under Other",
                self.category, self.workout_name
            );
            Category::Other
        });
        WorkoutRecord {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .map(WorkoutId::new)
                .unwrap_or(fallback_id),
            fields: WorkoutFields {
                category,
                workout_name: self.workout_name,
                sets: self.sets.unwrap_or_default(),
                reps: self.reps.unwrap_or_default(),
                weight: self.weight.unwrap_or_default(),
                duration: self.duration.unwrap_or_default(),
            },
            date,
            calories_burned: self.calories_burned,
        }
    }
}

/// The backend as seen by the client core. Every call carries the caller's
/// session explicitly.
#[async_trait]
pub trait WorkoutApi: Send + Sync {
    async fn create(&self, session: &Session, workout_string: &str)
        -> Result<RemoteWorkout, RemoteError>;

    /// `None` asks the server for today.
    async fn fetch_day(
        &self,
        session: &Session,
        date: Option<NaiveDate>,
    ) -> Result<Vec<RemoteWorkout>, RemoteError>;

    async fn update(
        &self,
        session: &Session,
        id: &WorkoutId,
        fields: &WorkoutFields,
    ) -> Result<(), RemoteError>;

    async fn delete(&self, session: &Session, id: &WorkoutId) -> Result<(), RemoteError>;
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CreatePayload<'a> {
    workout_string: &'a str,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct DayResponse {
    #[serde(default)]
    todays_workouts: Vec<RemoteWorkout>,
}

/// Date filter in the month/day/year form the server expects.
pub fn format_date_query(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        error!("Request timeout: {err}");
        RemoteError::Timeout
    } else if err.is_decode() {
        error!("Could not decode response: {err}");
        RemoteError::Decode(err.to_string())
    } else {
        error!("Network error: {err}");
        RemoteError::Network
    }
}

pub struct HttpWorkoutApi {
    http_client: Client,
    server_url: String,
}

impl HttpWorkoutApi {
    /// # Errors
    /// Returns `anyhow::Error` if the HTTP client cannot be built.
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http_client,
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    fn workout_url(&self) -> String {
        format!("{}/user/workout", self.server_url)
    }

    async fn send(&self, request: RequestBuilder, session: &Session) -> Result<Response, RemoteError> {
        let response = request
            .bearer_auth(session.bearer_token())
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error body".to_string());
            error!("Request failed with status: {}. Body: {}", status, error_body);
            return Err(RemoteError::from_status(status.as_u16(), &error_body));
        }
        Ok(response)
    }
}

#[async_trait]
impl WorkoutApi for HttpWorkoutApi {
    async fn create(
        &self,
        session: &Session,
        workout_string: &str,
    ) -> Result<RemoteWorkout, RemoteError> {
        let url = self.workout_url();
        info!("Sending POST to {}", url);
        debug!("Workout string: {:?}", workout_string);

        let request = self
            .http_client
            .post(&url)
            .json(&CreatePayload { workout_string });
        let created: RemoteWorkout = self
            .send(request, session)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        info!("Server accepted workout, id: {:?}", created.id);
        Ok(created)
    }

    async fn fetch_day(
        &self,
        session: &Session,
        date: Option<NaiveDate>,
    ) -> Result<Vec<RemoteWorkout>, RemoteError> {
        let url = self.workout_url();
        let mut request = self.http_client.get(&url);
        if let Some(day) = date {
            request = request.query(&[("date", format_date_query(day))]);
        }
        info!("Sending GET to {} for {:?}", url, date);

        let body: DayResponse = self
            .send(request, session)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        info!("Received {} workouts", body.todays_workouts.len());
        Ok(body.todays_workouts)
    }

    async fn update(
        &self,
        session: &Session,
        id: &WorkoutId,
        fields: &WorkoutFields,
    ) -> Result<(), RemoteError> {
        let url = format!("{}/{}", self.workout_url(), id);
        info!("Sending PUT to {}", url);
        self.send(self.http_client.put(&url).json(fields), session)
            .await?;
        Ok(())
    }

    async fn delete(&self, session: &Session, id: &WorkoutId) -> Result<(), RemoteError> {
        let url = format!("{}/{}", self.workout_url(), id);
        info!("Sending DELETE to {}", url);
        self.send(self.http_client.delete(&url), session).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    #[test]
    fn date_query_is_month_day_year_without_padding() {
        assert_eq!(format_date_query(day()), "1/5/2024");
    }

    #[test]
    fn remote_record_accepts_mongo_shape() {
        let json = r#"{
            "_id": "65a1",
            "category": "Full Body",
            "name": "Burpees",
            "sets": 3, "reps": 15, "weight": 0, "duration": 12,
            "caloriesBurned": 80,
            "date": "2024-01-04T18:30:00.000Z"
        }"#;
        let remote: RemoteWorkout = serde_json::from_str(json).unwrap();
        let record = remote.into_record(WorkoutId::placeholder(0), day());
        assert_eq!(record.id, WorkoutId::new("65a1"));
        assert_eq!(record.category(), Category::FullBody);
        assert_eq!(record.workout_name(), "Burpees");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(record.calories_burned, Some(80.0));
    }

    fn session() -> Session {
        Session::new("t")
    }

    // Answers every connection with one canned HTTP response.
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let mut seen = Vec::new();
            while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                seen.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}/api")
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_error() {
        let api = HttpWorkoutApi::new("http://127.0.0.1:1/api", Duration::from_secs(2)).unwrap();
        let err = api.fetch_day(&session(), Some(day())).await.unwrap_err();
        assert_eq!(err, RemoteError::Network);
        assert_eq!(
            err.to_string(),
            "Network error - please check if the server is running"
        );
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        // Accepted by the OS backlog, never answered.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api", listener.local_addr().unwrap());
        let api = HttpWorkoutApi::new(&url, Duration::from_millis(200)).unwrap();

        let err = api.fetch_day(&session(), Some(day())).await.unwrap_err();
        assert_eq!(err, RemoteError::Timeout);
        assert_eq!(err.to_string(), "Request timeout - please try again");
        drop(listener);
    }

    #[tokio::test]
    async fn conflict_status_becomes_duplicate() {
        let url = serve_once(
            "HTTP/1.1 409 Conflict\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
        );
        let api = HttpWorkoutApi::new(&url, Duration::from_secs(2)).unwrap();
        let err = api
            .create(&session(), "#Legs\n-Squat\n-3 sets 10 reps\n-50 kg\n-20 min")
            .await
            .unwrap_err();
        assert_eq!(err, RemoteError::Duplicate);
    }

    #[tokio::test]
    async fn day_response_is_unwrapped() {
        let body = r#"{"todaysWorkouts":[{"_id":"65a1","category":"Legs","name":"Squat"}]}"#;
        let response: &'static str = Box::leak(
            format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
            .into_boxed_str(),
        );
        let api = HttpWorkoutApi::new(&serve_once(response), Duration::from_secs(2)).unwrap();
        let workouts = api.fetch_day(&session(), Some(day())).await.unwrap();
        assert_eq!(workouts.len(), 1);
        assert_eq!(workouts[0].id.as_deref(), Some("65a1"));
        assert_eq!(workouts[0].workout_name, "Squat");
    }

    #[test]
    fn missing_id_and_date_fall_back() {
        let json = r#"{ "category": "Yoga", "workoutName": "Flow" }"#;
        let remote: RemoteWorkout = serde_json::from_str(json).unwrap();
        let record = remote.into_record(WorkoutId::placeholder(3), day());
        assert_eq!(record.id.as_str(), "temp-3");
        assert_eq!(record.category(), Category::Other);
        assert_eq!(record.date, day());
    }
}
