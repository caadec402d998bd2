#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use campus_events::database::models::{Event, NewEvent, User};
use campus_events::database::{MemoryStore, Store};
use campus_events::services::{DeliveryError, ResetCodeNotifier};
use campus_events::types::{Category, Role};
use campus_events::{app, AppState};

/// Captures reset codes instead of delivering them
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl ResetCodeNotifier for RecordingNotifier {
    async fn send_reset_code(&self, user: &User, code: &str) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .unwrap()
            .push((user.email.clone(), code.to_string()));
        Ok(())
    }
}

/// One server per test, each with its own empty store
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub struct Account {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::new(store.clone(), notifier.clone());

        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.ok();
        });

        let test_app = Self {
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            store,
            notifier,
        };
        test_app.wait_ready(Duration::from_secs(5)).await?;
        Ok(test_app)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> Result<(StatusCode, Value)> {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await?).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: &Value) -> Result<(StatusCode, Value)> {
        let mut req = self.client.put(self.url(path)).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await?).await
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        read(self.client.get(self.url(path)).send().await?).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        let mut req = self.client.delete(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await?).await
    }

    /// Register a student account and return its credentials
    pub async fn signup(&self, name: &str, email: &str) -> Result<Account> {
        let (status, body) = self
            .post(
                "/api/auth/signup",
                None,
                &json!({ "name": name, "email": email, "password": "secret123" }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "signup failed: {} {}", status, body);

        Ok(Account {
            id: body["data"]["user"]["id"].as_str().context("missing user id")?.to_string(),
            email: email.to_string(),
            token: body["data"]["token"].as_str().context("missing token")?.to_string(),
        })
    }

    /// Register an account and give it `role` directly in the store.
    /// Roles are read from the store on each request, so the signup token stays valid.
    pub async fn account_with_role(&self, name: &str, email: &str, role: Role) -> Result<Account> {
        let account = self.signup(name, email).await?;
        self.store
            .update_user_role(email, role)
            .await?
            .context("account vanished")?;
        Ok(account)
    }

    /// Create a valid event as `token` and return its id
    pub async fn create_event(&self, token: &str, total_seats: i64) -> Result<String> {
        let (status, body) = self.post("/api/events", Some(token), &event_body(total_seats)).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create failed: {} {}", status, body);
        Ok(body["data"]["id"].as_str().context("missing event id")?.to_string())
    }
}

impl TestApp {
    /// Insert an event whose bookings have already consumed some seats.
    /// Bookings are made outside this service, so this goes straight to the store.
    pub async fn seed_booked_event(&self, organizer: &Account, total: i32, available: i32) -> Result<String> {
        let now = chrono::Utc::now();
        let mut event = Event::new(
            organizer.id.parse()?,
            NewEvent {
                name: "Robotics Workshop".to_string(),
                description: "Build a line follower in an afternoon".to_string(),
                date: chrono::NaiveDate::from_ymd_opt(2099, 3, 14).context("bad date")?,
                time: "14:30".to_string(),
                venue: "Main Auditorium".to_string(),
                organized_by: "IEEE Student Branch".to_string(),
                total_seats: total,
                category: Category::Workshop,
                registration_deadline: now + chrono::Duration::days(30),
                contact_email: "ieee@campus.edu".to_string(),
                contact_phone: "9876543210".to_string(),
            },
            now,
        );
        event.available_seats = available;
        let event = self.store.insert_event(event).await?;
        Ok(event.id.to_string())
    }
}

pub fn event_body(total_seats: i64) -> Value {
    json!({
        "name": "Robotics Workshop",
        "description": "Build a line follower in an afternoon",
        "date": "2099-03-14",
        "time": "14:30",
        "venue": "Main Auditorium",
        "organizedBy": "IEEE Student Branch",
        "totalSeats": total_seats,
        "category": "Workshop",
        "registrationDeadline": "2099-03-10T18:00:00Z",
        "contactEmail": "ieee@campus.edu",
        "contactPhone": "9876543210"
    })
}

async fn read(resp: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = resp.status();
    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    Ok((status, body))
}
