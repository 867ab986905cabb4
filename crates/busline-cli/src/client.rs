//! HTTP client for the busline server.
//!
//! Driver calls ride on the session cookie set by `/login`, so one client
//! instance is one logged-in driver.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use busline_core::{DriverId, PositionRecord};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub struct BuslineClient {
    base_url: String,
    driver: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct LocationUpdate {
    lat: f64,
    lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    accuracy: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl BuslineClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            driver: None,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Driver this client is logged in as.
    pub fn driver(&self) -> Option<&str> {
        self.driver.as_deref()
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        let body: LoginResponse = response.json().await?;
        if !status.is_success() || body.status != "success" {
            bail!(
                "login as {} failed ({}): {}",
                username,
                status,
                body.message.unwrap_or_default()
            );
        }

        self.driver = Some(username.to_string());
        Ok(())
    }

    /// Report a position; returns the server's capture timestamp.
    pub async fn update_location(&self, lat: f64, lng: f64, accuracy: Option<f64>) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint("/update_location"))
            .json(&LocationUpdate { lat, lng, accuracy })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let reason = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error)
                .unwrap_or_default();
            bail!("location update rejected ({}): {}", status, reason);
        }

        Ok(response.json::<UpdateResponse>().await?.timestamp)
    }

    /// The logged-in driver's own last position, if any.
    pub async fn my_location(&self) -> Result<Option<PositionRecord>> {
        let response = self
            .client
            .get(self.endpoint("/get_my_location"))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => bail!("get_my_location failed: {}", status),
        }
    }

    /// Every driver's last position. Empty when nobody has reported yet.
    pub async fn locations(&self) -> Result<BTreeMap<DriverId, PositionRecord>> {
        let response = self
            .client
            .get(self.endpoint("/get_locations"))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(BTreeMap::new()),
            status if status.is_success() => Ok(response.json().await?),
            status => bail!("get_locations failed: {}", status),
        }
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.client.get(self.endpoint("/logout")).send().await?;
        self.driver = None;
        Ok(())
    }
}
