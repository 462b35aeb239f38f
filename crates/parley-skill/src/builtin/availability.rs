// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Appointment availability lookup against the scheduling service.
//!
//! The model passes a loose date expression (`today`, `next friday`,
//! `2026-03-02`, `general`, ...). It is resolved against the current date
//! into either a single-day query or a month overview, sent to the
//! scheduling service's JSON endpoints, and summarized into a compact
//! JSON document with human-readable dates.

use async_trait::async_trait;
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use parley_config::model::SchedulingConfig;
use parley_core::ParleyError;
use serde_json::{Value, json};
use tracing::debug;

use crate::tool::{Tool, ToolContext, ToolOutput};

const INVALID_DATE: &str = "Invalid date format. Please use YYYY-MM-DD or a weekday name.";

/// What to ask the scheduling service for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityQuery {
    /// Open time slots on one day.
    Day(NaiveDate),
    /// Days with openings, scanning from the first of the given month.
    Month(NaiveDate),
}

/// Resolves a date expression relative to `today`.
///
/// Weekday names and three-letter abbreviations mean the next occurrence
/// strictly after `today`. An unrecognized weekday after `next` falls back
/// to the month overview. The error is the message shown to the model.
pub fn resolve_query(input: &str, today: NaiveDate) -> Result<AvailabilityQuery, String> {
    let input = input.trim().to_lowercase();
    let month_overview = AvailabilityQuery::Month(first_of_month(today));

    match input.as_str() {
        "general" => return Ok(month_overview),
        "today" => return Ok(AvailabilityQuery::Day(today)),
        "tomorrow" => return Ok(AvailabilityQuery::Day(today + Duration::days(1))),
        _ => {}
    }

    if let Ok(weekday) = input.parse::<Weekday>() {
        return Ok(AvailabilityQuery::Day(next_weekday(today, weekday)));
    }

    if let Some(rest) = input.strip_prefix("next") {
        if rest.is_empty() || rest.starts_with(' ') {
            let day = rest.trim();
            if day.is_empty() {
                return Err("Please provide a day after 'next' keyword".to_string());
            }
            return Ok(match day.parse::<Weekday>() {
                Ok(weekday) => AvailabilityQuery::Day(next_weekday(today, weekday)),
                Err(_) => month_overview,
            });
        }
    }

    NaiveDate::parse_from_str(&input, "%Y-%m-%d")
        .map(AvailabilityQuery::Day)
        .map_err(|_| INVALID_DATE.to_string())
}

/// Next date after `today` falling on `weekday`; a week ahead if `today` already is one.
pub fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = today.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    let mut days_ahead = (target - current).rem_euclid(7);
    if days_ahead == 0 {
        days_ahead = 7;
    }
    today + Duration::days(days_ahead)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn describe(date: NaiveDate) -> Value {
    json!({
        "date": date.format("%Y-%m-%d").to_string(),
        "day": date.format("%A").to_string(),
    })
}

fn parse_compact(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y%m%d").ok()
}

/// Normalizes a scheduling service response for the model.
pub fn summarize(query: AvailabilityQuery, today: NaiveDate, response: Value) -> Value {
    let mut summary = json!({ "today": describe(today) });
    match query {
        AvailabilityQuery::Day(_) => {
            if response.is_array() {
                summary["available_times"] = response;
            } else {
                summary["raw_response"] = response;
            }
        }
        AvailabilityQuery::Month(_) => {
            let mut days: Vec<NaiveDate> = response["available_days"]
                .as_object()
                .map(|days| days.keys().filter_map(|d| parse_compact(d)).collect())
                .unwrap_or_default();
            days.sort();
            summary["available_days"] = days.into_iter().map(describe).collect();
            summary["first_available_day"] = response["first_available_day"]
                .as_str()
                .and_then(parse_compact)
                .map(describe)
                .unwrap_or(Value::Null);
        }
    }
    summary
}

/// Checks open appointment slots for a day or a month.
pub struct CheckAvailabilityTool {
    client: reqwest::Client,
    config: SchedulingConfig,
    fixed_today: Option<NaiveDate>,
}

impl CheckAvailabilityTool {
    pub fn new(config: SchedulingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            fixed_today: None,
        }
    }

    /// Pins the reference date instead of reading the local clock.
    pub fn with_fixed_date(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.fixed_today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Scheduling service URL for a resolved query.
    pub fn query_url(&self, query: AvailabilityQuery) -> Result<reqwest::Url, ParleyError> {
        let base = format!(
            "{}/schedule/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.business_slug
        );
        let service_id = self.config.service_id.as_str();
        let time_zone = self.config.time_zone.as_str();

        let parsed = match query {
            AvailabilityQuery::Day(date) => reqwest::Url::parse_with_params(
                &format!("{base}/available_times_json"),
                &[
                    ("service_id", service_id),
                    ("date", date.format("%Y%m%d").to_string().as_str()),
                    ("time_zone", time_zone),
                ],
            ),
            AvailabilityQuery::Month(start) => reqwest::Url::parse_with_params(
                &format!("{base}/available_days_json"),
                &[
                    ("service_id", service_id),
                    ("start_date", start.format("%Y%m%d").to_string().as_str()),
                    ("time_zone", time_zone),
                    ("scan_to_first_available", "true"),
                ],
            ),
        };
        parsed.map_err(|e| ParleyError::Tool {
            message: format!("invalid scheduling URL: {e}"),
        })
    }

    async fn fetch(&self, url: reqwest::Url) -> Result<Value, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }
}

#[async_trait]
impl Tool for CheckAvailabilityTool {
    fn name(&self) -> &str {
        "check_availability"
    }

    fn description(&self) -> &str {
        "Check open appointment times. The date can be a specific date (YYYY-MM-DD), \
         a weekday name meaning its next occurrence (e.g. 'Monday', 'next Tuesday', 'Fri'), \
         'today', 'tomorrow', or 'general' for the days with openings this month"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "date": {
                    "type": "string",
                    "description": "Date expression, for example '2026-03-10', 'Monday', \
                                    'next wednesday', 'today', 'tomorrow' or 'general'"
                }
            },
            "required": ["date"]
        })
    }

    async fn invoke(&self, ctx: &ToolContext, input: Value) -> Result<ToolOutput, ParleyError> {
        let Some(expression) = input["date"].as_str() else {
            return Ok(ToolOutput::error("missing required 'date' parameter"));
        };

        let today = self.today();
        let query = match resolve_query(expression, today) {
            Ok(query) => query,
            Err(message) => return Ok(ToolOutput::error(message)),
        };
        let url = self.query_url(query)?;
        debug!(owner_id = ctx.owner_id(), expression, ?query, "checking availability");

        match self.fetch(url).await {
            Ok(response) => {
                let summary = summarize(query, today, response);
                let content = serde_json::to_string_pretty(&summary).map_err(|e| {
                    ParleyError::Tool {
                        message: format!("failed to encode availability: {e}"),
                    }
                })?;
                Ok(ToolOutput::ok(content))
            }
            Err(e) => Ok(ToolOutput::error(format!("Error fetching availability: {e}"))),
        }
    }
}
