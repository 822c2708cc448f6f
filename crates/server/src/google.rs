//! Google Calendar v3 over REST.
//!
//! Bookings are all-day events; Google's all-day `end.date` is already exclusive, which
//! matches `DateInterval`. Timed events from other sources are widened to whole days in
//! the business time zone.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use stayline_core::calendar::{CalendarError, CalendarEvent, CalendarStore, NewCalendarEvent};
use stayline_core::domain::booking::DateInterval;
use tracing::debug;

pub struct GoogleCalendar {
    client: Client,
    events_url: Url,
    access_token: SecretString,
    time_zone: Tz,
}

impl GoogleCalendar {
    pub fn new(
        api_base_url: &str,
        calendar_id: &str,
        access_token: SecretString,
        time_zone: Tz,
        timeout: Duration,
    ) -> Result<Self, CalendarError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| CalendarError::Unavailable(error.to_string()))?;
        let events_url = events_url(api_base_url, calendar_id)?;
        Ok(Self { client, events_url, access_token, time_zone })
    }

    fn midnight(&self, date: NaiveDate) -> String {
        let naive = date.and_time(NaiveTime::MIN);
        self.time_zone
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.to_rfc3339())
            .unwrap_or_else(|| naive.and_utc().to_rfc3339())
    }
}

fn events_url(api_base_url: &str, calendar_id: &str) -> Result<Url, CalendarError> {
    let mut url = Url::parse(api_base_url.trim_end_matches('/'))
        .map_err(|error| CalendarError::Unavailable(format!("invalid api base url: {error}")))?;
    url.path_segments_mut()
        .map_err(|_| CalendarError::Unavailable("api base url cannot carry a path".to_owned()))?
        .pop_if_empty()
        .extend(["calendars", calendar_id, "events"]);
    Ok(url)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventList {
    #[serde(default)]
    items: Vec<GoogleEvent>,
    #[serde(default)]
    next_page_token: Option<String>,
}

const MAX_EVENT_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
struct GoogleEvent {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    start: EventTime,
    #[serde(default)]
    end: EventTime,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_time: Option<DateTime<chrono::FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

#[derive(Debug, Serialize)]
struct InsertEvent<'a> {
    summary: &'a str,
    description: &'a str,
    start: EventTime,
    end: EventTime,
}

/// Day interval covered by a Google event. A timed event ending after midnight occupies its
/// end day too.
fn day_interval(start: &EventTime, end: &EventTime, zone: Tz) -> Option<DateInterval> {
    if let (Some(start), Some(end)) = (start.date, end.date) {
        return Some(DateInterval { start, end_exclusive: end.max(start + Days::new(1)) });
    }

    let start = start.date_time?.with_timezone(&zone);
    let end = end.date_time?.with_timezone(&zone);
    let first_day = start.date_naive();
    let last_day = if end.time() == NaiveTime::MIN { end.date_naive() } else { end.date_naive() + Days::new(1) };
    Some(DateInterval { start: first_day, end_exclusive: last_day.max(first_day + Days::new(1)) })
}

async fn rejected(response: reqwest::Response) -> CalendarError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = body.chars().take(300).collect();
    CalendarError::Rejected { status, message }
}

#[async_trait]
impl CalendarStore for GoogleCalendar {
    fn provider(&self) -> &'static str {
        "google"
    }

    async fn list_events(&self, window: DateInterval) -> Result<Vec<CalendarEvent>, CalendarError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_EVENT_PAGES {
            let mut query = vec![
                ("timeMin", self.midnight(window.start)),
                ("timeMax", self.midnight(window.end_exclusive)),
                ("singleEvents", "true".to_owned()),
                ("orderBy", "startTime".to_owned()),
            ];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let response = self
                .client
                .get(self.events_url.clone())
                .bearer_auth(self.access_token.expose_secret())
                .query(&query)
                .send()
                .await
                .map_err(|error| CalendarError::Unavailable(error.to_string()))?;

            if !response.status().is_success() {
                return Err(rejected(response).await);
            }

            let page: EventList =
                response.json().await.map_err(|error| CalendarError::Decode(error.to_string()))?;
            items.extend(page.items);
            page_token = page.next_page_token.filter(|token| !token.is_empty());
            if page_token.is_none() {
                break;
            }
        }

        if page_token.is_some() {
            return Err(CalendarError::Decode(format!(
                "event listing did not finish within {MAX_EVENT_PAGES} pages"
            )));
        }

        let events = items
            .into_iter()
            .filter(|event| event.status.as_deref() != Some("cancelled"))
            .filter_map(|event| {
                let interval = day_interval(&event.start, &event.end, self.time_zone)?;
                Some(CalendarEvent {
                    id: event.id,
                    summary: event.summary.unwrap_or_default(),
                    interval,
                })
            })
            .collect::<Vec<_>>();

        debug!(
            event_name = "calendar.google.listed",
            count = events.len(),
            window_start = %window.start,
            "google calendar events listed"
        );
        Ok(events)
    }

    async fn insert_event(&self, event: NewCalendarEvent) -> Result<CalendarEvent, CalendarError> {
        let zone = self.time_zone.name().to_owned();
        let body = InsertEvent {
            summary: &event.summary,
            description: &event.description,
            start: EventTime {
                date: Some(event.interval.start),
                time_zone: Some(zone.clone()),
                ..EventTime::default()
            },
            end: EventTime {
                date: Some(event.interval.end_exclusive),
                time_zone: Some(zone),
                ..EventTime::default()
            },
        };

        let response = self
            .client
            .post(self.events_url.clone())
            .bearer_auth(self.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|error| CalendarError::Unavailable(error.to_string()))?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let created: GoogleEvent =
            response.json().await.map_err(|error| CalendarError::Decode(error.to_string()))?;
        Ok(CalendarEvent {
            id: created.id,
            summary: created.summary.unwrap_or(event.summary),
            interval: event.interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use stayline_core::calendar::{CalendarError, CalendarStore, NewCalendarEvent};
    use stayline_core::domain::booking::DateInterval;

    use super::{day_interval, events_url, EventTime, GoogleCalendar};

    fn day(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, day).expect("date")
    }

    #[derive(Clone, Default)]
    struct Recorded {
        queries: Arc<Mutex<Vec<Vec<(String, String)>>>>,
        bodies: Arc<Mutex<Vec<Value>>>,
        auth: Arc<Mutex<Vec<String>>>,
    }

    async fn list(
        State(recorded): State<Recorded>,
        headers: HeaderMap,
        Query(query): Query<Vec<(String, String)>>,
    ) -> Json<Value> {
        if let Some(auth) = headers.get("authorization").and_then(|value| value.to_str().ok()) {
            recorded.auth.lock().expect("lock").push(auth.to_owned());
        }
        recorded.queries.lock().expect("lock").push(query);
        Json(json!({
            "items": [
                {"id": "all-day", "summary": "Booking", "start": {"date": "2024-08-11"}, "end": {"date": "2024-08-13"}},
                {"id": "gone", "status": "cancelled", "start": {"date": "2024-08-10"}, "end": {"date": "2024-08-11"}},
                {"id": "timed", "start": {"dateTime": "2024-08-14T15:00:00-05:00"}, "end": {"dateTime": "2024-08-15T11:00:00-05:00"}}
            ]
        }))
    }

    async fn insert(State(recorded): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
        recorded.bodies.lock().expect("lock").push(body.clone());
        Json(json!({"id": "evt-123", "summary": body["summary"]}))
    }

    async fn fake_google(recorded: Recorded) -> String {
        let app = Router::new()
            .route("/calendar/v3/calendars/{calendar}/events", get(list).post(insert))
            .with_state(recorded);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{address}/calendar/v3")
    }

    fn calendar(base: &str) -> GoogleCalendar {
        GoogleCalendar::new(
            base,
            "bookings@group.calendar.google.com",
            "ya29.token".to_owned().into(),
            chrono_tz::America::Chicago,
            Duration::from_secs(5),
        )
        .expect("client")
    }

    #[test]
    fn calendar_id_is_percent_encoded_into_the_path() {
        let url = events_url("https://www.googleapis.com/calendar/v3/", "a b@group.calendar.google.com")
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/a%20b@group.calendar.google.com/events"
        );
    }

    #[test]
    fn timed_events_cover_every_touched_day() {
        let zone = chrono_tz::America::Chicago;
        let start = EventTime {
            date_time: Some("2024-08-14T15:00:00-05:00".parse().expect("time")),
            ..EventTime::default()
        };
        let end = EventTime {
            date_time: Some("2024-08-15T00:00:00-05:00".parse().expect("time")),
            ..EventTime::default()
        };

        assert_eq!(
            day_interval(&start, &end, zone),
            Some(DateInterval { start: day(14), end_exclusive: day(15) })
        );
    }

    #[tokio::test]
    async fn lists_events_as_day_intervals() {
        let recorded = Recorded::default();
        let base = fake_google(recorded.clone()).await;

        let events = calendar(&base)
            .list_events(DateInterval { start: day(10), end_exclusive: day(16) })
            .await
            .expect("list");

        let intervals = events.iter().map(|event| (event.id.as_str(), event.interval)).collect::<Vec<_>>();
        assert_eq!(
            intervals,
            vec![
                ("all-day", DateInterval { start: day(11), end_exclusive: day(13) }),
                ("timed", DateInterval { start: day(14), end_exclusive: day(16) }),
            ]
        );

        let queries = recorded.queries.lock().expect("lock").clone();
        assert!(queries[0].contains(&("timeMin".to_owned(), "2024-08-10T00:00:00-05:00".to_owned())));
        assert!(queries[0].contains(&("singleEvents".to_owned(), "true".to_owned())));
        assert_eq!(recorded.auth.lock().expect("lock").clone(), vec!["Bearer ya29.token".to_owned()]);
    }

    async fn paged_list(
        State(recorded): State<Recorded>,
        Query(query): Query<Vec<(String, String)>>,
    ) -> Json<Value> {
        let second_page = query.iter().any(|(key, value)| key == "pageToken" && value == "page-2");
        recorded.queries.lock().expect("lock").push(query);
        if second_page {
            Json(json!({
                "items": [{"id": "late", "start": {"date": "2024-08-15"}, "end": {"date": "2024-08-17"}}]
            }))
        } else {
            Json(json!({
                "items": [{"id": "early", "start": {"date": "2024-08-10"}, "end": {"date": "2024-08-11"}}],
                "nextPageToken": "page-2"
            }))
        }
    }

    #[tokio::test]
    async fn follows_page_tokens_until_the_listing_ends() {
        let recorded = Recorded::default();
        let app = Router::new()
            .route("/calendar/v3/calendars/{calendar}/events", get(paged_list))
            .with_state(recorded.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let events = calendar(&format!("http://{address}/calendar/v3"))
            .list_events(DateInterval { start: day(10), end_exclusive: day(18) })
            .await
            .expect("list");

        let ids = events.iter().map(|event| event.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["early", "late"]);
        let queries = recorded.queries.lock().expect("lock").clone();
        assert_eq!(queries.len(), 2);
        assert!(queries[1].contains(&("pageToken".to_owned(), "page-2".to_owned())));
    }

    #[tokio::test]
    async fn inserts_all_day_event_with_time_zone() {
        let recorded = Recorded::default();
        let base = fake_google(recorded.clone()).await;

        let created = calendar(&base)
            .insert_event(NewCalendarEvent {
                summary: "Booking for Bc - 2 guests".to_owned(),
                description: "phone booking".to_owned(),
                interval: DateInterval { start: day(10), end_exclusive: day(12) },
            })
            .await
            .expect("insert");

        assert_eq!(created.id, "evt-123");
        let bodies = recorded.bodies.lock().expect("lock").clone();
        assert_eq!(bodies[0]["start"], json!({"date": "2024-08-10", "timeZone": "America/Chicago"}));
        assert_eq!(bodies[0]["end"], json!({"date": "2024-08-12", "timeZone": "America/Chicago"}));
    }

    #[tokio::test]
    async fn error_statuses_are_rejections() {
        let app = Router::new().route(
            "/calendar/v3/calendars/{calendar}/events",
            get(|| async { (StatusCode::UNAUTHORIZED, "invalid credentials") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let error = calendar(&format!("http://{address}/calendar/v3"))
            .list_events(DateInterval { start: day(10), end_exclusive: day(12) })
            .await
            .expect_err("unauthorized");

        assert_eq!(
            error,
            CalendarError::Rejected { status: 401, message: "invalid credentials".to_owned() }
        );
    }
}
