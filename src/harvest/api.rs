//! Shapes of the Harvest v2 API responses that are used.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer};

use crate::entities::{IdName, TimeEntry};

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AccountsResponse {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct TimeEntriesPage {
    pub time_entries: Vec<TimeEntryResponse>,
    pub next_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Reference {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TimeEntryResponse {
    pub id: i64,
    pub spent_date: NaiveDate,
    #[serde(default, deserialize_with = "clock_time")]
    pub started_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "clock_time")]
    pub ended_time: Option<NaiveTime>,
    #[serde(default)]
    pub hours: f64,
    pub notes: Option<String>,
    pub client: Reference,
    pub project: Reference,
    pub task: Reference,
}

impl From<Reference> for IdName {
    fn from(Reference { id, name }: Reference) -> Self {
        IdName { id, name }
    }
}

impl From<TimeEntryResponse> for TimeEntry {
    fn from(value: TimeEntryResponse) -> Self {
        TimeEntry {
            id: value.id,
            spent_date: value.spent_date,
            started_time: value.started_time,
            ended_time: value.ended_time,
            hours: value.hours,
            notes: value.notes,
            client: value.client.into(),
            project: value.project.into(),
            task: value.task.into(),
        }
    }
}

/// Harvest reports times the way the account is configured to show them, either "8:00am" or
/// "08:00".
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%I:%M%p")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

fn clock_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref() {
        None | Some("") => Ok(None),
        Some(v) => parse_clock_time(v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("Unrecognized time of day {v:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{NaiveDate, NaiveTime};

    use crate::entities::TimeEntry;

    use super::{parse_clock_time, TimeEntriesPage};

    #[test]
    fn test_parse_clock_time() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0);
        assert_eq!(parse_clock_time("8:00am"), t(8, 0));
        assert_eq!(parse_clock_time("12:30pm"), t(12, 30));
        assert_eq!(parse_clock_time("12:05am"), t(0, 5));
        assert_eq!(parse_clock_time("3:10PM"), t(15, 10));
        assert_eq!(parse_clock_time("17:45"), t(17, 45));
        assert_eq!(parse_clock_time("noon"), None);
    }

    #[test]
    fn test_time_entries_page() -> Result<()> {
        let json = r#"{
            "time_entries": [
                {
                    "id": 636709355,
                    "spent_date": "2024-01-02",
                    "hours": 1.5,
                    "notes": "Sketches",
                    "started_time": "9:00am",
                    "ended_time": "10:30am",
                    "is_running": false,
                    "client": {"id": 5735776, "name": "Acme Corp", "currency": "USD"},
                    "project": {"id": 14307913, "name": "Website", "code": "WEB"},
                    "task": {"id": 8083365, "name": "Design"}
                },
                {
                    "id": 636709356,
                    "spent_date": "2024-01-02",
                    "hours": 0.25,
                    "notes": null,
                    "started_time": null,
                    "ended_time": null,
                    "client": {"id": 5735776, "name": "Acme Corp"},
                    "project": {"id": 14307913, "name": "Website"},
                    "task": {"id": 8083366, "name": "Dev"}
                }
            ],
            "per_page": 2000,
            "next_page": 2
        }"#;

        let page: TimeEntriesPage = serde_json::from_str(json)?;
        assert_eq!(page.next_page, Some(2));

        let entries = page.time_entries.into_iter().map(TimeEntry::from).collect::<Vec<_>>();
        assert_eq!(entries[0].spent_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(entries[0].started_time, NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(entries[0].ended_time, NaiveTime::from_hms_opt(10, 30, 0));
        assert_eq!(entries[0].triple().ids(), (5735776, 14307913, 8083365));
        assert_eq!(entries[1].span(), None);
        assert_eq!(entries[1].notes, None);
        Ok(())
    }
}
