use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Reference to a client, project or task. The casing matches the short code file, which
/// stores these as `{"Id": 1, "Name": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IdName {
    pub id: i64,
    pub name: String,
}

impl IdName {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A (client, project, task) grouping. Two triples are the same triple when their ids match,
/// names are only carried along for display and for generating short codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IdentityTriple {
    pub client: IdName,
    pub project: IdName,
    pub task: IdName,
}

impl IdentityTriple {
    pub fn new(client: IdName, project: IdName, task: IdName) -> Self {
        Self {
            client,
            project,
            task,
        }
    }

    pub fn ids(&self) -> (i64, i64, i64) {
        (self.client.id, self.project.id, self.task.id)
    }
}

impl PartialEq for IdentityTriple {
    fn eq(&self, other: &Self) -> bool {
        self.ids() == other.ids()
    }
}

impl Eq for IdentityTriple {}

impl Hash for IdentityTriple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ids().hash(state);
    }
}

impl PartialOrd for IdentityTriple {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IdentityTriple {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ids().cmp(&other.ids())
    }
}

/// A single recorded time entry as it comes from the time tracking service.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeEntry {
    pub id: i64,
    pub spent_date: NaiveDate,
    pub started_time: Option<NaiveTime>,
    pub ended_time: Option<NaiveTime>,
    pub hours: f64,
    pub notes: Option<String>,
    pub client: IdName,
    pub project: IdName,
    pub task: IdName,
}

impl TimeEntry {
    pub fn triple(&self) -> IdentityTriple {
        IdentityTriple::new(self.client.clone(), self.project.clone(), self.task.clone())
    }

    /// Start and end of the entry, when both are known.
    pub fn span(&self) -> Option<(NaiveTime, NaiveTime)> {
        self.started_time.zip(self.ended_time)
    }
}

/// Time entry together with the short code of its triple. Rebuilt on every report.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedEntry {
    pub entry: TimeEntry,
    pub short_code: String,
}
