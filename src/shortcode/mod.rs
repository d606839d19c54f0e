//! Short codes are compact abbreviations of (client, project, task) triples, e.g. `awd` for
//! "Acme Corp / Website / Design". Codes are handed out once and persisted through a
//! [store::ShortCodeStore], so a triple keeps its code across runs.

pub mod store;

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::entities::{AnnotatedEntry, IdentityTriple, TimeEntry};

use self::store::ShortCodeStore;

/// Shown for entries whose triple has no code.
pub const UNKNOWN_SHORT_CODE: &str = "???";

#[derive(Error, Debug)]
pub enum ShortCodeError {
    #[error("No free short code left for {client} / {project} / {task}")]
    Exhausted {
        client: String,
        project: String,
        task: String,
    },
}

/// Bijection between short codes and triples.
#[derive(Debug, Default, Clone)]
pub struct ShortCodeMap {
    by_code: BTreeMap<String, IdentityTriple>,
    by_triple: HashMap<IdentityTriple, String>,
}

impl ShortCodeMap {
    /// Rebuilds the reverse direction from persisted codes. If a damaged file lists the same
    /// triple under several codes, the last code in key order is the one used for lookups.
    pub fn from_codes(codes: BTreeMap<String, IdentityTriple>) -> Self {
        let mut by_triple = HashMap::with_capacity(codes.len());
        for (code, triple) in &codes {
            if let Some(previous) = by_triple.insert(triple.clone(), code.clone()) {
                warn!("Triple {:?} is stored under both {previous} and {code}", triple.ids());
            }
        }
        Self {
            by_code: codes,
            by_triple,
        }
    }

    pub fn code_for(&self, triple: &IdentityTriple) -> Option<&str> {
        self.by_triple.get(triple).map(String::as_str)
    }

    pub fn triple_for(&self, code: &str) -> Option<&IdentityTriple> {
        self.by_code.get(code)
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    pub fn contains_triple(&self, triple: &IdentityTriple) -> bool {
        self.by_triple.contains_key(triple)
    }

    /// Codes with their triples, ordered by code.
    pub fn codes(&self) -> &BTreeMap<String, IdentityTriple> {
        &self.by_code
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    fn insert(&mut self, code: String, triple: IdentityTriple) {
        self.by_triple.insert(triple.clone(), code.clone());
        self.by_code.insert(code, triple);
    }
}

fn normalize(name: &str) -> Vec<char> {
    name.replace(' ', "").to_lowercase().chars().collect()
}

fn prefix(name: &[char], length: usize) -> String {
    name[..length].iter().collect()
}

/// Searches for the first code not taken in `map`.
///
/// Candidates are tried with `base_length` ascending and, within each length, for the 8
/// variants where bit 0 lengthens the task prefix, bit 1 the project prefix and bit 2 the
/// client prefix by one character. `base_length` stops one short of the shortest normalized
/// name minus one, so names of 2 characters or fewer can never be coded.
pub fn find_free_code(map: &ShortCodeMap, triple: &IdentityTriple) -> Option<String> {
    let client = normalize(&triple.client.name);
    let project = normalize(&triple.project.name);
    let task = normalize(&triple.task.name);

    let shortest = client.len().min(project.len()).min(task.len()).saturating_sub(1);
    for base_length in 1..shortest {
        for variant in 0..8usize {
            let candidate = format!(
                "{}{}{}",
                prefix(&client, base_length + ((variant & 0x4) >> 2)),
                prefix(&project, base_length + ((variant & 0x2) >> 1)),
                prefix(&task, base_length + (variant & 0x1)),
            );
            if !map.contains_code(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Orders distinct triples by how many entries use them, most used first. Ties keep the order
/// in which the triples first appear.
fn by_usage(triples: impl IntoIterator<Item = IdentityTriple>) -> Vec<IdentityTriple> {
    let mut positions = HashMap::<IdentityTriple, usize>::new();
    let mut counted = Vec::<(IdentityTriple, usize)>::new();
    for triple in triples {
        match positions.get(&triple) {
            Some(&position) => counted[position].1 += 1,
            None => {
                positions.insert(triple.clone(), counted.len());
                counted.push((triple, 1));
            }
        }
    }
    // sort_by is stable
    counted.sort_by(|a, b| b.1.cmp(&a.1));
    counted.into_iter().map(|v| v.0).collect()
}

/// Owns the short code map for the duration of a run and persists it after changes.
pub struct ShortCodeAllocator<S> {
    map: ShortCodeMap,
    store: S,
}

impl<S: ShortCodeStore> ShortCodeAllocator<S> {
    pub async fn load(store: S) -> Result<Self> {
        let map = store.load().await?;
        Ok(Self { map, store })
    }

    pub fn new(map: ShortCodeMap, store: S) -> Self {
        Self { map, store }
    }

    pub fn map(&self) -> &ShortCodeMap {
        &self.map
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gives a code to every triple that doesn't have one yet and returns how many were added.
    ///
    /// Codes added before an [ShortCodeError::Exhausted] failure are still saved.
    #[instrument(skip_all)]
    pub async fn allocate(
        &mut self,
        triples: impl IntoIterator<Item = IdentityTriple>,
    ) -> Result<usize> {
        let mut added = 0;
        let mut failure = None;
        for triple in by_usage(triples) {
            if self.map.contains_triple(&triple) {
                continue;
            }
            match find_free_code(&self.map, &triple) {
                Some(code) => {
                    debug!("Assigned {code} to {:?}", triple.ids());
                    self.map.insert(code, triple);
                    added += 1;
                }
                None => {
                    failure = Some(ShortCodeError::Exhausted {
                        client: triple.client.name,
                        project: triple.project.name,
                        task: triple.task.name,
                    });
                    break;
                }
            }
        }

        if added > 0 {
            self.store.save(&self.map).await?;
            info!("Saved {added} new short codes, {} in total", self.map.len());
        }

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(added),
        }
    }

    /// Pairs every entry with the code of its triple.
    pub fn annotate(&self, entries: Vec<TimeEntry>) -> Vec<AnnotatedEntry> {
        entries
            .into_iter()
            .map(|entry| {
                let short_code = self
                    .map
                    .code_for(&entry.triple())
                    .unwrap_or(UNKNOWN_SHORT_CODE)
                    .to_string();
                AnnotatedEntry { entry, short_code }
            })
            .collect()
    }
}
