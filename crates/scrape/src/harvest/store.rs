// ABOUTME: Persistence interface for harvested problems plus an in-memory, JSON-snapshotted store.
// ABOUTME: Problems upsert on (source judge, external id); tags are case-folded and links deduplicated.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::result::Sample;

/// One problem row as handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub source_judge_id: u32,
    pub external_id: String,
    pub title: String,
    pub url: String,
    /// Declared difficulty, kept as text.
    pub difficulty: String,
    pub time_limit_ms: u32,
    pub mem_limit_kb: u64,
    pub statement_html: Option<String>,
    pub input_spec: Option<String>,
    pub output_spec: Option<String>,
    pub samples: Vec<Sample>,
    pub fetched_at: DateTime<Utc>,
}

/// Storage backend for harvested problems and their tags.
#[async_trait]
pub trait ProblemStore: Send + Sync {
    /// Insert or replace the problem keyed by `(source_judge_id, external_id)`.
    /// Returns the stable problem id.
    async fn upsert_problem(&self, record: ProblemRecord) -> Result<u64, ScrapeError>;

    /// Insert the tag if unseen and return its id. Names are trimmed and
    /// lowercased first; an empty name is rejected.
    async fn upsert_tag(&self, name: &str) -> Result<u64, ScrapeError>;

    /// Link a problem to a tag. Linking an existing pair is a no-op.
    async fn link_tag(&self, problem_id: u64, tag_id: u64) -> Result<(), ScrapeError>;
}

/// Canonical form of a tag name.
pub fn normalize_tag(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProblem {
    pub problem_id: u64,
    #[serde(flatten)]
    pub record: ProblemRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTag {
    pub tag_id: u64,
    pub name: String,
}

/// Serialized form of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub problems: Vec<StoredProblem>,
    pub tags: Vec<StoredTag>,
    pub problem_tags: Vec<(u64, u64)>,
}

#[derive(Debug, Default)]
struct Tables {
    problems: HashMap<u64, ProblemRecord>,
    problem_keys: HashMap<(u32, String), u64>,
    tags: HashMap<u64, String>,
    tag_names: HashMap<String, u64>,
    links: BTreeSet<(u64, u64)>,
    next_problem_id: u64,
    next_tag_id: u64,
}

impl Tables {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut tables = Tables::default();
        for stored in snapshot.problems {
            let key = (stored.record.source_judge_id, stored.record.external_id.clone());
            tables.next_problem_id = tables.next_problem_id.max(stored.problem_id);
            tables.problem_keys.insert(key, stored.problem_id);
            tables.problems.insert(stored.problem_id, stored.record);
        }
        for tag in snapshot.tags {
            tables.next_tag_id = tables.next_tag_id.max(tag.tag_id);
            tables.tag_names.insert(tag.name.clone(), tag.tag_id);
            tables.tags.insert(tag.tag_id, tag.name);
        }
        tables.links = snapshot.problem_tags.into_iter().collect();
        tables
    }

    fn to_snapshot(&self) -> Snapshot {
        let mut problems: Vec<StoredProblem> = self
            .problems
            .iter()
            .map(|(id, record)| StoredProblem {
                problem_id: *id,
                record: record.clone(),
            })
            .collect();
        problems.sort_by_key(|p| p.problem_id);

        let mut tags: Vec<StoredTag> = self
            .tags
            .iter()
            .map(|(id, name)| StoredTag {
                tag_id: *id,
                name: name.clone(),
            })
            .collect();
        tags.sort_by_key(|t| t.tag_id);

        Snapshot {
            problems,
            tags,
            problem_tags: self.links.iter().copied().collect(),
        }
    }
}

/// In-memory [`ProblemStore`] with relational-style tables.
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::from_snapshot(snapshot))),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.tables.lock().to_snapshot()
    }

    pub fn problem_count(&self) -> usize {
        self.tables.lock().problems.len()
    }

    pub fn problem(&self, problem_id: u64) -> Option<ProblemRecord> {
        self.tables.lock().problems.get(&problem_id).cloned()
    }

    pub fn problem_id(&self, source_judge_id: u32, external_id: &str) -> Option<u64> {
        self.tables
            .lock()
            .problem_keys
            .get(&(source_judge_id, external_id.to_string()))
            .copied()
    }

    /// Tag names linked to a problem, sorted.
    pub fn tags_for(&self, problem_id: u64) -> Vec<String> {
        let tables = self.tables.lock();
        let mut names: Vec<String> = tables
            .links
            .iter()
            .filter(|(pid, _)| *pid == problem_id)
            .filter_map(|(_, tid)| tables.tags.get(tid).cloned())
            .collect();
        names.sort();
        names
    }

    /// Write the store as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ScrapeError> {
        let key = path.display().to_string();
        let json = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| ScrapeError::store(&key, "Save", Some(e.into())))?;
        std::fs::write(path, json).map_err(|e| ScrapeError::store(&key, "Save", Some(e.into())))
    }

    /// Load a store previously written by [`MemoryStore::save`].
    pub fn load(path: &Path) -> Result<Self, ScrapeError> {
        let key = path.display().to_string();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScrapeError::store(&key, "Load", Some(e.into())))?;
        let snapshot: Snapshot = serde_json::from_str(&raw)
            .map_err(|e| ScrapeError::store(&key, "Load", Some(e.into())))?;
        Ok(Self::from_snapshot(snapshot))
    }
}

#[async_trait]
impl ProblemStore for MemoryStore {
    async fn upsert_problem(&self, record: ProblemRecord) -> Result<u64, ScrapeError> {
        if record.external_id.trim().is_empty() {
            return Err(ScrapeError::store(
                &record.url,
                "UpsertProblem",
                Some(anyhow::anyhow!("empty external id")),
            ));
        }

        let mut tables = self.tables.lock();
        let key = (record.source_judge_id, record.external_id.clone());
        let existing = tables.problem_keys.get(&key).copied();
        let id = match existing {
            Some(id) => id,
            None => {
                tables.next_problem_id += 1;
                let id = tables.next_problem_id;
                tables.problem_keys.insert(key, id);
                id
            }
        };
        tables.problems.insert(id, record);
        Ok(id)
    }

    async fn upsert_tag(&self, name: &str) -> Result<u64, ScrapeError> {
        let name = normalize_tag(name);
        if name.is_empty() {
            return Err(ScrapeError::store(
                "",
                "UpsertTag",
                Some(anyhow::anyhow!("empty tag name")),
            ));
        }

        let mut tables = self.tables.lock();
        if let Some(id) = tables.tag_names.get(&name) {
            return Ok(*id);
        }
        tables.next_tag_id += 1;
        let id = tables.next_tag_id;
        tables.tag_names.insert(name.clone(), id);
        tables.tags.insert(id, name);
        Ok(id)
    }

    async fn link_tag(&self, problem_id: u64, tag_id: u64) -> Result<(), ScrapeError> {
        let mut tables = self.tables.lock();
        if !tables.problems.contains_key(&problem_id) {
            return Err(ScrapeError::store(
                problem_id.to_string(),
                "LinkTag",
                Some(anyhow::anyhow!("unknown problem {}", problem_id)),
            ));
        }
        if !tables.tags.contains_key(&tag_id) {
            return Err(ScrapeError::store(
                problem_id.to_string(),
                "LinkTag",
                Some(anyhow::anyhow!("unknown tag {}", tag_id)),
            ));
        }
        tables.links.insert((problem_id, tag_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(external_id: &str, title: &str) -> ProblemRecord {
        ProblemRecord {
            source_judge_id: 1,
            external_id: external_id.to_string(),
            title: title.to_string(),
            url: format!("https://codeforces.com/problemset/problem/{}", external_id),
            difficulty: "800".to_string(),
            time_limit_ms: 2000,
            mem_limit_kb: 262144,
            statement_html: None,
            input_spec: None,
            output_spec: None,
            samples: vec![],
            fetched_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_problem_keeps_id_and_replaces_fields() {
        let store = MemoryStore::new();
        let first = store.upsert_problem(record("4A", "Watermelon")).await.unwrap();
        let again = store
            .upsert_problem(record("4A", "Watermelon (revised)"))
            .await
            .unwrap();
        let other = store.upsert_problem(record("71A", "Way Too Long Words")).await.unwrap();

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(store.problem_count(), 2);
        assert_eq!(store.problem(first).unwrap().title, "Watermelon (revised)");
        assert_eq!(store.problem_id(1, "4A"), Some(first));
    }

    #[tokio::test]
    async fn same_external_id_on_other_judge_is_distinct() {
        let store = MemoryStore::new();
        let cf = store.upsert_problem(record("1A", "Theatre Square")).await.unwrap();
        let mut elsewhere = record("1A", "Other");
        elsewhere.source_judge_id = 2;
        let other = store.upsert_problem(elsewhere).await.unwrap();
        assert_ne!(cf, other);
    }

    #[tokio::test]
    async fn tags_are_normalized_and_deduplicated() {
        let store = MemoryStore::new();
        let a = store.upsert_tag("  Brute Force ").await.unwrap();
        let b = store.upsert_tag("brute force").await.unwrap();
        assert_eq!(a, b);

        let err = store.upsert_tag("   ").await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Store);
    }

    #[tokio::test]
    async fn linking_twice_is_a_no_op() {
        let store = MemoryStore::new();
        let pid = store.upsert_problem(record("4A", "Watermelon")).await.unwrap();
        let math = store.upsert_tag("math").await.unwrap();
        let brute = store.upsert_tag("brute force").await.unwrap();

        store.link_tag(pid, math).await.unwrap();
        store.link_tag(pid, math).await.unwrap();
        store.link_tag(pid, brute).await.unwrap();

        assert_eq!(store.tags_for(pid), vec!["brute force", "math"]);
        assert_eq!(store.snapshot().problem_tags.len(), 2);
    }

    #[tokio::test]
    async fn linking_unknown_ids_fails() {
        let store = MemoryStore::new();
        let tag = store.upsert_tag("dp").await.unwrap();
        assert!(store.link_tag(42, tag).await.is_err());
    }

    #[tokio::test]
    async fn snapshot_survives_save_and_load() {
        let store = MemoryStore::new();
        let pid = store.upsert_problem(record("4A", "Watermelon")).await.unwrap();
        let tag = store.upsert_tag("math").await.unwrap();
        store.link_tag(pid, tag).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.snapshot(), store.snapshot());

        let next = loaded.upsert_problem(record("1A", "Theatre Square")).await.unwrap();
        assert!(next > pid);
        assert_eq!(loaded.upsert_tag("MATH").await.unwrap(), tag);
    }
}
