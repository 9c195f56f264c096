//! Core types for Memoria

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::search::{execute_saved_query, RelevanceWeights, SearchConfig, SearchOutcome};

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Identifier of a record within a working set
pub type RecordId = String;

/// One millisecond-denominated day
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Normalized view of any trackable entity (note, task, event, goal, contact, ...)
///
/// Records are immutable snapshots. The engine reads them and never writes
/// back; every query receives a fresh set from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    /// Unique within a working set
    pub id: RecordId,
    /// Category label, e.g. "Journal entry" or "Task"
    #[serde(rename = "type")]
    pub record_type: String,
    pub title: String,
    /// Body text
    #[serde(default)]
    pub content: String,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    /// Ordered set of tags
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Foreign ids of related records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_ids: Option<Vec<RecordId>>,
}

impl MemoryRecord {
    /// Create a record with the required fields; everything else empty
    pub fn new(
        id: impl Into<String>,
        record_type: impl Into<String>,
        title: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            record_type: record_type.into(),
            title: title.into(),
            content: String::new(),
            created_at,
            updated_at: None,
            tags: Vec::new(),
            status: None,
            priority: None,
            sentiment: None,
            metadata: BTreeMap::new(),
            related_ids: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_sentiment(mut self, sentiment: impl Into<String>) -> Self {
        self.sentiment = Some(sentiment.into());
        self
    }

    pub fn with_related<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// True when the record links to at least one other record
    pub fn has_relationships(&self) -> bool {
        self.related_ids.as_ref().is_some_and(|ids| !ids.is_empty())
    }
}

/// Which record fields the text query is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchIn {
    /// Title, content and tags
    #[default]
    All,
    Title,
    Content,
}

impl SearchIn {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchIn::All => "all",
            SearchIn::Title => "title",
            SearchIn::Content => "content",
        }
    }
}

impl std::str::FromStr for SearchIn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(SearchIn::All),
            "title" => Ok(SearchIn::Title),
            "content" => Ok(SearchIn::Content),
            _ => Err(format!("Unknown search field: {}", s)),
        }
    }
}

/// Constraints applied by the filter stage
///
/// The default value imposes no constraint at all, so filtering with it is
/// the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilter {
    /// Free-text boolean query
    pub query: String,
    /// Include-list of record types (empty = any)
    pub types: Vec<String>,
    pub exclude_types: Vec<String>,
    /// Include-list of tags; a record needs at least one (empty = any)
    pub tags: Vec<String>,
    /// Inclusive lower bound on `created_at`
    pub date_from: Option<Timestamp>,
    /// Inclusive upper bound on `created_at`
    pub date_to: Option<Timestamp>,
    pub search_in: SearchIn,
    pub status: Option<Vec<String>>,
    pub priority: Option<Vec<String>>,
    pub sentiment: Option<Vec<String>>,
    /// `Some(true)` keeps linked records only, `Some(false)` unlinked only
    pub has_relationships: Option<bool>,
}

impl SearchFilter {
    /// Filter carrying only a text query
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Filter restricted to the given record types
    pub fn with_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Heuristic score against the query; `DateDesc` without one
    Relevance,
    #[default]
    DateDesc,
    DateAsc,
    Title,
    /// Type label, newest first within a type
    Type,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Relevance => "relevance",
            SortKey::DateDesc => "date-desc",
            SortKey::DateAsc => "date-asc",
            SortKey::Title => "title",
            SortKey::Type => "type",
        }
    }

    pub fn all() -> &'static [SortKey] {
        &[
            SortKey::Relevance,
            SortKey::DateDesc,
            SortKey::DateAsc,
            SortKey::Title,
            SortKey::Type,
        ]
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relevance" => Ok(SortKey::Relevance),
            "date-desc" | "date" | "newest" => Ok(SortKey::DateDesc),
            "date-asc" | "oldest" => Ok(SortKey::DateAsc),
            "title" => Ok(SortKey::Title),
            "type" => Ok(SortKey::Type),
            _ => Err(format!("Unknown sort key: {}", s)),
        }
    }
}

/// Bucketing applied after ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupKey {
    #[default]
    None,
    Type,
    Date,
    Tags,
    Status,
    Priority,
}

impl GroupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::None => "none",
            GroupKey::Type => "type",
            GroupKey::Date => "date",
            GroupKey::Tags => "tags",
            GroupKey::Status => "status",
            GroupKey::Priority => "priority",
        }
    }
}

impl std::str::FromStr for GroupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(GroupKey::None),
            "type" => Ok(GroupKey::Type),
            "date" => Ok(GroupKey::Date),
            "tags" | "tag" => Ok(GroupKey::Tags),
            "status" => Ok(GroupKey::Status),
            "priority" => Ok(GroupKey::Priority),
            _ => Err(format!("Unknown group key: {}", s)),
        }
    }
}

/// A text query decomposed into term sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BooleanQuery {
    /// Every one must match
    pub required: Vec<String>,
    /// At least one must match when non-empty
    pub optional: Vec<String>,
    /// None may match
    pub excluded: Vec<String>,
    /// Quoted phrases matched as literal substrings
    pub exact: Vec<String>,
}

impl BooleanQuery {
    /// True when the query places no constraint
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
            && self.optional.is_empty()
            && self.excluded.is_empty()
            && self.exact.is_empty()
    }

    /// Terms a match is expected to contain (everything except exclusions)
    pub fn positive_terms(&self) -> impl Iterator<Item = &str> {
        self.exact
            .iter()
            .chain(self.required.iter())
            .chain(self.optional.iter())
            .map(String::as_str)
    }

    /// Positive terms joined by single spaces
    pub fn positive_text(&self) -> String {
        self.positive_terms().collect::<Vec<_>>().join(" ")
    }
}

/// Records judged near-duplicates of a head record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCluster {
    pub head: MemoryRecord,
    /// Matches of `head`, never empty, never containing `head`
    pub members: Vec<MemoryRecord>,
}

impl DuplicateCluster {
    /// Number of records in the cluster, head included
    pub fn len(&self) -> usize {
        self.members.len() + 1
    }

    /// Clusters always hold a head, so never empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Ids of every record in the cluster, head first
    pub fn ids(&self) -> Vec<&str> {
        std::iter::once(self.head.id.as_str())
            .chain(self.members.iter().map(|m| m.id.as_str()))
            .collect()
    }
}

/// Everything the pipeline needs besides records and the clock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub filter: SearchFilter,
    pub sort: SortKey,
    pub group: GroupKey,
}

/// A named, reusable search owned by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuery {
    pub id: String,
    pub name: String,
    pub filter: SearchFilter,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub group: GroupKey,
    pub created_at: Timestamp,
    /// Ranking weights to use instead of the configured ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<RelevanceWeights>,
}

impl SavedQuery {
    /// Create a saved query with a fresh v4 id
    pub fn new(name: impl Into<String>, request: SearchRequest, created_at: Timestamp) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            filter: request.filter,
            sort: request.sort,
            group: request.group,
            created_at,
            weights: None,
        }
    }

    /// The embedded filter, sort and group keys
    pub fn request(&self) -> SearchRequest {
        SearchRequest {
            filter: self.filter.clone(),
            sort: self.sort,
            group: self.group,
        }
    }

    /// Run this query over `records`
    pub fn run(
        &self,
        records: &[MemoryRecord],
        now: Timestamp,
        config: &SearchConfig,
    ) -> SearchOutcome {
        execute_saved_query(records, self, now, config)
    }
}
