//! Domain entities and their normalization into [`MemoryRecord`]
//!
//! Each kind of trackable thing has its own payload. They are fanned into the
//! single record shape once, at the boundary; the search engine only ever
//! sees records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{MemoryRecord, RecordId, Timestamp};

pub const JOURNAL_ENTRY: &str = "Journal entry";
pub const TASK: &str = "Task";
pub const CALENDAR_EVENT: &str = "Calendar event";
pub const DELIVERABLE: &str = "Deliverable";
pub const BRAND_ELEMENT: &str = "Brand element";
pub const PERSON: &str = "Person";
pub const CONCEPT: &str = "Concept";
pub const GOAL: &str = "Goal";

/// Fields shared by every entity kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Common {
    pub id: RecordId,
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub related_ids: Vec<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    #[serde(flatten)]
    pub common: Common,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(flatten)]
    pub common: Common,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<Timestamp>,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(flatten)]
    pub common: Common,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start: Timestamp,
    #[serde(default)]
    pub end: Option<Timestamp>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deliverable {
    #[serde(flatten)]
    pub common: Common,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<Timestamp>,
    #[serde(default)]
    pub client: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandElement {
    #[serde(flatten)]
    pub common: Common,
    pub name: String,
    /// e.g. "color", "typography", "voice"
    #[serde(default)]
    pub element_type: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(flatten)]
    pub common: Common,
    pub name: String,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    #[serde(flatten)]
    pub common: Common,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(flatten)]
    pub common: Common,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub target_date: Option<Timestamp>,
    /// Percent complete, 0-100
    #[serde(default)]
    pub progress: Option<u8>,
}

/// Any trackable entity, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    JournalEntry(JournalEntry),
    Task(Task),
    CalendarEvent(CalendarEvent),
    Deliverable(Deliverable),
    BrandElement(BrandElement),
    Person(Person),
    Concept(Concept),
    Goal(Goal),
}

impl Entity {
    /// Type label the entity carries once normalized
    pub fn type_label(&self) -> &'static str {
        match self {
            Entity::JournalEntry(_) => JOURNAL_ENTRY,
            Entity::Task(_) => TASK,
            Entity::CalendarEvent(_) => CALENDAR_EVENT,
            Entity::Deliverable(_) => DELIVERABLE,
            Entity::BrandElement(_) => BRAND_ELEMENT,
            Entity::Person(_) => PERSON,
            Entity::Concept(_) => CONCEPT,
            Entity::Goal(_) => GOAL,
        }
    }

    pub fn id(&self) -> &str {
        &self.common().id
    }

    fn common(&self) -> &Common {
        match self {
            Entity::JournalEntry(e) => &e.common,
            Entity::Task(e) => &e.common,
            Entity::CalendarEvent(e) => &e.common,
            Entity::Deliverable(e) => &e.common,
            Entity::BrandElement(e) => &e.common,
            Entity::Person(e) => &e.common,
            Entity::Concept(e) => &e.common,
            Entity::Goal(e) => &e.common,
        }
    }

    /// Normalize into the record shape the engine searches
    pub fn into_record(self) -> MemoryRecord {
        let label = self.type_label();
        let mut meta = MetadataBuilder::default();

        let (common, title, content) = match self {
            Entity::JournalEntry(e) => {
                meta.string("mood", e.mood);
                let mut record = base(e.common, label, e.title, e.content);
                record.sentiment = e.sentiment;
                return finish(record, meta);
            }
            Entity::Task(e) => {
                meta.time("dueDate", e.due_date);
                meta.time("completedAt", e.completed_at);
                let mut record = base(e.common, label, e.title, e.description);
                record.status = e.status;
                record.priority = e.priority;
                return finish(record, meta);
            }
            Entity::CalendarEvent(e) => {
                meta.time("start", Some(e.start));
                meta.time("end", e.end);
                meta.string("location", e.location);
                meta.list("attendees", e.attendees);
                (e.common, e.title, e.description)
            }
            Entity::Deliverable(e) => {
                meta.time("dueDate", e.due_date);
                meta.string("client", e.client);
                let mut record = base(e.common, label, e.title, e.description);
                record.status = e.status;
                record.priority = e.priority;
                return finish(record, meta);
            }
            Entity::BrandElement(e) => {
                meta.string("elementType", e.element_type);
                meta.string("value", e.value);
                (e.common, e.name, e.description)
            }
            Entity::Person(e) => {
                meta.string("relationship", e.relationship);
                meta.string("email", e.email);
                meta.string("phone", e.phone);
                (e.common, e.name, e.notes)
            }
            Entity::Concept(e) => {
                meta.string("category", e.category);
                (e.common, e.name, e.description)
            }
            Entity::Goal(e) => {
                meta.time("targetDate", e.target_date);
                if let Some(progress) = e.progress {
                    meta.insert("progress", Value::from(progress.min(100)));
                }
                let mut record = base(e.common, label, e.title, e.description);
                record.status = e.status;
                record.priority = e.priority;
                return finish(record, meta);
            }
        };

        finish(base(common, label, title, content), meta)
    }
}

impl From<Entity> for MemoryRecord {
    fn from(entity: Entity) -> Self {
        entity.into_record()
    }
}

/// Normalize a batch of entities, preserving order
pub fn normalize_entities(entities: Vec<Entity>) -> Vec<MemoryRecord> {
    entities.into_iter().map(Entity::into_record).collect()
}

fn base(common: Common, label: &str, title: String, content: String) -> MemoryRecord {
    MemoryRecord {
        id: common.id,
        record_type: label.to_string(),
        title,
        content,
        created_at: common.created_at,
        updated_at: common.updated_at,
        tags: common.tags,
        status: None,
        priority: None,
        sentiment: None,
        metadata: BTreeMap::new(),
        related_ids: if common.related_ids.is_empty() {
            None
        } else {
            Some(common.related_ids)
        },
    }
}

fn finish(mut record: MemoryRecord, meta: MetadataBuilder) -> MemoryRecord {
    record.metadata = meta.0;
    record
}

/// Collects entity-specific fields, skipping absent ones
#[derive(Default)]
struct MetadataBuilder(BTreeMap<String, Value>);

impl MetadataBuilder {
    fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    fn string(&mut self, key: &str, value: Option<String>) {
        if let Some(v) = value {
            self.insert(key, Value::String(v));
        }
    }

    fn time(&mut self, key: &str, value: Option<Timestamp>) {
        if let Some(v) = value {
            self.insert(key, Value::from(v));
        }
    }

    fn list(&mut self, key: &str, values: Vec<String>) {
        if !values.is_empty() {
            self.insert(key, Value::from(values));
        }
    }
}
