//! Core domain types for the Helios assistant.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{HeliosError, Result};

/// A searchable index and the semantic fields its documents were embedded on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Index name as known to the search cluster.
    pub name: String,

    /// Semantic (inference-backed) fields, primary field first.
    pub semantic_fields: Vec<String>,
}

impl IndexDescriptor {
    /// Create a descriptor, rejecting indices without a semantic field.
    pub fn new<I, S>(name: impl Into<String>, semantic_fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let descriptor = Self {
            name: name.into(),
            semantic_fields: semantic_fields.into_iter().map(Into::into).collect(),
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Check the descriptor is usable for querying.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HeliosError::config("index name must not be empty"));
        }
        match self.semantic_fields.first() {
            Some(field) if !field.trim().is_empty() => Ok(()),
            _ => Err(HeliosError::config(format!(
                "index '{}' has no semantic field configured",
                self.name
            ))),
        }
    }

    /// The field used for both querying and flattening.
    ///
    /// Only the first configured field is used; additional fields are kept
    /// for reference but do not take part in retrieval.
    pub fn primary_field(&self) -> &str {
        self.semantic_fields
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Name under which the search backend reports this index's inner hits.
    pub fn inner_hit_key(&self) -> String {
        inner_hit_key(&self.name, self.primary_field())
    }
}

/// Composite `<index>.<field>` key naming a nested inner-hit group.
pub fn inner_hit_key(index: &str, field: &str) -> String {
    format!("{}.{}", index, field)
}

/// The process-wide set of index descriptors.
///
/// Keeps configuration order for query construction and a name lookup for
/// resolving hits back to their descriptor.
#[derive(Debug, Clone)]
pub struct IndexRegistry {
    descriptors: Vec<IndexDescriptor>,
    by_name: HashMap<String, usize>,
}

impl IndexRegistry {
    /// Build a registry from validated descriptors.
    pub fn new(descriptors: Vec<IndexDescriptor>) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(HeliosError::config("at least one index must be configured"));
        }

        let mut by_name = HashMap::with_capacity(descriptors.len());
        for (position, descriptor) in descriptors.iter().enumerate() {
            descriptor.validate()?;
            if by_name.insert(descriptor.name.clone(), position).is_some() {
                return Err(HeliosError::config(format!(
                    "index '{}' is configured more than once",
                    descriptor.name
                )));
            }
        }

        Ok(Self {
            descriptors,
            by_name,
        })
    }

    /// Look up a descriptor by index name.
    pub fn get(&self, name: &str) -> Option<&IndexDescriptor> {
        self.by_name.get(name).map(|&i| &self.descriptors[i])
    }

    /// Descriptors in configuration order.
    pub fn descriptors(&self) -> &[IndexDescriptor] {
        &self.descriptors
    }

    /// Index names in configuration order.
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    /// Map from index name to its primary field, as used by the flattener.
    pub fn primary_fields(&self) -> HashMap<String, String> {
        self.descriptors
            .iter()
            .map(|d| (d.name.clone(), d.primary_field().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// A single matched chunk returned inside an inner-hit group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerHitFragment {
    /// Chunk text.
    pub text: String,
}

impl InnerHitFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// One ranked document returned by the search backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchHit {
    /// Index the document came from.
    pub index: String,

    /// Fused relevance score, if reported.
    #[serde(default)]
    pub score: Option<f64>,

    /// Stored document fields.
    #[serde(default)]
    pub source: serde_json::Map<String, serde_json::Value>,

    /// Nested chunk matches keyed by `<index>.<field>`.
    #[serde(default)]
    pub inner_hits: Option<HashMap<String, Vec<InnerHitFragment>>>,
}

impl SearchHit {
    /// Create a flat hit with no inner hits.
    pub fn flat(index: impl Into<String>, source: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            index: index.into(),
            score: None,
            source,
            inner_hits: None,
        }
    }

    /// Attach an inner-hit group under the given key.
    pub fn with_inner_hits<I, S>(mut self, key: impl Into<String>, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fragments = texts.into_iter().map(InnerHitFragment::new).collect();
        self.inner_hits
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), fragments);
        self
    }

    /// Inner-hit fragments stored under `key`, if any.
    pub fn inner_hits_for(&self, key: &str) -> Option<&[InnerHitFragment]> {
        self.inner_hits
            .as_ref()
            .and_then(|groups| groups.get(key))
            .map(Vec::as_slice)
    }
}

/// Ranked hits for one search. Hit order is the ranking.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Hits in fused rank order.
    pub hits: Vec<SearchHit>,

    /// Server-side latency in milliseconds.
    #[serde(default)]
    pub took_ms: Option<u64>,

    /// Whether the backend gave up early and returned partial results.
    #[serde(default)]
    pub timed_out: bool,
}

impl SearchResponse {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            took_ms: None,
            timed_out: false,
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        };
        write!(f, "{}", s)
    }
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only conversation transcript for one session.
///
/// The first turn is always the synthetic assistant greeting, followed by
/// alternating user and assistant turns. Deserialization enforces the same
/// shape, so a history is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HistoryRecord")]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
}

/// Unchecked wire form of [`ConversationHistory`].
#[derive(Deserialize)]
struct HistoryRecord {
    turns: Vec<ConversationTurn>,
}

impl TryFrom<HistoryRecord> for ConversationHistory {
    type Error = HeliosError;

    fn try_from(record: HistoryRecord) -> Result<Self> {
        match record.turns.first() {
            Some(greeting) if greeting.role == Role::Assistant => {}
            Some(_) => {
                return Err(HeliosError::invalid_argument(
                    "history must start with the assistant greeting",
                ))
            }
            None => return Err(HeliosError::invalid_argument("history must not be empty")),
        }

        for (position, turn) in record.turns.iter().enumerate().skip(1) {
            let expected = if position % 2 == 1 {
                Role::User
            } else {
                Role::Assistant
            };
            if turn.role != expected {
                return Err(HeliosError::invalid_argument(format!(
                    "history turn {} should be {}, found {}",
                    position, expected, turn.role
                )));
            }
        }

        Ok(Self {
            turns: record.turns,
        })
    }
}

impl ConversationHistory {
    /// Start a history with the given greeting.
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            turns: vec![ConversationTurn::assistant(greeting)],
        }
    }

    /// Append a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(ConversationTurn::user(content));
    }

    /// Append an assistant turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(ConversationTurn::assistant(content));
    }

    /// All turns, greeting first.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// The synthetic greeting.
    pub fn greeting(&self) -> Option<&ConversationTurn> {
        self.turns.first()
    }

    /// The most recent turn.
    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false: a history holds at least its greeting.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// A fully assembled prompt. Rendered once and sent as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub instructions: String,
    pub context: String,
    pub question: String,
    pub history_summary: Option<String>,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Instructions:")?;
        writeln!(f, "{}", self.instructions.trim_end())?;
        writeln!(f)?;
        writeln!(f, "Context:")?;
        writeln!(f, "{}", self.context)?;
        if let Some(history) = &self.history_summary {
            write!(f, "{}", history)?;
        }
        writeln!(f, "Question:")?;
        write!(f, "{}", self.question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_requires_semantic_field() {
        let err = IndexDescriptor::new("opendata-chat", Vec::<String>::new()).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");

        let err = IndexDescriptor::new("opendata-chat", [""]).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_descriptor_primary_field_and_key() {
        let descriptor =
            IndexDescriptor::new("aa-postal_code", ["semantic_field", "description"]).unwrap();
        assert_eq!(descriptor.primary_field(), "semantic_field");
        assert_eq!(descriptor.inner_hit_key(), "aa-postal_code.semantic_field");
    }

    #[test]
    fn test_registry_lookup() {
        let registry = IndexRegistry::new(vec![
            IndexDescriptor::new("a", ["semantic_field"]).unwrap(),
            IndexDescriptor::new("b", ["body"]).unwrap(),
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(registry.get("b").unwrap().primary_field(), "body");
        assert!(registry.get("c").is_none());

        let fields = registry.primary_fields();
        assert_eq!(fields.get("a").map(String::as_str), Some("semantic_field"));
    }

    #[test]
    fn test_registry_rejects_duplicates_and_empty() {
        assert!(IndexRegistry::new(Vec::new()).is_err());

        let dup = IndexRegistry::new(vec![
            IndexDescriptor::new("a", ["f"]).unwrap(),
            IndexDescriptor::new("a", ["g"]).unwrap(),
        ]);
        assert!(dup.is_err());
    }

    #[test]
    fn test_registry_rejects_deserialized_descriptor_without_field() {
        let descriptor: IndexDescriptor =
            serde_json::from_value(json!({"name": "a", "semantic_fields": []})).unwrap();
        assert!(IndexRegistry::new(vec![descriptor]).is_err());
    }

    #[test]
    fn test_hit_inner_hits_lookup() {
        let hit = SearchHit::flat("a", serde_json::Map::new())
            .with_inner_hits("a.semantic_field", ["one", "two"]);

        let fragments = hit.inner_hits_for("a.semantic_field").unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].text, "two");
        assert!(hit.inner_hits_for("a.other").is_none());
    }

    #[test]
    fn test_history_starts_with_greeting() {
        let mut history = ConversationHistory::new("How can I help you?");
        assert_eq!(history.len(), 1);
        assert_eq!(history.greeting().map(|turn| turn.role), Some(Role::Assistant));

        history.push_user("hi");
        history.push_assistant("hello");
        assert_eq!(history.len(), 3);
        assert_eq!(history.last(), Some(&ConversationTurn::assistant("hello")));
    }

    #[test]
    fn test_history_serde_keeps_turns() {
        let mut history = ConversationHistory::new("Hi");
        history.push_user("q1");
        history.push_assistant("a1");

        let text = serde_json::to_string(&history).unwrap();
        let parsed: ConversationHistory = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, history);
    }

    #[test]
    fn test_history_rejects_empty_or_misordered_turns() {
        assert!(serde_json::from_str::<ConversationHistory>(r#"{"turns": []}"#).is_err());

        let user_first = r#"{"turns": [{"role": "user", "content": "q1"}]}"#;
        assert!(serde_json::from_str::<ConversationHistory>(user_first).is_err());

        let two_users = r#"{"turns": [
            {"role": "assistant", "content": "Hi"},
            {"role": "user", "content": "q1"},
            {"role": "user", "content": "q2"}
        ]}"#;
        assert!(serde_json::from_str::<ConversationHistory>(two_users).is_err());
    }

    #[test]
    fn test_prompt_render_layout() {
        let prompt = Prompt {
            instructions: "Be factual.\n".to_string(),
            context: "ctx line\n".to_string(),
            question: "where?".to_string(),
            history_summary: None,
        };
        assert_eq!(
            prompt.to_string(),
            "Instructions:\nBe factual.\n\nContext:\nctx line\n\nQuestion:\nwhere?"
        );
    }

    #[test]
    fn test_prompt_render_with_history() {
        let prompt = Prompt {
            instructions: "I".to_string(),
            context: "C".to_string(),
            question: "Q".to_string(),
            history_summary: Some("Chat History:\nPrevious Question: a\nRespective Answer: b\n\n".to_string()),
        };
        let rendered = prompt.to_string();
        let history_at = rendered.find("Chat History:").unwrap();
        let context_at = rendered.find("Context:").unwrap();
        let question_at = rendered.find("Question:\nQ").unwrap();
        assert!(context_at < history_at);
        assert!(history_at < question_at);
    }
}
