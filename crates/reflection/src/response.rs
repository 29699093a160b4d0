//! The JSON response contract `deep_reflect` demands of the LLM, and a
//! parser tolerant of markdown code fences: on unparseable output, every
//! section defaults to empty rather than erroring.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GoalUpdate {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub progress: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub blockers: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NewGoal {
    pub description: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub goal_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Insight {
    pub content: String,
    #[serde(default)]
    pub importance: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Learning {
    pub content: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct KnowledgeNodeSpec {
    pub node_type: String,
    pub content: String,
    #[serde(default)]
    pub relevance: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct KnowledgeEdgeSpec {
    pub source: String,
    pub target: String,
    pub relationship: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RelationshipUpdate {
    pub name: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ReflectionResponse {
    #[serde(default)]
    pub goal_updates: Vec<GoalUpdate>,
    #[serde(default)]
    pub new_goals: Vec<NewGoal>,
    #[serde(default)]
    pub insights: Vec<Insight>,
    #[serde(default)]
    pub learnings: Vec<Learning>,
    #[serde(default)]
    pub knowledge_nodes: Vec<KnowledgeNodeSpec>,
    #[serde(default)]
    pub knowledge_edges: Vec<KnowledgeEdgeSpec>,
    #[serde(default)]
    pub relationships: Vec<RelationshipUpdate>,
    #[serde(default)]
    pub self_insight_suggestions: Vec<String>,
    #[serde(default)]
    pub thinking: Option<String>,
}

/// Strips a leading/trailing ```` ```json ```` or ```` ``` ```` fence, if
/// present.
fn strip_markdown_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\n', '\r']);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parses the LLM's raw text into a [`ReflectionResponse`], defaulting
/// every section to empty on any parse failure rather than erroring.
pub fn parse_response(raw: &str) -> ReflectionResponse {
    let candidate = strip_markdown_fence(raw);
    serde_json::from_str(candidate).unwrap_or_default()
}
