use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder Reddit uses for the author or body of removed content.
pub const DELETED_SENTINEL: &str = "[deleted]";
pub const REMOVED_SENTINEL: &str = "[removed]";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub title: String,
    pub body: String,
    pub author: String,
    pub score: i64,
    pub url: String,
    pub num_comments: i64,
    pub created_utc: i64,
    pub subreddit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub body: String,
    pub author: String,
    pub score: i64,
    pub depth: usize,
}

/// One normalized unit of a flattened thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FlatRecord {
    Post(PostRecord),
    Comment(CommentRecord),
}

impl FlatRecord {
    pub fn as_post(&self) -> Option<&PostRecord> {
        match self {
            FlatRecord::Post(post) => Some(post),
            FlatRecord::Comment(_) => None,
        }
    }

    pub fn as_comment(&self) -> Option<&CommentRecord> {
        match self {
            FlatRecord::Comment(comment) => Some(comment),
            FlatRecord::Post(_) => None,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, FlatRecord::Comment(_))
    }
}

/// Ordered output of the flattener: the post (if any) followed by comments in
/// depth-first reply order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatThread {
    pub records: Vec<FlatRecord>,
}

impl FlatThread {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn post(&self) -> Option<&PostRecord> {
        self.records.first().and_then(FlatRecord::as_post)
    }

    pub fn comments(&self) -> impl Iterator<Item = &CommentRecord> {
        self.records.iter().filter_map(FlatRecord::as_comment)
    }

    pub fn comment_count(&self) -> usize {
        self.comments().count()
    }

    pub fn subreddit(&self) -> &str {
        self.post().map(|p| p.subreddit.as_str()).unwrap_or("")
    }
}

/// A candidate thread surfaced by a subreddit scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub title: String,
    pub url: String,
    pub score: i64,
    pub num_comments: i64,
    pub created_utc: i64,
}

impl ThreadSummary {
    /// `comments x (1 + score / 100)`
    pub fn engagement(&self) -> f64 {
        self.num_comments as f64 * (1.0 + self.score as f64 / 100.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PainPoint {
    #[serde(deserialize_with = "lenient_string")]
    pub pain: String,
    #[serde(deserialize_with = "lenient_enum")]
    pub severity: Severity,
    #[serde(deserialize_with = "lenient_string")]
    pub frequency: String,
    #[serde(deserialize_with = "lenient_string")]
    pub who_has_it: String,
    #[serde(deserialize_with = "lenient_string")]
    pub current_solutions: String,
    #[serde(deserialize_with = "lenient_string")]
    pub why_current_solutions_fail: String,
    #[serde(deserialize_with = "lenient_strings")]
    pub quotes: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub validation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuyingIntent {
    #[serde(deserialize_with = "lenient_string")]
    pub signal: String,
    #[serde(deserialize_with = "lenient_string")]
    pub budget_hints: String,
    #[serde(deserialize_with = "lenient_enum")]
    pub urgency: Urgency,
    #[serde(deserialize_with = "lenient_strings")]
    pub quotes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnmetNeed {
    #[serde(deserialize_with = "lenient_string")]
    pub need: String,
    #[serde(deserialize_with = "lenient_string")]
    pub who_needs_it: String,
    #[serde(deserialize_with = "lenient_string")]
    pub why_unmet: String,
    #[serde(deserialize_with = "lenient_string")]
    pub opportunity: String,
    #[serde(deserialize_with = "lenient_strings")]
    pub quotes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Objection {
    #[serde(deserialize_with = "lenient_string")]
    pub objection: String,
    #[serde(deserialize_with = "lenient_string")]
    pub how_to_overcome: String,
    #[serde(deserialize_with = "lenient_strings")]
    pub quotes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pattern {
    #[serde(deserialize_with = "lenient_string")]
    pub pattern: String,
    #[serde(deserialize_with = "lenient_string")]
    pub frequency: String,
    #[serde(deserialize_with = "lenient_string")]
    pub implication: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductIdea {
    #[serde(deserialize_with = "lenient_string")]
    pub idea: String,
    #[serde(deserialize_with = "lenient_string")]
    pub target_customer: String,
    #[serde(deserialize_with = "lenient_string")]
    pub problem_solved: String,
    #[serde(deserialize_with = "lenient_string")]
    pub evidence: String,
    #[serde(deserialize_with = "lenient_string")]
    pub mvp_suggestion: String,
    #[serde(deserialize_with = "lenient_string")]
    pub risk: String,
}

/// Structured product-research insights extracted from one thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightResult {
    #[serde(deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(deserialize_with = "lenient_list")]
    pub pain_points: Vec<PainPoint>,
    #[serde(deserialize_with = "lenient_list")]
    pub buying_intent: Vec<BuyingIntent>,
    #[serde(deserialize_with = "lenient_list")]
    pub unmet_needs: Vec<UnmetNeed>,
    #[serde(deserialize_with = "lenient_list")]
    pub objections_and_concerns: Vec<Objection>,
    #[serde(deserialize_with = "lenient_list")]
    pub patterns: Vec<Pattern>,
    #[serde(deserialize_with = "lenient_list")]
    pub product_ideas: Vec<ProductIdea>,
    #[serde(deserialize_with = "lenient_strings")]
    pub golden_quotes: Vec<String>,
    #[serde(deserialize_with = "lenient_strings")]
    pub recommended_next_steps: Vec<String>,
}

impl InsightResult {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
            && self.pain_points.is_empty()
            && self.buying_intent.is_empty()
            && self.unmet_needs.is_empty()
            && self.objections_and_concerns.is_empty()
            && self.patterns.is_empty()
            && self.product_ideas.is_empty()
            && self.golden_quotes.is_empty()
            && self.recommended_next_steps.is_empty()
    }
}

// Models drift from the requested schema: numbers where strings were asked for,
// nulls, and enum values like "high | medium". Accept those instead of failing
// the whole extraction.

fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_string(value))
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => Vec::new(),
        serde_json::Value::Array(items) => items.into_iter().map(value_to_string).collect(),
        other => vec![value_to_string(other)],
    })
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_enum<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let text = value_to_string(value).trim().to_lowercase();
    // "high | medium" style answers take the first option
    let first = text.split(['|', '/', ',']).next().unwrap_or("").trim();
    Ok(serde_json::from_value(serde_json::Value::String(first.to_string())).unwrap_or_default())
}
