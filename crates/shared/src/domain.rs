use std::fmt;

use serde::{
    de::Error as _,
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::{Map, Value};

/// Server-assigned identifier. A given entity type uses one representation only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Num(i64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Numeric,
    Text,
}

impl ResourceId {
    /// Parses raw user input according to the usual id representation of an
    /// entity type. Input that is not a number stays text, since some
    /// deployments key numeric-looking entities by string.
    pub fn parse_as(kind: IdKind, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match kind {
            IdKind::Numeric => Some(
                raw.parse()
                    .map(Self::Num)
                    .unwrap_or_else(|_| Self::Text(raw.to_string())),
            ),
            IdKind::Text => Some(Self::Text(raw.to_string())),
        }
    }

    pub fn kind(&self) -> IdKind {
        match self {
            Self::Num(_) => IdKind::Numeric,
            Self::Text(_) => IdKind::Text,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(value: i64) -> Self {
        Self::Num(value)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Status values as spoken by the backend.
pub mod status {
    pub const ALL: &str = "all";
    pub const ACTIVE: &str = "faol";
    pub const ON_LEAVE: &str = "ta'tilda";
    pub const INACTIVE: &str = "nofaol";
    pub const FROZEN: &str = "muzlatilgan";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "lenient_text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub role: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            self.email.clone().unwrap_or_default()
        } else {
            parts.join(" ")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaffRole {
    Admin,
    #[serde(rename = "Super Admin")]
    SuperAdmin,
    Manager,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::SuperAdmin => "Super Admin",
            Self::Manager => "Manager",
        }
    }
}

/// Admins and managers share one record shape on the staff endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    #[serde(flatten, deserialize_with = "id_key", serialize_with = "as_id")]
    pub id: ResourceId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    #[serde(flatten, deserialize_with = "id_key", serialize_with = "as_id")]
    pub id: ResourceId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(flatten, deserialize_with = "id_key", serialize_with = "as_id")]
    pub id: ResourceId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(flatten, deserialize_with = "mongo_key", serialize_with = "as_mongo_id")]
    pub id: ResourceId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub teacher_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub teacher_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub course_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub course_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub students_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(flatten, deserialize_with = "mongo_key", serialize_with = "as_mongo_id")]
    pub id: ResourceId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub students_count: Option<u32>,
    #[serde(default, deserialize_with = "course_status")]
    pub status: Option<String>,
}

/// A student who has not paid for the selected month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debtor {
    #[serde(flatten, deserialize_with = "mongo_key", serialize_with = "as_mongo_id")]
    pub id: ResourceId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phone: Option<String>,
}

/// A hit returned by the search-as-you-type endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupHit {
    #[serde(flatten, deserialize_with = "mongo_key", serialize_with = "as_mongo_id")]
    pub id: ResourceId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_name: Option<String>,
}

impl LookupHit {
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: StaffRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentDraft {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDraft {
    pub name: String,
    pub teacher_id: String,
    pub course_id: String,
    pub start_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDraft {
    pub name: String,
    pub price: f64,
    pub duration: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Naqd,
    Karta,
    Bank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDraft {
    pub student_id: String,
    pub group_id: String,
    pub payment_price: f64,
    /// Billing month as `YYYY-MM`.
    pub month: String,
    pub method: PaymentMethod,
    #[serde(rename = "paidAt")]
    pub paid_at: String,
}

// Records carry their key as `id`, `_id`, or both; the first listed wins.
fn record_key<'de, D>(deserializer: D, keys: [&'static str; 2]) -> Result<ResourceId, D::Error>
where
    D: Deserializer<'de>,
{
    let mut rest = Map::<String, Value>::deserialize(deserializer)?;
    for key in keys {
        if let Some(value) = rest.remove(key).filter(|value| !value.is_null()) {
            return ResourceId::deserialize(value).map_err(D::Error::custom);
        }
    }
    Err(D::Error::missing_field(keys[0]))
}

fn id_key<'de, D>(deserializer: D) -> Result<ResourceId, D::Error>
where
    D: Deserializer<'de>,
{
    record_key(deserializer, ["id", "_id"])
}

fn mongo_key<'de, D>(deserializer: D) -> Result<ResourceId, D::Error>
where
    D: Deserializer<'de>,
{
    record_key(deserializer, ["_id", "id"])
}

fn key_entry<S>(key: &str, id: &ResourceId, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(key, id)?;
    map.end()
}

fn as_id<S: Serializer>(id: &ResourceId, serializer: S) -> Result<S::Ok, S::Error> {
    key_entry("id", id, serializer)
}

fn as_mongo_id<S: Serializer>(id: &ResourceId, serializer: S) -> Result<S::Ok, S::Error> {
    key_entry("_id", id, serializer)
}

/// Display text that the backend sometimes sends as a number or as a
/// populated `{ "name": ... }` reference.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(text_of))
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(mut fields) => fields.remove("name").and_then(text_of),
        Value::Null | Value::Array(_) => None,
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?
        .filter(|value| *value >= 0.0)
        .map(|value| value as u32))
}

// The course endpoints report status either as a word or as an "active" flag.
fn course_status<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Some(s),
        Some(Value::Bool(true)) => Some(status::ACTIVE.to_string()),
        Some(Value::Bool(false)) => Some(status::FROZEN.to_string()),
        _ => None,
    })
}
