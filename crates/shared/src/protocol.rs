use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{domain::UserProfile, error::FormatError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Token and profile extracted from a sign-in response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInGrant {
    pub token: String,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Default, Deserialize)]
struct SignInBody {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "accessToken")]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct SignInData {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<Value>,
}

impl SignInGrant {
    /// Accepts the token under `token`, `accessToken` or `data.token`, in that order.
    pub fn from_response(raw: &Value) -> Result<Self, FormatError> {
        let body: SignInBody = serde_json::from_value(raw.clone())
            .map_err(|err| FormatError::new(format!("sign-in response: {err}")))?;
        let data: SignInData = body
            .data
            .and_then(|data| serde_json::from_value(data).ok())
            .unwrap_or_default();

        let token = [body.token, body.access_token, data.token]
            .into_iter()
            .flatten()
            .find(|token| !token.is_empty())
            .ok_or_else(|| FormatError::new("sign-in response carried no token"))?;

        let user = body
            .user
            .or(data.user)
            .and_then(|user| serde_json::from_value::<UserProfile>(user).ok());

        Ok(Self { token, user })
    }
}

/// Recognized shapes of a list response.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEnvelope {
    Bare(Vec<Value>),
    Data(Vec<Value>),
    Keyed { key: String, items: Vec<Value> },
}

impl ListEnvelope {
    pub fn classify(raw: Value, plural_key: Option<&str>) -> Result<Self, FormatError> {
        let mut object = match raw {
            Value::Array(items) => return Ok(Self::Bare(items)),
            Value::Object(object) => object,
            other => {
                return Err(FormatError::new(format!(
                    "expected an array or object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        if let Some(Value::Array(items)) = object.remove("data") {
            return Ok(Self::Data(items));
        }
        if let Some(key) = plural_key {
            if let Some(Value::Array(items)) = object.remove(key) {
                return Ok(Self::Keyed {
                    key: key.to_string(),
                    items,
                });
            }
        }

        Err(FormatError::new(match plural_key {
            Some(key) => format!("no array under `data` or `{key}`"),
            None => "no array under `data`".to_string(),
        }))
    }

    pub fn into_items(self) -> Vec<Value> {
        match self {
            Self::Bare(items) | Self::Data(items) | Self::Keyed { items, .. } => items,
        }
    }
}

/// Decodes a list response into typed items, rejecting unknown shapes and malformed items.
pub fn decode_list_response<T: DeserializeOwned>(
    raw: Value,
    plural_key: Option<&str>,
) -> Result<Vec<T>, FormatError> {
    ListEnvelope::classify(raw, plural_key)?
        .into_items()
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item)
                .map_err(|err| FormatError::new(format!("item {index}: {err}")))
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
