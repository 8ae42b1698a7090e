use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address fields as shown in the form and persisted in storage.
///
/// Serialized with the form's own keys (`cep`, `logradouro`, ...) so the
/// stored JSON stays compatible with what the page has always written.
/// Missing or `null` keys restore as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    #[serde(rename = "cep", default, deserialize_with = "string_or_empty")]
    pub postal_code: String,
    #[serde(rename = "logradouro", default, deserialize_with = "string_or_empty")]
    pub street: String,
    #[serde(rename = "numero", default, deserialize_with = "string_or_empty")]
    pub number: String,
    #[serde(rename = "complemento", default, deserialize_with = "string_or_empty")]
    pub complement: String,
    #[serde(rename = "bairro", default, deserialize_with = "string_or_empty")]
    pub neighborhood: String,
    #[serde(rename = "cidade", default, deserialize_with = "string_or_empty")]
    pub city: String,
    #[serde(rename = "uf", default, deserialize_with = "string_or_empty")]
    pub state_code: String,
    #[serde(
        rename = "savedAt",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub saved_at: Option<DateTime<Utc>>,
}

impl AddressRecord {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::PostalCode => &self.postal_code,
            Field::Street => &self.street,
            Field::Number => &self.number,
            Field::Complement => &self.complement,
            Field::Neighborhood => &self.neighborhood,
            Field::City => &self.city,
            Field::State => &self.state_code,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::PostalCode => &mut self.postal_code,
            Field::Street => &mut self.street,
            Field::Number => &mut self.number,
            Field::Complement => &mut self.complement,
            Field::Neighborhood => &mut self.neighborhood,
            Field::City => &mut self.city,
            Field::State => &mut self.state_code,
        };
        *slot = value.into();
    }

    /// Overwrite the fields a lookup is responsible for.
    ///
    /// Number and postal code are the user's and are left alone.
    pub fn apply_remote(&mut self, remote: &RemoteAddress) {
        self.street = remote.logradouro.clone().unwrap_or_default();
        self.complement = remote.complemento.clone().unwrap_or_default();
        self.neighborhood = remote.bairro.clone().unwrap_or_default();
        self.city = remote.localidade.clone().unwrap_or_default();
        self.state_code = remote.uf.clone().unwrap_or_default();
    }

    /// Same record with the timestamp dropped, for comparing field content.
    pub fn without_timestamp(&self) -> Self {
        Self {
            saved_at: None,
            ..self.clone()
        }
    }
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// savedAt is informational only; a garbled stamp should not make the whole record unreadable.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

/// A tracked form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PostalCode,
    Street,
    Number,
    Complement,
    Neighborhood,
    City,
    State,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::PostalCode,
        Field::Street,
        Field::Number,
        Field::Complement,
        Field::Neighborhood,
        Field::City,
        Field::State,
    ];

    /// Element id of the field in the address form
    pub fn id(self) -> &'static str {
        match self {
            Self::PostalCode => "cep",
            Self::Street => "logradouro",
            Self::Number => "numero",
            Self::Complement => "complemento",
            Self::Neighborhood => "bairro",
            Self::City => "cidade",
            Self::State => "uf",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown form field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.id() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// ViaCEP signals a miss with `erro`, as a bool on the classic API and as a
/// string on newer deployments. Anything else is judged by JS truthiness,
/// which is what the page's `if (data.erro)` did.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ErrorFlag {
    Bool(bool),
    Text(String),
    Other(serde_json::Value),
}

impl ErrorFlag {
    pub fn is_set(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Text(s) => !s.is_empty(),
            Self::Other(value) => is_truthy(value),
        }
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// Response body of `GET /ws/{cep}/json/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteAddress {
    pub cep: Option<String>,
    pub logradouro: Option<String>,
    pub complemento: Option<String>,
    pub bairro: Option<String>,
    pub localidade: Option<String>,
    pub uf: Option<String>,
    pub erro: Option<ErrorFlag>,
}

impl RemoteAddress {
    pub fn is_not_found(&self) -> bool {
        self.erro.as_ref().map(ErrorFlag::is_set).unwrap_or(false)
    }
}

/// What the lookup service said about a CEP
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Found(RemoteAddress),
    NotFound,
}
