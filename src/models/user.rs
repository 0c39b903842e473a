use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Page size used when the caller gives none or an out-of-range one.
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "MALE",
            Sex::Female => "FEMALE",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MALE" => Ok(Sex::Male),
            "FEMALE" => Ok(Sex::Female),
            other => Err(format!("unknown sex: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub nationality: Option<String>,
    pub sex: Option<Sex>,
    pub age: Option<i32>,
}

/// Sparse search criteria. Every `None` field is left out of the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub nationality: Option<String>,
    pub sex: Option<Sex>,
    pub age: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Pagination {
    /// Clamp raw caller values: limit outside 1..=100 (or missing) becomes 10,
    /// negative or missing offset becomes 0.
    pub fn clamped(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = match limit {
            Some(l) if l > 0 && l as u64 <= MAX_LIMIT => l as u64,
            _ => DEFAULT_LIMIT,
        };
        let offset = offset.filter(|o| *o > 0).unwrap_or(0) as u64;

        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }
}

/// Input for persisting a new user. Callers only ever set `name`, `surname`
/// and `patronymic`; the rest is filled in by enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserInput {
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub nationality: Option<String>,
    pub age: Option<i32>,
    pub sex: Option<Sex>,
}

impl CreateUserInput {
    pub fn new(name: String, surname: String, patronymic: Option<String>) -> Self {
        Self {
            name,
            surname,
            patronymic,
            nationality: None,
            age: None,
            sex: None,
        }
    }

    pub fn with_enrichment(self, enrichment: Enrichment) -> Self {
        Self {
            nationality: enrichment.nationality,
            age: enrichment.age,
            sex: enrichment.sex,
            ..self
        }
    }
}

/// Attributes inferred from a first name. Each one is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub age: Option<i32>,
    pub nationality: Option<String>,
    pub sex: Option<Sex>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub nationality: Option<String>,
    pub age: Option<i32>,
    pub sex: Option<Sex>,
}

impl UpdateUserInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.surname.is_none()
            && self.patronymic.is_none()
            && self.nationality.is_none()
            && self.age.is_none()
            && self.sex.is_none()
    }
}

/// One page of search results together with the total match count.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub total: u64,
    pub items: Vec<User>,
}
