use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::entities::accounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

/// Account data exposed outside the persistence layer (no password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub gender: Gender,
    pub about: String,
    pub profile_url: String,
    pub dob: NaiveDate,
    pub is_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name,
            email: model.email,
            username: model.username,
            gender: model.gender.parse().unwrap_or(Gender::Other),
            about: model.about,
            profile_url: model.profile_url,
            dob: model.dob,
            is_verified: model.is_verified,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// The authenticated account together with its graph neighbourhood.
#[derive(Debug, Clone, Serialize)]
pub struct AccountProfile {
    #[serde(flatten)]
    pub account: Account,
    pub followers: Vec<Account>,
    pub following: Vec<Account>,
    pub posts: Vec<super::Post>,
}

/// Canonical form used for both storage and lookup of emails and usernames.
#[must_use]
pub fn normalize_handle(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parse() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!(" female ".parse::<Gender>().unwrap(), Gender::Female);
        assert!("robot".parse::<Gender>().is_err());
    }

    #[test]
    fn test_normalize_handle() {
        assert_eq!(normalize_handle("  Alice@Example.COM "), "alice@example.com");
    }
}
