//! Database models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// Category with the number of items filed under it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub item_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub issue_date: Option<NaiveDate>,
    pub country: String,
    pub condition: String,
    pub category_id: i64,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Grading scale for coins and stamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemCondition {
    /// Uncirculated
    #[serde(rename = "UNC")]
    Uncirculated,
    /// About uncirculated
    #[serde(rename = "AU")]
    AboutUncirculated,
    /// Extremely fine
    #[serde(rename = "XF")]
    ExtremelyFine,
    /// Very fine
    #[serde(rename = "VF")]
    VeryFine,
    /// Fine
    #[serde(rename = "F")]
    Fine,
    /// Very good
    #[serde(rename = "VG")]
    VeryGood,
    /// Good
    #[serde(rename = "G")]
    Good,
}

impl ItemCondition {
    pub const ALL: [ItemCondition; 7] = [
        ItemCondition::Uncirculated,
        ItemCondition::AboutUncirculated,
        ItemCondition::ExtremelyFine,
        ItemCondition::VeryFine,
        ItemCondition::Fine,
        ItemCondition::VeryGood,
        ItemCondition::Good,
    ];

    /// Storage code (`UNC`, `AU`, ...)
    pub fn code(&self) -> &'static str {
        match self {
            ItemCondition::Uncirculated => "UNC",
            ItemCondition::AboutUncirculated => "AU",
            ItemCondition::ExtremelyFine => "XF",
            ItemCondition::VeryFine => "VF",
            ItemCondition::Fine => "F",
            ItemCondition::VeryGood => "VG",
            ItemCondition::Good => "G",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemCondition::Uncirculated => "Uncirculated (UNC)",
            ItemCondition::AboutUncirculated => "About Uncirculated (AU)",
            ItemCondition::ExtremelyFine => "Extremely Fine (XF)",
            ItemCondition::VeryFine => "Very Fine (VF)",
            ItemCondition::Fine => "Fine (F)",
            ItemCondition::VeryGood => "Very Good (VG)",
            ItemCondition::Good => "Good (G)",
        }
    }

    /// Parse a storage code, rejecting anything outside the grading scale
    pub fn from_code(code: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown item condition: {}", code)))
    }
}

/// Comment joined with its author's username
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub item_id: i64,
    pub user_id: i64,
    pub username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub password_salt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: i64,
    pub bio: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Poll {
    pub id: i64,
    pub question: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PollOption {
    pub id: i64,
    pub poll_id: i64,
    pub text: String,
}

/// Visits counted for one calendar date
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VisitCount {
    pub id: i64,
    pub date: NaiveDate,
    pub count: i64,
}

/// Item in a user's personal collection
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CollectionEntry {
    pub id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub item_slug: String,
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
}
