use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{check_ins, matches, profiles, users, venues};

// --- Categorical values ---
//
// Stored as varchar columns; parsed at the edge so handlers reject unknown
// values before touching state.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInMode {
    Dating,
    Friends,
}

impl CheckInMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInMode::Dating => "dating",
            CheckInMode::Friends => "friends",
        }
    }
}

impl std::fmt::Display for CheckInMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CheckInMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dating" => Ok(CheckInMode::Dating),
            "friends" => Ok(CheckInMode::Friends),
            _ => Err(format!("unknown check-in mode: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::NonBinary => "non-binary",
            Gender::Other => "other",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "non-binary" => Ok(Gender::NonBinary),
            "other" => Ok(Gender::Other),
            _ => Err(format!("unknown gender: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SexualOrientation {
    Straight,
    Gay,
    Lesbian,
    Bisexual,
    Pansexual,
    Asexual,
    Other,
}

impl SexualOrientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SexualOrientation::Straight => "straight",
            SexualOrientation::Gay => "gay",
            SexualOrientation::Lesbian => "lesbian",
            SexualOrientation::Bisexual => "bisexual",
            SexualOrientation::Pansexual => "pansexual",
            SexualOrientation::Asexual => "asexual",
            SexualOrientation::Other => "other",
        }
    }
}

impl std::str::FromStr for SexualOrientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "straight" => Ok(SexualOrientation::Straight),
            "gay" => Ok(SexualOrientation::Gay),
            "lesbian" => Ok(SexualOrientation::Lesbian),
            "bisexual" => Ok(SexualOrientation::Bisexual),
            "pansexual" => Ok(SexualOrientation::Pansexual),
            "asexual" => Ok(SexualOrientation::Asexual),
            "other" => Ok(SexualOrientation::Other),
            _ => Err(format!("unknown sexual orientation: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Matched,
    Rejected,
    Expired,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Matched => "matched",
            MatchStatus::Rejected => "rejected",
            MatchStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- User ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = users)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = users)]
pub struct UpsertUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}

// --- Profile ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profiles)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub bio: Option<String>,
    pub interests: serde_json::Value,
    pub gender: String,
    pub sexual_orientation: String,
    pub birthday: NaiveDate,
    pub profile_photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub username: String,
    pub bio: Option<String>,
    pub interests: serde_json::Value,
    pub gender: String,
    pub sexual_orientation: String,
    pub birthday: NaiveDate,
    pub profile_photo_url: Option<String>,
}

#[derive(Debug, AsChangeset, Default)]
#[diesel(table_name = profiles)]
pub struct UpdateProfile {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<serde_json::Value>,
    pub gender: Option<String>,
    pub sexual_orientation: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub profile_photo_url: Option<String>,
}

// --- Venue ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = venues)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub venue_type: String,
    pub music_type: String,
    pub vibe: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = venues)]
pub struct NewVenue {
    pub name: String,
    pub address: String,
    pub venue_type: String,
    pub music_type: String,
    pub vibe: String,
    pub description: Option<String>,
}

// --- CheckIn ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = check_ins)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub id: Uuid,
    pub user_id: Uuid,
    pub venue_id: Uuid,
    pub mode: String,
    pub ai_recommendations: bool,
    pub checked_in_at: DateTime<Utc>,
    pub checked_out_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = check_ins)]
pub struct NewCheckIn {
    pub user_id: Uuid,
    pub venue_id: Uuid,
    pub mode: String,
    pub ai_recommendations: bool,
}

// --- Match ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = matches)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub target_id: Uuid,
    pub venue_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub matched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatch {
    pub requester_id: Uuid,
    pub target_id: Uuid,
    pub venue_id: Uuid,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn check_in_mode_parses_both_values() {
        assert_eq!(CheckInMode::from_str("dating").unwrap(), CheckInMode::Dating);
        assert_eq!(CheckInMode::from_str("Friends").unwrap(), CheckInMode::Friends);
        assert!(CheckInMode::from_str("networking").is_err());
    }

    #[test]
    fn orientation_rejects_unknown_values() {
        assert_eq!(
            SexualOrientation::from_str("bisexual").unwrap(),
            SexualOrientation::Bisexual
        );
        assert!(SexualOrientation::from_str("dating").is_err());
    }

    #[test]
    fn gender_accepts_kebab_case() {
        assert_eq!(Gender::from_str("non-binary").unwrap(), Gender::NonBinary);
    }

    #[test]
    fn check_in_serializes_camel_case() {
        let row = CheckIn {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            venue_id: Uuid::new_v4(),
            mode: CheckInMode::Dating.as_str().to_string(),
            ai_recommendations: false,
            checked_in_at: Utc::now(),
            checked_out_at: None,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("venueId").is_some());
        assert!(json.get("checkedInAt").is_some());
        assert!(json.get("aiRecommendations").is_some());
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn match_status_round_trips_through_strings() {
        for status in [
            MatchStatus::Pending,
            MatchStatus::Matched,
            MatchStatus::Rejected,
            MatchStatus::Expired,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
