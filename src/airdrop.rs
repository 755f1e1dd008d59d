use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an airdrop, always derived from its dates and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Upcoming,
    Active,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Upcoming => "Upcoming",
            Status::Active => "Active",
            Status::Completed => "Completed",
        }
    }

    /// Parse a status label, ignoring case and surrounding whitespace.
    pub fn from_strng(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "UPCOMING" => Some(Status::Upcoming),
            "ACTIVE" => Some(Status::Active),
            "COMPLETED" => Some(Status::Completed),
            _ => None,
        }
    }
}

/// Status filter applied to the visible view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterStatus {
    All,
    Upcoming,
    Active,
    Completed,
}

impl FilterStatus {
    pub fn from_strng(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "ALL" => Some(FilterStatus::All),
            "UPCOMING" => Some(FilterStatus::Upcoming),
            "ACTIVE" => Some(FilterStatus::Active),
            "COMPLETED" => Some(FilterStatus::Completed),
            _ => None,
        }
    }

    /// Whether a record with the given status passes this filter.
    pub fn accepts(&self, status: Status) -> bool {
        match self {
            FilterStatus::All => true,
            FilterStatus::Upcoming => status == Status::Upcoming,
            FilterStatus::Active => status == Status::Active,
            FilterStatus::Completed => status == Status::Completed,
        }
    }
}

/// A checklist item belonging to one airdrop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

impl Task {
    pub fn new(text: impl Into<String>) -> Self {
        Task {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            completed: false,
        }
    }
}

/// One tracked airdrop opportunity
///
/// All date fields are epoch milliseconds (UTC). `status` is derived and
/// recomputed on every mutation; `created_at` is assigned once and serves
/// as the default sort key (newest first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airdrop {
    /// Unique identifier, assigned at creation
    pub id: String,

    /// Identifier of the owning user or guest session
    pub owner_id: String,

    /// Display name; never empty (a fallback is substituted at creation)
    pub name: String,

    pub description: Option<String>,
    pub notes: Option<String>,
    pub wallet_address: Option<String>,
    pub blockchain: Option<String>,
    pub airdrop_link: Option<String>,
    pub referral_code: Option<String>,
    pub airdrop_type: Option<String>,
    pub information_source: Option<String>,
    pub participation_requirements: Option<String>,
    pub user_defined_status: Option<String>,

    /// Expected token amount, non-negative when present
    pub token_amount: Option<f64>,

    pub start_date: Option<i64>,
    pub deadline: Option<i64>,
    pub registration_date: Option<i64>,
    pub claim_date: Option<i64>,

    /// Checklist, insertion order meaningful for display only
    pub tasks: Vec<Task>,

    /// Derived lifecycle status
    pub status: Status,

    pub created_at: i64,
}

/// Task data as it arrives from forms and import sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskInput {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// Airdrop data as it arrives from forms, extraction and import sources
///
/// Every field is optional; the store substitutes defaults at creation.
/// `status` is only honored on the raw bulk-import path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirdropInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub wallet_address: Option<String>,
    pub blockchain: Option<String>,
    pub airdrop_link: Option<String>,
    pub referral_code: Option<String>,
    pub airdrop_type: Option<String>,
    pub information_source: Option<String>,
    pub participation_requirements: Option<String>,
    pub user_defined_status: Option<String>,
    pub token_amount: Option<f64>,
    pub start_date: Option<i64>,
    pub deadline: Option<i64>,
    pub registration_date: Option<i64>,
    pub claim_date: Option<i64>,
    #[serde(default)]
    pub tasks: Vec<TaskInput>,
    pub status: Option<Status>,
}

impl AirdropInput {
    /// Validate form input before it reaches the store
    ///
    /// This is the form boundary's responsibility, not the store's: the
    /// store itself accepts any input. Checks that at least one field is
    /// filled in, that `start_date <= deadline` when both are present,
    /// and that `token_amount` is non-negative.
    ///
    /// # Returns
    /// * `Result<(), String>` - Ok or a message describing the first problem
    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("At least one field must be filled in".to_string());
        }

        if let (Some(start), Some(end)) = (self.start_date, self.deadline) {
            if start > end {
                return Err("Start date must not be after the deadline".to_string());
            }
        }

        if let Some(amount) = self.token_amount {
            if amount < 0.0 {
                return Err("Token amount cannot be negative".to_string());
            }
        }

        Ok(())
    }

    /// True when no field carries any data.
    pub fn is_empty(&self) -> bool {
        let text_fields = [
            &self.name,
            &self.description,
            &self.notes,
            &self.wallet_address,
            &self.blockchain,
            &self.airdrop_link,
            &self.referral_code,
            &self.airdrop_type,
            &self.information_source,
            &self.participation_requirements,
            &self.user_defined_status,
        ];

        text_fields
            .iter()
            .all(|f| f.as_deref().map_or(true, |s| s.trim().is_empty()))
            && self.token_amount.is_none()
            && self.start_date.is_none()
            && self.deadline.is_none()
            && self.registration_date.is_none()
            && self.claim_date.is_none()
            && self.tasks.is_empty()
    }
}

/// Fallback display name for an airdrop created without one.
pub fn fallback_name(created_at: i64) -> String {
    match Utc.timestamp_millis_opt(created_at).single() {
        Some(ts) => format!("Airdrop {}", ts.format("%Y-%m-%d %H:%M")),
        None => "Airdrop".to_string(),
    }
}

/// Current instant in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_fails_validation() {
        let input = AirdropInput::default();
        assert!(input.validate().is_err());

        let input = AirdropInput {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn date_ordering_is_enforced_at_the_form_boundary() {
        let input = AirdropInput {
            name: Some("Layer2 points".to_string()),
            start_date: Some(2_000),
            deadline: Some(1_000),
            ..Default::default()
        };
        assert!(input.validate().is_err());

        let input = AirdropInput {
            name: Some("Layer2 points".to_string()),
            start_date: Some(1_000),
            deadline: Some(1_000),
            ..Default::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn negative_token_amount_is_rejected() {
        let input = AirdropInput {
            name: Some("X".to_string()),
            token_amount: Some(-1.0),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn status_labels_round_trip() {
        for status in [Status::Upcoming, Status::Active, Status::Completed] {
            assert_eq!(Status::from_strng(status.as_str()), Some(status));
        }
        assert_eq!(Status::from_strng("finished"), None);
        assert_eq!(FilterStatus::from_strng("all"), Some(FilterStatus::All));
    }

    #[test]
    fn fallback_name_carries_the_creation_date() {
        // 2024-03-01 00:00:00 UTC
        let name = fallback_name(1_709_251_200_000);
        assert!(name.starts_with("Airdrop 2024-03-01"));
    }
}
