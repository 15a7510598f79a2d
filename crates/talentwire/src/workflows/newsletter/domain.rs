use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a candidate by the listings subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Job-seeker listing as read from the listings subsystem.
///
/// The pipeline never mutates candidates; it only filters them against
/// subscriber preferences. Attributes a listing may leave unset are optional
/// here, and an unset attribute never satisfies a constrained dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub employment_type: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub gender: Option<String>,
    pub document_type: Option<String>,
    #[serde(default)]
    pub demanded: bool,
}

/// Newsletter recipient with a saved preference vector. Created by the
/// subscription flow; read-only for this pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub email: String,
    pub active: bool,
    pub preferences: PreferenceVector,
}

/// Per-subscriber filter constraints. An empty list or unset option leaves
/// that dimension unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceVector {
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub employment_types: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub gender: Option<String>,
    #[serde(default)]
    pub document_types: Vec<String>,
    #[serde(default)]
    pub demanded_only: bool,
}

impl PreferenceVector {
    /// True when no dimension constrains the candidate list.
    pub fn is_unconstrained(&self) -> bool {
        self.cities.is_empty()
            && self.categories.is_empty()
            && self.employment_types.is_empty()
            && self.languages.is_empty()
            && self.gender.is_none()
            && self.document_types.is_empty()
            && !self.demanded_only
    }
}
