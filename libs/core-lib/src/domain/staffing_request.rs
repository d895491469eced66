use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffingRequest {
    pub id: i64,
    pub client_id: i64,
    pub provider_id: i64,
    pub contract_id: i64,
    pub requester_profile_id: i64,
    pub created_at: DateTime<Utc>,
    pub professional_type: String,
    pub shift: String,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct NewStaffingRequest {
    pub client_id: i64,
    pub provider_id: i64,
    pub contract_id: i64,
    pub requester_profile_id: i64,
    pub professional_type: String,
    pub shift: String,
    pub notes: String,
}

/// A request joined with the names shown on the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestSummary {
    pub request: StaffingRequest,
    pub client_name: String,
    pub provider_name: String,
}
