use chrono::{DateTime, Utc};

use super::company::{ClientUpsert, ProviderUpsert};

/// Local record of a redeemed invitation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub id: i64,
    pub profile_id: i64,
    pub token: String,
    pub client_email: String,
    pub provider_id: Option<i64>,
    pub contract_id: i64,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

/// Everything written locally once the scheduling service accepted a token.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub profile_id: i64,
    pub token: String,
    pub client_email: String,
    pub provider: ProviderUpsert,
    pub client: ClientUpsert,
    /// Contract id as known by the scheduling service.
    pub contract_id: i64,
}
