use serde::Serialize;

/// Company providing staff (the "empresa contratante" on the scheduling side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provider {
    pub id: i64,
    pub name: String,
    pub tax_id: String,
    pub email: String,
    pub system_url: String,
}

/// Company requesting staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub tax_id: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contract {
    pub id: i64,
    pub number: String,
    pub client_id: i64,
    pub provider_id: i64,
}

/// Provider fields keyed by tax id, as received from the scheduling service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUpsert {
    pub tax_id: String,
    pub name: String,
    pub email: String,
    pub system_url: String,
}

/// Client fields keyed by tax id, as received from the scheduling service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientUpsert {
    pub tax_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}
