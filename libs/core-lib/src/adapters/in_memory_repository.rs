use crate::{
    CoreError, Repository,
    domain::{
        account::{Account, Identity, NewAccount, Profile},
        company::{Client, ClientUpsert, Contract, Provider, ProviderUpsert},
        grant::{Redemption, TokenGrant},
        staffing_request::{NewStaffingRequest, RequestSummary, StaffingRequest},
    },
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

#[derive(Debug, Default)]
struct Sequence(AtomicI64);

impl Sequence {
    fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[derive(Debug, Default)]
struct Tables {
    identities: DashMap<i64, Identity>,
    // email -> identity id
    identity_emails: DashMap<String, i64>,
    profiles: DashMap<i64, Profile>,
    providers: DashMap<i64, Provider>,
    // tax id -> provider id
    provider_tax_ids: DashMap<String, i64>,
    clients: DashMap<i64, Client>,
    // tax id -> client id
    client_tax_ids: DashMap<String, i64>,
    contracts: DashMap<i64, Contract>,
    grants: DashMap<i64, TokenGrant>,
    // token -> grant id
    grant_tokens: DashMap<String, i64>,
    requests: DashMap<i64, StaffingRequest>,

    identity_seq: Sequence,
    profile_seq: Sequence,
    provider_seq: Sequence,
    client_seq: Sequence,
    grant_seq: Sequence,
    request_seq: Sequence,
}

/// In-memory implementation of the Repository port for tests and runs
/// without a database.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Tables>,
}

impl InMemoryRepository {
    fn upsert_provider(&self, upsert: ProviderUpsert) -> Provider {
        let tables = &self.tables;
        let id = *tables
            .provider_tax_ids
            .entry(upsert.tax_id.clone())
            .or_insert_with(|| tables.provider_seq.next());
        let provider = Provider {
            id,
            name: upsert.name,
            tax_id: upsert.tax_id,
            email: upsert.email,
            system_url: upsert.system_url,
        };
        tables.providers.insert(id, provider.clone());
        provider
    }

    fn upsert_client(&self, upsert: ClientUpsert) -> Client {
        let tables = &self.tables;
        let id = *tables
            .client_tax_ids
            .entry(upsert.tax_id.clone())
            .or_insert_with(|| tables.client_seq.next());
        let client = Client {
            id,
            name: upsert.name,
            tax_id: upsert.tax_id,
            email: upsert.email,
            phone: upsert.phone,
        };
        tables.clients.insert(id, client.clone());
        client
    }

    fn upsert_contract(&self, contract_id: i64, client_id: i64, provider_id: i64) {
        self.tables
            .contracts
            .entry(contract_id)
            .and_modify(|contract| {
                contract.client_id = client_id;
                contract.provider_id = provider_id;
            })
            .or_insert_with(|| Contract {
                id: contract_id,
                number: contract_id.to_string(),
                client_id,
                provider_id,
            });
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, CoreError> {
        let Some(id) = self.tables.identity_emails.get(email).map(|entry| *entry) else {
            return Ok(None);
        };
        Ok(self.tables.identities.get(&id).map(|entry| entry.clone()))
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, CoreError> {
        let tables = &self.tables;
        let identity_id = match tables.identity_emails.entry(account.email.clone()) {
            Entry::Occupied(_) => {
                return Err(CoreError::AlreadyExists(format!(
                    "identity with email {}",
                    account.email
                )));
            }
            Entry::Vacant(slot) => {
                let id = tables.identity_seq.next();
                slot.insert(id);
                id
            }
        };

        let identity = Identity {
            id: identity_id,
            username: account.email.clone(),
            email: account.email,
            password_hash: account.password_hash,
            created_at: Utc::now(),
        };
        let profile = Profile {
            id: tables.profile_seq.next(),
            identity_id,
            full_name: account.full_name,
        };
        tables.identities.insert(identity_id, identity.clone());
        tables.profiles.insert(profile.id, profile.clone());

        Ok(Account { identity, profile })
    }

    async fn delete_identity(&self, identity_id: i64) -> Result<(), CoreError> {
        let tables = &self.tables;
        if let Some((_, identity)) = tables.identities.remove(&identity_id) {
            tables.identity_emails.remove(&identity.email);
        }

        let profile_ids: Vec<i64> = tables
            .profiles
            .iter()
            .filter(|entry| entry.identity_id == identity_id)
            .map(|entry| entry.id)
            .collect();
        for profile_id in profile_ids {
            tables.profiles.remove(&profile_id);
            // record_redemption locks grant_tokens before grants, so the
            // token index is only touched once retain has returned.
            let mut released_tokens = Vec::new();
            tables.grants.retain(|_, grant| {
                if grant.profile_id == profile_id {
                    released_tokens.push(grant.token.clone());
                    false
                } else {
                    true
                }
            });
            for token in released_tokens {
                tables.grant_tokens.remove(&token);
            }
            tables
                .requests
                .retain(|_, request| request.requester_profile_id != profile_id);
        }
        Ok(())
    }

    async fn find_profile_by_identity(
        &self,
        identity_id: i64,
    ) -> Result<Option<Profile>, CoreError> {
        Ok(self
            .tables
            .profiles
            .iter()
            .find(|entry| entry.identity_id == identity_id)
            .map(|entry| entry.clone()))
    }

    async fn find_provider_by_tax_id(&self, tax_id: &str) -> Result<Option<Provider>, CoreError> {
        let Some(id) = self.tables.provider_tax_ids.get(tax_id).map(|entry| *entry) else {
            return Ok(None);
        };
        Ok(self.tables.providers.get(&id).map(|entry| entry.clone()))
    }

    async fn find_client_by_tax_id(&self, tax_id: &str) -> Result<Option<Client>, CoreError> {
        let Some(id) = self.tables.client_tax_ids.get(tax_id).map(|entry| *entry) else {
            return Ok(None);
        };
        Ok(self.tables.clients.get(&id).map(|entry| entry.clone()))
    }

    async fn find_contract(&self, contract_id: i64) -> Result<Option<Contract>, CoreError> {
        Ok(self
            .tables
            .contracts
            .get(&contract_id)
            .map(|entry| entry.clone()))
    }

    async fn record_redemption(&self, redemption: Redemption) -> Result<TokenGrant, CoreError> {
        let tables = &self.tables;
        if !tables.profiles.contains_key(&redemption.profile_id) {
            return Err(CoreError::NotFound(format!(
                "profile {}",
                redemption.profile_id
            )));
        }

        // Nothing is written unless the token slot is free.
        let slot = match tables.grant_tokens.entry(redemption.token.clone()) {
            Entry::Occupied(_) => {
                return Err(CoreError::AlreadyExists(format!(
                    "token grant {}",
                    redemption.token
                )));
            }
            Entry::Vacant(slot) => slot,
        };

        let provider = self.upsert_provider(redemption.provider);
        let client = self.upsert_client(redemption.client);
        self.upsert_contract(redemption.contract_id, client.id, provider.id);

        let grant = TokenGrant {
            id: tables.grant_seq.next(),
            profile_id: redemption.profile_id,
            token: redemption.token,
            client_email: redemption.client_email,
            provider_id: Some(provider.id),
            contract_id: redemption.contract_id,
            used: true,
            created_at: Utc::now(),
        };
        tables.grants.insert(grant.id, grant.clone());
        slot.insert(grant.id);

        Ok(grant)
    }

    async fn grants_for_profile(&self, profile_id: i64) -> Result<Vec<TokenGrant>, CoreError> {
        let mut grants: Vec<TokenGrant> = self
            .tables
            .grants
            .iter()
            .filter(|entry| entry.profile_id == profile_id)
            .map(|entry| entry.clone())
            .collect();
        grants.sort_by_key(|grant| (grant.created_at, grant.id));
        Ok(grants)
    }

    async fn insert_request(
        &self,
        request: NewStaffingRequest,
    ) -> Result<StaffingRequest, CoreError> {
        let tables = &self.tables;
        if !tables.clients.contains_key(&request.client_id) {
            return Err(CoreError::NotFound(format!("client {}", request.client_id)));
        }
        if !tables.providers.contains_key(&request.provider_id) {
            return Err(CoreError::NotFound(format!(
                "provider {}",
                request.provider_id
            )));
        }
        if !tables.contracts.contains_key(&request.contract_id) {
            return Err(CoreError::NotFound(format!(
                "contract {}",
                request.contract_id
            )));
        }
        if !tables.profiles.contains_key(&request.requester_profile_id) {
            return Err(CoreError::NotFound(format!(
                "profile {}",
                request.requester_profile_id
            )));
        }

        let stored = StaffingRequest {
            id: tables.request_seq.next(),
            client_id: request.client_id,
            provider_id: request.provider_id,
            contract_id: request.contract_id,
            requester_profile_id: request.requester_profile_id,
            created_at: Utc::now(),
            professional_type: request.professional_type,
            shift: request.shift,
            notes: request.notes,
        };
        tables.requests.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn requests_for_providers(
        &self,
        provider_ids: &[i64],
    ) -> Result<Vec<RequestSummary>, CoreError> {
        let tables = &self.tables;
        let mut summaries: Vec<RequestSummary> = tables
            .requests
            .iter()
            .filter(|entry| provider_ids.contains(&entry.provider_id))
            .map(|entry| {
                let request = entry.value().clone();
                let client_name = tables
                    .clients
                    .get(&request.client_id)
                    .map(|client| client.name.clone())
                    .unwrap_or_default();
                let provider_name = tables
                    .providers
                    .get(&request.provider_id)
                    .map(|provider| provider.name.clone())
                    .unwrap_or_default();
                RequestSummary {
                    request,
                    client_name,
                    provider_name,
                }
            })
            .collect();
        summaries.sort_by(|a, b| {
            (b.request.created_at, b.request.id).cmp(&(a.request.created_at, a.request.id))
        });
        Ok(summaries)
    }
}
