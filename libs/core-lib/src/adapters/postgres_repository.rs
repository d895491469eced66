use crate::{
    CoreError, Repository,
    domain::{
        account::{Account, Identity, NewAccount, Profile},
        company::{Client, Contract, Provider},
        grant::{Redemption, TokenGrant},
        staffing_request::{NewStaffingRequest, RequestSummary, StaffingRequest},
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, migrate::Migrator};

/// Schema migrations, embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(sqlx::FromRow, Debug)]
struct IdentityRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        Identity {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow, Debug)]
struct ProfileRow {
    id: i64,
    identity_id: i64,
    full_name: String,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            identity_id: row.identity_id,
            full_name: row.full_name,
        }
    }
}

#[derive(sqlx::FromRow, Debug)]
struct ProviderRow {
    id: i64,
    name: String,
    tax_id: String,
    email: String,
    system_url: String,
}

impl From<ProviderRow> for Provider {
    fn from(row: ProviderRow) -> Self {
        Provider {
            id: row.id,
            name: row.name,
            tax_id: row.tax_id,
            email: row.email,
            system_url: row.system_url,
        }
    }
}

#[derive(sqlx::FromRow, Debug)]
struct ClientRow {
    id: i64,
    name: String,
    tax_id: String,
    email: String,
    phone: String,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            name: row.name,
            tax_id: row.tax_id,
            email: row.email,
            phone: row.phone,
        }
    }
}

#[derive(sqlx::FromRow, Debug)]
struct ContractRow {
    id: i64,
    number: String,
    client_id: i64,
    provider_id: i64,
}

#[derive(sqlx::FromRow, Debug)]
struct GrantRow {
    id: i64,
    profile_id: i64,
    token: String,
    client_email: String,
    provider_id: Option<i64>,
    contract_id: i64,
    used: bool,
    created_at: DateTime<Utc>,
}

impl From<GrantRow> for TokenGrant {
    fn from(row: GrantRow) -> Self {
        TokenGrant {
            id: row.id,
            profile_id: row.profile_id,
            token: row.token,
            client_email: row.client_email,
            provider_id: row.provider_id,
            contract_id: row.contract_id,
            used: row.used,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow, Debug)]
struct RequestRow {
    id: i64,
    client_id: i64,
    provider_id: i64,
    contract_id: i64,
    requester_profile_id: i64,
    created_at: DateTime<Utc>,
    professional_type: String,
    shift: String,
    notes: String,
}

impl From<RequestRow> for StaffingRequest {
    fn from(row: RequestRow) -> Self {
        StaffingRequest {
            id: row.id,
            client_id: row.client_id,
            provider_id: row.provider_id,
            contract_id: row.contract_id,
            requester_profile_id: row.requester_profile_id,
            created_at: row.created_at,
            professional_type: row.professional_type,
            shift: row.shift,
            notes: row.notes,
        }
    }
}

#[derive(sqlx::FromRow, Debug)]
struct RequestSummaryRow {
    #[sqlx(flatten)]
    request: RequestRow,
    client_name: String,
    provider_name: String,
}

/// PostgreSQL implementation of the Repository port using sqlx.
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, CoreError> {
        let row: Option<IdentityRow> = sqlx::query_as(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM identities
            WHERE username = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Identity::from))
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, CoreError> {
        let mut tx = self.pool.begin().await?;

        let identity: IdentityRow = sqlx::query_as(
            r#"
            INSERT INTO identities (username, email, password_hash)
            VALUES ($1, $1, $2)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(&account.email)
        .bind(&account.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let profile: ProfileRow = sqlx::query_as(
            r#"
            INSERT INTO profiles (identity_id, full_name)
            VALUES ($1, $2)
            RETURNING id, identity_id, full_name
            "#,
        )
        .bind(identity.id)
        .bind(&account.full_name)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Account {
            identity: identity.into(),
            profile: profile.into(),
        })
    }

    async fn delete_identity(&self, identity_id: i64) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM identities WHERE id = $1")
            .bind(identity_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_profile_by_identity(
        &self,
        identity_id: i64,
    ) -> Result<Option<Profile>, CoreError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            "SELECT id, identity_id, full_name FROM profiles WHERE identity_id = $1",
        )
        .bind(identity_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Profile::from))
    }

    async fn find_provider_by_tax_id(&self, tax_id: &str) -> Result<Option<Provider>, CoreError> {
        let row: Option<ProviderRow> = sqlx::query_as(
            "SELECT id, name, tax_id, email, system_url FROM providers WHERE tax_id = $1",
        )
        .bind(tax_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Provider::from))
    }

    async fn find_client_by_tax_id(&self, tax_id: &str) -> Result<Option<Client>, CoreError> {
        let row: Option<ClientRow> = sqlx::query_as(
            "SELECT id, name, tax_id, email, phone FROM clients WHERE tax_id = $1",
        )
        .bind(tax_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Client::from))
    }

    async fn find_contract(&self, contract_id: i64) -> Result<Option<Contract>, CoreError> {
        let row: Option<ContractRow> = sqlx::query_as(
            "SELECT id, number, client_id, provider_id FROM contracts WHERE id = $1",
        )
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| Contract {
            id: row.id,
            number: row.number,
            client_id: row.client_id,
            provider_id: row.provider_id,
        }))
    }

    /// Runs all local writes of a redemption in one transaction. A duplicate
    /// token rolls back the company upserts as well.
    async fn record_redemption(&self, redemption: Redemption) -> Result<TokenGrant, CoreError> {
        let mut tx = self.pool.begin().await?;

        let provider: ProviderRow = sqlx::query_as(
            r#"
            INSERT INTO providers (tax_id, name, email, system_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tax_id) DO UPDATE
            SET name = EXCLUDED.name, email = EXCLUDED.email, system_url = EXCLUDED.system_url
            RETURNING id, name, tax_id, email, system_url
            "#,
        )
        .bind(&redemption.provider.tax_id)
        .bind(&redemption.provider.name)
        .bind(&redemption.provider.email)
        .bind(&redemption.provider.system_url)
        .fetch_one(&mut *tx)
        .await?;

        let client: ClientRow = sqlx::query_as(
            r#"
            INSERT INTO clients (tax_id, name, email, phone)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tax_id) DO UPDATE
            SET name = EXCLUDED.name, email = EXCLUDED.email, phone = EXCLUDED.phone
            RETURNING id, name, tax_id, email, phone
            "#,
        )
        .bind(&redemption.client.tax_id)
        .bind(&redemption.client.name)
        .bind(&redemption.client.email)
        .bind(&redemption.client.phone)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO contracts (id, number, client_id, provider_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET client_id = EXCLUDED.client_id, provider_id = EXCLUDED.provider_id
            "#,
        )
        .bind(redemption.contract_id)
        .bind(redemption.contract_id.to_string())
        .bind(client.id)
        .bind(provider.id)
        .execute(&mut *tx)
        .await?;

        let grant: GrantRow = sqlx::query_as(
            r#"
            INSERT INTO token_grants (profile_id, token, client_email, provider_id, contract_id, used)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING id, profile_id, token, client_email, provider_id, contract_id, used, created_at
            "#,
        )
        .bind(redemption.profile_id)
        .bind(&redemption.token)
        .bind(&redemption.client_email)
        .bind(provider.id)
        .bind(redemption.contract_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(grant.into())
    }

    async fn grants_for_profile(&self, profile_id: i64) -> Result<Vec<TokenGrant>, CoreError> {
        let rows: Vec<GrantRow> = sqlx::query_as(
            r#"
            SELECT id, profile_id, token, client_email, provider_id, contract_id, used, created_at
            FROM token_grants
            WHERE profile_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TokenGrant::from).collect())
    }

    async fn insert_request(
        &self,
        request: NewStaffingRequest,
    ) -> Result<StaffingRequest, CoreError> {
        let row: RequestRow = sqlx::query_as(
            r#"
            INSERT INTO staffing_requests
                (client_id, provider_id, contract_id, requester_profile_id, professional_type, shift, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, client_id, provider_id, contract_id, requester_profile_id,
                      created_at, professional_type, shift, notes
            "#,
        )
        .bind(request.client_id)
        .bind(request.provider_id)
        .bind(request.contract_id)
        .bind(request.requester_profile_id)
        .bind(&request.professional_type)
        .bind(&request.shift)
        .bind(&request.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn requests_for_providers(
        &self,
        provider_ids: &[i64],
    ) -> Result<Vec<RequestSummary>, CoreError> {
        if provider_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<RequestSummaryRow> = sqlx::query_as(
            r#"
            SELECT r.id, r.client_id, r.provider_id, r.contract_id, r.requester_profile_id,
                   r.created_at, r.professional_type, r.shift, r.notes,
                   c.name AS client_name, p.name AS provider_name
            FROM staffing_requests r
            JOIN clients c ON c.id = r.client_id
            JOIN providers p ON p.id = r.provider_id
            WHERE r.provider_id = ANY($1)
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .bind(provider_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| RequestSummary {
                request: row.request.into(),
                client_name: row.client_name,
                provider_name: row.provider_name,
            })
            .collect())
    }
}
