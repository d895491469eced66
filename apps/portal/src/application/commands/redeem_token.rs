use core_lib::{
    Command, CommandHandler, CoreError, Repository, SchedulingApi, domain::grant::TokenGrant,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RedeemToken {
    pub profile_id: i64,
    pub token: String,
}

impl Command for RedeemToken {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedemptionOutcome {
    Redeemed(TokenGrant),
    /// Token unknown, expired, already used, or the scheduling service
    /// could not be reached.
    Rejected,
}

/// Validates a token with the scheduling service, consumes it, then records
/// the provider, client, contract and grant locally.
///
/// A token consumed remotely but not recorded locally is not compensated.
pub struct RedeemTokenHandler {
    repository: Arc<dyn Repository>,
    scheduling: Arc<dyn SchedulingApi>,
    system_url: String,
}

impl RedeemTokenHandler {
    pub fn new(
        repository: Arc<dyn Repository>,
        scheduling: Arc<dyn SchedulingApi>,
        system_url: String,
    ) -> Self {
        Self {
            repository,
            scheduling,
            system_url,
        }
    }
}

impl CommandHandler<RedeemToken> for RedeemTokenHandler {
    type Output = RedemptionOutcome;

    async fn handle(&self, command: RedeemToken) -> Result<RedemptionOutcome, CoreError> {
        let token = command.token.trim();

        let Some(validation) = self.scheduling.validate_token(token).await else {
            info!("Token rejected by scheduling service");
            return Ok(RedemptionOutcome::Rejected);
        };

        if !self.scheduling.consume_token(token).await {
            warn!("Scheduling service did not accept token consumption");
            return Ok(RedemptionOutcome::Rejected);
        }

        let redemption = validation.into_redemption(command.profile_id, token, &self.system_url);
        match self.repository.record_redemption(redemption).await {
            Ok(grant) => {
                info!(
                    "Token redeemed for profile {} (contract {})",
                    grant.profile_id, grant.contract_id
                );
                Ok(RedemptionOutcome::Redeemed(grant))
            }
            Err(CoreError::AlreadyExists(detail)) => {
                warn!("Token already recorded locally: {}", detail);
                Ok(RedemptionOutcome::Rejected)
            }
            Err(e) => Err(e),
        }
    }
}
