pub mod add_token;
pub mod login;
pub mod redeem_token;
pub mod register_account;
pub mod submit_request;

pub use redeem_token::{RedeemTokenHandler, RedemptionOutcome};
pub use register_account::{RegisterAccountHandler, RegistrationOutcome};
pub use submit_request::SubmitRequestHandler;
