pub mod account;
pub mod company;
pub mod grant;
pub mod scheduling;
pub mod staffing_request;
