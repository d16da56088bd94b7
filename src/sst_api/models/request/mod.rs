pub mod control_request;
pub mod login_request;
