pub mod billing;
pub mod checkout_gateway;
