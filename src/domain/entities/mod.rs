pub mod account;
pub mod checkout_step;
pub mod invoice;
pub mod payment_method;
pub mod subscription;
