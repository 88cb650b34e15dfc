pub mod account;
pub mod keyword;
