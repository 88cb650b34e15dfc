mod accounts;

pub use accounts::{cmd_reset_password, cmd_unlock};
