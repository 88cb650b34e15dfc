pub mod session {
    /// Key under which the signed-in account snapshot is stored.
    pub const USER_KEY: &str = "user";
}

pub mod limits {

    pub const MAX_USERNAME_LEN: usize = 30;

    pub const MAX_KEYWORD_LEN: usize = 50;

    /// Compare-and-set retries before a lockout update gives up.
    pub const LOCKOUT_CAS_RETRIES: usize = 8;
}

pub mod bootstrap {

    pub const ADMIN_USERNAME: &str = "admin";
}
