pub mod session {

    /// Session key holding the logged-in user's id
    pub const USER_ID: &str = "user_id";

    /// Session key holding pending flash messages
    pub const FLASH: &str = "flash";
}

pub mod routes {

    pub const CATALOG: &str = "/";

    pub const LOGIN: &str = "/login";

    /// Where a successful login lands when no `next` target was given
    pub const AFTER_LOGIN: &str = "/add_gift";
}

pub mod intervals {
    use std::time::Duration;

    pub const EXPIRED_SESSION_SWEEP: Duration = Duration::from_secs(60 * 60);
}
