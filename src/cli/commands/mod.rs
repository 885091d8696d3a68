mod gifts;
mod init;

pub use gifts::cmd_list_gifts;
pub use init::cmd_init;
