pub mod hash_password;
pub mod initdb;
pub mod serve;

pub use hash_password::hash_password;
pub use initdb::init_database;
pub use serve::serve;
