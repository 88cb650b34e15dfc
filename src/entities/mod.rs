pub mod prelude;

pub mod keyword_records;
pub mod users;
