pub use super::keyword_records::Entity as KeywordRecords;
pub use super::users::Entity as Users;
