pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService};
pub use auth_service_impl::SeaOrmAuthService;

pub mod account_service;
pub mod account_service_impl;
pub use account_service::{AccountError, AccountService};
pub use account_service_impl::SeaOrmAccountService;

pub mod keyword_service;
pub mod keyword_service_impl;
pub use keyword_service::{KeywordError, KeywordRecordInput, KeywordService, KeywordsInput};
pub use keyword_service_impl::SeaOrmKeywordService;

pub mod dispatcher;
pub use dispatcher::{DispatchOutcome, KeywordDispatcher, ReplySender};
