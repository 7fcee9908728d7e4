//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod credential_repo;
pub mod session_repo;
pub mod user_repo;
pub mod website_chat_repo;
pub mod website_repo;

pub use credential_repo::CredentialRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
pub use website_chat_repo::WebsiteChatRepo;
pub use website_repo::WebsiteRepo;
