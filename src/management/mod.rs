mod auth;
mod session;
mod storage;

pub use auth::ACCESS_TOKEN_KEY;
pub use auth::CODE_VERIFIER_KEY;
pub use auth::REFRESH_TOKEN_KEY;
pub use auth::TOKEN_EXPIRATION_KEY;
pub use auth::TokenStore;
pub use session::AuthSession;
pub use session::SessionState;
pub use storage::FileStorage;
pub use storage::MemoryStorage;
pub use storage::Storage;
pub use storage::StorageEvent;
