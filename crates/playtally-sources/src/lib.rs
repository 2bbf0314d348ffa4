pub mod traits;
pub mod tautulli;
pub mod error;

pub use traits::TautulliApi;
pub use tautulli::{fetch_history, resolve_user, TautulliHttpClient, UserLookup, DEFAULT_PAGE_SIZE};
pub use error::SourceError;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
