pub mod api;
pub mod history;
pub mod users;

pub use api::{unwrap_envelope, TautulliHttpClient};
pub use history::{fetch_history, DEFAULT_PAGE_SIZE};
pub use users::{resolve_user, UserLookup};
