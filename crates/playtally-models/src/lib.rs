pub mod media;
pub mod play_event;
pub mod summary;

pub use media::{ExportKind, MediaKind, DEFAULT_PAGE_SIZE, DEFAULT_WATCHED_THRESHOLD};
pub use play_event::PlayEvent;
pub use summary::{MovieSummary, ShowSummary};
