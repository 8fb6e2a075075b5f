pub mod page;
pub mod record;

pub use page::{PageLink, ResultCell, ResultRow, ResultsPage};
pub use record::{select_record, DownloadOutcome, DownloadRequest, SearchRecord, SearchResults};
