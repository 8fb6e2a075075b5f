pub mod challenge;
pub mod download_detector;
pub mod result_parser;
pub mod session;
pub mod snapshot;

pub use challenge::{ChallengeSignal, ChannelSignal, ConsoleSignal};
pub use download_detector::{DownloadDetector, TriggerLocator};
pub use result_parser::{ResultParser, SkipReason};
pub use session::{SessionDriver, SessionState};
pub use snapshot::DirectorySnapshot;
