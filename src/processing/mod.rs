/*! Release processing

From a date to matches:

- [scheduler] spreads jobs (one per date) over a pool of workers,
- [search] runs a job: resolve the release, acquire it, search it,
- [acquire] downloads and extracts the payloads of a release concurrently,
- [extract] unzips and decompresses a single payload.
!*/
pub mod acquire;
pub mod extract;
pub mod job;
pub mod scheduler;
pub mod search;

pub use acquire::{Acquisition, DownloadJob};
pub use extract::Extractor;
pub use job::{ArchiveJob, JobDate, ProcessResult, ProcessSummary, Status};
pub use scheduler::{Report, Scheduler};
pub use search::Searcher;
