//! Review scheduling and card selection.
//!
//! Every function here is pure: it reads the cards it is given and either
//! returns derived data or, for grading, mutates the one card passed in.

pub mod filter;
pub mod grader;
pub mod interval;
pub mod recency;
pub mod selector;

pub use filter::{apply_filters, FilteredPool, SelectionRequest};
pub use grader::{grade, Outcome};
pub use interval::{capped_next_review_at, interval_days, next_review_at, MAX_INTERVAL_DAYS};
pub use recency::{partition, RecencyBucket, RecencyGroup, RecencyThresholds};
pub use selector::{arrange, prioritize, select_session, StudyOrder, SESSION_SIZE};
