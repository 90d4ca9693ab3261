//! State module for tracking a crawl run
//!
//! # Components
//!
//! - `CrawlState`: page cursor, article count and the termination bookkeeping of the pagination loop
//! - `StopReason`: why the pagination loop ended
//! - `SeenSet`: URLs already accepted during this run
//! - `CancelFlag`: one-shot cancellation signal shared with the controller

mod cancel;
mod crawl_state;
mod seen_set;
mod stop_reason;

// Re-export main types
pub use cancel::CancelFlag;
pub use crawl_state::CrawlState;
pub use seen_set::SeenSet;
pub use stop_reason::StopReason;
