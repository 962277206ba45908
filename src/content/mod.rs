//! Published content store collaborators.
//!
//! # Data Flow
//! ```text
//! candidate location → probe.rs (ContentProbe: HTTP or filesystem) → Found | NotFound
//! listing location   → listing.rs (RuleSource: HTTP or filesystem) → ordered rules
//! renderer request   → page.rs (page record + editor script)
//! ```
//!
//! # Design Decisions
//! - Transport sits behind traits so the router only sees outcomes
//! - Transport failures are reported, and the router degrades them

pub mod listing;
pub mod page;
pub mod probe;

pub use listing::{parse_listing, FsRuleSource, HttpRuleSource, RuleSource};
pub use page::{get_page, get_standalone, PageQuery, PageRecord};
pub use probe::{ContentProbe, FsContentProbe, HttpContentProbe, ProbeOutcome};
