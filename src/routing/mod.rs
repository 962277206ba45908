//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (RequestRouter)
//!         → path.rs (candidate content locations)
//!         → ContentProbe (first existing candidate wins)
//!         → redirect.rs (ordered rule match, capture substitution)
//!     → Return: RewriteToRenderer | Redirect | PassThrough
//!
//! Editor launch (renderer page data):
//!     jshcms_url → origin.rs (allow-list check) → launcher script URL
//! ```
//!
//! # Design Decisions
//! - Engine compiled from config, immutable at runtime
//! - Deterministic: same input always produces the same decision
//! - First match wins (listing order)
//! - Content always takes precedence over redirects

pub mod origin;
pub mod path;
pub mod redirect;
pub mod router;

pub use origin::OriginValidator;
pub use path::PathResolver;
pub use redirect::{Disposal, MatchType, RedirectMatcher, RedirectRule, ResolvedRedirect};
pub use router::{RequestRouter, RoutingDecision};
