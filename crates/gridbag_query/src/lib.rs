//! # gridbag_query - Item Query Engine
//!
//! Read-only, predicate-based search over one or many containers.
//!
//! - Composable filters: tags (hierarchical), tag sets, definition, count,
//!   kind, tag values, and `and` / `or` / `not`
//! - Scopes: one container, a list, a container with everything nested in it,
//!   or every container
//! - Orderings: position, tag priority, count, definition, insertion
//! - Results are snapshots; iterating them never touches a container
//! - Registered queries stay current from change notifications
//!
//! ```ignore
//! use gridbag_query::prelude::*;
//!
//! let have = ItemQuery::recursive(backpack)
//!     .filter(ItemFilter::tag("Item.Type.Ammo"))
//!     .count(&store);
//! ```

pub mod filter;
pub mod manager;
pub mod query;
pub mod results;
pub mod source;

pub use filter::{ItemFilter, KindFilter};
pub use manager::QueryManager;
pub use query::{ItemQuery, QueryOrder, QueryScope};
pub use results::QueryResults;
pub use source::ItemSource;

pub mod prelude {
    pub use crate::filter::{ItemFilter, KindFilter};
    pub use crate::manager::QueryManager;
    pub use crate::query::{ItemQuery, QueryOrder, QueryScope};
    pub use crate::results::QueryResults;
    pub use crate::source::ItemSource;
}
