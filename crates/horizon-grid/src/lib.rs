//! Horizon Grid - a reactive in-memory table engine.
//!
//! The engine holds column definitions and row records for one open table
//! view, derives filtered, sorted, and paginated views on demand, and lets a
//! rendering layer read and mutate that state through explicit actions.
//! Drawing cells and headers is left to the host.
//!
//! - [`column`]: the column registry (order, visibility, width)
//! - [`row`]: the row store and template-driven row creation
//! - [`pipeline`]: the pure filter/sort/paginate derivation
//! - [`controller`]: gesture handling (resize, reorder, sort, new-row input)
//! - [`config`]: layered display configuration with change notification
//! - [`session`]: one open view tying everything together
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//! use horizon_grid::prelude::*;
//!
//! let mut session = TableSession::new(
//!     [
//!         ColumnDef::new("name"),
//!         ColumnDef::new("estimate").kind(ColumnKind::Number),
//!     ],
//!     [
//!         Row::new("a").with("name", "Write docs").with("estimate", 3),
//!         Row::new("b").with("name", "Fix bug").with("estimate", 1),
//!     ],
//!     ConfigStore::default(),
//!     TemplateRegistry::new(),
//! );
//!
//! session.toggle_sort("estimate", false);
//! assert_eq!(session.render().row_ids(), vec!["b", "a"]);
//!
//! // Widths are committed once the drag has been quiet for a while.
//! let now = Instant::now();
//! session.begin_resize("name");
//! session.resize_move("name", 40.0, now);
//! session.release_resize("name");
//! assert!(session.tick(now).is_empty());
//! assert_eq!(session.tick(now + RESIZE_COMMIT_DELAY).len(), 1);
//! ```

pub mod column;
pub mod config;
pub mod controller;
mod error;
pub mod pipeline;
pub mod prelude;
pub mod row;
pub mod session;
pub mod template;
pub mod value;

pub use error::{Result, TableError};
pub use horizon_grid_core::logging;
