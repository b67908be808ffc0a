//! Interactive paginated panels: a page list or page source bound to one chat message whose
//! controls drive navigation, locking and domain actions.

pub mod error;
pub mod grid;
pub mod handler;
pub mod lock;
pub mod page_source;
pub mod pagination;
pub mod registry;
pub mod review;
pub mod session;
pub mod transport;

pub use error::{PanelError, PanelResult};
pub use grid::{group_rows, ControlGrid, ROW_CAPACITY, ROW_COUNT};
pub use handler::{EventOutcome, Flow, LockHandler, NavigationHandler, Panel, PanelHandler};
pub use lock::PanelLock;
pub use page_source::{PageSource, Pages};
pub use pagination::{next_page, NavAction, Pagination};
pub use registry::PanelRegistry;
pub use session::{PanelOptions, PanelSession, Redraw, SessionState};
pub use transport::{MessageTransport, MissingTransport};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
