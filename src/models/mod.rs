pub mod message;
pub mod run_state;
pub mod table;
pub mod work_item;

pub use message::{Message, RowsResponse, StatusResponse};
pub use run_state::{RunState, RunStatus, StateSnapshot};
pub use table::{RenderedRow, TableSnapshot};
pub use work_item::WorkItem;
