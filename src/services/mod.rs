pub mod broadcaster;
pub mod form_filler;
pub mod journal;
pub mod row_extractor;
pub mod status_writer;

pub use broadcaster::StatusBroadcaster;
pub use form_filler::FormFiller;
pub use journal::RunJournal;
pub use row_extractor::{extract_work_items, Extraction};
pub use status_writer::StatusWriter;
