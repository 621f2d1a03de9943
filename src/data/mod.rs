//! Dataset acquisition, cleaning, splitting and summary statistics

pub mod preparation;
pub mod split;
pub mod summary;

pub use preparation::{clean_records, parse_raw, DataPreparer};
pub use split::{stratified_split, DatasetSplit};
pub use summary::{summarize, DatasetSummary};
