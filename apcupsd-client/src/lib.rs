pub mod domain;
pub mod nis;
pub mod status;

pub use nis::{NisClient, NisError};
pub use status::{parse_status_text, RawStatus};
