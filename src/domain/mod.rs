mod archive_id;
mod display;
mod types;

pub use archive_id::*;
pub use display::*;
pub use types::*;
