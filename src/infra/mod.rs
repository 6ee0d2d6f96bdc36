mod history;
mod library;
mod settings;

pub use history::*;
pub use library::*;
pub use settings::*;
