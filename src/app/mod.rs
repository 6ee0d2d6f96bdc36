mod controller;
mod gateways;
mod progress;
mod session;

pub use controller::*;
pub use gateways::*;
pub use progress::*;
pub use session::*;
