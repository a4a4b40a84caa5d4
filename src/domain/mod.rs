pub mod asset;
pub mod state;
pub mod trade;

pub use asset::*;
pub use state::*;
pub use trade::*;
