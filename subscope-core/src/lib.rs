pub mod config;
pub mod error;
pub mod themes;
pub mod types;

pub use config::*;
pub use error::*;
pub use themes::*;
pub use types::*;
