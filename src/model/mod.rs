pub mod config;
pub mod record;
pub mod settings;
pub mod task;
pub mod tree;

pub use config::*;
pub use record::*;
pub use settings::*;
pub use task::*;
pub use tree::*;
