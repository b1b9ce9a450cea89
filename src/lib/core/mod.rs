pub mod error;
pub mod todo;
pub mod service;

pub use error::*;
pub use todo::*;
pub use service::*;
