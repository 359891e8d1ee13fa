pub mod catalog;
pub mod core;
pub mod document;
pub mod extract;
pub mod revision;
pub mod suggest;
pub mod trigger;

pub use catalog::*;
pub use self::core::*;
pub use document::*;
pub use extract::*;
pub use revision::*;
pub use suggest::*;
pub use trigger::*;
