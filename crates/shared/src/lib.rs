pub mod change;
pub mod domain;
pub mod error;
pub mod protocol;
