#![forbid(unsafe_code)]

mod dependencies;
mod nodes;

pub use dependencies::*;
pub use nodes::*;
