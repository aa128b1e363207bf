mod node;
mod builder;
mod summarize;
mod partition;

pub use node::*;
pub use builder::*;
pub use summarize::*;
pub use partition::*;

#[cfg(test)]
mod summarize_tests;
#[cfg(test)]
mod partition_tests;
