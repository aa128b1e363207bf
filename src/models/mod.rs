mod vector;
mod body;
mod plummer;

pub use vector::*;
pub use body::*;
pub use plummer::*;

#[cfg(test)]
mod vector_tests;
