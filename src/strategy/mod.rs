// Strategies built on the field tokenizer

pub mod direct;
pub mod parallel;

pub use direct::*;
pub use parallel::*;
