// Core primitives for DSV tokenizing

pub mod field;
pub mod newlines;
pub mod preamble;
pub mod scanner;

pub use field::*;
pub use newlines::*;
pub use preamble::*;
pub use scanner::*;
