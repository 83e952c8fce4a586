//! File scaffolding for `create test` and `create function`

pub mod function;
pub mod runtime;
pub mod template;
pub mod test_file;

pub use function::{create_function, CreatedFunction};
pub use test_file::create_test;
