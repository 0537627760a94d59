pub mod array_ops;

pub use array_ops::{array_remove, array_union};
