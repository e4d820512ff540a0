pub mod todo;

pub use todo::{TodoCollection, TodoEntity};
