pub mod todos;

pub use todos::{Todo, UNSAVED_ROWID};
