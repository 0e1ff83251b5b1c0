pub mod id;
pub mod loader;
pub mod model;

pub use id::{QuestionId, Stage};
pub use loader::{LoadError, load_from_slice, load_from_str};
pub use model::TestDocument;
