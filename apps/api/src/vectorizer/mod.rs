// Student vector construction: academic base profile, subject
// personalization and soft-skill normalization into the shared 76d space.

pub mod similarity;
pub mod student;

pub use student::{StudentVector, StudentVectorizer, VectorError};
