pub mod recommendations;

pub use recommendations::recommend_courses;
