pub mod group;
pub mod pipeline;
pub mod project;
pub mod tree;
