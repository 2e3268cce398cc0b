pub mod render;
pub mod seed;
pub mod sql;
