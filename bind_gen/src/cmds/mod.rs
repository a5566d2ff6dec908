pub mod common;
pub mod layout;
pub mod render;
