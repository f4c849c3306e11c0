pub mod command;
pub mod slice;
