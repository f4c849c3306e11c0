pub mod progress;
pub mod report;
mod slice_impl;

pub use slice_impl::cmd_slice;
