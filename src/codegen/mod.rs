mod engine;
mod vm_writer;

pub use engine::*;
pub use vm_writer::*;
