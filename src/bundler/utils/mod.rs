//! Filesystem and archive helpers shared by the pipeline and the coordinator.

pub mod archive;
pub mod fs;
