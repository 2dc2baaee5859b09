//! Runtime module — process lifecycle: boot, then stream stdin through the pipeline.

pub mod boot;
pub mod run;
