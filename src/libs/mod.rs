pub mod alignment;
pub mod chunks;
pub mod config;
pub mod decomposition;
pub mod error;
pub mod extended;
pub mod io;
pub mod jobs;
pub mod long_branch;
pub mod merge;
pub mod phylo;
pub mod pipeline;
pub mod sizer;
pub mod splitter;
pub mod tools;
