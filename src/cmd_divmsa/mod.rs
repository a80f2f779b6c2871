pub mod chunks;
pub mod decompose;
pub mod filter;
pub mod merge;
pub mod run;
pub mod size;
pub mod split;
