//! Application state module

mod catalog;
mod forms;
mod report;
mod wizard;

pub use catalog::brsr_sections;
pub use forms::*;
pub use report::*;
pub use wizard::*;
