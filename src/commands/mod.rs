pub mod nodes;
pub mod report;
