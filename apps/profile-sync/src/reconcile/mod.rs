//! Profile reconciliation: matching, diff planning, validation, execution.

pub mod executor;
pub mod matcher;
pub mod planner;
pub mod sections;
pub mod validation;
