pub mod action;
pub mod reproduction;
pub mod stats;
