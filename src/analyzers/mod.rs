pub mod commit_classifier;
pub mod developers;
pub mod features;
pub mod risk;
pub mod tech_stack;
