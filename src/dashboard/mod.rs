pub mod options;
pub mod registry;
