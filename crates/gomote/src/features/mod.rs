pub mod builder_catalog;
pub mod groups;
pub mod instance_creation;
pub mod instance_setup;
pub mod legacy_creation;
