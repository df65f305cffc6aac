//! MCP resources: one JSON schema document per table.

pub mod locator;

pub use locator::{
    ListResourcesOutput, ReadResourceOutput, ResourceContent, ResourceDescriptor,
    ResourceLocator, ResourceOrigin,
};
