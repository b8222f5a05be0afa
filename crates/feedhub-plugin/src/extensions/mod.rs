//! UI extension points.

pub mod registry;
pub mod renderer;

pub use registry::{
    ExtensionFilter, ExtensionMetadata, ExtensionOptions, ExtensionRegistration,
    ExtensionRegistry,
};
pub use renderer::{
    ExtensionPointRenderer, RenderFailure, RenderOutput, RenderRequest, RenderedExtension,
};
