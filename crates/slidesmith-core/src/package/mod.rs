pub mod content_types;
pub mod ooxml;
pub mod parts;
pub mod relationships;
pub mod uri;

pub use content_types::{content_type_values, ContentTypes};
pub use ooxml::{write_atomic, Package};
pub use parts::{Part, PartPayload};
pub use relationships::{relationship_types, Relationship, Relationships, TargetMode};
