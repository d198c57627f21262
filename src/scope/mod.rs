//! Scope Graph Builder
//!
//! Turns one file's flat definition captures into scope nodes plus the
//! Encapsulation/Ownership edges that encode lexical nesting.

pub mod builder;

pub use builder::build_file_scopes;
