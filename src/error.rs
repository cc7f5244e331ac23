//! Error taxonomy.
//!
//! Resolution and registration errors abort a load. Cache errors never do:
//! the load path logs them and falls back to resolving from the source.
//! Matching has no error type at all.

use thiserror::Error;

/// Failure while inserting a device into a [`KnowledgeBase`](crate::KnowledgeBase).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("device '{device}' references unregistered parent '{parent}'")]
    UnregisteredParent { device: String, parent: String },

    #[error("device '{0}' is already registered")]
    Duplicate(String),

    #[error("cannot register '{0}': knowledge base has been compacted")]
    Compacted(String),
}

/// Failure while resolving device records into a knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("record #{position} has an empty device id")]
    EmptyId { position: usize },

    #[error("device id '{0}' appears more than once in the source")]
    DuplicateId(String),

    #[error("device '{device}' falls back to '{parent}', which is not in the source")]
    MissingParent { device: String, parent: String },

    #[error("cyclic fall back chain: {}", cycle.join(" -> "))]
    CyclicParent { cycle: Vec<String> },

    #[error(transparent)]
    Register(#[from] RegisterError),
}

/// Failure while reading or writing a cache snapshot.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache encode error: {0}")]
    Encode(bincode::Error),

    #[error("cache decode error: {0}")]
    Decode(bincode::Error),

    #[error("cache format {found} does not match expected format {expected}")]
    Version { found: u32, expected: u32 },

    #[error("cache holds {found} devices, need more than {min}")]
    TooSmall { found: usize, min: usize },

    #[error("cache was built with groups [{}], requested [{}]", found.join(","), expected.join(","))]
    Groups { found: Vec<String>, expected: Vec<String> },

    #[error("cache snapshot is inconsistent: {0}")]
    Inconsistent(#[from] RegisterError),
}

/// Failure while decoding device records from a source document.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read device source: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed device XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: &'static str, attribute: &'static str },
}

/// Top-level error returned by [`Repository`](crate::Repository) constructors.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("generic device '{0}' is not in the knowledge base; matching would not be total")]
    MissingGeneric(String),
}
