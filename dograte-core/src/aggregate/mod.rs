//! MongoDB aggregation builders.
//!
//! [`stages`] returns one `$stage` document per function; [`pipelines`]
//! composes them into the queries the repositories run.

pub mod pipelines;
pub mod stages;
