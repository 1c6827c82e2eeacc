// Core modules implementing the embedded-block rewrite and error modeling.
pub mod error;
pub mod rewrite;
pub mod scan;
