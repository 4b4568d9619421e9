pub mod metrics_defs;

// Re-exported so the macros below resolve regardless of the caller's imports.
pub use metrics;
