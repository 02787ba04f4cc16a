//! Utility modules.

/// Keeps response bodies and request payloads short in logs.
pub mod log_sanitizer;
