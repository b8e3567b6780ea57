//! Schema versioning and compatibility.

/// Current schema version for all JSON outputs.
///
/// Follows semver: MAJOR.MINOR.PATCH
/// - MAJOR: Breaking changes (field removals, type changes)
/// - MINOR: Additive changes (new optional fields)
/// - PATCH: Bug fixes, documentation
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Check if a schema version is compatible with current.
pub fn is_compatible(version: &str) -> bool {
    let major = |v: &str| {
        v.split('.')
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0)
    };
    major(SCHEMA_VERSION) == major(version)
}
