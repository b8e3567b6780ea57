//! Parameter and user-property sanitizers.
//!
//! Both are total: malformed input shrinks the output, it never errors.

mod params;
mod user;

pub use params::{sanitize_params, ParamSet, DEFAULT_MAX_PARAMS, PAGEVIEW_MAX_PARAMS};
pub use user::{sanitize_user_properties, UserPropertySet, MAX_USER_PROP_VALUE_LEN};
