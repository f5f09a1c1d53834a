//! Package versions written into generated manifests

pub const NX_VERSION: &str = "16.5.1";
pub const TSLIB_VERSION: &str = "^2.3.0";
pub const SWC_NODE_VERSION: &str = "~1.4.2";
pub const SWC_CORE_VERSION: &str = "~1.3.51";
pub const SWC_HELPERS_VERSION: &str = "~0.5.0";
pub const JEST_VERSION: &str = "^29.4.1";
pub const TS_JEST_VERSION: &str = "^29.1.0";
pub const JEST_TYPES_VERSION: &str = "^29.4.0";
