//! Lookup rejection reasons.

use crate::routing::instance::InstanceHeaderError;
use crate::routing::key::RouteKey;

/// Why a request could not be resolved to a route pool.
///
/// Both kinds are scoped to a single request and surface to the client as a 404.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The registry holds no pool for the key (scoped or unscoped).
    #[error("no route registered for {key}")]
    UnknownRoute { key: RouteKey },

    /// The instance selection header is malformed. No registry lookup was made.
    #[error(transparent)]
    InvalidInstanceHeader(#[from] InstanceHeaderError),
}

impl LookupError {
    /// Stable label for the rejection class.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnknownRoute { .. } => "no_matching_route",
            Self::InvalidInstanceHeader(_) => "invalid_instance_header",
        }
    }
}
