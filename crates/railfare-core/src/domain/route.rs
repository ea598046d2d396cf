use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Origin/destination pair with human-readable names and provider station codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteSpec {
    pub origin_name: String,
    pub destination_name: String,
    pub origin_code: String,
    pub destination_code: String,
}

impl RouteSpec {
    pub fn new(
        origin_name: impl Into<String>,
        destination_name: impl Into<String>,
        origin_code: impl Into<String>,
        destination_code: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self {
            origin_name: origin_name.into().trim().to_owned(),
            destination_name: destination_name.into().trim().to_owned(),
            origin_code: origin_code.into().trim().to_owned(),
            destination_code: destination_code.into().trim().to_owned(),
        }
        .validated()
    }

    /// Trims every field and checks that names and codes are present.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let route = Self {
            origin_name: self.origin_name.trim().to_owned(),
            destination_name: self.destination_name.trim().to_owned(),
            origin_code: normalize_code(&self.origin_code),
            destination_code: normalize_code(&self.destination_code),
        };

        if route.origin_code.is_empty() || route.destination_code.is_empty() {
            return Err(ValidationError::EmptyStationCode {
                origin: route.origin_name,
                destination: route.destination_name,
            });
        }
        if route.origin_name.is_empty() {
            return Err(ValidationError::EmptyStationName {
                code: route.origin_code,
            });
        }
        if route.destination_name.is_empty() {
            return Err(ValidationError::EmptyStationName {
                code: route.destination_code,
            });
        }

        Ok(route)
    }
}

impl Display for RouteSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.origin_name, self.destination_name)
    }
}

// Spreadsheet exports sometimes render integer codes as `2000000.0`.
fn normalize_code(code: &str) -> String {
    let code = code.trim();
    code.strip_suffix(".0").unwrap_or(code).to_owned()
}
