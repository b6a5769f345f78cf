//! Limit/offset bounds for search results

use serde::{Deserialize, Serialize};

use super::SearchError;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Server-side bounds applied to every search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLimits {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

impl PaginationLimits {
    /// Validate requested bounds. A missing limit takes the default and a
    /// limit above the maximum is capped, but a non-positive limit or a
    /// negative offset is rejected.
    pub fn resolve(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<PageRequest, SearchError> {
        let limit = match limit {
            None => self.default_limit,
            Some(l) if l < 1 => {
                return Err(SearchError::InvalidParameter {
                    name: "limit".to_string(),
                    value: format!("{} (must be at least 1)", l),
                })
            },
            Some(l) => l.min(self.max_limit),
        };

        let offset = match offset {
            None => 0,
            Some(o) if o < 0 => {
                return Err(SearchError::InvalidParameter {
                    name: "offset".to_string(),
                    value: format!("{} (must not be negative)", o),
                })
            },
            Some(o) => o,
        };

        Ok(PageRequest { limit, offset })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let page = PaginationLimits::default().resolve(None, None).unwrap();
        assert_eq!(page, PageRequest { limit: 10, offset: 0 });
    }

    #[test]
    fn test_limit_is_capped() {
        let limits = PaginationLimits {
            default_limit: 5,
            max_limit: 50,
        };
        assert_eq!(limits.resolve(Some(500), Some(7)).unwrap(), PageRequest { limit: 50, offset: 7 });
        assert_eq!(limits.resolve(Some(50), None).unwrap().limit, 50);
        assert_eq!(limits.resolve(None, None).unwrap().limit, 5);
    }

    #[test]
    fn test_rejects_bad_bounds() {
        let limits = PaginationLimits::default();
        assert!(matches!(
            limits.resolve(Some(0), None),
            Err(SearchError::InvalidParameter { ref name, .. }) if name == "limit"
        ));
        assert!(matches!(
            limits.resolve(None, Some(-1)),
            Err(SearchError::InvalidParameter { ref name, .. }) if name == "offset"
        ));
    }
}
