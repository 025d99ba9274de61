//! Limit/offset paging for list endpoints

use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// Largest page any list endpoint returns
pub const MAX_LIMIT: i64 = 100;

/// `?limit=&offset=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Validated limit and offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl PageQuery {
    /// Apply `default_limit` and reject values outside `1..=MAX_LIMIT` or a
    /// negative offset
    pub fn resolve(&self, default_limit: i64) -> ApiResult<Page> {
        let limit = self.limit.unwrap_or(default_limit);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(ApiError::BadRequest(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }

        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(ApiError::BadRequest("offset must not be negative".to_string()));
        }

        Ok(Page { limit, offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let page = PageQuery::default().resolve(20).unwrap();
        assert_eq!(page, Page { limit: 20, offset: 0 });
    }

    #[test]
    fn test_limit_bounds() {
        let at_max = PageQuery { limit: Some(100), offset: Some(40) };
        assert_eq!(at_max.resolve(20).unwrap(), Page { limit: 100, offset: 40 });

        assert!(PageQuery { limit: Some(101), offset: None }.resolve(20).is_err());
        assert!(PageQuery { limit: Some(0), offset: None }.resolve(20).is_err());
    }

    #[test]
    fn test_negative_offset_rejected() {
        assert!(PageQuery { limit: None, offset: Some(-1) }.resolve(10).is_err());
    }
}
