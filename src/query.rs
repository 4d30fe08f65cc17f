//! Request query string split into filter pairs and reserved directives.

/// Query parameters of one request, in request order.
#[derive(Clone, Debug, Default)]
pub struct RequestQuery {
    /// Every non-reserved pair; repeated keys are kept.
    pub filters: Vec<(String, String)>,
    pub order: Option<String>,
    pub select: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl RequestQuery {
    /// Reserved keys keep their last occurrence.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut q = RequestQuery::default();
        for (k, v) in pairs {
            match k.as_str() {
                "order" => q.order = Some(v),
                "select" => q.select = Some(v),
                "limit" => q.limit = Some(v),
                "offset" => q.offset = Some(v),
                _ => q.filters.push((k, v)),
            }
        }
        q
    }

    pub fn has_limit_or_offset(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_reserved_from_filters() {
        let q = RequestQuery::from_pairs(vec![
            ("s".to_string(), "eq.a".to_string()),
            ("order".to_string(), "id.desc".to_string()),
            ("i".to_string(), "gt.1".to_string()),
            ("i".to_string(), "lt.5".to_string()),
            ("select".to_string(), "id,s".to_string()),
        ]);
        assert_eq!(q.filters.len(), 3);
        assert_eq!(q.order.as_deref(), Some("id.desc"));
        assert_eq!(q.select.as_deref(), Some("id,s"));
        assert!(!q.has_limit_or_offset());
    }
}
