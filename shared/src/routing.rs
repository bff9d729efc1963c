use std::collections::HashMap;

#[derive(Debug)]
enum PathSegment {
    Static(String),
    Param(String),
}

/// A parsed path pattern such as `/{type}/{id}/relationships/{relname}`.
#[derive(Debug)]
pub struct PathPattern {
    segments: Vec<PathSegment>,
}

impl PathPattern {
    /// Parses a path pattern string.
    /// Supports static segments (`/api/users`) and named parameters (`/api/users/{id}`).
    pub fn parse(pattern: &str) -> Self {
        let normalized = pattern.trim().trim_matches('/');

        let segments = if normalized.is_empty() {
            vec![]
        } else {
            normalized
                .split('/')
                .map(|s| {
                    if let Some(stripped) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                        PathSegment::Param(stripped.to_string())
                    } else {
                        PathSegment::Static(s.to_string())
                    }
                })
                .collect()
        };

        PathPattern { segments }
    }

    /// Parses `pattern` mounted below the static `prefix` path.
    pub fn with_prefix(prefix: &str, pattern: &str) -> Self {
        let prefix = prefix.trim().trim_matches('/');
        if prefix.is_empty() {
            Self::parse(pattern)
        } else {
            Self::parse(&format!("{prefix}/{}", pattern.trim().trim_start_matches('/')))
        }
    }

    /// Matches a request path against this pattern.
    /// Returns the captured parameters on success. Empty parameter segments never match.
    pub fn matches<'a>(&self, request_path: &'a str) -> Option<HashMap<String, &'a str>> {
        let normalized = request_path.trim().trim_matches('/');

        let request_segments: Vec<&'a str> = if normalized.is_empty() {
            vec![]
        } else {
            normalized.split('/').collect()
        };

        if request_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (seg, req_segment) in self.segments.iter().zip(request_segments) {
            match seg {
                PathSegment::Static(s) => {
                    if req_segment != s {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    if req_segment.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), req_segment);
                }
            }
        }

        Some(params)
    }
}

#[derive(Debug, PartialEq)]
pub struct RouteMatch<'a, A> {
    pub params: HashMap<String, &'a str>,
    pub action: &'a A,
}

/// An ordered table of path patterns; the first matching pattern wins.
#[derive(Debug)]
pub struct RouteTable<A> {
    routes: Vec<(PathPattern, A)>,
}

impl<A> Default for RouteTable<A> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<A> RouteTable<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pattern: PathPattern, action: A) -> &mut Self {
        self.routes.push((pattern, action));
        self
    }

    pub fn resolve<'a>(&'a self, path: &'a str) -> Option<RouteMatch<'a, A>> {
        self.routes.iter().find_map(|(pattern, action)| {
            pattern
                .matches(path)
                .map(|params| RouteMatch { params, action })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_path() {
        let pattern = PathPattern::parse("/api/test/");
        assert!(pattern.matches("/api/test").is_some(), "exact path");
        assert!(
            pattern.matches("/api/test/").is_some(),
            "with trailing slash normalization"
        );
        assert!(
            pattern.matches("/api/test/2").is_none(),
            "extra segment doesn't match"
        );
        assert!(
            pattern.matches("/api/").is_none(),
            "missing segment doesn't match"
        );
    }

    #[test]
    fn test_dynamic_path() {
        let pattern = PathPattern::parse("/{type}/{id}/relationships/{relname}");

        let params = pattern.matches("/articles/1/relationships/comments").unwrap();
        assert_eq!(params.get("type").copied(), Some("articles"));
        assert_eq!(params.get("id").copied(), Some("1"));
        assert_eq!(params.get("relname").copied(), Some("comments"));

        assert!(pattern.matches("/articles/1/comments").is_none());
        assert!(pattern.matches("/articles//relationships/comments").is_none());
    }

    #[test]
    fn test_prefix() {
        let pattern = PathPattern::with_prefix("/api/v1/", "/{type}/{id}");
        assert!(pattern.matches("/api/v1/articles/1").is_some());
        assert!(pattern.matches("/articles/1").is_none());

        let pattern = PathPattern::with_prefix("/", "/{type}/{id}");
        assert!(pattern.matches("/articles/1").is_some());
    }

    #[test]
    fn test_route_table_first_match_wins() {
        let mut table = RouteTable::new();
        table
            .add(PathPattern::parse("/{type}/{id}/relationships/{relname}"), "relationship")
            .add(PathPattern::parse("/{type}/{id}/{relname}"), "related");

        let route_match = table.resolve("/articles/1/relationships/author").unwrap();
        assert_eq!(route_match.action, &"relationship");

        let route_match = table.resolve("/articles/1/author").unwrap();
        assert_eq!(route_match.action, &"related");
        assert_eq!(route_match.params.get("relname").copied(), Some("author"));

        assert!(table.resolve("/articles").is_none());
    }
}
