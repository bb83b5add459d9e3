//! Bearer 토큰 추출
//!
//! 요청에서 후보 토큰을 찾는 로직입니다.

/// 토큰이 발견된 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// `Authorization: Bearer ...`
    Header,

    /// `?token=...`
    Query,

    /// `Cookie: token=...`
    Cookie,
}

impl TokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSource::Header => "header",
            TokenSource::Query => "query",
            TokenSource::Cookie => "cookie",
        }
    }
}

/// 요청에서 추출한 후보 토큰
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub source: TokenSource,
    pub value: String,
}

impl BearerToken {
    /// 요청 구성 요소에서 토큰 추출
    ///
    /// # 추출 우선순위
    /// 1. `Authorization: Bearer ...`
    /// 2. `token` 쿼리 파라미터
    /// 3. `token` 쿠키
    ///
    /// 빈 값은 없는 것으로 취급합니다.
    pub fn from_parts(
        authorization: Option<&str>,
        query_token: Option<&str>,
        cookie_header: Option<&str>,
    ) -> Option<Self> {
        // 1. Authorization 헤더
        if let Some(token) = authorization.and_then(bearer_value) {
            return Some(Self::new(TokenSource::Header, token));
        }

        // 2. 쿼리
        if let Some(token) = query_token.map(str::trim).filter(|t| !t.is_empty()) {
            return Some(Self::new(TokenSource::Query, token));
        }

        // 3. 쿠키
        if let Some(token) = cookie_header.and_then(|c| cookie_value(c, "token")) {
            return Some(Self::new(TokenSource::Cookie, token));
        }

        None
    }

    fn new(source: TokenSource, value: &str) -> Self {
        Self {
            source,
            value: value.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("source", &self.source)
            .field("len", &self.value.len())
            .finish_non_exhaustive()
    }
}

fn bearer_value(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// `Cookie` 헤더에서 이름으로 값 조회
pub fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_priority() {
        let token = BearerToken::from_parts(
            Some("Bearer from-header"),
            Some("from-query"),
            Some("token=from-cookie"),
        )
        .unwrap();
        assert_eq!(token.source, TokenSource::Header);
        assert_eq!(token.as_str(), "from-header");

        let token =
            BearerToken::from_parts(None, Some("from-query"), Some("token=from-cookie")).unwrap();
        assert_eq!(token.source, TokenSource::Query);

        let token = BearerToken::from_parts(None, None, Some("a=1; token=from-cookie")).unwrap();
        assert_eq!(token.source, TokenSource::Cookie);
        assert_eq!(token.as_str(), "from-cookie");

        assert!(BearerToken::from_parts(None, None, None).is_none());
    }

    #[test]
    fn test_non_bearer_header_falls_through() {
        let token = BearerToken::from_parts(Some("Basic dXNlcjpwYXNz"), Some("q"), None).unwrap();
        assert_eq!(token.source, TokenSource::Query);

        let token = BearerToken::from_parts(Some("bearer lower"), None, None).unwrap();
        assert_eq!(token.as_str(), "lower");
    }

    #[test]
    fn test_empty_values_are_absent() {
        assert!(BearerToken::from_parts(Some("Bearer "), Some(""), Some("token=")).is_none());
        assert!(BearerToken::from_parts(Some("Bearer"), Some("  "), Some("other=1")).is_none());
    }

    #[test]
    fn test_cookie_value() {
        assert_eq!(cookie_value("a=1; token=\"abc\"; b=2", "token"), Some("abc"));
        assert_eq!(cookie_value("mytoken=abc", "token"), None);
    }

    #[test]
    fn test_debug_hides_value() {
        let token = BearerToken::from_parts(Some("Bearer secret-value"), None, None).unwrap();
        assert!(!format!("{:?}", token).contains("secret-value"));
    }
}
