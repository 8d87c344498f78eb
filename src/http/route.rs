use reqwest::Method;
use std::fmt;

/// A value substituted into a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathParam {
    Int(u64),
    Str(String),
}

impl From<u64> for PathParam {
    fn from(v: u64) -> Self {
        PathParam::Int(v)
    }
}

impl From<&str> for PathParam {
    fn from(v: &str) -> Self {
        PathParam::Str(v.to_string())
    }
}

impl From<String> for PathParam {
    fn from(v: String) -> Self {
        PathParam::Str(v)
    }
}

impl PathParam {
    fn render(&self) -> String {
        match self {
            PathParam::Int(n) => n.to_string(),
            PathParam::Str(s) => urlencoding::encode(s).into_owned(),
        }
    }
}

/// Method plus fully rendered URL of one logical API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    method: Method,
    path: String,
    url: String,
}

impl Route {
    /// Render `template` against `params`; string values are percent-encoded.
    ///
    /// Placeholders look like `{player_id}`.
    pub fn new(method: Method, base_url: &str, template: &str, params: &[(&str, PathParam)]) -> Self {
        let mut path = template.to_string();
        for (name, value) in params {
            path = path.replace(&format!("{{{}}}", name), &value.render());
        }
        let url = format!("{}{}", base_url.trim_end_matches('/'), path);
        Self {
            method,
            path: template.to_string(),
            url,
        }
    }

    pub fn get(base_url: &str, template: &str, params: &[(&str, PathParam)]) -> Self {
        Self::new(Method::GET, base_url, template, params)
    }

    pub fn post(base_url: &str, template: &str, params: &[(&str, PathParam)]) -> Self {
        Self::new(Method::POST, base_url, template, params)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The unrendered path template, useful for logs.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
