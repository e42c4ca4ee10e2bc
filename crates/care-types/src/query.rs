use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of a cached remote-data result: a resource name followed by
/// zero or more parameters, e.g. `donations/my/rin@x.org`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(resource: impl Into<String>) -> Self {
        Self(vec![resource.into()])
    }

    pub fn with(mut self, param: impl Into<String>) -> Self {
        self.0.push(param.into());
        self
    }

    pub fn resource(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    pub fn params(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// True when every segment of `prefix` matches the leading segments of this key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}
