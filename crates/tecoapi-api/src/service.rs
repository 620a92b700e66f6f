use std::fmt;

/// An endpoint of the TecoApi web service, relative to the resource URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Read one object (or the whole tree under it) by dotted path.
    GetObject,
    /// Write one object; body is `{path: value}`.
    PutObject,
    /// Controller identification block.
    GetInfo,
    /// Names of every top-level public object.
    GetList,
}

impl Service {
    /// The path segment appended to the resource URL.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetObject => "GetObject",
            Self::PutObject => "PutObject",
            Self::GetInfo => "GetInfo",
            Self::GetList => "GetList",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
