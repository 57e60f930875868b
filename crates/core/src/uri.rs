//! Item identifiers: structured URIs and path aliases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A structured content manager URI: `tcm:<publication>-<item>[-<type>][-v<version>]`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TcmUri {
    publication: u32,
    item: u32,
    item_type: Option<u32>,
    version: Option<u32>,
}

impl TcmUri {
    /// URI scheme prefix, including the colon.
    pub const SCHEME: &'static str = "tcm:";

    /// The null URI, used for new items.
    pub const NULL: TcmUri = TcmUri {
        publication: 0,
        item: 0,
        item_type: Some(0),
        version: None,
    };

    /// Parse a URI string. The scheme is matched case-insensitively.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let s = s.trim();
        let rest = match s.get(..Self::SCHEME.len()) {
            Some(scheme) if scheme.eq_ignore_ascii_case(Self::SCHEME) => &s[Self::SCHEME.len()..],
            _ => {
                return Err(crate::Error::validation(format!("not a tcm URI: {s}")));
            }
        };

        let mut parts: Vec<&str> = rest.split('-').collect();
        let version = match parts.last().copied() {
            Some(last) if last.starts_with(['v', 'V']) => {
                let v = parse_component(&last[1..], "version", s)?;
                parts.pop();
                Some(v)
            }
            _ => None,
        };

        let (publication, item, item_type) = match parts.as_slice() {
            [publication, item] => (
                parse_component(publication, "publication id", s)?,
                parse_component(item, "item id", s)?,
                None,
            ),
            [publication, item, item_type] => (
                parse_component(publication, "publication id", s)?,
                parse_component(item, "item id", s)?,
                Some(parse_component(item_type, "item type", s)?),
            ),
            _ => {
                return Err(crate::Error::validation(format!("malformed tcm URI: {s}")));
            }
        };

        Ok(Self {
            publication,
            item,
            item_type,
            version,
        })
    }

    /// Whether `s` looks like a URI rather than a path alias.
    pub fn is_uri_like(s: &str) -> bool {
        s.trim()
            .get(..Self::SCHEME.len())
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case(Self::SCHEME))
    }

    /// Publication id component.
    pub fn publication_id(&self) -> u32 {
        self.publication
    }

    /// Item id component.
    pub fn item_id(&self) -> u32 {
        self.item
    }

    /// Item type component, if present.
    pub fn item_type(&self) -> Option<u32> {
        self.item_type
    }

    /// Version component, if present.
    pub fn version(&self) -> Option<u32> {
        self.version
    }

    /// Whether this is the null URI (all components zero).
    pub fn is_null(&self) -> bool {
        self.publication == 0 && self.item == 0 && self.item_type.unwrap_or(0) == 0
    }
}

fn parse_component(value: &str, what: &str, uri: &str) -> crate::Result<u32> {
    value
        .parse::<u32>()
        .map_err(|_| crate::Error::validation(format!("invalid {what} in tcm URI: {uri}")))
}

impl fmt::Display for TcmUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tcm:{}-{}", self.publication, self.item)?;
        if let Some(item_type) = self.item_type {
            write!(f, "-{item_type}")?;
        }
        if let Some(version) = self.version {
            write!(f, "-v{version}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TcmUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TcmUri({self})")
    }
}

impl TryFrom<String> for TcmUri {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::parse(&value)
    }
}

impl From<TcmUri> for String {
    fn from(uri: TcmUri) -> Self {
        uri.to_string()
    }
}

/// Reference to a server-side object, either by URI or by path alias (WebDAV URL).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactReference {
    #[serde(rename = "id_ref")]
    Uri(TcmUri),
    #[serde(rename = "webdav_url")]
    Alias(String),
}

impl ArtifactReference {
    /// Pick the URI form when the input is lexically a URI, the alias form otherwise.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(crate::Error::validation("empty item identifier"));
        }
        if TcmUri::is_uri_like(s) {
            Ok(Self::Uri(TcmUri::parse(s)?))
        } else {
            Ok(Self::Alias(s.to_string()))
        }
    }

    /// The URI, if this reference is in URI form.
    pub fn as_uri(&self) -> Option<&TcmUri> {
        match self {
            Self::Uri(uri) => Some(uri),
            Self::Alias(_) => None,
        }
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uri(uri) => write!(f, "{uri}"),
            Self::Alias(alias) => write!(f, "{alias}"),
        }
    }
}
