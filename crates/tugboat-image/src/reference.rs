//! Image reference parsing.

use std::fmt;

use tugboat_common::{TugboatError, TugboatResult};

/// A parsed image reference.
///
/// The operator's original string is kept alongside the parsed parts: the
/// container is created from exactly what was given, while pulls are split
/// into an image name and a tag the way the Engine API expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    raw: String,
    /// Registry hostname (with port, if any).
    pub registry: String,
    /// Repository path within the registry.
    pub repository: String,
    /// Tag or digest.
    pub reference: ImageTag,
}

/// Image tag or digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageTag {
    /// A tag (e.g., "latest").
    Tag(String),
    /// A digest (e.g., "sha256:abc123...").
    Digest(String),
}

impl ImageTag {
    /// The tag or digest string without its separator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tag(t) | Self::Digest(t) => t,
        }
    }
}

impl ImageReference {
    /// Default registry.
    pub const DEFAULT_REGISTRY: &'static str = "docker.io";
    /// Default tag.
    pub const DEFAULT_TAG: &'static str = "latest";

    /// Parse an image reference string.
    ///
    /// Examples:
    /// - `alpine` -> docker.io/library/alpine:latest
    /// - `alpine:3.19` -> docker.io/library/alpine:3.19
    /// - `myuser/myapp` -> docker.io/myuser/myapp:latest
    /// - `localhost:5000/app` -> localhost:5000/app:latest
    /// - `ghcr.io/org/app@sha256:...` -> ghcr.io/org/app@sha256:...
    ///
    /// # Errors
    ///
    /// Returns [`TugboatError::InvalidReference`] for empty references, any
    /// whitespace (leading and trailing included), or an empty repository, tag
    /// or digest.
    pub fn parse(raw: &str) -> TugboatResult<Self> {
        let invalid = || TugboatError::InvalidReference {
            reference: raw.to_string(),
        };

        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let (name, tag) = if let Some((name, digest)) = raw.split_once('@') {
            (name, ImageTag::Digest(digest.to_string()))
        } else {
            // A colon before the last slash is a registry port, not a tag.
            let last_slash = raw.rfind('/').map_or(0, |idx| idx + 1);
            match raw[last_slash..].rfind(':') {
                Some(idx) => {
                    let split = last_slash + idx;
                    (&raw[..split], ImageTag::Tag(raw[split + 1..].to_string()))
                }
                None => (raw, ImageTag::Tag(Self::DEFAULT_TAG.to_string())),
            }
        };

        if name.is_empty() || tag.as_str().is_empty() {
            return Err(invalid());
        }

        let (registry, repository) = match name.split_once('/') {
            Some((first, rest)) if Self::looks_like_registry(first) => {
                (first.to_string(), rest.to_string())
            }
            // Docker Hub user/repo
            Some(_) => (Self::DEFAULT_REGISTRY.to_string(), name.to_string()),
            // Official image (e.g., "alpine" -> "library/alpine")
            None => (
                Self::DEFAULT_REGISTRY.to_string(),
                format!("library/{name}"),
            ),
        };

        if repository.is_empty() || repository.split('/').any(str::is_empty) {
            return Err(invalid());
        }

        Ok(Self {
            raw: raw.to_string(),
            registry,
            repository,
            reference: tag,
        })
    }

    fn looks_like_registry(component: &str) -> bool {
        component.contains('.') || component.contains(':') || component == "localhost"
    }

    /// The reference exactly as the operator supplied it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Fully qualified image name without tag or digest.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}/{}", self.registry, self.repository)
    }

    /// Split into the `fromImage` and `tag` parameters of a pull request.
    ///
    /// For digest references the digest takes the place of the tag.
    #[must_use]
    pub fn pull_target(&self) -> (String, String) {
        (self.name(), self.reference.as_str().to_string())
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
