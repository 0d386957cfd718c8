//! Run configuration.

use tugboat_common::{TugboatError, TugboatResult};
use tugboat_image::{ImageReference, RegistryCredential};

/// Everything a run needs, built once from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Credential presented to the registry on pull.
    pub credential: RegistryCredential,
    /// Image to pull and run.
    pub image: ImageReference,
}

impl RunConfig {
    /// Build a configuration from the three required parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TugboatError::MissingParameters`] if any parameter is absent
    /// or empty, and [`TugboatError::InvalidReference`] if the image cannot
    /// be parsed.
    pub fn new(
        username: Option<&str>,
        token: Option<&str>,
        image: Option<&str>,
    ) -> TugboatResult<Self> {
        let (Some(username), Some(token), Some(image)) =
            (present(username), present(token), present(image))
        else {
            return Err(TugboatError::MissingParameters);
        };

        Ok(Self {
            credential: RegistryCredential::new(username, token),
            image: ImageReference::parse(image)?,
        })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
