//! Error taxonomy for tugboat.
//!
//! Every variant is fatal. The `Display` text is the single diagnostic line
//! printed before the process exits with status 1, so each message names the
//! step that failed followed by the underlying cause.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`TugboatError`].
pub type TugboatResult<T> = Result<T, TugboatError>;

/// Errors raised while driving a container through its lifecycle.
#[derive(Error, Diagnostic, Debug)]
pub enum TugboatError {
    /// One of the required parameters was absent or empty.
    #[error("username, token and image must be specified")]
    #[diagnostic(
        code(tugboat::config::missing),
        help("Pass -username, -token and -image with non-empty values")
    )]
    MissingParameters,

    /// The container runtime client could not be built.
    #[error("Error creating docker client: {message}")]
    #[diagnostic(
        code(tugboat::client),
        help("Check that the Docker daemon is running and DOCKER_HOST is correct")
    )]
    Client {
        /// The underlying client error.
        message: String,
    },

    /// The registry credential could not be serialized or decoded.
    #[error("Error marshalling registry credentials: {message}")]
    #[diagnostic(code(tugboat::credentials))]
    Credentials {
        /// The underlying serialization error.
        message: String,
    },

    /// The image pull was rejected or failed mid-stream.
    #[error("Error pulling image {image}: {message}")]
    #[diagnostic(code(tugboat::pull))]
    Pull {
        /// The image being pulled.
        image: String,
        /// The underlying runtime error.
        message: String,
    },

    /// The container could not be created.
    #[error("Error creating container: {message}")]
    #[diagnostic(
        code(tugboat::create),
        help("Host port 8080 must be free for the container to be created")
    )]
    Create {
        /// The underlying runtime error.
        message: String,
    },

    /// The created container could not be started.
    #[error("Error starting container {container}: {message}")]
    #[diagnostic(code(tugboat::start))]
    Start {
        /// The container that failed to start.
        container: String,
        /// The underlying runtime error.
        message: String,
    },

    /// Waiting for the container signalled an error instead of a status.
    #[error("Error waiting for container {container}: {message}")]
    #[diagnostic(code(tugboat::wait))]
    Wait {
        /// The container being waited on.
        container: String,
        /// The underlying runtime error.
        message: String,
    },

    /// The container logs could not be fetched.
    #[error("Error fetching container logs for {container}: {message}")]
    #[diagnostic(code(tugboat::logs))]
    Logs {
        /// The container whose logs were requested.
        container: String,
        /// The underlying runtime error.
        message: String,
    },

    /// The runtime returned an identifier that is not a valid handle.
    #[error("Invalid container handle: {id:?}")]
    #[diagnostic(code(tugboat::container::invalid_handle))]
    InvalidContainerHandle {
        /// The rejected identifier.
        id: String,
    },

    /// The image reference could not be parsed.
    #[error("Invalid image reference: {reference:?}")]
    #[diagnostic(
        code(tugboat::image::invalid_reference),
        help("Use the form [registry/]repository[:tag|@digest]")
    )]
    InvalidReference {
        /// The rejected reference.
        reference: String,
    },

    /// Writing to the console failed.
    #[error("I/O error: {0}")]
    #[diagnostic(code(tugboat::io))]
    Io(#[from] std::io::Error),
}
