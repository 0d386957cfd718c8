//! Port exposure for created containers.

use std::fmt;

/// Port the service inside the container listens on.
pub const SERVICE_PORT: u16 = 8080;

/// Host address the service port is bound to (all interfaces).
pub const SERVICE_HOST_IP: &str = "0.0.0.0";

/// A container TCP port exposed and bound to a host address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    /// Port inside the container.
    pub container_port: u16,
    /// Host IP to bind to.
    pub host_ip: String,
    /// Host port.
    pub host_port: u16,
}

impl PortMapping {
    /// Bind a container TCP port to the same port on all host interfaces.
    #[must_use]
    pub fn tcp(port: u16) -> Self {
        Self {
            container_port: port,
            host_ip: SERVICE_HOST_IP.to_string(),
            host_port: port,
        }
    }

    /// The mapping every tugboat container gets: `8080/tcp` on `0.0.0.0:8080`.
    #[must_use]
    pub fn service() -> Self {
        Self::tcp(SERVICE_PORT)
    }

    /// Port key in `port/protocol` form, e.g. `8080/tcp`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/tcp", self.container_port)
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}->{}", self.host_ip, self.host_port, self.key())
    }
}
