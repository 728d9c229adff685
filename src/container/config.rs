//! Container configuration

use super::details::de;
use serde::{Deserialize, Serialize};

/// Container configuration passed to `create`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerConfig {
    /// Image name/tag
    pub image: String,
    /// Hostname
    pub hostname: String,
    /// User to run as
    pub user: String,
    /// Entry point, command followed by its arguments
    #[serde(deserialize_with = "de::string_or_seq")]
    pub entrypoint: Vec<String>,
    /// Environment variables as `KEY=VALUE`
    #[serde(deserialize_with = "de::nullable")]
    pub env: Vec<String>,
    /// Exposed ports, e.g. `1414/tcp`
    #[serde(deserialize_with = "de::seq_or_map_keys")]
    pub exposed_ports: Vec<String>,
}

impl ContainerConfig {
    /// Create a new container configuration for an image
    pub fn new(image: &str) -> Self {
        Self {
            image: image.to_string(),
            ..Default::default()
        }
    }

    /// Set the entry point
    pub fn entrypoint<I, S>(mut self, entrypoint: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entrypoint = entrypoint.into_iter().map(Into::into).collect();
        self
    }

    /// Add an environment variable
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push(format!("{}={}", key, value));
        self
    }

    /// Set the user
    pub fn user(mut self, user: &str) -> Self {
        self.user = user.to_string();
        self
    }

    /// Set the hostname
    pub fn hostname(mut self, hostname: &str) -> Self {
        self.hostname = hostname.to_string();
        self
    }

    /// Expose a port
    pub fn expose(mut self, port: &str) -> Self {
        self.exposed_ports.push(port.to_string());
        self
    }
}

/// Host-side configuration passed to `create`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerHostConfig {
    /// Bind mounts as `host:container[:options]`
    #[serde(deserialize_with = "de::nullable")]
    pub binds: Vec<String>,
    /// Published ports
    #[serde(deserialize_with = "de::port_bindings")]
    pub port_bindings: Vec<PortBinding>,
    /// Give extended privileges to the container
    pub privileged: bool,
    /// Linux capabilities to add
    #[serde(deserialize_with = "de::nullable")]
    pub cap_add: Vec<String>,
    /// Linux capabilities to drop
    #[serde(deserialize_with = "de::nullable")]
    pub cap_drop: Vec<String>,
    /// Security options
    #[serde(deserialize_with = "de::nullable")]
    pub security_opt: Vec<String>,
    /// Read-only root filesystem
    #[serde(rename = "ReadonlyRootfs", alias = "ReadOnlyRootfs")]
    pub read_only_rootfs: bool,
}

impl ContainerHostConfig {
    /// Add a bind mount
    pub fn bind(mut self, host_path: &str, container_path: &str) -> Self {
        self.binds.push(format!("{}:{}", host_path, container_path));
        self
    }

    /// Publish a container port on the host
    pub fn publish(mut self, binding: PortBinding) -> Self {
        self.port_bindings.push(binding);
        self
    }
}

/// Binding from a container port to a port on the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    #[serde(rename = "HostIp", alias = "HostIP", default)]
    pub host_ip: String,
    /// Port on the host; empty lets the engine pick one
    #[serde(rename = "HostPort", default)]
    pub host_port: String,
    /// Exposed port on the container, e.g. `1414/tcp`
    #[serde(rename = "ContainerPort", default)]
    pub container_port: String,
}

impl PortBinding {
    /// Bind a TCP container port to an engine-chosen port on all interfaces
    pub fn tcp(container_port: u16) -> Self {
        Self {
            host_ip: "0.0.0.0".to_string(),
            host_port: String::new(),
            container_port: format!("{}/tcp", container_port),
        }
    }

    /// Render as the value of `--publish`
    pub fn publish_spec(&self) -> String {
        format!("{}:{}:{}", self.host_ip, self.host_port, self.container_port)
    }
}

/// Networks to connect a container to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerNetworkSettings {
    pub networks: Vec<String>,
}

/// Options for removing a container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerRemoveOptions {
    pub force: bool,
    pub remove_volumes: bool,
}

/// Options for starting a container
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerStartOptions {}

/// Options for fetching container logs
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerLogsOptions {}

/// Options for creating a network
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkCreateOptions {}

/// Options for removing an image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageRemoveOptions {
    pub force: bool,
}

/// Options for creating a volume
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeCreateOptions {
    pub name: String,
    /// Volume driver; empty uses the engine default
    pub driver: String,
}
