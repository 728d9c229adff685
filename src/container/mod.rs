//! Container data model
//!
//! Configuration handed to the engine at creation time, the per-verb option
//! structs, and the views decoded from `inspect` output.

pub mod config;
pub mod details;

pub use config::{
    ContainerConfig, ContainerHostConfig, ContainerLogsOptions, ContainerNetworkSettings,
    ContainerRemoveOptions, ContainerStartOptions, ImageRemoveOptions, NetworkCreateOptions,
    PortBinding, VolumeCreateOptions,
};
pub use details::{ContainerDetails, ContainerDetailsLogging};
