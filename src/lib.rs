//! ctharness - container engine harness for queue manager image tests
//!
//! Drives the `docker` or `podman` command-line tool to create, run,
//! inspect and tear down containers under test. It provides:
//!
//! - A typed container data model (`container`)
//! - An engine client behind the [`ContainerInterface`] trait (`engine`)
//! - Readiness, log polling and cleanup helpers (`harness`)
//! - Settings from YAML and the environment (`settings`)

pub mod container;
pub mod engine;
pub mod error;
pub mod harness;
pub mod settings;

pub use engine::{ContainerClient, ContainerInterface, ContainerTool};
pub use error::{EngineError, Result};
pub use settings::EngineSettings;
