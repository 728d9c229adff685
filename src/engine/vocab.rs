//! Engine CLI vocabulary
//!
//! The objects, verbs and flags understood by both `docker` and `podman`.

use std::fmt;

/// Object sub-commands (`<tool> <object> <verb>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Object {
    Volume,
    Image,
    Port,
    Network,
}

impl Object {
    pub fn as_str(self) -> &'static str {
        match self {
            Object::Volume => "volume",
            Object::Image => "image",
            Object::Port => "port",
            Object::Network => "network",
        }
    }
}

/// Verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    ListContainers,
    ListImages,
    Create,
    Start,
    Wait,
    Exec,
    Logs,
    Stop,
    Remove,
    Inspect,
    Copy,
    Build,
    Kill,
    Version,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::ListContainers => "ps",
            Verb::ListImages => "images",
            Verb::Create => "create",
            Verb::Start => "start",
            Verb::Wait => "wait",
            Verb::Exec => "exec",
            Verb::Logs => "logs",
            Verb::Stop => "stop",
            Verb::Remove => "rm",
            Verb::Inspect => "inspect",
            Verb::Copy => "cp",
            Verb::Build => "build",
            Verb::Kill => "kill",
            Verb::Version => "version",
        }
    }
}

/// Flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Entrypoint,
    User,
    Expose,
    Volume,
    Publish,
    Privileged,
    AddCapability,
    DropCapability,
    Name,
    Condition,
    EnvironmentVariable,
    Tail,
    Force,
    Volumes,
    Hostname,
    Driver,
    File,
    Quiet,
    Tag,
    Format,
    Network,
    SecurityOptions,
    Signal,
    ReadOnlyRootfs,
}

impl Flag {
    pub fn as_str(self) -> &'static str {
        match self {
            Flag::Entrypoint => "--entrypoint",
            Flag::User => "--user",
            Flag::Expose => "--expose",
            Flag::Volume => "--volume",
            Flag::Publish => "--publish",
            Flag::Privileged => "--privileged",
            Flag::AddCapability => "--cap-add",
            Flag::DropCapability => "--cap-drop",
            Flag::Name => "--name",
            Flag::Condition => "--condition",
            Flag::EnvironmentVariable => "--env",
            Flag::Tail => "--tail",
            Flag::Force => "--force",
            Flag::Volumes => "--volumes",
            Flag::Hostname => "--hostname",
            Flag::Driver => "--driver",
            Flag::File => "--file",
            Flag::Quiet => "--quiet",
            Flag::Tag => "--tag",
            Flag::Format => "--format",
            Flag::Network => "--network",
            Flag::SecurityOptions => "--security-opt",
            Flag::Signal => "--signal",
            Flag::ReadOnlyRootfs => "--read-only",
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wait condition for a container that is no longer running
pub const CONTAINER_STATE_NOT_RUNNING: &str = "not-running";
/// Podman's spelling of [`CONTAINER_STATE_NOT_RUNNING`]
pub const CONTAINER_STATE_STOPPED: &str = "stopped";
