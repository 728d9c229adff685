//! Argument rendering
//!
//! Pure functions turning configuration into the argv passed after the tool
//! name. The two engines differ in three places: entrypoint syntax, the
//! `wait` condition, and how `image build` locates the Dockerfile.

use super::vocab::{Flag, Object, Verb, CONTAINER_STATE_NOT_RUNNING, CONTAINER_STATE_STOPPED};
use super::ContainerTool;
use crate::container::{
    ContainerConfig, ContainerHostConfig, ContainerNetworkSettings, ContainerRemoveOptions,
    ImageRemoveOptions, VolumeCreateOptions,
};
use std::path::Path;

fn push(args: &mut Vec<String>, flag: Flag, value: &str) {
    args.push(flag.to_string());
    args.push(value.to_string());
}

fn push_if(args: &mut Vec<String>, flag: Flag, value: &str) {
    if !value.is_empty() {
        push(args, flag, value);
    }
}

/// Entrypoint as Podman's JSON list, e.g. `["a","b"]`
pub fn podman_entrypoint(entrypoint: &[String]) -> String {
    let tokens: Vec<String> = entrypoint
        .iter()
        .map(|token| serde_json::Value::from(token.as_str()).to_string())
        .collect();
    format!("[{}]", tokens.join(","))
}

/// Append the flags for a [`ContainerConfig`], ending with the image.
///
/// Docker only takes the executable in `--entrypoint`; the remaining
/// entrypoint tokens follow the image as the command.
pub fn container_config_args(args: &mut Vec<String>, config: &ContainerConfig, tool: ContainerTool) {
    let mut trailing: &[String] = &[];
    if let Some((first, rest)) = config.entrypoint.split_first() {
        match tool {
            ContainerTool::Podman => push(args, Flag::Entrypoint, &podman_entrypoint(&config.entrypoint)),
            ContainerTool::Docker => {
                push(args, Flag::Entrypoint, first);
                trailing = rest;
            }
        }
    }
    push_if(args, Flag::User, &config.user);
    for port in &config.exposed_ports {
        push(args, Flag::Expose, port);
    }
    push_if(args, Flag::Hostname, &config.hostname);
    for env in &config.env {
        push(args, Flag::EnvironmentVariable, env);
    }
    if !config.image.is_empty() {
        args.push(config.image.clone());
    }
    args.extend(trailing.iter().cloned());
}

/// Append the flags for a [`ContainerHostConfig`].
///
/// Order: binds, publish, privileged, cap-add, cap-drop, security-opt, read-only.
pub fn host_config_args(args: &mut Vec<String>, host_config: &ContainerHostConfig) {
    for bind in &host_config.binds {
        push(args, Flag::Volume, bind);
    }
    for binding in &host_config.port_bindings {
        push(args, Flag::Publish, &binding.publish_spec());
    }
    if host_config.privileged {
        args.push(Flag::Privileged.to_string());
    }
    for capability in &host_config.cap_add {
        push(args, Flag::AddCapability, capability);
    }
    for capability in &host_config.cap_drop {
        push(args, Flag::DropCapability, capability);
    }
    for option in &host_config.security_opt {
        push(args, Flag::SecurityOptions, option);
    }
    if host_config.read_only_rootfs {
        args.push(Flag::ReadOnlyRootfs.to_string());
    }
}

/// Append one `--network` per network
pub fn network_config_args(args: &mut Vec<String>, networking_config: &ContainerNetworkSettings) {
    for network in &networking_config.networks {
        push(args, Flag::Network, network);
    }
}

/// `create --name <name> <host flags> <network flags> <container flags> <image> [cmd]`
pub fn create_args(
    tool: ContainerTool,
    config: &ContainerConfig,
    host_config: &ContainerHostConfig,
    networking_config: &ContainerNetworkSettings,
    container_name: &str,
) -> Vec<String> {
    let mut args = vec![Verb::Create.to_string()];
    push(&mut args, Flag::Name, container_name);
    host_config_args(&mut args, host_config);
    network_config_args(&mut args, networking_config);
    container_config_args(&mut args, config, tool);
    args
}

pub fn start_args(container: &str) -> Vec<String> {
    vec![Verb::Start.to_string(), container.to_string()]
}

pub fn stop_args(container: &str) -> Vec<String> {
    vec![Verb::Stop.to_string(), container.to_string()]
}

pub fn kill_args(container: &str, signal: Option<&str>) -> Vec<String> {
    let mut args = vec![Verb::Kill.to_string(), container.to_string()];
    if let Some(signal) = signal {
        push_if(&mut args, Flag::Signal, signal);
    }
    args
}

pub fn remove_args(container: &str, options: ContainerRemoveOptions) -> Vec<String> {
    let mut args = vec![Verb::Remove.to_string(), container.to_string()];
    if options.force {
        args.push(Flag::Force.to_string());
    }
    if options.remove_volumes {
        args.push(Flag::Volumes.to_string());
    }
    args
}

/// The wait condition as the engine spells it
pub fn engine_condition(tool: ContainerTool, condition: &str) -> &str {
    match tool {
        ContainerTool::Podman if condition == CONTAINER_STATE_NOT_RUNNING => CONTAINER_STATE_STOPPED,
        _ => condition,
    }
}

/// `wait <container>`; only Podman accepts `--condition`
pub fn wait_args(tool: ContainerTool, container: &str, condition: &str) -> Vec<String> {
    let mut args = vec![Verb::Wait.to_string(), container.to_string()];
    if tool == ContainerTool::Podman {
        push_if(&mut args, Flag::Condition, engine_condition(tool, condition));
    }
    args
}

pub fn exec_args(id: &str, user: Option<&str>, cmd: &[String]) -> Vec<String> {
    let mut args = vec![Verb::Exec.to_string()];
    if let Some(user) = user {
        push_if(&mut args, Flag::User, user);
    }
    args.push(id.to_string());
    args.extend(cmd.iter().cloned());
    args
}

pub fn logs_args(container: &str) -> Vec<String> {
    vec![Verb::Logs.to_string(), container.to_string()]
}

pub fn copy_args(container: &str, src_path: &str, dest_dir: &Path) -> Vec<String> {
    vec![
        Verb::Copy.to_string(),
        format!("{}:{}", container, src_path),
        format!("{}/.", dest_dir.display()),
    ]
}

/// `cp <container>:<src_dir> <dest_dir>/`, landing the directory inside `dest_dir`
pub fn copy_dir_args(container: &str, src_dir: &str, dest_dir: &Path) -> Vec<String> {
    vec![
        Verb::Copy.to_string(),
        format!("{}:{}", container, src_dir),
        format!("{}/", dest_dir.display()),
    ]
}

pub fn port_args(id: &str, port: u16) -> Vec<String> {
    vec![Object::Port.to_string(), id.to_string(), port.to_string()]
}

pub fn inspect_args(id: &str, format: &str) -> Vec<String> {
    let mut args = vec![Verb::Inspect.to_string(), id.to_string()];
    push_if(&mut args, Flag::Format, format);
    args
}

pub fn image_inspect_args(id: &str, format: &str) -> Vec<String> {
    let mut args = vec![Object::Image.to_string(), Verb::Inspect.to_string(), id.to_string()];
    push_if(&mut args, Flag::Format, format);
    args
}

/// `image build`.
///
/// Podman is handed the Dockerfile itself; Docker is handed the directory
/// holding it as the build context.
pub fn image_build_args(tool: ContainerTool, dockerfile: &Path, tag: Option<&str>) -> Vec<String> {
    let mut args = vec![Object::Image.to_string(), Verb::Build.to_string()];
    if tool == ContainerTool::Podman {
        push(&mut args, Flag::File, &dockerfile.display().to_string());
    }
    if let Some(tag) = tag {
        push_if(&mut args, Flag::Tag, tag);
    }
    args.push(Flag::Quiet.to_string());
    if tool == ContainerTool::Docker {
        let context = match dockerfile.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.display().to_string(),
            _ => ".".to_string(),
        };
        args.push(context);
    }
    args
}

pub fn image_remove_args(image: &str, options: ImageRemoveOptions) -> Vec<String> {
    let mut args = vec![Object::Image.to_string(), Verb::Remove.to_string(), image.to_string()];
    if options.force {
        args.push(Flag::Force.to_string());
    }
    args
}

pub fn volume_create_args(options: &VolumeCreateOptions) -> Vec<String> {
    let mut args = vec![Object::Volume.to_string(), Verb::Create.to_string()];
    if !options.name.is_empty() {
        args.push(options.name.clone());
    }
    push_if(&mut args, Flag::Driver, &options.driver);
    args
}

pub fn volume_remove_args(volume_id: &str, force: bool) -> Vec<String> {
    let mut args = vec![Object::Volume.to_string(), Verb::Remove.to_string(), volume_id.to_string()];
    if force {
        args.push(Flag::Force.to_string());
    }
    args
}

pub fn network_create_args(name: &str) -> Vec<String> {
    let mut args = vec![Object::Network.to_string(), Verb::Create.to_string()];
    if !name.is_empty() {
        args.push(name.to_string());
    }
    args
}

pub fn network_remove_args(network: &str) -> Vec<String> {
    vec![Object::Network.to_string(), Verb::Remove.to_string(), network.to_string()]
}

/// `version --format ...` with the template each engine understands
pub fn version_args(tool: ContainerTool) -> Vec<String> {
    let template = match tool {
        ContainerTool::Docker => "{{.Client.Version}}",
        ContainerTool::Podman => "{{.Version}}",
    };
    let mut args = vec![Verb::Version.to_string()];
    push(&mut args, Flag::Format, template);
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::PortBinding;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn position(args: &[String], value: &str) -> usize {
        args.iter().position(|a| a == value).unwrap()
    }

    #[test]
    fn test_podman_entrypoint_is_quoted_list() {
        let config = ContainerConfig::new("mq").entrypoint(["a", "b", "c"]);
        let mut args = Vec::new();
        container_config_args(&mut args, &config, ContainerTool::Podman);
        assert_eq!(args, strings(&["--entrypoint", r#"["a","b","c"]"#, "mq"]));
    }

    #[test]
    fn test_podman_entrypoint_escapes_quotes() {
        let entrypoint = strings(&["sh", "-c", r#"echo "hi" \ done"#]);
        let rendered = podman_entrypoint(&entrypoint);
        assert_eq!(rendered, r#"["sh","-c","echo \"hi\" \\ done"]"#);

        let decoded: Vec<String> = serde_json::from_str(&rendered).unwrap();
        assert_eq!(decoded, entrypoint);
    }

    #[test]
    fn test_docker_entrypoint_splits_after_image() {
        let config = ContainerConfig::new("mq").entrypoint(["a", "b", "c"]);
        let mut args = Vec::new();
        container_config_args(&mut args, &config, ContainerTool::Docker);
        assert_eq!(args, strings(&["--entrypoint", "a", "mq", "b", "c"]));
    }

    #[test]
    fn test_single_token_entrypoint() {
        let config = ContainerConfig::new("mq").entrypoint(["runmqserver"]);

        let mut args = Vec::new();
        container_config_args(&mut args, &config, ContainerTool::Podman);
        assert_eq!(args, strings(&["--entrypoint", r#"["runmqserver"]"#, "mq"]));

        let mut args = Vec::new();
        container_config_args(&mut args, &config, ContainerTool::Docker);
        assert_eq!(args, strings(&["--entrypoint", "runmqserver", "mq"]));
    }

    #[test]
    fn test_container_config_order() {
        let config = ContainerConfig::new("mq")
            .user("1001")
            .expose("1414/tcp")
            .hostname("qm1")
            .env("LICENSE", "accept");
        let mut args = Vec::new();
        container_config_args(&mut args, &config, ContainerTool::Docker);
        assert_eq!(
            args,
            strings(&[
                "--user", "1001", "--expose", "1414/tcp", "--hostname", "qm1", "--env",
                "LICENSE=accept", "mq",
            ])
        );
    }

    #[test]
    fn test_empty_config_emits_nothing() {
        let mut args = Vec::new();
        container_config_args(&mut args, &ContainerConfig::default(), ContainerTool::Podman);
        host_config_args(&mut args, &ContainerHostConfig::default());
        network_config_args(&mut args, &ContainerNetworkSettings::default());
        assert!(args.is_empty());
    }

    #[test]
    fn test_bind_renders_volume_flag() {
        let host = ContainerHostConfig {
            binds: strings(&["/h:/c"]),
            ..Default::default()
        };
        let mut args = Vec::new();
        host_config_args(&mut args, &host);
        assert_eq!(args, strings(&["--volume", "/h:/c"]));
    }

    #[test]
    fn test_host_config_order() {
        let host = ContainerHostConfig {
            binds: strings(&["/h:/c:z"]),
            port_bindings: vec![PortBinding::tcp(1414)],
            privileged: true,
            cap_add: strings(&["NET_ADMIN"]),
            cap_drop: strings(&["ALL"]),
            security_opt: strings(&["no-new-privileges"]),
            read_only_rootfs: true,
        };
        let mut args = Vec::new();
        host_config_args(&mut args, &host);
        assert_eq!(
            args,
            strings(&[
                "--volume",
                "/h:/c:z",
                "--publish",
                "0.0.0.0::1414/tcp",
                "--privileged",
                "--cap-add",
                "NET_ADMIN",
                "--cap-drop",
                "ALL",
                "--security-opt",
                "no-new-privileges",
                "--read-only",
            ])
        );
    }

    #[test]
    fn test_create_args_layout() {
        let config = ContainerConfig::new("mq").entrypoint(["a", "b"]);
        let host = ContainerHostConfig::default().bind("/h", "/c");
        let network = ContainerNetworkSettings {
            networks: strings(&["test"]),
        };
        let args = create_args(ContainerTool::Docker, &config, &host, &network, "qm");

        assert_eq!(&args[..3], &strings(&["create", "--name", "qm"])[..]);
        assert!(position(&args, "--volume") < position(&args, "--network"));
        assert!(position(&args, "--network") < position(&args, "--entrypoint"));
        assert_eq!(args.last().unwrap(), "b");
        assert_eq!(position(&args, "mq") + 1, position(&args, "b"));
    }

    #[test]
    fn test_wait_condition_per_tool() {
        assert_eq!(engine_condition(ContainerTool::Podman, "not-running"), "stopped");
        assert_eq!(engine_condition(ContainerTool::Podman, "running"), "running");
        assert_eq!(engine_condition(ContainerTool::Docker, "not-running"), "not-running");

        assert_eq!(
            wait_args(ContainerTool::Podman, "qm", "not-running"),
            strings(&["wait", "qm", "--condition", "stopped"])
        );
        assert_eq!(wait_args(ContainerTool::Docker, "qm", "not-running"), strings(&["wait", "qm"]));
    }

    #[test]
    fn test_kill_and_remove_args() {
        assert_eq!(kill_args("qm", None), strings(&["kill", "qm"]));
        assert_eq!(kill_args("qm", Some("")), strings(&["kill", "qm"]));
        assert_eq!(kill_args("qm", Some("SIGTERM")), strings(&["kill", "qm", "--signal", "SIGTERM"]));

        let options = ContainerRemoveOptions {
            force: true,
            remove_volumes: true,
        };
        assert_eq!(remove_args("qm", options), strings(&["rm", "qm", "--force", "--volumes"]));
        assert_eq!(remove_args("qm", ContainerRemoveOptions::default()), strings(&["rm", "qm"]));
    }

    #[test]
    fn test_exec_args() {
        let cmd = strings(&["bash", "-c", "dspmq"]);
        assert_eq!(exec_args("qm", None, &cmd), strings(&["exec", "qm", "bash", "-c", "dspmq"]));
        assert_eq!(
            exec_args("qm", Some("root"), &cmd),
            strings(&["exec", "--user", "root", "qm", "bash", "-c", "dspmq"])
        );
    }

    #[test]
    fn test_copy_and_port_args() {
        assert_eq!(
            copy_args("qm", "/run/termination-log", Path::new("/tmp/x")),
            strings(&["cp", "qm:/run/termination-log", "/tmp/x/."])
        );
        assert_eq!(
            copy_dir_args("qm", "/var/mqm/errors/", Path::new("/tmp/x")),
            strings(&["cp", "qm:/var/mqm/errors/", "/tmp/x/"])
        );
        assert_eq!(port_args("qm", 1414), strings(&["port", "qm", "1414"]));
    }

    #[test]
    fn test_inspect_args() {
        assert_eq!(inspect_args("qm", ""), strings(&["inspect", "qm"]));
        assert_eq!(
            image_inspect_args("mq", "{{.Config.Labels.version}}"),
            strings(&["image", "inspect", "mq", "--format", "{{.Config.Labels.version}}"])
        );
    }

    #[test]
    fn test_image_build_per_tool() {
        let dockerfile = Path::new("/src/test/Dockerfile");
        assert_eq!(
            image_build_args(ContainerTool::Podman, dockerfile, Some("mq-test")),
            strings(&["image", "build", "--file", "/src/test/Dockerfile", "--tag", "mq-test", "--quiet"])
        );
        assert_eq!(
            image_build_args(ContainerTool::Docker, dockerfile, Some("mq-test")),
            strings(&["image", "build", "--tag", "mq-test", "--quiet", "/src/test"])
        );
        assert_eq!(
            image_build_args(ContainerTool::Docker, Path::new("Dockerfile"), None),
            strings(&["image", "build", "--quiet", "."])
        );
    }

    #[test]
    fn test_volume_and_network_args() {
        let options = VolumeCreateOptions {
            name: "qmdata".to_string(),
            driver: "local".to_string(),
        };
        assert_eq!(
            volume_create_args(&options),
            strings(&["volume", "create", "qmdata", "--driver", "local"])
        );
        assert_eq!(volume_remove_args("qmdata", true), strings(&["volume", "rm", "qmdata", "--force"]));
        assert_eq!(network_create_args("test"), strings(&["network", "create", "test"]));
        assert_eq!(network_remove_args("abc"), strings(&["network", "rm", "abc"]));
        assert_eq!(
            image_remove_args("mq", ImageRemoveOptions { force: true }),
            strings(&["image", "rm", "mq", "--force"])
        );
    }

    #[test]
    fn test_version_args() {
        assert_eq!(
            version_args(ContainerTool::Docker),
            strings(&["version", "--format", "{{.Client.Version}}"])
        );
        assert_eq!(
            version_args(ContainerTool::Podman),
            strings(&["version", "--format", "{{.Version}}"])
        );
    }
}
