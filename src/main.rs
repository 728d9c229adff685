//! ctharness - container engine harness
//!
//! Command-line front end over the engine client and harness helpers.

use clap::{Parser, Subcommand};
use ctharness::container::{
    ContainerConfig, ContainerHostConfig, ContainerLogsOptions, ContainerNetworkSettings,
    ContainerRemoveOptions, ContainerStartOptions, ImageRemoveOptions, NetworkCreateOptions,
    PortBinding, VolumeCreateOptions,
};
use ctharness::engine::CONTAINER_STATE_NOT_RUNNING;
use ctharness::error::Result;
use ctharness::harness;
use ctharness::{ContainerClient, ContainerInterface, EngineSettings};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// ctharness - drive docker or podman for container tests
#[derive(Parser)]
#[command(name = "ctharness")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Container engine harness for queue manager image tests", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Container tool to drive (docker or podman)
    #[arg(long, global = true)]
    tool: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a container
    Create {
        /// Image to use
        image: String,
        /// Container name
        #[arg(long)]
        name: Option<String>,
        /// Environment variable (KEY=VALUE)
        #[arg(short, long)]
        env: Vec<String>,
        /// Bind mount (host:container)
        #[arg(short, long)]
        volume: Vec<String>,
        /// Publish a container TCP port on a random host port
        #[arg(short, long)]
        publish: Vec<u16>,
        /// Network to connect to
        #[arg(long)]
        network: Vec<String>,
        /// User to run as
        #[arg(short, long)]
        user: Option<String>,
        /// Container hostname
        #[arg(long)]
        hostname: Option<String>,
        /// Entrypoint and arguments
        #[arg(trailing_var_arg = true)]
        entrypoint: Vec<String>,
    },

    /// Start a container
    Start {
        /// Container ID or name
        container: String,
    },

    /// Stop a container
    Stop {
        /// Container ID or name
        container: String,
        /// Timeout in seconds
        #[arg(short, long, default_value = "10")]
        timeout: u64,
    },

    /// Send a signal to a container
    Kill {
        /// Container ID or name
        container: String,
        /// Signal to send
        #[arg(short, long)]
        signal: Option<String>,
    },

    /// Remove a container
    Rm {
        /// Container ID or name
        container: String,
        /// Remove a running container
        #[arg(short, long)]
        force: bool,
        /// Remove anonymous volumes
        #[arg(short, long)]
        volumes: bool,
    },

    /// Wait for a container and print its exit code
    Wait {
        /// Container ID or name
        container: String,
        /// Condition to wait for
        #[arg(long, default_value = CONTAINER_STATE_NOT_RUNNING)]
        condition: String,
        /// Timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Run a command in a running container
    Exec {
        /// Container ID or name
        container: String,
        /// User to run as
        #[arg(short, long)]
        user: Option<String>,
        /// Timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
        /// Command to run
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },

    /// Print container logs
    Logs {
        /// Container ID or name
        container: String,
        /// Summarize JSON log lines
        #[arg(short, long)]
        summarize: bool,
    },

    /// Inspect a container
    Inspect {
        /// Container ID or name
        container: String,
        /// Go template to render instead of the JSON details
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Print the host port a container port is published on
    Port {
        /// Container ID or name
        container: String,
        /// Container port
        port: u16,
    },

    /// Print a container's IP address
    Ip {
        /// Container ID or name
        container: String,
    },

    /// Copy a file out of a container
    Cp {
        /// Container ID or name
        container: String,
        /// Path inside the container
        path: String,
        /// Destination file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the container tool version
    Version,

    /// Print the version label of an image
    MqVersion {
        /// Image name or ID
        image: String,
    },

    /// Image management
    Image {
        #[command(subcommand)]
        command: ImageCommands,
    },

    /// Volume management
    Volume {
        #[command(subcommand)]
        command: VolumeCommands,
    },

    /// Network management
    Network {
        #[command(subcommand)]
        command: NetworkCommands,
    },

    /// Wait for the queue manager in a container to become ready
    Ready {
        /// Container ID or name
        container: String,
        /// Timeout in seconds
        #[arg(short, long, default_value = "240")]
        timeout: u64,
    },
}

#[derive(Subcommand)]
enum ImageCommands {
    /// Build an image from a Dockerfile
    Build {
        /// Path to the Dockerfile
        #[arg(default_value = "Dockerfile")]
        dockerfile: PathBuf,
        /// Tag for the image
        #[arg(short, long)]
        tag: Option<String>,
    },
    /// Remove an image
    Rm {
        /// Image name or ID
        image: String,
        /// Force removal
        #[arg(short, long)]
        force: bool,
    },
    /// Inspect an image with a Go template
    Inspect {
        /// Image name or ID
        image: String,
        /// Go template
        #[arg(short, long, default_value = "{{.Id}}")]
        format: String,
    },
}

#[derive(Subcommand)]
enum VolumeCommands {
    /// Create a volume
    Create {
        /// Volume name
        name: String,
        /// Volume driver
        #[arg(long, default_value = "")]
        driver: String,
    },
    /// Remove a volume
    Rm {
        /// Volume name
        name: String,
        /// Force removal
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum NetworkCommands {
    /// Create a network
    Create {
        /// Network name
        name: Option<String>,
    },
    /// Remove a network
    Rm {
        /// Network name or ID
        network: String,
    },
}

fn seconds(value: Option<u64>) -> Option<Duration> {
    value.map(Duration::from_secs)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut settings = EngineSettings::load()?;
    if let Some(tool) = &cli.tool {
        settings.tool = tool.parse()?;
    }
    let client = ContainerClient::from_settings(&settings).await;

    match cli.command {
        Commands::Create {
            image,
            name,
            env,
            volume,
            publish,
            network,
            user,
            hostname,
            entrypoint,
        } => {
            let container_name = name.unwrap_or_else(|| {
                format!("ctharness-{}", &uuid::Uuid::new_v4().to_string()[..8])
            });

            let mut config = ContainerConfig::new(&image).entrypoint(entrypoint);
            config.env = env;
            if let Some(user) = user {
                config = config.user(&user);
            }
            if let Some(hostname) = hostname {
                config = config.hostname(&hostname);
            }

            let mut host_config = ContainerHostConfig {
                binds: volume,
                ..Default::default()
            };
            for port in publish {
                host_config = host_config.publish(PortBinding::tcp(port));
            }
            let networking_config = ContainerNetworkSettings { networks: network };

            let id = client
                .container_create(&config, &host_config, &networking_config, &container_name)
                .await?;
            println!("{}", id);
        }

        Commands::Start { container } => {
            client
                .container_start(&container, ContainerStartOptions::default())
                .await?;
            println!("{}", container);
        }

        Commands::Stop { container, timeout } => {
            client
                .container_stop(&container, Some(Duration::from_secs(timeout)))
                .await?;
            println!("{}", container);
        }

        Commands::Kill { container, signal } => {
            client.container_kill(&container, signal.as_deref()).await?;
            println!("{}", container);
        }

        Commands::Rm {
            container,
            force,
            volumes,
        } => {
            let options = ContainerRemoveOptions {
                force,
                remove_volumes: volumes,
            };
            client.container_remove(&container, options).await?;
            println!("{}", container);
        }

        Commands::Wait {
            container,
            condition,
            timeout,
        } => {
            let code = client
                .container_wait(&container, &condition, seconds(timeout))
                .await
                .await?;
            println!("{}", code);
        }

        Commands::Exec {
            container,
            user,
            timeout,
            command,
        } => {
            let result = client
                .exec_container(&container, user.as_deref(), &command, seconds(timeout))
                .await?;
            print!("{}", result.output);
            if !result.success() {
                std::process::exit(result.exit_code);
            }
        }

        Commands::Logs {
            container,
            summarize,
        } => {
            let logs = client
                .get_container_logs(&container, ContainerLogsOptions::default(), None)
                .await?;
            if summarize {
                print!("{}", harness::summarize_json_logs(&logs));
            } else {
                print!("{}", logs);
            }
        }

        Commands::Inspect { container, format } => match format {
            Some(format) => {
                println!("{}", client.container_inspect_with_format(&format, &container).await?);
            }
            None => {
                let details = client.container_inspect(&container).await?;
                println!("{}", serde_json::to_string_pretty(&details)?);
            }
        },

        Commands::Port { container, port } => {
            println!("{}", client.get_container_port(&container, port).await?);
        }

        Commands::Ip { container } => {
            println!("{}", client.get_container_ip_address(&container).await?);
        }

        Commands::Cp {
            container,
            path,
            output,
        } => {
            let data = client.copy_from_container(&container, &path).await?;
            match output {
                Some(dest) => tokio::fs::write(&dest, &data).await?,
                None => std::io::stdout().write_all(&data)?,
            }
        }

        Commands::Version => {
            println!("{} {}", client.tool(), client.version());
        }

        Commands::MqVersion { image } => {
            println!("{}", client.get_mq_version(&image).await?);
        }

        Commands::Image { command } => match command {
            ImageCommands::Build { dockerfile, tag } => {
                let id = client.image_build(&dockerfile, tag.as_deref()).await?;
                println!("{}", id);
            }
            ImageCommands::Rm { image, force } => {
                client
                    .image_remove(&image, ImageRemoveOptions { force })
                    .await?;
                println!("{}", image);
            }
            ImageCommands::Inspect { image, format } => {
                println!("{}", client.image_inspect_with_format(&format, &image).await?);
            }
        },

        Commands::Volume { command } => match command {
            VolumeCommands::Create { name, driver } => {
                let id = client
                    .volume_create(&VolumeCreateOptions { name, driver })
                    .await?;
                println!("{}", id);
            }
            VolumeCommands::Rm { name, force } => {
                client.volume_remove(&name, force).await?;
                println!("{}", name);
            }
        },

        Commands::Network { command } => match command {
            NetworkCommands::Create { name } => {
                let name = name.unwrap_or_else(|| {
                    format!("ctharness-{}", &uuid::Uuid::new_v4().to_string()[..8])
                });
                let id = client
                    .network_create(&name, NetworkCreateOptions::default())
                    .await?;
                println!("{}", id);
            }
            NetworkCommands::Rm { network } => {
                client.network_remove(&network).await?;
                println!("{}", network);
            }
        },

        Commands::Ready { container, timeout } => {
            let readiness =
                harness::wait_for_ready(&client, &container, Duration::from_secs(timeout)).await?;
            println!("{:?}", readiness);
        }
    }

    Ok(())
}
