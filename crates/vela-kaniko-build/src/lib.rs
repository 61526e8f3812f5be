//! Vela kaniko plugin core
//!
//! This crate validates the build, image, registry and repository
//! configuration of the plugin, renders the argument list for the kaniko
//! executor, writes the registry credential file, and runs the executor.

pub mod auth;
pub mod build;
pub mod command;
pub mod error;
pub mod executor;
pub mod image;
pub mod label;
pub mod plugin;
pub mod registry;
pub mod repo;
pub mod verbosity;

pub use auth::{DockerConfig, RegistryAuth};
pub use build::{BuildInfo, SnapshotMode};
pub use command::{CommandCompiler, FlagSet};
pub use error::{BuildError, BuildResult, ErrorKind};
pub use executor::Executor;
pub use image::ImageInfo;
pub use label::LabelInfo;
pub use plugin::Plugin;
pub use registry::RegistryInfo;
pub use repo::{Compression, RepositoryInfo};
pub use verbosity::Verbosity;
