//! chronoflow-deploy: create and link the three ChronoFlow contracts.
//!
//! Deployment is split into a plan and a run. [`module::ModuleBuilder`]
//! declares contract creations and calls, wiring them together with
//! [`module::ContractFuture`] references. [`executor::Executor`] then resolves
//! those references one step at a time through a [`executor::Deployer`].
//!
//! [`deploy_chronoflow`] runs the fixed ChronoFlow plan; [`deploy_network`]
//! does the same against a configured network over HTTP.

pub mod artifacts;
pub mod chronoflow;
pub mod error;
pub mod executor;
pub mod module;

pub use artifacts::{Artifact, ArtifactStore};
pub use chronoflow::{
    chronoflow_module, default_addresses_path, deploy_chronoflow, deploy_network, verify_links,
    ChronoFlowDeployment, ChronoFlowModule, MODULE_NAME,
};
pub use error::{ArtifactError, Created, DeployError, StepError};
pub use executor::{Deployer, DeploymentResult, Executor, RpcDeployer};
pub use module::{Arg, ContractFuture, DeploymentModule, ModuleBuilder, Step};
