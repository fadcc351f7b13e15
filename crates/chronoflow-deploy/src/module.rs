//! Declarative deployment plans.
//!
//! A [`ModuleBuilder`] records contract creations and calls without touching
//! the network. Each creation returns a [`ContractFuture`], a reference to an
//! address that only exists once that step has run; passing it as an argument
//! to a later step is how dependencies are expressed.
//!
//! ```rust
//! use chronoflow_deploy::module::{Arg, ModuleBuilder};
//! use chronoflow_core::{Address, ContractKind};
//!
//! let mut m = ModuleBuilder::new("Example");
//! let nft = m.contract(ContractKind::StreamNft, [Arg::from(Address::ZERO)]);
//! let core = m.contract(ContractKind::Core, [Arg::from(&nft)]);
//! m.call(&nft, "setCoreContract", [Arg::from(&core)]);
//! let module = m.build().unwrap();
//! assert_eq!(module.steps().len(), 3);
//! ```

use alloy_primitives::Address;
use chronoflow_core::{ContractKind, DynSolValue, Interface};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::DeployError;

/// Placeholder for the address of a contract created by an earlier step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractFuture {
    id: String,
    kind: ContractKind,
    step: usize,
}

impl ContractFuture {
    /// `"<Module>#<Contract>"`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ContractKind {
        self.kind
    }

    /// Index of the step that resolves this future.
    pub fn step(&self) -> usize {
        self.step
    }
}

impl fmt::Display for ContractFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// A constructor or call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(DynSolValue),
    /// Resolved to the contract's address when the step runs.
    Contract(ContractFuture),
}

impl From<DynSolValue> for Arg {
    fn from(v: DynSolValue) -> Self {
        Self::Value(v)
    }
}

impl From<Address> for Arg {
    fn from(a: Address) -> Self {
        Self::Value(DynSolValue::Address(a))
    }
}

impl From<&ContractFuture> for Arg {
    fn from(f: &ContractFuture) -> Self {
        Self::Contract(f.clone())
    }
}

#[derive(Debug, Clone)]
pub enum Step {
    Deploy {
        future: ContractFuture,
        args: Vec<Arg>,
    },
    Call {
        /// `"<Module>#<Contract>.<function>"`.
        id: String,
        target: ContractFuture,
        function: String,
        args: Vec<Arg>,
    },
}

impl Step {
    pub fn id(&self) -> &str {
        match self {
            Self::Deploy { future, .. } => future.id(),
            Self::Call { id, .. } => id,
        }
    }

    pub fn args(&self) -> &[Arg] {
        match self {
            Self::Deploy { args, .. } | Self::Call { args, .. } => args,
        }
    }

    /// Futures this step reads, including a call's target.
    pub fn dependencies(&self) -> impl Iterator<Item = &ContractFuture> {
        let target = match self {
            Self::Call { target, .. } => Some(target),
            Self::Deploy { .. } => None,
        };
        target.into_iter().chain(self.args().iter().filter_map(|a| match a {
            Arg::Contract(f) => Some(f),
            Arg::Value(_) => None,
        }))
    }
}

/// Records steps in the order they will execute.
#[derive(Debug)]
pub struct ModuleBuilder {
    name: String,
    steps: Vec<Step>,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Create `kind` with constructor `args`.
    pub fn contract(
        &mut self,
        kind: ContractKind,
        args: impl IntoIterator<Item = Arg>,
    ) -> ContractFuture {
        let future = ContractFuture {
            id: format!("{}#{}", self.name, kind.name()),
            kind,
            step: self.steps.len(),
        };
        self.steps.push(Step::Deploy {
            future: future.clone(),
            args: args.into_iter().collect(),
        });
        future
    }

    /// Call `function` on the contract behind `target`.
    pub fn call(
        &mut self,
        target: &ContractFuture,
        function: impl Into<String>,
        args: impl IntoIterator<Item = Arg>,
    ) {
        let function = function.into();
        self.steps.push(Step::Call {
            id: format!("{}.{function}", target.id()),
            target: target.clone(),
            function,
            args: args.into_iter().collect(),
        });
    }

    /// Check the plan and freeze it.
    ///
    /// Every referenced future must come from a creation step of this module
    /// that precedes the referencing step, and each step must match its
    /// interface's constructor or function arity.
    pub fn build(self) -> Result<DeploymentModule, DeployError> {
        let mut seen = BTreeSet::new();
        for (index, step) in self.steps.iter().enumerate() {
            if !seen.insert(step.id().to_string()) {
                return Err(DeployError::DuplicateFuture(step.id().to_string()));
            }
            for dep in step.dependencies() {
                let declared = self.steps.get(dep.step).is_some_and(
                    |s| matches!(s, Step::Deploy { future, .. } if future == dep),
                );
                if !declared || dep.step >= index {
                    return Err(DeployError::UnresolvedFuture {
                        step: step.id().to_string(),
                        future: dep.id().to_string(),
                    });
                }
            }
            check_arity(step)?;
        }
        Ok(DeploymentModule {
            name: self.name,
            steps: self.steps,
        })
    }
}

fn check_arity(step: &Step) -> Result<(), DeployError> {
    let invalid = |reason: String| DeployError::InvalidStep {
        step: step.id().to_string(),
        reason,
    };
    match step {
        Step::Deploy { future, args } => {
            let expected = Interface::get(future.kind())
                .constructor()
                .map_or(0, |c| c.inputs.len());
            if expected != args.len() {
                return Err(invalid(format!(
                    "constructor takes {expected} arguments, got {}",
                    args.len()
                )));
            }
        }
        Step::Call {
            target,
            function,
            args,
            ..
        } => {
            Interface::get(target.kind())
                .function(function, args.len())
                .map_err(|e| invalid(e.to_string()))?;
        }
    }
    Ok(())
}

/// A checked, ordered deployment plan.
#[derive(Debug, Clone)]
pub struct DeploymentModule {
    name: String,
    steps: Vec<Step>,
}

impl DeploymentModule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Creation steps only.
    pub fn futures(&self) -> impl Iterator<Item = &ContractFuture> {
        self.steps.iter().filter_map(|s| match s {
            Step::Deploy { future, .. } => Some(future),
            Step::Call { .. } => None,
        })
    }
}
