/*
 * ==========================================================================
 * VaultScript — Sandboxed Embedded Scripting Runtime
 * ==========================================================================
 *
 * This file is part of the VaultScript runtime.
 *
 * VaultScript is dual-licensed under the terms of:
 *   - The MIT License
 *   - The Apache License, Version 2.0
 *
 * You may choose either license to govern your use of this software.
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under these licenses is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * ==========================================================================
 */

//! Binds host-supplied adapters into the script global namespace and
//! attaches per-method contracts — Component 5 of the core.

pub mod context;
pub mod contract;
pub mod job_queue;

pub use contract::Contract;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::cancellation::CancellationHandle;
use crate::error::{ScriptError, ScriptResult};
use crate::span::Span;
use crate::value::{Builtin, Value};

/// Carried into `CapabilityAdapter::bind` — the per-call context a
/// capability needs to honor cancellation and report errors.
#[derive(Clone)]
pub struct CapabilityBinding {
    pub cancel: CancellationHandle,
}

/// A host-supplied adapter. `bind` returns the globals it contributes;
/// `capability_contracts` optionally attaches argument/return validation to
/// its builtins by name.
pub trait CapabilityAdapter: Send + Sync {
    fn bind(&self, binding: &CapabilityBinding) -> ScriptResult<HashMap<String, Value>>;

    fn capability_contracts(&self) -> HashMap<String, Contract> {
        HashMap::new()
    }
}

/// Resolved contracts keyed by the bound builtin's identity, so the
/// evaluator can look one up in O(1) when dispatching a call.
#[derive(Default)]
pub struct ContractTable {
    by_builtin_ptr: HashMap<usize, Contract>,
}

impl ContractTable {
    pub fn lookup(&self, builtin: &Arc<Builtin>) -> Option<&Contract> {
        self.by_builtin_ptr.get(&(Arc::as_ptr(builtin) as *const () as usize))
    }
}

/// Binds every adapter's globals, rejecting a duplicate contract (or
/// global) name across adapters as a setup failure.
pub fn bind_capabilities(
    adapters: &[Arc<dyn CapabilityAdapter>],
    binding: &CapabilityBinding,
    span: Span,
) -> ScriptResult<(HashMap<String, Value>, HashMap<String, Contract>)> {
    let mut contracts_by_name: HashMap<String, Contract> = HashMap::new();
    for adapter in adapters {
        for (name, contract) in adapter.capability_contracts() {
            if contracts_by_name.contains_key(&name) {
                return Err(ScriptError::capability(
                    format!("duplicate contract for method {name}"),
                    span,
                ));
            }
            contracts_by_name.insert(name, contract);
        }
    }

    let mut globals: HashMap<String, Value> = HashMap::new();
    for adapter in adapters {
        let bound = adapter.bind(binding)?;
        for (name, value) in bound {
            if globals.contains_key(&name) {
                return Err(ScriptError::capability(
                    format!("duplicate capability global: {name}"),
                    span,
                ));
            }
            debug!(global = name, "bound capability global");
            globals.insert(name, value);
        }
    }

    Ok((globals, contracts_by_name))
}

/// Scans a (rebound) globals graph for builtins matching a contract name,
/// attaching the first match found and ignoring builtins already claimed.
pub fn attach_contracts(
    globals: &HashMap<String, Value>,
    contracts_by_name: &HashMap<String, Contract>,
) -> ContractTable {
    let mut table = ContractTable::default();
    if contracts_by_name.is_empty() {
        return table;
    }
    let mut visited_containers: HashSet<usize> = HashSet::new();
    let mut claimed: HashSet<usize> = HashSet::new();
    for value in globals.values() {
        scan(value, contracts_by_name, &mut table, &mut visited_containers, &mut claimed);
    }
    table
}

fn scan(
    value: &Value,
    contracts_by_name: &HashMap<String, Contract>,
    table: &mut ContractTable,
    visited_containers: &mut HashSet<usize>,
    claimed: &mut HashSet<usize>,
) {
    match value {
        Value::Builtin(b) => {
            let id = Arc::as_ptr(b) as *const () as usize;
            if claimed.contains(&id) {
                return;
            }
            if let Some(contract) = contracts_by_name.get(&b.name) {
                table.by_builtin_ptr.insert(id, contract.clone());
                claimed.insert(id);
            }
        }
        Value::Array(arr) => {
            let id = Arc::as_ptr(arr) as *const () as usize;
            if !visited_containers.insert(id) {
                return;
            }
            for item in arr.lock().unwrap().iter() {
                scan(item, contracts_by_name, table, visited_containers, claimed);
            }
        }
        Value::Hash(map) | Value::Object(map) => {
            let id = Arc::as_ptr(map) as *const () as usize;
            if !visited_containers.insert(id) {
                return;
            }
            for item in map.lock().unwrap().values() {
                scan(item, contracts_by_name, table, visited_containers, claimed);
            }
        }
        _ => {}
    }
}
