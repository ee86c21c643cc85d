//! Install state of the packages the host manages
//!
//! The bridge never installs anything itself. It only reads where a package
//! lives (its version prefix) and what it is doing right now (its stage)
//! before deciding whether a helper can be started.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// What a package is currently doing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PackageStage {
    /// Installed, nothing in progress
    #[default]
    Idle,
    /// A new version is staged and waits for a restart
    NeedRestart,
    /// Any other stage (checking, downloading, installing...)
    Other(String),
}

impl From<String> for PackageStage {
    fn from(s: String) -> Self {
        match s.as_str() {
            "idle" => PackageStage::Idle,
            "need-restart" => PackageStage::NeedRestart,
            _ => PackageStage::Other(s),
        }
    }
}

impl From<PackageStage> for String {
    fn from(stage: PackageStage) -> Self {
        stage.to_string()
    }
}

impl std::fmt::Display for PackageStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageStage::Idle => write!(f, "idle"),
            PackageStage::NeedRestart => write!(f, "need-restart"),
            PackageStage::Other(s) => write!(f, "{}", s),
        }
    }
}

/// State of one package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageState {
    pub stage: PackageStage,
    /// Directory of the installed version; `None` until first install
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_prefix: Option<PathBuf>,
    /// Version waiting to be activated, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_version: Option<String>,
}

/// Read access to package state
pub trait PackageRegistry: Send + Sync {
    /// Snapshot of the named package, `None` if it is not registered
    fn package(&self, name: &str) -> Option<PackageState>;
}

/// Concurrent in-memory registry, updated by whoever manages installs
#[derive(Debug, Default)]
pub struct PackageTable {
    packages: DashMap<String, PackageState>,
}

impl PackageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the `[packages]` section of the config file
    pub fn from_config(packages: &HashMap<String, PackageState>) -> Self {
        let table = Self::new();
        for (name, state) in packages {
            table.insert(name.clone(), state.clone());
        }
        table
    }

    pub fn insert(&self, name: impl Into<String>, state: PackageState) {
        self.packages.insert(name.into(), state);
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl PackageRegistry for PackageTable {
    fn package(&self, name: &str) -> Option<PackageState> {
        self.packages.get(name).map(|entry| entry.value().clone())
    }
}
