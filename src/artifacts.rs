use crate::domain::errors::HarnessError;
use anyhow::{Context, Result};
use ethers::abi::Abi;
use ethers::prelude::{ContractFactory, Middleware};
use ethers::types::Bytes;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

/// A compiled contract in Hardhat's artifact layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
    #[serde(skip)]
    pub path: PathBuf,
}

impl Artifact {
    /// `path/to/Source.sol:Name`, the form explorers expect.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    pub fn factory<M: Middleware>(
        &self,
        client: Arc<M>,
    ) -> Result<ContractFactory<M>, HarnessError> {
        if self.bytecode.is_empty() {
            return Err(HarnessError::Artifact(format!(
                "{} has no creation bytecode (abstract contract or interface?)",
                self.contract_name
            )));
        }
        Ok(ContractFactory::new(
            self.abi.clone(),
            self.bytecode.clone(),
            client,
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: String,
}

/// Compiler run that produced an artifact.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub solc_long_version: String,
    /// Standard JSON input handed to solc.
    pub input: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Looks a contract up by bare name anywhere under the artifacts root.
    pub fn find(&self, name: &str) -> Result<Artifact> {
        let file_name = format!("{}.json", name);
        let mut matches = Vec::new();
        collect_matches(&self.root, &file_name, &mut matches).with_context(|| {
            format!("scan artifacts directory {}", self.root.display())
        })?;

        let path = match matches.len() {
            0 => {
                return Err(HarnessError::Artifact(format!(
                    "no artifact for {} under {} (compile the contracts first)",
                    name,
                    self.root.display()
                ))
                .into())
            }
            1 => matches.remove(0),
            _ => {
                let found: Vec<String> = matches.iter().map(|p| p.display().to_string()).collect();
                return Err(HarnessError::Artifact(format!(
                    "{} is ambiguous: {}",
                    name,
                    found.join(", ")
                ))
                .into());
            }
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read artifact {}", path.display()))?;
        let mut artifact: Artifact = serde_json::from_str(&raw)
            .with_context(|| format!("parse artifact {}", path.display()))?;
        artifact.path = path;
        Ok(artifact)
    }

    /// Follows the artifact's `.dbg.json` to its build-info file.
    pub fn build_info(&self, artifact: &Artifact) -> Result<BuildInfo> {
        let dbg_path = artifact.path.with_extension("dbg.json");
        let raw = fs::read_to_string(&dbg_path)
            .with_context(|| format!("read debug file {}", dbg_path.display()))?;
        let dbg: DebugFile = serde_json::from_str(&raw).context("parse debug file")?;

        let dir = dbg_path.parent().unwrap_or(&self.root);
        let build_info_path = dir.join(&dbg.build_info);
        let raw = fs::read_to_string(&build_info_path)
            .with_context(|| format!("read build info {}", build_info_path.display()))?;
        serde_json::from_str(&raw).context("parse build info")
    }
}

fn collect_matches(dir: &Path, file_name: &str, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            if entry.file_name() == "build-info" {
                continue;
            }
            collect_matches(&path, file_name, out)?;
        } else if entry.file_name() == file_name {
            out.push(path);
        }
    }
    Ok(())
}
