// Build harness over the external Solidity compiler.
// The compiler is an opaque collaborator: JSON in over stdin, JSON out
// over stdout. This module shapes the input, surfaces diagnostics, and
// extracts or persists the artifact. No retries; every failure halts the run.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    Io(String),
    Solc(String),
    Parse(String),
    /// Error-severity diagnostics from the compiler, formatted.
    Source(Vec<String>),
    MissingContract {
        file: String,
        name: String,
    },
}

// --- standard-JSON input ---

#[derive(Debug, Clone, Serialize)]
pub struct CompilerInput {
    pub language: String,
    pub sources: BTreeMap<String, SourceContent>,
    pub settings: CompilerSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceContent {
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompilerSettings {
    #[serde(rename = "outputSelection")]
    pub output_selection: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

/// Input selecting the ABI and deployable bytecode for every contract in
/// one source file. The persisted build additionally selects opcodes.
pub fn standard_input(file_name: &str, source: String, with_opcodes: bool) -> CompilerInput {
    let mut outputs = vec!["abi".to_string(), "evm.bytecode.object".to_string()];
    if with_opcodes {
        outputs.push("evm.bytecode.opcodes".to_string());
    }

    let mut sources = BTreeMap::new();
    sources.insert(file_name.to_string(), SourceContent { content: source });

    let mut all = BTreeMap::new();
    all.insert("*".to_string(), outputs);
    let mut output_selection = BTreeMap::new();
    output_selection.insert("*".to_string(), all);

    CompilerInput {
        language: "Solidity".to_string(),
        sources,
        settings: CompilerSettings { output_selection },
    }
}

// --- standard-JSON output ---

#[derive(Debug, Clone, Deserialize)]
pub struct CompilerOutput {
    #[serde(default)]
    pub errors: Vec<Diagnostic>,
    #[serde(default)]
    pub contracts: BTreeMap<String, BTreeMap<String, ContractEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Diagnostic {
    pub severity: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "formattedMessage", default)]
    pub formatted_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractEntry {
    pub abi: Value,
    pub evm: EvmArtifact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvmArtifact {
    pub bytecode: Bytecode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bytecode {
    /// Deployable bytecode as a hex string, no 0x prefix.
    pub object: String,
    #[serde(default)]
    pub opcodes: Option<String>,
}

/// Reject output carrying error-severity diagnostics (warnings pass).
pub fn ensure_no_errors(output: &CompilerOutput) -> Result<(), CompileError> {
    let errors: Vec<String> = output
        .errors
        .iter()
        .filter(|d| d.severity == "error")
        .map(|d| {
            d.formatted_message
                .clone()
                .unwrap_or_else(|| d.message.clone())
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CompileError::Source(errors))
    }
}

/// One contract's deployable pairing of interface and bytecode.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub contract: String,
    pub abi: Value,
    pub bytecode: String,
}

impl Artifact {
    /// Pull the named contract out of `contracts[file][name]`.
    pub fn from_output(
        output: &CompilerOutput,
        file: &str,
        name: &str,
    ) -> Result<Artifact, CompileError> {
        let entry = output
            .contracts
            .get(file)
            .and_then(|contracts| contracts.get(name))
            .ok_or_else(|| CompileError::MissingContract {
                file: file.to_string(),
                name: name.to_string(),
            })?;
        Ok(Artifact {
            contract: name.to_string(),
            abi: entry.abi.clone(),
            bytecode: entry.evm.bytecode.object.clone(),
        })
    }
}

/// Compile one source file and extract the contract named after it.
pub fn compile(source_path: &Path) -> Result<Artifact, CompileError> {
    let (file_name, stem) = source_names(source_path)?;
    let source = fs::read_to_string(source_path).map_err(|e| CompileError::Io(format!("{}", e)))?;

    let input = standard_input(&file_name, source, false);
    let (_, output) = run_solc(&input)?;
    ensure_no_errors(&output)?;
    Artifact::from_output(&output, &file_name, &stem)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
}

fn default_source_path() -> PathBuf {
    PathBuf::from("contract/Lottery.sol")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("contract/build")
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            build_dir: default_build_dir(),
        }
    }
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let data = fs::read(path).map_err(|e| CompileError::Io(format!("{}", e)))?;
        serde_json::from_slice(&data).map_err(|e| CompileError::Parse(format!("{}", e)))
    }
}

/// Compile with opcodes selected and persist the compiler's full output
/// (not just one contract) for downstream consumption.
pub fn build(config: &BuildConfig) -> Result<PathBuf, CompileError> {
    let (file_name, stem) = source_names(&config.source_path)?;
    let source =
        fs::read_to_string(&config.source_path).map_err(|e| CompileError::Io(format!("{}", e)))?;

    let input = standard_input(&file_name, source, true);
    let (raw, output) = run_solc(&input)?;
    ensure_no_errors(&output)?;
    // The expected contract must be present before anything is written.
    Artifact::from_output(&output, &file_name, &stem)?;

    persist_output(&raw, &config.build_dir, &stem)
}

/// Write the full compiler output as pretty JSON under `build_dir`.
/// Temp-file-then-rename so a crash never leaves a torn artifact.
pub fn persist_output(raw: &Value, build_dir: &Path, stem: &str) -> Result<PathBuf, CompileError> {
    fs::create_dir_all(build_dir).map_err(|e| CompileError::Io(format!("{}", e)))?;
    let out_path = build_dir.join(format!("{}.json", stem));
    let data = serde_json::to_vec_pretty(raw).map_err(|e| CompileError::Parse(format!("{}", e)))?;
    let tmp_path = out_path.with_extension("json.tmp");
    fs::write(&tmp_path, data).map_err(|e| CompileError::Io(format!("{}", e)))?;
    fs::rename(&tmp_path, &out_path).map_err(|e| CompileError::Io(format!("{}", e)))?;
    Ok(out_path)
}

fn run_solc(input: &CompilerInput) -> Result<(Value, CompilerOutput), CompileError> {
    let payload =
        serde_json::to_vec(input).map_err(|e| CompileError::Parse(format!("{}", e)))?;

    let mut child = Command::new("solc")
        .arg("--standard-json")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| CompileError::Solc(format!("spawn solc: {}", e)))?;

    {
        let stdin = child
            .stdin
            .as_mut()
            .ok_or_else(|| CompileError::Solc("solc stdin unavailable".to_string()))?;
        stdin
            .write_all(&payload)
            .map_err(|e| CompileError::Io(format!("{}", e)))?;
    }

    let done = child
        .wait_with_output()
        .map_err(|e| CompileError::Solc(format!("{}", e)))?;
    if !done.status.success() {
        return Err(CompileError::Solc(format!(
            "solc exited with {}",
            done.status
        )));
    }

    let raw: Value =
        serde_json::from_slice(&done.stdout).map_err(|e| CompileError::Parse(format!("{}", e)))?;
    let output: CompilerOutput =
        serde_json::from_value(raw.clone()).map_err(|e| CompileError::Parse(format!("{}", e)))?;
    Ok((raw, output))
}

fn source_names(path: &Path) -> Result<(String, String), CompileError> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| CompileError::Io(format!("bad source path {}", path.display())))?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| CompileError::Io(format!("bad source path {}", path.display())))?;
    Ok((file_name, stem))
}
