use lottery_core::client::{ProviderConfig, ProviderHandle};
use lottery_core::compiler::{
    ensure_no_errors, persist_output, standard_input, Artifact, BuildConfig, CompileError,
    CompilerOutput,
};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

const SOLC_OUTPUT: &str = r#"{
    "errors": [
        {
            "severity": "warning",
            "message": "Unused local variable.",
            "formattedMessage": "Warning: Unused local variable."
        }
    ],
    "contracts": {
        "Lottery.sol": {
            "Lottery": {
                "abi": [
                    {"inputs": [], "name": "enter", "outputs": [], "stateMutability": "payable", "type": "function"}
                ],
                "evm": {
                    "bytecode": {
                        "object": "6080604052348015600f57600080fd5b50603f80601d6000396000f3fe",
                        "opcodes": "PUSH1 0x80 PUSH1 0x40 MSTORE"
                    }
                }
            }
        }
    }
}"#;

fn parsed_output() -> CompilerOutput {
    serde_json::from_str(SOLC_OUTPUT).expect("parse compiler output")
}

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "lottery-artifacts-{}-{}",
        tag,
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[test]
fn extracts_the_named_contract() {
    let output = parsed_output();
    let artifact = Artifact::from_output(&output, "Lottery.sol", "Lottery").expect("artifact");

    assert_eq!(artifact.contract, "Lottery");
    assert!(!artifact.bytecode.starts_with("0x"));
    assert!(hex::decode(&artifact.bytecode).is_ok());
    assert!(artifact.abi.is_array());
}

#[test]
fn missing_contract_is_an_error() {
    let output = parsed_output();
    let err = Artifact::from_output(&output, "Lottery.sol", "Raffle").expect_err("missing key");
    assert_eq!(
        err,
        CompileError::MissingContract {
            file: "Lottery.sol".to_string(),
            name: "Raffle".to_string(),
        }
    );
}

#[test]
fn warnings_do_not_fail_the_build() {
    assert!(ensure_no_errors(&parsed_output()).is_ok());
}

#[test]
fn error_diagnostics_halt_the_build() {
    let broken: CompilerOutput = serde_json::from_str(
        r#"{"errors": [{"severity": "error", "message": "ParserError", "formattedMessage": "ParserError: expected ';'"}]}"#,
    )
    .expect("parse");

    let err = ensure_no_errors(&broken).expect_err("error diagnostics must fail");
    assert_eq!(
        err,
        CompileError::Source(vec!["ParserError: expected ';'".to_string()])
    );
}

#[test]
fn input_selects_abi_and_bytecode() {
    let input = standard_input("Lottery.sol", "contract Lottery {}".to_string(), false);
    let json = serde_json::to_value(&input).expect("serialize input");

    assert_eq!(json["language"], "Solidity");
    assert_eq!(
        json["sources"]["Lottery.sol"]["content"],
        "contract Lottery {}"
    );
    let selection = &json["settings"]["outputSelection"]["*"]["*"];
    assert_eq!(
        selection,
        &serde_json::json!(["abi", "evm.bytecode.object"])
    );

    let with_opcodes = standard_input("Lottery.sol", String::new(), true);
    let json = serde_json::to_value(&with_opcodes).expect("serialize input");
    assert_eq!(
        json["settings"]["outputSelection"]["*"]["*"],
        serde_json::json!(["abi", "evm.bytecode.object", "evm.bytecode.opcodes"])
    );
}

#[test]
fn persists_the_full_output() {
    let raw: Value = serde_json::from_str(SOLC_OUTPUT).expect("parse raw output");
    let dir = temp_dir("persist");

    let path = persist_output(&raw, &dir, "Lottery").expect("persist");
    assert_eq!(path, dir.join("Lottery.json"));

    let written: Value =
        serde_json::from_slice(&fs::read(&path).expect("read artifact")).expect("parse artifact");
    assert!(written.get("contracts").is_some());
    assert!(written.get("errors").is_some());

    fs::remove_dir_all(&dir).expect("cleanup");
}

#[test]
fn provider_handle_carries_the_configured_endpoint() {
    let handle = ProviderHandle::connect(&ProviderConfig::default());
    assert_eq!(handle.endpoint(), "http://127.0.0.1:8545");

    let config: ProviderConfig =
        serde_json::from_str(r#"{"endpoint": "http://10.0.0.5:8545"}"#).expect("parse config");
    assert_eq!(
        ProviderHandle::connect(&config).endpoint(),
        "http://10.0.0.5:8545"
    );
}

#[test]
fn build_config_defaults_and_load() {
    let config = BuildConfig::default();
    assert_eq!(config.source_path, PathBuf::from("contract/Lottery.sol"));
    assert_eq!(config.build_dir, PathBuf::from("contract/build"));

    let dir = temp_dir("config");
    let path = dir.join("build.json");
    fs::write(&path, r#"{"source_path": "demos/Raffle.sol"}"#).expect("write config");

    let loaded = BuildConfig::load(&path).expect("load config");
    assert_eq!(loaded.source_path, PathBuf::from("demos/Raffle.sol"));
    assert_eq!(loaded.build_dir, PathBuf::from("contract/build"));

    fs::remove_dir_all(&dir).expect("cleanup");
}
