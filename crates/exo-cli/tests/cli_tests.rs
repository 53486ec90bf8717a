//! CLI integration tests for assetcli
//!
//! Tests command parsing, config handling and the failures that happen
//! before anything reaches a node.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

const KEY: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";
const STAKER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
const ASSET: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";
// Nothing listens here
const DEAD_RPC: &str = "http://127.0.0.1:1";

/// Helper to run the CLI with arguments against an isolated config file
fn run_assetcli(config: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_assetcli"))
        .args(args)
        .env("EXO_CLI_CONFIG", config)
        .env_remove("EXO_PRIVATE_KEY")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn temp_config() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    (dir, path)
}

fn json_stdout(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

// ==================== Help & Version Tests ====================

#[test]
fn test_cli_help_lists_operations() {
    let (_dir, config) = temp_config();
    let output = run_assetcli(&config, &["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in [
        "deposit",
        "deposit-nst",
        "withdraw",
        "withdraw-nst",
        "register-client-chain",
        "register-token",
        "update-token",
        "delegate",
        "undelegate",
        "self-delegate",
        "dissociate",
        "claim-reward",
        "compound-reward",
        "query",
        "config",
    ] {
        assert!(stdout.contains(command), "help lacks {}", command);
    }
}

#[test]
fn test_cli_version() {
    let (_dir, config) = temp_config();
    let output = run_assetcli(&config, &["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("assetcli"));
}

#[test]
fn test_cli_query_help() {
    let (_dir, config) = temp_config();
    let output = run_assetcli(&config, &["query", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("client-chains"));
    assert!(stdout.contains("is-registered-client-chain"));
}

#[test]
fn test_missing_required_flag() {
    let (_dir, config) = temp_config();
    let output = run_assetcli(&config, &["delegate", "--staker", STAKER]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--operator"));
}

// ==================== Config Tests ====================

#[test]
fn test_config_show_defaults() {
    let (_dir, config) = temp_config();
    let output = run_assetcli(&config, &["--json", "config", "--show"]);
    assert!(output.status.success());
    let value = json_stdout(&output);
    assert_eq!(value["rpc_url"], "http://localhost:8545");
    assert_eq!(value["network_id"], 101);
    assert_eq!(value["gas_limit"], 500000);
    assert_eq!(value["simulation"], "warn");
    assert!(value.get("default_asset_id").is_none());
}

#[test]
fn test_config_set_and_show() {
    let (_dir, config) = temp_config();
    let output = run_assetcli(
        &config,
        &[
            "config",
            "--set-rpc",
            "http://node.example:8545",
            "--set-network-id",
            "40161",
            "--set-asset",
            ASSET,
        ],
    );
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Configuration saved"));

    let saved = std::fs::read_to_string(&config).unwrap();
    assert!(saved.contains("node.example"));
    assert!(!saved.contains("private"));

    let value = json_stdout(&run_assetcli(&config, &["--json", "config", "--show"]));
    assert_eq!(value["rpc_url"], "http://node.example:8545");
    assert_eq!(value["network_id"], 40161);
    assert_eq!(value["default_asset_id"], ASSET);
}

#[test]
fn test_config_rejects_bad_default_asset() {
    let (_dir, config) = temp_config();
    let output = run_assetcli(&config, &["config", "--set-asset", "0x1234"]);
    assert!(!output.status.success());
    assert!(!config.exists());
}

#[test]
fn test_malformed_config_file() {
    let (_dir, config) = temp_config();
    std::fs::write(&config, "network_id = \"many\"").unwrap();
    let output = run_assetcli(&config, &["config", "--show"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Config error"));
}

// ==================== Pre-network Failure Tests ====================

#[test]
fn test_missing_private_key() {
    let (_dir, config) = temp_config();
    let output = run_assetcli(
        &config,
        &[
            "--json", "--rpc-url", DEAD_RPC, "deposit", "--staker", STAKER, "--asset", ASSET,
            "--amount", "1000",
        ],
    );
    assert!(!output.status.success());
    let value = json_stdout(&output);
    assert_eq!(value["success"], false);
    assert!(value["error"].as_str().unwrap().contains("private key"));
}

#[test]
fn test_bad_identifier_fails_before_network() {
    let (_dir, config) = temp_config();
    let output = run_assetcli(
        &config,
        &[
            "--json",
            "--rpc-url",
            DEAD_RPC,
            "--private-key",
            KEY,
            "deposit",
            "--staker",
            STAKER,
            "--asset",
            "0x1234",
            "--amount",
            "1000",
        ],
    );
    assert!(!output.status.success());
    let value = json_stdout(&output);
    assert!(value["error"].as_str().unwrap().contains("invalid input"));
    assert_eq!(value["stage"], "idle");
    assert!(value.get("tx_hash").is_none());
}

#[test]
fn test_asset_required_without_default() {
    let (_dir, config) = temp_config();
    let output = run_assetcli(
        &config,
        &[
            "--private-key", KEY, "claim-reward", "--withdrawer", STAKER, "--amount", "1",
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("default_asset_id"));
}

#[test]
fn test_unreachable_node_reports_connection_stage() {
    let (_dir, config) = temp_config();
    let output = run_assetcli(
        &config,
        &[
            "--json",
            "--rpc-url",
            DEAD_RPC,
            "--private-key",
            KEY,
            "undelegate",
            "--staker",
            STAKER,
            "--asset",
            ASSET,
            "--operator",
            "exo1qqqsyqcyq5rqwzqfpg9scrgwpugpzysn7hzdtn",
            "--amount",
            "10",
            "--instant",
        ],
    );
    assert!(!output.status.success());
    let value = json_stdout(&output);
    assert_eq!(value["stage"], "connected");
    assert_eq!(
        value["destination"],
        "0x0000000000000000000000000000000000000805"
    );
    let error = value["error"].as_str().unwrap();
    assert!(error.contains("chain id"));
    assert!(error.contains("0x0000000000000000000000000000000000000805"));
}

#[test]
fn test_shared_precompile_override_rejected() {
    let (_dir, config) = temp_config();
    std::fs::write(
        &config,
        "reward_precompile = \"0x0000000000000000000000000000000000000804\"",
    )
    .unwrap();
    let output = run_assetcli(
        &config,
        &[
            "--private-key", KEY, "claim-reward", "--withdrawer", STAKER, "--asset", ASSET,
            "--amount", "1",
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("share destination"));
}

#[test]
fn test_unsupported_schema_version_in_config() {
    let (_dir, config) = temp_config();
    std::fs::write(&config, "delegation_schema = \"v3\"").unwrap();
    let output = run_assetcli(
        &config,
        &[
            "--private-key", KEY, "dissociate", "--staker", STAKER,
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("delegation_schema"));
}
