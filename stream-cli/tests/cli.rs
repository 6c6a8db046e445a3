use std::fs;

use anyhow::Context;
use anyhow::Result;
use assert_cmd::Command;
use predicates::str::contains;
use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

/// Command isolated from the user's `~/.songsmith` and `RUST_LOG`.
fn songsmith_stream(home: &TempDir) -> Result<Command> {
    let mut cmd = Command::cargo_bin("songsmith-stream").context("locate songsmith-stream")?;
    cmd.env("SONGSMITH_HOME", home.path()).env_remove("RUST_LOG");
    Ok(cmd)
}

fn json_lines(stdout: &[u8]) -> Result<Vec<Value>> {
    std::str::from_utf8(stdout)?
        .lines()
        .map(|line| serde_json::from_str(line).map_err(Into::into))
        .collect()
}

#[test]
fn replay_file_one_byte_at_a_time() -> Result<()> {
    let home = tempfile::tempdir()?;
    let input = home.path().join("reply.txt");
    fs::write(
        &input,
        "Here you go <content>\nSweet home Austin</content><original_song>\nSweet home Alabama</original_song> enjoy",
    )?;

    let output = songsmith_stream(&home)?
        .args(["replay", "--chunk-bytes", "1"])
        .arg(&input)
        .output()?;
    assert!(output.status.success(), "{output:?}");

    let lines = json_lines(&output.stdout)?;
    assert_eq!(
        lines.last(),
        Some(&json!({
            "type": "completed",
            "phase": "after",
            "chat": "Here you go  enjoy",
            "content": "Sweet home Austin",
            "original": "Sweet home Alabama",
        }))
    );
    assert!(
        lines[..lines.len() - 1]
            .iter()
            .all(|line| line["type"] == "delta")
    );
    Ok(())
}

#[test]
fn replay_reads_stdin_and_honours_config_file() -> Result<()> {
    let home = tempfile::tempdir()?;
    fs::write(home.path().join("config.toml"), "chunk_bytes = 64\n")?;

    let output = songsmith_stream(&home)?
        .arg("replay")
        .write_stdin("ok <content>x</content>")
        .output()?;
    assert!(output.status.success(), "{output:?}");

    assert_eq!(
        json_lines(&output.stdout)?,
        vec![
            json!({"type": "delta", "chat": "ok ", "content": "x", "original": ""}),
            json!({
                "type": "completed",
                "phase": "between",
                "chat": "ok ",
                "content": "x",
                "original": "",
            }),
        ]
    );
    Ok(())
}

#[test]
fn replay_rejects_zero_chunk_bytes_from_explicit_config() -> Result<()> {
    let home = tempfile::tempdir()?;
    let config = home.path().join("custom.toml");
    fs::write(&config, "chunk_bytes = 0\n")?;

    songsmith_stream(&home)?
        .arg("replay")
        .arg("--config")
        .arg(&config)
        .write_stdin("hello")
        .assert()
        .failure()
        .stderr(contains("chunk_bytes must be greater than zero"));
    Ok(())
}

#[test]
fn chunk_bytes_flag_overrides_zero_in_config_file() -> Result<()> {
    let home = tempfile::tempdir()?;
    fs::write(home.path().join("config.toml"), "chunk_bytes = 0\n")?;

    let output = songsmith_stream(&home)?
        .args(["replay", "--chunk-bytes", "4"])
        .write_stdin("hi <content>x</content>")
        .output()?;
    assert!(output.status.success(), "{output:?}");

    assert_eq!(
        json_lines(&output.stdout)?.last(),
        Some(&json!({
            "type": "completed",
            "phase": "between",
            "chat": "hi ",
            "content": "x",
            "original": "",
        }))
    );
    Ok(())
}

#[test]
fn replay_fails_on_invalid_utf8()-> Result<()> {
    let home = tempfile::tempdir()?;

    songsmith_stream(&home)?
        .args(["replay", "--chunk-bytes", "4"])
        .write_stdin(b"abcd\xFF".to_vec())
        .assert()
        .failure()
        .stderr(contains("chunk 1 is not valid UTF-8"));
    Ok(())
}

#[test]
fn extract_chat_reply() -> Result<()> {
    let home = tempfile::tempdir()?;

    let output = songsmith_stream(&home)?
        .args(["extract", "--kind", "chat"])
        .write_stdin("Sure!\n<content>\nNew chorus\n</content>\nShortened the chorus.")
        .output()?;
    assert!(output.status.success(), "{output:?}");

    assert_eq!(
        serde_json::from_slice::<Value>(&output.stdout)?,
        json!({
            "content": "New chorus",
            "explanation": "Shortened the chorus.",
            "changes_summary": "Shortened the chorus.",
        })
    );
    Ok(())
}
