use std::path::Path;
use std::process::{Command, Output};
use std::sync::Once;
use tracing::{error, info};

static INIT: Once = Once::new();

/// Initialize logging exactly once for all tests
fn init_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    });
}

fn test_data(name: &str) -> String {
    format!("{}/../test-data/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn run(args: &[&str]) -> Result<Output, Box<dyn std::error::Error>> {
    let output = Command::new(env!("CARGO_BIN_EXE_xml-to-rdf"))
        .args(args)
        .output()?;

    if !output.status.success() {
        error!("Command failed with status: {}", output.status);
        error!("stderr: {}", String::from_utf8_lossy(&output.stderr));
        error!("stdout: {}", String::from_utf8_lossy(&output.stdout));
    } else {
        info!("Command executed successfully");
        info!("stdout: {}", String::from_utf8_lossy(&output.stdout));
    }
    Ok(output)
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_process_to_turtle() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    info!("Starting CLI process test");
    let dir = tempfile::tempdir()?;
    let output = run(&[
        "process",
        "--config",
        &test_data("config.xml"),
        "--input",
        &test_data("input.xml"),
        "--output",
        path_arg(dir.path()),
        "--format",
        "ttl",
        "--modifiers",
        &test_data("modifiers"),
    ])?;
    assert!(output.status.success());

    let turtle = std::fs::read_to_string(dir.path().join("input.ttl"))?;
    info!("Generated Turtle:\n{}", turtle);
    assert!(turtle.contains("@prefix ex: <http://example.com/museum/>"));
    assert!(turtle.contains("\"Silver penny\"@en"));
    assert!(turtle.contains("trade-token"));
    Ok(())
}

#[test]
fn test_process_split() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let dir = tempfile::tempdir()?;
    let input = dir.path().join("records.xml");
    std::fs::copy(test_data("input.xml"), &input)?;
    let out = dir.path().join("out");

    let output = run(&[
        "process",
        "-c",
        &test_data("config.xml"),
        "-i",
        path_arg(&input),
        "-o",
        path_arg(&out),
        "-f",
        "nt",
        "--split",
    ])?;
    assert!(output.status.success());

    assert!(dir.path().join("inputchunks").join("records_0.xml").exists());
    assert!(dir.path().join("inputchunks").join("records_1.xml").exists());
    assert!(out.join("outputchunks").join("records_0.nt").exists());
    let last = std::fs::read_to_string(out.join("outputchunks").join("records_1.nt"))?;
    assert!(last.contains("<http://example.com/museum/object/1003>"));
    Ok(())
}

#[test]
fn test_process_rejects_unknown_format() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let dir = tempfile::tempdir()?;
    let output = run(&[
        "process",
        "--config",
        &test_data("config.xml"),
        "--input",
        &test_data("input.xml"),
        "--output",
        path_arg(dir.path()),
        "--format",
        "jsonld",
    ])?;
    assert!(!output.status.success());
    Ok(())
}

#[test]
fn test_generated_configs_validate() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let dir = tempfile::tempdir()?;
    for template in ["basic", "full"] {
        let config = dir.path().join(format!("{}.xml", template));
        let output = run(&["generate-config", "--type", template, "--output", path_arg(&config)])?;
        assert!(output.status.success());
        assert!(std::fs::read_to_string(&config)?.contains("<config>"));

        let output = run(&["validate", "--config", path_arg(&config)])?;
        assert!(output.status.success());
    }

    let output = run(&["generate-config", "--type", "fancy", "--output", path_arg(dir.path())])?;
    assert!(!output.status.success());
    Ok(())
}

#[test]
fn test_validate_rejects_unknown_tags() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let dir = tempfile::tempdir()?;
    let config = dir.path().join("config.xml");
    std::fs::write(&config, "<config><mapping match=\"/a\"><resourse/></mapping></config>")?;

    let output = run(&["validate", "--config", path_arg(&config)])?;
    assert!(!output.status.success());
    Ok(())
}
