//! End to end tests of the `fountain` binary, run headless.

fn fountain(config: &str, arguments: &[&str]) -> (tempfile::TempDir, std::process::Output) {
    let directory = tempfile::tempdir().unwrap();
    std::fs::write(directory.path().join("fountain.toml"), config).unwrap();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_fountain"))
        .arg("--config-dir")
        .arg(directory.path())
        .arg("--no-input")
        .args(arguments)
        .stdin(std::process::Stdio::null())
        .output()
        .unwrap();

    (directory, output)
}

fn frames(output: &std::process::Output) -> Vec<serde_json::Value> {
    std::str::from_utf8(&output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

const SIMPLE_CONFIG: &str = indoc::indoc! {"
    frame_rate = 200

    [obstacle]
    enabled = false

    [parameters.emission_rate]
    value = 400
"};

#[test]
fn dumps_every_frame() {
    let (_directory, output) = fountain(
        SIMPLE_CONFIG,
        &["--frames", "20", "--dump-frames", "--seed", "3"],
    );
    assert!(output.status.success(), "{output:?}");

    let frames = frames(&output);
    assert_eq!(frames.len(), 20);
    for (index, frame) in frames.iter().enumerate() {
        let number = u64::try_from(index).unwrap() + 1;
        assert_eq!(frame["frame"], number);
        assert_eq!(frame["run_state"], "playing");
        assert_eq!(frame["method"], "explicit_euler");
        assert_eq!(frame["emitted"], 2);
        assert_eq!(frame["culled"], 0);
        assert_eq!(frame["time_step"], 0.005);
        let positions = frame["positions"].as_array().unwrap();
        assert_eq!(positions.len(), usize::try_from(number * 2).unwrap());
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let arguments = ["--frames", "10", "--dump-frames", "--seed", "11"];
    let (_first_directory, first) = fountain(SIMPLE_CONFIG, &arguments);
    let (_second_directory, second) = fountain(SIMPLE_CONFIG, &arguments);

    let positions = |output: &std::process::Output| -> Vec<serde_json::Value> {
        frames(output)
            .into_iter()
            .map(|frame| frame["positions"].clone())
            .collect()
    };
    assert_eq!(positions(&first), positions(&second));
}

#[test]
fn method_from_the_command_line() {
    let (_directory, output) = fountain(
        SIMPLE_CONFIG,
        &["--frames", "3", "--dump-frames", "--method", "verlet"],
    );
    assert!(output.status.success(), "{output:?}");
    let frames = frames(&output);
    assert!(frames.iter().all(|frame| frame["method"] == "verlet"));
}

#[test]
fn unknown_method_is_an_error() {
    let (_directory, output) = fountain(SIMPLE_CONFIG, &["--frames", "3", "--method", "rk4"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("rk4"), "{stderr}");
}

#[test]
fn bad_config_is_an_error() {
    let config = indoc::indoc! {"
        [parameters.spread]
        min = 90
        max = 10
    "};
    let (_directory, output) = fountain(config, &["--frames", "3"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Bad config file"), "{stderr}");
}

#[test]
fn without_dumping_nothing_is_written_to_stdout() {
    let (_directory, output) = fountain(SIMPLE_CONFIG, &["--frames", "5"]);
    assert!(output.status.success(), "{output:?}");
    assert!(output.stdout.is_empty());
}
