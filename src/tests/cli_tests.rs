use std::path::PathBuf;

use crate::{parse_args, Args};

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn no_arguments_runs_the_render_loop_with_default_config() {
    let parsed = parse_args(args(&[])).unwrap();
    assert_eq!(
        parsed,
        Args {
            stdout: false,
            config: PathBuf::from("tidelight.toml"),
        }
    );
}

#[test]
fn stdout_and_config_flags_are_parsed_in_any_order() {
    let parsed = parse_args(args(&["--config", "/etc/tidelight.toml", "--stdout"])).unwrap();
    assert!(parsed.stdout);
    assert_eq!(parsed.config, PathBuf::from("/etc/tidelight.toml"));
}

#[test]
fn config_flag_without_path_is_rejected() {
    assert!(parse_args(args(&["--config"])).is_err());
}

#[test]
fn unknown_flags_are_rejected() {
    let err = parse_args(args(&["--verbose"])).unwrap_err();
    assert!(err.to_string().contains("--verbose"));
}
