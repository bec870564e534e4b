use std::path::PathBuf;

use outliner::config::{BreadcrumbChoice, ConfigFlags, load_config_flags, parse_flag_tokens};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".outlinerrc");
    let content = r"
# comment
--watch

--breadcrumb follow

--render-debug-log=render.log
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.watch);
    assert_eq!(flags.breadcrumb, Some(BreadcrumbChoice::Follow));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".outlinerrc");
    let content = "--watch\n--breadcrumb follow\n--block-size 20\n--state views.json\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "outliner".to_string(),
        "--breadcrumb".to_string(),
        "anchor".to_string(),
        "--extended".to_string(),
        "notes.md".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.watch, "file flags should remain enabled");
    assert!(effective.extended, "cli flags should be applied");
    assert_eq!(
        effective.breadcrumb,
        Some(BreadcrumbChoice::Anchor),
        "cli should override breadcrumb mode"
    );
    assert_eq!(effective.block_size, Some(20));
    assert_eq!(
        effective.state,
        Some(PathBuf::from("views.json")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let args = vec![
        "outliner".to_string(),
        "--breadcrumb=follow".to_string(),
        "--min-level=3".to_string(),
        "--state=views.json".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.breadcrumb, Some(BreadcrumbChoice::Follow));
    assert_eq!(flags.min_level, Some(3));
    assert_eq!(flags.state, Some(PathBuf::from("views.json")));
}

#[test]
fn test_missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("absent")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
}

#[test]
fn test_union_of_defaults_is_identity() {
    let flags = parse_flag_tokens(&["--rtl".to_string(), "--perf".to_string()]);
    assert_eq!(ConfigFlags::default().union(&flags), flags);
    assert_eq!(flags.union(&ConfigFlags::default()), flags);
}
