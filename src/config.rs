use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::breadcrumb::BreadcrumbMode;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreadcrumbChoice {
    Anchor,
    Follow,
}

impl From<BreadcrumbChoice> for BreadcrumbMode {
    fn from(choice: BreadcrumbChoice) -> Self {
        match choice {
            BreadcrumbChoice::Anchor => Self::Anchor,
            BreadcrumbChoice::Follow => Self::FollowSelection,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub extended: bool,
    pub rtl: bool,
    pub perf: bool,
    pub breadcrumb: Option<BreadcrumbChoice>,
    pub block_size: Option<usize>,
    pub min_level: Option<usize>,
    pub state: Option<PathBuf>,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            extended: self.extended || other.extended,
            rtl: self.rtl || other.rtl,
            perf: self.perf || other.perf,
            breadcrumb: other.breadcrumb.or(self.breadcrumb),
            block_size: other.block_size.or(self.block_size),
            min_level: other.min_level.or(self.min_level),
            state: other.state.clone().or_else(|| self.state.clone()),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("outliner").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("outliner")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("outliner").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("outliner")
                .join("config");
        }
    }

    PathBuf::from(".outlinerrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".outlinerrc")
}

/// Where view state for `file` is kept when `--state` is not given.
pub fn default_state_path(file: &Path) -> PathBuf {
    let name = file
        .file_name()
        .map_or_else(|| "outline".into(), |name| name.to_string_lossy().into_owned());
    let dir = file.parent().filter(|p| !p.as_os_str().is_empty());
    let state_name = format!(".{name}.outline.json");
    dir.map_or_else(|| PathBuf::from(&state_name), |dir| dir.join(&state_name))
}

/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// # Errors
///
/// Returns an error if the config directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# outliner defaults (saved with --save)".to_string());
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if let Some(choice) = flags.breadcrumb {
        lines.push(format!("--breadcrumb {}", breadcrumb_str(choice)));
    }
    if flags.extended {
        lines.push("--extended".to_string());
    }
    if flags.rtl {
        lines.push("--rtl".to_string());
    }
    if let Some(size) = flags.block_size {
        lines.push(format!("--block-size {size}"));
    }
    if let Some(level) = flags.min_level {
        lines.push(format!("--min-level {level}"));
    }
    if let Some(path) = &flags.state {
        lines.push(format!("--state {}", path.display()));
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let mut value = || {
            inline.map(ToOwned::to_owned).or_else(|| {
                let next = tokens.get(i + 1).cloned();
                if next.is_some() {
                    i += 1;
                }
                next
            })
        };
        match name {
            "--watch" | "-w" => flags.watch = true,
            "--extended" => flags.extended = true,
            "--rtl" => flags.rtl = true,
            "--perf" => flags.perf = true,
            "--breadcrumb" => flags.breadcrumb = value().as_deref().and_then(parse_breadcrumb),
            "--block-size" => flags.block_size = value().and_then(|v| v.parse().ok()),
            "--min-level" => flags.min_level = value().and_then(|v| v.parse().ok()),
            "--state" => flags.state = value().map(PathBuf::from),
            "--render-debug-log" => flags.render_debug_log = value().map(PathBuf::from),
            _ => {}
        }
        i += 1;
    }
    flags
}

fn parse_breadcrumb(s: &str) -> Option<BreadcrumbChoice> {
    match s {
        "anchor" => Some(BreadcrumbChoice::Anchor),
        "follow" => Some(BreadcrumbChoice::Follow),
        _ => None,
    }
}

const fn breadcrumb_str(choice: BreadcrumbChoice) -> &'static str {
    match choice {
        BreadcrumbChoice::Anchor => "anchor",
        BreadcrumbChoice::Follow => "follow",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = vec![
            "outliner".to_string(),
            "--watch".to_string(),
            "--breadcrumb".to_string(),
            "follow".to_string(),
            "--block-size=25".to_string(),
            "--min-level".to_string(),
            "2".to_string(),
            "--render-debug-log=render.log".to_string(),
            "--rtl".to_string(),
            "notes.md".to_string(),
        ];
        let flags = parse_flag_tokens(&args);
        assert!(flags.watch);
        assert!(flags.rtl);
        assert!(!flags.extended);
        assert_eq!(flags.breadcrumb, Some(BreadcrumbChoice::Follow));
        assert_eq!(flags.block_size, Some(25));
        assert_eq!(flags.min_level, Some(2));
        assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
    }

    #[test]
    fn test_parse_flag_tokens_ignores_bad_values() {
        let args = vec![
            "--block-size".to_string(),
            "many".to_string(),
            "--breadcrumb=sideways".to_string(),
        ];
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.block_size, None);
        assert_eq!(flags.breadcrumb, None);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            watch: true,
            breadcrumb: Some(BreadcrumbChoice::Anchor),
            block_size: Some(10),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            extended: true,
            breadcrumb: Some(BreadcrumbChoice::Follow),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.watch);
        assert!(merged.extended);
        assert_eq!(merged.breadcrumb, Some(BreadcrumbChoice::Follow));
        assert_eq!(merged.block_size, Some(10));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".outlinerrc");
        let flags = ConfigFlags {
            watch: true,
            extended: true,
            rtl: true,
            perf: true,
            breadcrumb: Some(BreadcrumbChoice::Follow),
            block_size: Some(64),
            min_level: Some(2),
            state: Some(PathBuf::from("state.json")),
            render_debug_log: Some(PathBuf::from("render.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_default_state_path_sits_beside_file() {
        assert_eq!(
            default_state_path(Path::new("docs/notes.md")),
            PathBuf::from("docs/.notes.md.outline.json")
        );
        assert_eq!(
            default_state_path(Path::new("notes.md")),
            PathBuf::from(".notes.md.outline.json")
        );
    }

    #[test]
    fn test_breadcrumb_choice_maps_to_mode() {
        assert_eq!(
            BreadcrumbMode::from(BreadcrumbChoice::Follow),
            BreadcrumbMode::FollowSelection
        );
        assert_eq!(BreadcrumbMode::from(BreadcrumbChoice::Anchor), BreadcrumbMode::Anchor);
    }
}
