//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Every command opens the settings database itself; nothing here needs the
//! server to be running.

use super::AchievementsAction;
use crate::api::{self, AppState};
use crate::config::{AppConfig, DEFAULT_CONFIG_TOML};
use std::path::Path;
use vtsite_core::{
    AchievementCategory, AchievementEditor, AchievementField, PageContext, SCHEMA, Sanitized,
    Settings, SiteConfig, SiteError, achievements_page, home_page, not_found_page,
};

fn open_settings(config: &AppConfig) -> Result<Settings, SiteError> {
    let settings = if config.storage.ephemeral {
        Settings::in_memory()
    } else {
        Settings::open(&config.storage.database)?
    };
    tracing::debug!(
        event = "settings_opened",
        persistent = settings.is_persistent(),
        database = %config.storage.database.display(),
        "Settings opened"
    );
    Ok(settings)
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn report_sanitized(sanitized: &Sanitized) {
    if sanitized.dropped_fields > 0 || sanitized.dropped_records > 0 || sanitized.malformed {
        tracing::warn!(
            key = sanitized.key,
            dropped_fields = sanitized.dropped_fields,
            dropped_records = sanitized.dropped_records,
            malformed = sanitized.malformed,
            "Value was coerced by its sanitizer"
        );
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &AppConfig) -> Result<(), SiteError> {
    let settings = open_settings(config)?;
    let database = if settings.is_persistent() {
        format!("{:?}", config.storage.database)
    } else {
        tracing::warn!("Settings are in memory only; edits are lost on exit");
        "(in memory)".to_string()
    };
    let state = AppState::from_config(settings, config)?;

    println!("vtsite Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", config.server.host);
    println!("  Port:     {}", config.server.port);
    println!("  Database: {}", database);
    println!("  Assets:   {:?}", config.server.assets_dir);
    println!("  Mail:     {}", state.mailer.name());
    println!();
    println!("Pages:");
    println!("  GET  /              - Home");
    println!("  GET  /achievements  - Achievements");
    println!("  POST /contact       - Contact form");
    println!("  GET  /health        - Health check");
    println!("  *    /admin/...     - Admin API (requires {})", api::API_KEY_ENV);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&config.bind_addr(), state).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create the database and a starter config file.
pub fn cmd_init(config: &AppConfig, config_path: &Path, force: bool) -> Result<(), SiteError> {
    if config.storage.ephemeral {
        return Err(SiteError::IoError(
            "init creates a database; drop --ephemeral".to_string(),
        ));
    }
    let db_path = &config.storage.database;

    if db_path.exists() {
        if !force {
            return Err(SiteError::IoError(format!(
                "Database already exists: {:?}. Use --force to recreate.",
                db_path
            )));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| SiteError::IoError(format!("Remove {:?}: {}", db_path, e)))?;
    }
    let settings = open_settings(config)?;
    drop(settings);
    println!("Created settings database: {:?}", db_path);

    if config_path.exists() && !force {
        println!("Keeping existing config: {:?}", config_path);
    } else {
        std::fs::write(config_path, DEFAULT_CONFIG_TOML)
            .map_err(|e| SiteError::IoError(format!("Write {:?}: {}", config_path, e)))?;
        println!("Wrote config: {:?}", config_path);
    }

    Ok(())
}

// =============================================================================
// SETTINGS COMMANDS
// =============================================================================

/// Every setting with its effective value.
pub fn cmd_settings_list(config: &AppConfig, json_mode: bool) -> Result<(), SiteError> {
    let settings = open_settings(config)?;
    let snapshot = settings.snapshot()?;
    let orphaned = settings.orphaned_keys()?;

    if json_mode {
        let values: serde_json::Map<String, serde_json::Value> = snapshot
            .into_iter()
            .map(|(key, value)| {
                (
                    key.to_string(),
                    serde_json::to_value(value).unwrap_or_default(),
                )
            })
            .collect();
        print_json(&serde_json::json!({ "settings": values, "orphaned": orphaned }));
        return Ok(());
    }

    println!("Site Settings ({:?})", config.storage.database);
    println!("=============");
    for (key, value) in snapshot {
        let marker = if settings.is_set(key)? { " " } else { "*" };
        let shown = serde_json::to_string(&value).unwrap_or_default();
        println!("{marker} {key:<24} {shown}");
    }
    println!();
    println!("* = default value");
    if !orphaned.is_empty() {
        println!("Unknown stored keys (ignored): {}", orphaned.join(", "));
    }
    Ok(())
}

/// One setting's stored text.
pub fn cmd_settings_get(config: &AppConfig, json_mode: bool, key: &str) -> Result<(), SiteError> {
    let settings = open_settings(config)?;
    if json_mode {
        let value = settings.get(key)?;
        print_json(&serde_json::json!({ "key": key, "value": value }));
    } else {
        println!("{}", settings.get_raw(key)?);
    }
    Ok(())
}

/// Sanitize and store a value.
pub fn cmd_settings_set(
    config: &AppConfig,
    json_mode: bool,
    key: &str,
    value: &str,
) -> Result<(), SiteError> {
    let mut settings = open_settings(config)?;
    let sanitized = settings.set(key, value)?;
    report_sanitized(&sanitized);

    if json_mode {
        print_json(&serde_json::json!(sanitized));
    } else {
        println!("{} = {}", sanitized.key, sanitized.stored);
    }
    Ok(())
}

/// Drop the stored value.
pub fn cmd_settings_reset(config: &AppConfig, json_mode: bool, key: &str) -> Result<(), SiteError> {
    let mut settings = open_settings(config)?;
    let removed = settings.reset(key)?;
    if json_mode {
        print_json(&serde_json::json!({ "key": key, "removed": removed }));
    } else if removed {
        println!("{key} reset to default");
    } else {
        println!("{key} was already default");
    }
    Ok(())
}

// =============================================================================
// ACHIEVEMENTS COMMANDS
// =============================================================================

/// Edit an achievements list and print the result.
pub fn cmd_achievements(
    config: &AppConfig,
    json_mode: bool,
    action: AchievementsAction,
) -> Result<(), SiteError> {
    let category_name = match &action {
        AchievementsAction::List { category }
        | AchievementsAction::Add { category }
        | AchievementsAction::Remove { category, .. }
        | AchievementsAction::Update { category, .. }
        | AchievementsAction::Move { category, .. } => category.clone(),
    };
    let category: AchievementCategory = category_name.parse()?;

    let mut settings = open_settings(config)?;
    let mut editor = AchievementEditor::load(category, &settings)?;

    let changed = match action {
        AchievementsAction::List { .. } => false,
        AchievementsAction::Add { .. } => {
            let index = editor.add_record()?;
            if !json_mode {
                println!("Added record #{}", index + 1);
            }
            true
        }
        AchievementsAction::Remove { index, .. } => {
            let removed = editor.remove_record(index)?;
            if !json_mode {
                println!("Removed record #{} ({})", index + 1, removed.title);
            }
            true
        }
        AchievementsAction::Update {
            index,
            field,
            value,
            ..
        } => {
            let field: AchievementField = field.parse()?;
            editor.update_field(index, field, &value)?;
            true
        }
        AchievementsAction::Move { from, to, .. } => {
            editor.move_record(from, to)?;
            true
        }
    };

    if changed {
        let sanitized = editor.commit(&mut settings)?;
        report_sanitized(&sanitized);
    }

    if json_mode {
        print_json(&serde_json::json!({
            "category": category,
            "records": editor.records(),
        }));
        return Ok(());
    }

    println!("{} achievements", category.heading());
    println!("=====================");
    if editor.records().is_empty() {
        println!("(empty - the page shows the built-in examples)");
    }
    for (label, record) in editor.ordinal_labels().iter().zip(editor.records()) {
        println!(
            "{:<4} {} {:<8} {}",
            label,
            if record.icon.is_empty() { "  " } else { record.icon.as_str() },
            record.date,
            record.title
        );
    }
    Ok(())
}

// =============================================================================
// RENDER COMMAND
// =============================================================================

/// Write `index.html`, `achievements/index.html` and `404.html`.
///
/// The contact form in these files carries no token; submissions only work
/// against a running server.
pub fn cmd_render(config: &AppConfig, output: &Path) -> Result<(), SiteError> {
    let settings = open_settings(config)?;
    let (site, warnings) = SiteConfig::load(&settings)?;
    for warning in &warnings {
        tracing::warn!(
            key = warning.key,
            dropped_fields = warning.dropped_fields,
            dropped_records = warning.dropped_records,
            malformed = warning.malformed,
            "Stored list decoded with losses"
        );
    }

    let pages = [
        ("index.html", home_page(&PageContext::new(&site, "/"))),
        (
            "achievements/index.html",
            achievements_page(&PageContext::new(&site, "/achievements")),
        ),
        ("404.html", not_found_page(&PageContext::new(&site, "/404.html"))),
    ];

    for (relative, html) in pages {
        let path = output.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SiteError::IoError(format!("Create {:?}: {}", parent, e)))?;
        }
        std::fs::write(&path, html)
            .map_err(|e| SiteError::IoError(format!("Write {:?}: {}", path, e)))?;
        println!("Wrote {:?}", path);
    }
    Ok(())
}

// =============================================================================
// SCHEMA COMMAND
// =============================================================================

/// Print the settings schema.
pub fn cmd_schema(json_mode: bool) {
    if json_mode {
        print_json(&serde_json::json!(SCHEMA));
        return;
    }

    println!("{:<24} {:<28} {}", "KEY", "KIND", "DEFAULT");
    for def in SCHEMA {
        let kind = serde_json::to_value(def.kind)
            .ok()
            .map(|v| match v {
                serde_json::Value::Object(map) => {
                    let ty = map.get("type").and_then(|t| t.as_str()).unwrap_or("");
                    match map.get("category").and_then(|c| c.as_str()) {
                        Some(category) => format!("{ty}({category})"),
                        None => ty.to_string(),
                    }
                }
                other => other.to_string(),
            })
            .unwrap_or_default();
        let default = def.default.lines().next().unwrap_or("");
        println!("{:<24} {:<28} {}", def.key, kind, default);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_config(dir: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.database = dir.join("site.redb");
        config
    }

    #[test]
    fn init_then_refuse_without_force() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = temp_config(dir.path());
        let config_path = dir.path().join("vtsite.toml");

        cmd_init(&config, &config_path, false).expect("init");
        assert!(config.storage.database.exists());
        assert!(config_path.exists());

        assert!(cmd_init(&config, &config_path, false).is_err());
        cmd_init(&config, &config_path, true).expect("force init");
    }

    #[test]
    fn settings_set_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = temp_config(dir.path());

        cmd_settings_set(&config, false, "tagline", "  <b>Hi</b> there ").expect("set");
        let settings = open_settings(&config).expect("open");
        assert_eq!(settings.text("tagline").expect("text"), "Hi there");
    }

    #[test]
    fn achievements_edit_round() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = temp_config(dir.path());

        for _ in 0..2 {
            cmd_achievements(
                &config,
                true,
                AchievementsAction::Add {
                    category: "personal".to_string(),
                },
            )
            .expect("add");
        }
        cmd_achievements(
            &config,
            true,
            AchievementsAction::Update {
                category: "personal".to_string(),
                index: 1,
                field: "title".to_string(),
                value: "Second".to_string(),
            },
        )
        .expect("update");
        cmd_achievements(
            &config,
            true,
            AchievementsAction::Move {
                category: "personal".to_string(),
                from: 1,
                to: 0,
            },
        )
        .expect("move");

        let settings = open_settings(&config).expect("open");
        let records = settings
            .achievements(AchievementCategory::Personal)
            .expect("achievements")
            .value;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Second");
    }

    #[test]
    fn unknown_category_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = temp_config(dir.path());
        let result = cmd_achievements(
            &config,
            false,
            AchievementsAction::List {
                category: "music".to_string(),
            },
        );
        assert!(matches!(result, Err(SiteError::UnknownCategory(_))));
    }

    #[test]
    fn ephemeral_settings_never_touch_the_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = temp_config(dir.path());
        config.storage.ephemeral = true;

        let settings = open_settings(&config).expect("open");
        assert!(!settings.is_persistent());
        cmd_settings_set(&config, false, "tagline", "Hello").expect("set");
        assert!(!config.storage.database.exists());

        let config_path = dir.path().join("vtsite.toml");
        assert!(cmd_init(&config, &config_path, false).is_err());
        assert!(!config_path.exists());
    }

    #[test]
    fn database_settings_are_persistent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = temp_config(dir.path());
        assert!(open_settings(&config).expect("open").is_persistent());
    }

    #[test]
    fn render_writes_three_pages() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = temp_config(dir.path());
        let out: PathBuf = dir.path().join("public");

        cmd_render(&config, &out).expect("render");
        let home = std::fs::read_to_string(out.join("index.html")).expect("index");
        assert!(home.contains("<!DOCTYPE html>"));
        assert!(out.join("achievements/index.html").exists());
        assert!(out.join("404.html").exists());
    }
}
