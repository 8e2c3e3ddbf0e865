// tests/settings_config.rs
use crime_anniversaries::config::settings::{
    Settings, ENV_CONFIG_PATH, ENV_GET_ON_THIS_DAY, ENV_GET_WIKIDATA, ENV_MAX_PAGES,
    ENV_OUTPUT_DIR, ENV_PAUSE_MS, ENV_USER_AGENT, ENV_YEAR_CUTOFF,
};
use std::path::PathBuf;
use std::{env, fs};

fn clear_env() {
    for k in [
        ENV_CONFIG_PATH,
        ENV_GET_ON_THIS_DAY,
        ENV_GET_WIKIDATA,
        ENV_MAX_PAGES,
        ENV_OUTPUT_DIR,
        ENV_USER_AGENT,
        ENV_PAUSE_MS,
        ENV_YEAR_CUTOFF,
    ] {
        env::remove_var(k);
    }
}

#[test]
fn load_toml_and_json_files() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("settings.toml");
    fs::write(
        &p_toml,
        r#"
get_on_this_day = false
year_cutoff = 1945
max_pages = 0
crime_pattern = '''(?i)\b(piracy|smuggling)\b'''
"#,
    )
    .unwrap();
    let s = Settings::load_from(&p_toml).unwrap();
    assert!(!s.get_on_this_day);
    assert!(s.get_wikidata);
    assert_eq!(s.year_cutoff, 1945);
    assert_eq!(s.max_pages, 1, "zero is clamped");
    assert_eq!(
        s.matcher().unwrap().classify("Smuggling ring busted").as_deref(),
        Some("smuggling")
    );

    let p_json = dir.path().join("settings.json");
    fs::write(&p_json, r#"{"output_dir": "out", "pause_ms": 250}"#).unwrap();
    let j = Settings::load_from(&p_json).unwrap();
    assert_eq!(j.output_dir, PathBuf::from("out"));
    assert_eq!(j.pause().as_millis(), 250);

    let p_bad = dir.path().join("bad.toml");
    fs::write(&p_bad, r#"crime_pattern = "(""#).unwrap();
    assert!(Settings::load_from(&p_bad).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) Nothing -> built-in defaults
    let s = Settings::load_default().unwrap();
    assert_eq!(s, Settings::default());

    // 2) Fallback TOML in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("crime_anniversaries.toml"), "year_cutoff = 1960\n").unwrap();
    assert_eq!(Settings::load_default().unwrap().year_cutoff, 1960);

    // 3) Explicit path wins
    let p_env = tmp.path().join("other.json");
    fs::write(&p_env, r#"{"year_cutoff": 1980}"#).unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(Settings::load_default().unwrap().year_cutoff, 1980);

    // 4) Explicit path to nowhere is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("nope.toml").display().to_string());
    assert!(Settings::load_default().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_overrides_apply_on_top() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    env::set_var(ENV_GET_WIKIDATA, "off");
    env::set_var(ENV_YEAR_CUTOFF, "1990");
    env::set_var(ENV_PAUSE_MS, "not-a-number");
    env::set_var(ENV_OUTPUT_DIR, "exports");

    let s = Settings::load_default().unwrap();
    assert!(!s.get_wikidata);
    assert_eq!(s.year_cutoff, 1990);
    assert_eq!(s.pause_ms, 1_000, "unparsable value is ignored");
    assert_eq!(s.output_dir, PathBuf::from("exports"));

    clear_env();
    env::set_current_dir(&old).unwrap();
}
