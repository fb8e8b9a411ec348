use super::*;
use std::io::Write;

const TAP_SCRIPT: &str = r#"{
    "windows": [
        { "name": "panel", "bounds": [0, 0, 200, 100] },
        { "name": "button", "parent": "panel", "bounds": [10, 10, 50, 30] }
    ],
    "steps": [
        { "type": "touch", "action": "pressed", "x": 20, "y": 20, "time_ms": 0 },
        { "type": "touch", "action": "released", "x": 20, "y": 20, "time_ms": 40 }
    ]
}"#;

#[test]
fn script_parses_with_defaults() -> anyhow::Result<()> {
    let script = ReplayScript::parse(TAP_SCRIPT)?;
    assert_eq!(script.windows.len(), 2);
    assert!(script.windows[0].visible);
    assert!(script.windows[0].can_focus);
    assert_eq!(script.windows[1].parent.as_deref(), Some("panel"));
    assert_eq!(
        script.steps[0],
        Step::Touch {
            action: TouchAction::Pressed,
            x: 20,
            y: 20,
            id: 0,
            time_ms: 0,
        }
    );
    Ok(())
}

#[test]
fn unknown_step_type_is_rejected() {
    let result = ReplayScript::parse(r#"{ "steps": [ { "type": "teleport" } ] }"#);
    assert!(result.is_err());
}

#[test]
fn tap_on_a_button_becomes_a_click() -> anyhow::Result<()> {
    let script = ReplayScript::parse(TAP_SCRIPT)?;
    let mut runner = ReplayRunner::new(&AuraConfig::default());
    let log = runner.run(&script)?;

    assert!(log.contains(&"button TouchPressed #0 at 10,10".to_string()));
    assert!(log.contains(&"button GestureTap at 10,10".to_string()));
    assert!(log.contains(&"button MousePressed at 10,10".to_string()));
    assert!(log.contains(&"button MouseReleased at 10,10".to_string()));
    assert!(!log.iter().any(|line| line.starts_with("panel")));
    Ok(())
}

#[test]
fn consumed_gestures_do_not_click() -> anyhow::Result<()> {
    let mut script = ReplayScript::parse(TAP_SCRIPT)?;
    script.windows[1].consume_gestures = true;
    let mut runner = ReplayRunner::new(&AuraConfig::default());
    let log = runner.run(&script)?;

    assert!(log.contains(&"button GestureTap at 10,10".to_string()));
    assert!(!log.iter().any(|line| line.contains("MousePressed")));
    Ok(())
}

#[test]
fn focus_and_key_steps() -> anyhow::Result<()> {
    let script = ReplayScript::parse(
        r#"{
            "windows": [ { "name": "editor", "bounds": [0, 0, 100, 100] } ],
            "steps": [
                { "type": "focus", "window": "editor" },
                { "type": "key", "key": "x" },
                { "type": "key", "key": "nonsense" },
                { "type": "focus", "window": null }
            ]
        }"#,
    )?;
    let mut runner = ReplayRunner::new(&AuraConfig::default());
    let log = runner.run(&script)?;
    assert_eq!(
        log,
        vec![
            "editor focus".to_string(),
            "editor KeyPressed Character('x')".to_string(),
            "editor blur".to_string(),
        ]
    );
    Ok(())
}

#[test]
fn unknown_window_names_fail_the_step() {
    let script = ReplayScript::parse(r#"{ "steps": [ { "type": "capture", "window": "ghost" } ] }"#).unwrap();
    let mut runner = ReplayRunner::new(&AuraConfig::default());
    let err = runner.run(&script).unwrap_err();
    assert!(format!("{:#}", err).contains("Unknown window 'ghost'"));
}

#[test]
fn destroyed_windows_cannot_be_referenced() -> anyhow::Result<()> {
    let script = ReplayScript::parse(
        r#"{
            "windows": [ { "name": "w", "bounds": [0, 0, 10, 10] } ],
            "steps": [
                { "type": "destroy", "window": "w" },
                { "type": "show", "window": "w" }
            ]
        }"#,
    )?;
    let mut runner = ReplayRunner::new(&AuraConfig::default());
    let err = runner.run(&script).unwrap_err();
    assert!(format!("{:#}", err).contains("has been destroyed"));
    assert_eq!(runner.log(), vec!["w destroyed".to_string()]);
    Ok(())
}

#[test]
fn duplicate_names_are_rejected() {
    let script = ReplayScript::parse(
        r#"{ "windows": [
            { "name": "a", "bounds": [0, 0, 10, 10] },
            { "name": "a", "bounds": [0, 0, 10, 10] }
        ] }"#,
    )
    .unwrap();
    let mut runner = ReplayRunner::new(&AuraConfig::default());
    assert!(runner.run(&script).is_err());
}

#[test]
fn advance_runs_due_draws_and_lock_blocks_them() -> anyhow::Result<()> {
    let script = ReplayScript::parse(
        r#"{
            "windows": [ { "name": "w", "bounds": [0, 0, 10, 10] } ],
            "steps": [
                { "type": "advance", "ms": 0 },
                { "type": "compositing_ended" },
                { "type": "lock_compositor" },
                { "type": "set_bounds", "window": "w", "bounds": [0, 0, 20, 20] },
                { "type": "hide", "window": "w" },
                { "type": "show", "window": "w" },
                { "type": "run_tasks" }
            ]
        }"#,
    )?;
    let mut runner = ReplayRunner::new(&AuraConfig::default());
    runner.run(&script)?;
    assert_eq!(runner.draws(), 1);

    runner.step(&Step::UnlockCompositor)?;
    runner.step(&Step::RunTasks)?;
    assert_eq!(runner.draws(), 2);
    Ok(())
}

#[test]
fn load_reads_script_files() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(TAP_SCRIPT.as_bytes())?;
    let script = ReplayScript::load(file.path())?;
    assert_eq!(script.steps.len(), 2);

    assert!(ReplayScript::load("/nonexistent/replay.json").is_err());
    Ok(())
}

#[test]
fn key_names() {
    assert_eq!(parse_key("a"), KeyCode::Character('a'));
    assert_eq!(parse_key("Return"), KeyCode::Return);
    assert_eq!(parse_key("f5"), KeyCode::Function(5));
    assert_eq!(parse_key("f99"), KeyCode::Unknown);
    assert_eq!(parse_key("hyper"), KeyCode::Unknown);
}
