use super::*;

use crate::test_support::scene_json;

fn loaded() -> EngineCore {
    let mut core = EngineCore::new();
    SceneSurface::load(&mut core, &scene_json()).expect("loads");
    core
}

#[test]
fn headless_present_keeps_only_persistence() {
    let mut core = EngineCore::new();
    let rest = core.present(vec![
        Action::RenderNeeded,
        Action::Persist("{}".into()),
        Action::PersistFailed("boom".into()),
    ]);
    assert_eq!(rest, vec![Action::Persist("{}".into()), Action::PersistFailed("boom".into())]);
}

#[test]
fn settings_absent_until_loaded() {
    let core = EngineCore::new();
    assert!(core.settings().is_none());

    let settings = loaded().settings().expect("settings");
    assert_eq!(settings.grid_columns, 10);
    assert_eq!(settings.grid_rows, 8);
    assert!(settings.grid_lines);
}

#[test]
fn failed_load_keeps_current_graph() {
    let mut core = loaded();
    assert!(SceneSurface::load(&mut core, "not json").is_err());
    assert!(core.model.is_loaded());
}

#[test]
fn apply_config_yields_persist() {
    let mut core = loaded();
    let manage = SceneManage { map_x: 1.0, map_z: 2.0, grid_lines: false };
    let actions = SceneSurface::apply_config(&mut core, &manage).expect("applies");
    let rest = core.present(actions);
    assert!(matches!(rest.as_slice(), [Action::Persist(_)]));
}
