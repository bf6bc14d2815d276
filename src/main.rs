//! Placement Engine headless harness
//!
//! Replays a scripted list of drops against a fixed layout and prints the
//! final snapshot. Usage: `placement-engine [replay.json]` (built-in demo
//! when no file is given). `RUST_LOG=debug` shows every snap decision.

#[cfg(not(target_arch = "wasm32"))]
mod replay {
    use glam::Vec2;
    use serde::Deserialize;

    use placement_engine::engine::{LogPort, Manifest, Session, StaticLayout};
    use placement_engine::profile::AgeProfile;

    /// Replay document
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Replay {
        pub manifest: Manifest,
        #[serde(default)]
        pub profile: AgeProfile,
        pub layout: StaticLayout,
        #[serde(default)]
        pub drops: Vec<ScriptedDrop>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ScriptedDrop {
        pub item_id: String,
        pub x: f32,
        pub y: f32,
    }

    pub const DEMO: &str = r#"{
        "manifest": {
            "items": [
                {"id": "fish", "correctTargetId": "water", "assetRef": "🐟"},
                {"id": "bird", "correctTargetId": "sky", "assetRef": "🐦"},
                {"id": "frog", "correctTargetId": "water", "assetRef": "🐸"}
            ],
            "targets": [
                {"id": "water", "label": "Water"},
                {"id": "sky", "label": "Sky", "toleranceRadius": 120.0}
            ]
        },
        "profile": {"snapToleranceDefault": 100.0, "feedbackIntensity": "celebratory"},
        "layout": {
            "container": {"origin": [20.0, 40.0], "size": [800.0, 600.0]},
            "targets": {
                "water": {"center": [200.0, 450.0], "radius": null},
                "sky": {"center": [600.0, 120.0], "radius": null}
            }
        },
        "drops": [
            {"itemId": "frog", "x": 420.0, "y": 420.0},
            {"itemId": "fish", "x": 640.0, "y": 170.0},
            {"itemId": "bird", "x": 240.0, "y": 490.0},
            {"itemId": "fish", "x": 230.0, "y": 480.0},
            {"itemId": "bird", "x": 610.0, "y": 150.0},
            {"itemId": "frog", "x": 210.0, "y": 500.0}
        ]
    }"#;

    pub fn load(path: Option<&str>) -> Result<Replay, Box<dyn std::error::Error>> {
        let json = match path {
            Some(path) => std::fs::read_to_string(path)?,
            None => DEMO.to_string(),
        };
        let replay: Replay = serde_json::from_str(&json)?;
        replay.profile.validate()?;
        Ok(replay)
    }

    pub fn run(replay: Replay) -> Result<String, serde_json::Error> {
        let mut session =
            Session::new(replay.manifest, replay.profile).with_position_provider(Box::new(replay.layout));
        session.subscribe(Box::new(LogPort));

        for drop in &replay.drops {
            match session.on_drag_end(&drop.item_id, Vec2::new(drop.x, drop.y)) {
                Ok(outcome) => log::debug!("{} -> {:?}", drop.item_id, outcome),
                Err(err) => log::warn!("{} rejected: {}", drop.item_id, err),
            }
        }

        serde_json::to_string_pretty(&session.snapshot())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Placement engine harness starting...");

    let path = std::env::args().nth(1);
    let replay = match replay::load(path.as_deref()) {
        Ok(replay) => replay,
        Err(err) => {
            log::error!("Failed to load replay: {}", err);
            std::process::exit(2);
        }
    };

    match replay::run(replay) {
        Ok(snapshot) => println!("{}", snapshot),
        Err(err) => {
            log::error!("Failed to serialize snapshot: {}", err);
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is `wasm::start`, this is just to satisfy the compiler
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::replay;

    #[test]
    fn test_demo_replay_completes() {
        let demo = replay::load(None).unwrap();
        let snapshot: serde_json::Value =
            serde_json::from_str(&replay::run(demo).unwrap()).unwrap();
        assert_eq!(snapshot["phase"], "completed");
        assert_eq!(snapshot["completion"]["correctCount"], 3);
        assert_eq!(snapshot["completion"]["mistakes"], 2);
    }
}
