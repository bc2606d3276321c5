//! Astro Saucer headless runner
//!
//! Plays a full mission on autopilot at a fixed 60 Hz step and logs what
//! happens. Usage: `astro-saucer [seed] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::cell::RefCell;
    use std::rc::Rc;

    use astro_saucer::platform::FileStore;
    use astro_saucer::sim::{EventKind, GameEvent};
    use astro_saucer::{Session, StoredHighScore, TickInput, Tuning};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Astro Saucer (headless) starting...");

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0x5A5C_E125);

    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::error!("Failed to load tuning from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };

    let store = FileStore::new(std::env::temp_dir().join("astro-saucer-scores.json"));
    let mut session = Session::new(tuning, Box::new(StoredHighScore::new(store)), seed);

    let summaries = Rc::new(RefCell::new(Vec::new()));
    let sink = summaries.clone();
    session.subscribe_to(
        &[EventKind::WaveSummary],
        Box::new(move |event: &GameEvent| {
            if let GameEvent::WaveSummary(summary) = event {
                sink.borrow_mut().push(summary.clone());
            }
        }),
    );

    const FRAME_MS: f64 = 1000.0 / 60.0;
    // Ten minutes of game time is far beyond any mission
    const MAX_FRAMES: u32 = 60 * 60 * 10;

    let input = TickInput {
        autopilot: true,
        ..TickInput::default()
    };

    session.start_session(0.0);
    let mut now = 0.0;
    let mut frames = 0;
    while session.is_running() && frames < MAX_FRAMES {
        now += FRAME_MS;
        frames += 1;
        session.tick(now, FRAME_MS, &input);
        // Pull consumers drain every frame; only the sink above keeps anything
        session.drain_events();
    }

    let state = session.state();
    for summary in summaries.borrow().iter() {
        log::info!(
            "Wave {}: {} saucers, {} stingers, {} asteroids, {}% accuracy, peak combo x{}",
            summary.wave,
            summary.saucer_kills,
            summary.stinger_kills,
            summary.asteroid_kills,
            summary.accuracy,
            summary.peak_combo
        );
    }
    log::info!(
        "Finished after {:.1}s: score {}, lives {}, {} kills, {}",
        now / 1000.0,
        state.score,
        state.lives,
        state.total_kills(),
        if state.mission_complete {
            "mission complete"
        } else if state.game_over {
            "game over"
        } else {
            "timed out"
        }
    );
    log::info!("Best score: {}", session.best_score());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser hosts drive `Session` directly through the library
}
