//! Wave director
//!
//! Runs the mission state machine and the spawn timers:
//!
//! ```text
//! Intro -> Active -> Breather -> (Intro of next wave | MissionComplete)
//! ```
//!
//! Spawn timers are "next fire at" timestamps polled every tick. A timer that
//! fires asks for a spawn and reschedules itself from the current time with a
//! freshly drawn delay. The director never touches the registry; it returns
//! [`DirectorEvent`]s and the session acts on them.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::{Tuning, WaveSpec};

/// Mission phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WavePhase {
    /// Banner shown, nothing spawns yet
    Intro { until: f64 },
    /// Spawning, wave clock running
    Active,
    /// Wave over, waiting before the next one
    Breather { until: f64 },
    /// Last wave done; terminal until restart
    MissionComplete,
}

/// One self-rescheduling spawn timer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnTimer {
    next_at: Option<f64>,
}

impl SpawnTimer {
    pub fn schedule(&mut self, at: f64) {
        self.next_at = Some(at);
    }

    pub fn cancel(&mut self) {
        self.next_at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_at.is_some()
    }

    pub fn next_at(&self) -> Option<f64> {
        self.next_at
    }

    /// True when armed and its time has come
    pub fn due(&self, now: f64) -> bool {
        self.next_at.is_some_and(|at| now >= at)
    }
}

/// Per-wave counters for the summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveStats {
    pub saucer_kills: u32,
    pub stinger_kills: u32,
    pub asteroid_kills: u32,
    pub shots_fired: u32,
    pub hits: u32,
}

impl WaveStats {
    pub fn kills(&self) -> u32 {
        self.saucer_kills + self.stinger_kills + self.asteroid_kills
    }

    /// Hits over shots fired, as a whole percentage
    pub fn accuracy(&self) -> u32 {
        if self.shots_fired == 0 {
            return 0;
        }
        ((self.hits as f64 / self.shots_fired as f64) * 100.0).round() as u32
    }
}

/// End-of-wave readout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveSummary {
    pub wave: u32,
    pub saucer_kills: u32,
    pub stinger_kills: u32,
    pub asteroid_kills: u32,
    /// Percent of shots that hit
    pub accuracy: u32,
    pub peak_combo: u32,
    pub bonus: u64,
}

impl WaveSummary {
    pub fn new(wave: u32, stats: &WaveStats, peak_combo: u32, bonus: u64) -> Self {
        Self {
            wave,
            saucer_kills: stats.saucer_kills,
            stinger_kills: stats.stinger_kills,
            asteroid_kills: stats.asteroid_kills,
            accuracy: stats.accuracy(),
            peak_combo,
            bonus,
        }
    }
}

/// What a timer asked the session to spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnRequest {
    Asteroid,
    Saucer,
    Stinger,
}

/// Director output for one update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorEvent {
    /// Intro finished; the wave clock started
    Activated,
    Spawn(SpawnRequest),
    /// Wave duration elapsed; spawning stopped
    Completed,
    /// Breather over; the given 0-based wave is starting its intro
    NextWave(usize),
    /// Breather after the last wave is over
    MissionComplete,
}

/// Live enemy counts used for concurrency caps
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveCounts {
    pub saucers: usize,
    pub stingers: usize,
}

/// Mission state machine plus its spawn timers
#[derive(Debug, Clone)]
pub struct WaveDirector {
    waves: Vec<WaveSpec>,
    index: usize,
    phase: WavePhase,
    wave_started_at: f64,
    asteroid_timer: SpawnTimer,
    enemy_timer: SpawnTimer,
    stinger_timer: SpawnTimer,
    pub stats: WaveStats,
}

fn draw_delay<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64, mul: f64) -> f64 {
    let base = if max > min { rng.random_range(min..=max) } else { min };
    base * mul
}

impl WaveDirector {
    pub fn new(waves: Vec<WaveSpec>) -> Self {
        Self {
            waves,
            index: 0,
            phase: WavePhase::MissionComplete,
            wave_started_at: 0.0,
            asteroid_timer: SpawnTimer::default(),
            enemy_timer: SpawnTimer::default(),
            stinger_timer: SpawnTimer::default(),
            stats: WaveStats::default(),
        }
    }

    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    /// 0-based wave index
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based wave number for display
    pub fn wave_number(&self) -> u32 {
        self.index as u32 + 1
    }

    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    pub fn current(&self) -> Option<&WaveSpec> {
        self.waves.get(self.index)
    }

    pub fn is_last_wave(&self) -> bool {
        self.index + 1 >= self.waves.len()
    }

    pub fn timers(&self) -> [&SpawnTimer; 3] {
        [&self.asteroid_timer, &self.enemy_timer, &self.stinger_timer]
    }

    /// Enter the intro of wave `index`; stats reset, timers disarmed
    pub fn start_wave(&mut self, index: usize, now: f64, intro_ms: f64) {
        self.index = index.min(self.waves.len().saturating_sub(1));
        self.phase = WavePhase::Intro { until: now + intro_ms };
        self.wave_started_at = now;
        self.stats = WaveStats::default();
        self.cancel_timers();
        log::info!("Wave {} intro", self.wave_number());
    }

    /// Disarm every spawn timer
    pub fn cancel_timers(&mut self) {
        self.asteroid_timer.cancel();
        self.enemy_timer.cancel();
        self.stinger_timer.cancel();
    }

    /// Wave completion fraction in [0, 1]
    pub fn progress(&self, now: f64) -> f32 {
        match (self.phase, self.current()) {
            (WavePhase::Intro { .. }, _) => 0.0,
            (WavePhase::Active, Some(wave)) => {
                ((now - self.wave_started_at) / wave.duration_ms).clamp(0.0, 1.0) as f32
            }
            _ => 1.0,
        }
    }

    fn stingers_eligible(&self, tuning: &Tuning) -> bool {
        tuning.stinger.enabled && self.wave_number() >= tuning.stinger.from_wave
    }

    fn arm_timers<R: Rng + ?Sized>(&mut self, now: f64, tuning: &Tuning, rng: &mut R) {
        let Some(wave) = self.current().cloned() else {
            return;
        };
        let spawn = &tuning.spawn;
        self.asteroid_timer.schedule(
            now + draw_delay(rng, spawn.asteroid_min_ms, spawn.asteroid_max_ms, wave.asteroid_spawn_mul),
        );
        self.enemy_timer.schedule(
            now + draw_delay(rng, spawn.enemy_min_ms, spawn.enemy_max_ms, wave.enemy_spawn_mul),
        );
        if self.stingers_eligible(tuning) {
            self.stinger_timer.schedule(now + tuning.stinger.check_interval_ms);
        }
    }

    /// Advance the state machine and poll spawn timers
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        now: f64,
        tuning: &Tuning,
        live: LiveCounts,
        rng: &mut R,
    ) -> Vec<DirectorEvent> {
        let mut events = Vec::new();
        let Some(wave) = self.current().cloned() else {
            return events;
        };

        match self.phase {
            WavePhase::Intro { until } => {
                if now >= until {
                    self.phase = WavePhase::Active;
                    self.wave_started_at = now;
                    self.arm_timers(now, tuning, rng);
                    events.push(DirectorEvent::Activated);
                    log::info!("Wave {} active", self.wave_number());
                }
            }
            WavePhase::Active => {
                if now - self.wave_started_at >= wave.duration_ms {
                    self.cancel_timers();
                    self.phase = WavePhase::Breather {
                        until: now + tuning.spawn.inter_wave_ms,
                    };
                    events.push(DirectorEvent::Completed);
                    log::info!("Wave {} complete", self.wave_number());
                    return events;
                }

                let spawn = &tuning.spawn;
                if self.asteroid_timer.due(now) {
                    events.push(DirectorEvent::Spawn(SpawnRequest::Asteroid));
                    self.asteroid_timer.schedule(
                        now + draw_delay(rng, spawn.asteroid_min_ms, spawn.asteroid_max_ms, wave.asteroid_spawn_mul),
                    );
                }

                if self.enemy_timer.due(now) {
                    if rng.random_bool(spawn.asteroid_chance) {
                        events.push(DirectorEvent::Spawn(SpawnRequest::Asteroid));
                    } else {
                        let cap = (tuning.saucer.base_cap + wave.extra_enemy_cap) as usize;
                        if live.saucers < cap {
                            events.push(DirectorEvent::Spawn(SpawnRequest::Saucer));
                        } else {
                            log::trace!("Saucer spawn skipped at cap {}", cap);
                        }
                    }
                    self.enemy_timer.schedule(
                        now + draw_delay(rng, spawn.enemy_min_ms, spawn.enemy_max_ms, wave.enemy_spawn_mul),
                    );
                }

                if self.stinger_timer.due(now) {
                    if live.stingers < tuning.stinger.max_alive as usize
                        && rng.random_bool(tuning.stinger.spawn_chance)
                    {
                        events.push(DirectorEvent::Spawn(SpawnRequest::Stinger));
                    }
                    self.stinger_timer.schedule(now + tuning.stinger.check_interval_ms);
                }
            }
            WavePhase::Breather { until } => {
                if now >= until {
                    if self.is_last_wave() {
                        self.phase = WavePhase::MissionComplete;
                        events.push(DirectorEvent::MissionComplete);
                        log::info!("Mission complete");
                    } else {
                        let next = self.index + 1;
                        self.start_wave(next, now, tuning.spawn.intro_ms);
                        events.push(DirectorEvent::NextWave(next));
                    }
                }
            }
            WavePhase::MissionComplete => {}
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn short_mission() -> Tuning {
        Tuning {
            waves: vec![
                WaveSpec::new(5_000.0, 1.0, 1.0, 1.0, 0),
                WaveSpec::new(5_000.0, 1.0, 1.0, 1.0, 0),
            ],
            ..Tuning::default()
        }
    }

    fn run(
        director: &mut WaveDirector,
        tuning: &Tuning,
        from: f64,
        to: f64,
        live: LiveCounts,
        rng: &mut Pcg32,
    ) -> Vec<DirectorEvent> {
        let mut all = Vec::new();
        let mut now = from;
        while now <= to {
            all.extend(director.update(now, tuning, live, rng));
            now += 10.0;
        }
        all
    }

    #[test]
    fn test_timer_due() {
        let mut timer = SpawnTimer::default();
        assert!(!timer.due(1e9));
        timer.schedule(100.0);
        assert!(!timer.due(99.0));
        assert!(timer.due(100.0));
        timer.cancel();
        assert!(!timer.due(200.0));
    }

    #[test]
    fn test_intro_then_active() {
        let tuning = short_mission();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut director = WaveDirector::new(tuning.waves.clone());
        director.start_wave(0, 0.0, 1000.0);

        assert!(director.update(500.0, &tuning, LiveCounts::default(), &mut rng).is_empty());
        assert_eq!(director.progress(500.0), 0.0);
        assert!(director.timers().iter().all(|t| !t.is_armed()));

        let events = director.update(1000.0, &tuning, LiveCounts::default(), &mut rng);
        assert_eq!(events, vec![DirectorEvent::Activated]);
        assert_eq!(director.phase(), WavePhase::Active);
        assert!((director.progress(3500.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_timer_delays_in_range() {
        let tuning = short_mission();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut director = WaveDirector::new(tuning.waves.clone());
        director.start_wave(0, 0.0, 0.0);
        director.update(0.0, &tuning, LiveCounts::default(), &mut rng);

        let [asteroid, enemy, stinger] = director.timers();
        let a = asteroid.next_at().unwrap();
        let e = enemy.next_at().unwrap();
        assert!((700.0..=1000.0).contains(&a));
        assert!((1300.0..=1900.0).contains(&e));
        // Stingers not eligible in wave 1
        assert!(!stinger.is_armed());
    }

    #[test]
    fn test_wave_multiplier_scales_delay() {
        let mut tuning = short_mission();
        tuning.waves[0].asteroid_spawn_mul = 0.5;
        let mut rng = Pcg32::seed_from_u64(3);
        let mut director = WaveDirector::new(tuning.waves.clone());
        director.start_wave(0, 0.0, 0.0);
        director.update(0.0, &tuning, LiveCounts::default(), &mut rng);
        let a = director.timers()[0].next_at().unwrap();
        assert!((350.0..=500.0).contains(&a));
    }

    #[test]
    fn test_saucer_cap_enforced() {
        let mut tuning = short_mission();
        tuning.spawn.asteroid_chance = 0.0;
        let mut rng = Pcg32::seed_from_u64(11);
        let mut director = WaveDirector::new(tuning.waves.clone());
        director.start_wave(0, 0.0, 0.0);

        let full = LiveCounts {
            saucers: tuning.saucer.base_cap as usize,
            stingers: 0,
        };
        let events = run(&mut director, &tuning, 0.0, 4_900.0, full, &mut rng);
        assert!(!events.contains(&DirectorEvent::Spawn(SpawnRequest::Saucer)));

        director.start_wave(0, 0.0, 0.0);
        let events = run(&mut director, &tuning, 0.0, 4_900.0, LiveCounts::default(), &mut rng);
        assert!(events.contains(&DirectorEvent::Spawn(SpawnRequest::Saucer)));
    }

    #[test]
    fn test_stingers_only_from_eligible_wave() {
        let mut tuning = short_mission();
        tuning.stinger.from_wave = 2;
        tuning.stinger.spawn_chance = 1.0;
        let mut rng = Pcg32::seed_from_u64(5);
        let mut director = WaveDirector::new(tuning.waves.clone());

        director.start_wave(0, 0.0, 0.0);
        let events = run(&mut director, &tuning, 0.0, 4_900.0, LiveCounts::default(), &mut rng);
        assert!(!events.contains(&DirectorEvent::Spawn(SpawnRequest::Stinger)));

        director.start_wave(1, 0.0, 0.0);
        let events = run(&mut director, &tuning, 0.0, 4_900.0, LiveCounts::default(), &mut rng);
        let stingers = events
            .iter()
            .filter(|e| **e == DirectorEvent::Spawn(SpawnRequest::Stinger))
            .count();
        // One check every 1500ms
        assert_eq!(stingers, 3);
    }

    #[test]
    fn test_mission_completes_exactly_once() {
        let tuning = short_mission();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut director = WaveDirector::new(tuning.waves.clone());
        director.start_wave(0, 0.0, tuning.spawn.intro_ms);

        let events = run(&mut director, &tuning, 0.0, 60_000.0, LiveCounts::default(), &mut rng);
        let count = |target: DirectorEvent| events.iter().filter(|e| **e == target).count();
        assert_eq!(count(DirectorEvent::Completed), 2);
        assert_eq!(count(DirectorEvent::NextWave(1)), 1);
        assert_eq!(count(DirectorEvent::MissionComplete), 1);
        assert_eq!(director.phase(), WavePhase::MissionComplete);
        assert_eq!(director.wave_number(), 2);
        assert!(director.timers().iter().all(|t| !t.is_armed()));
    }

    #[test]
    fn test_no_spawns_after_completion() {
        let tuning = short_mission();
        let mut rng = Pcg32::seed_from_u64(13);
        let mut director = WaveDirector::new(tuning.waves.clone());
        director.start_wave(0, 0.0, 0.0);
        director.update(0.0, &tuning, LiveCounts::default(), &mut rng);
        assert_eq!(
            director.update(5_000.0, &tuning, LiveCounts::default(), &mut rng),
            vec![DirectorEvent::Completed]
        );
        let events = run(&mut director, &tuning, 5_010.0, 6_400.0, LiveCounts::default(), &mut rng);
        assert!(events.iter().all(|e| !matches!(e, DirectorEvent::Spawn(_))));
    }

    #[test]
    fn test_accuracy() {
        let stats = WaveStats {
            shots_fired: 8,
            hits: 3,
            ..WaveStats::default()
        };
        assert_eq!(stats.accuracy(), 38);
        assert_eq!(WaveStats::default().accuracy(), 0);
    }
}
