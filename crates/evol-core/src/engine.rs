use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

use crate::arena::Arena;
use crate::asteroid::Asteroid;
use crate::config::Config;
use crate::coord::Coord;
use crate::lifeform::Lifeform;
use crate::mutator;
use crate::opcode::{ActionKind, OpCode};
use crate::snapshot::SnapshotView;
use crate::timer::{Timer, TimerStats};

struct EngineState {
    arena: Arena,
    turn: u64,
}

/// The per-thread supervisor that advances one arena tick by tick
/// (spec.md §4.6). Grounded on the teacher's staged, individually-timed
/// `step()` (`world/lifecycle.rs`'s `step_nn_query_phase` / ... pattern):
/// this tick is similarly decomposed into phase methods, each operating on
/// the same locked state, timed as a whole via `Timer`.
///
/// The arena/turn pair lives behind an `RwLock` rather than the plain
/// `Mutex` spec.md §4.6 names: sense-and-decide (step 1) only ever *reads*
/// the arena, so a read lock lets it run without excluding concurrent
/// observers, while resolve-through-migrate (steps 3-9) takes the write
/// lock. This preserves the "no arena mutation during decide" contract in
/// safe Rust without an unsafe lock-free read path.
pub struct Engine {
    state: RwLock<EngineState>,
    rng: Mutex<ChaCha12Rng>,
    timer: Timer,
    exit: AtomicBool,
    asteroid: Arc<Asteroid>,
    config: Config,
}

impl Engine {
    pub fn new(config: Config, asteroid: Arc<Asteroid>) -> Engine {
        let arena = Arena::new(config.width, config.height);
        let seed = config.seed.unwrap_or_else(|| rand::random::<u64>());
        let engine = Engine {
            state: RwLock::new(EngineState { arena, turn: 0 }),
            rng: Mutex::new(ChaCha12Rng::seed_from_u64(seed)),
            timer: Timer::new(),
            exit: AtomicBool::new(false),
            asteroid,
            config,
        };
        engine.seed_initial_population();
        engine
    }

    fn seed_initial_population(&self) {
        let mut state = self.state.write().expect("engine state poisoned");
        let mut rng = self.rng.lock().expect("engine rng poisoned");
        for _ in 0..self.config.starting_lifeforms {
            let coord = state.arena.random_coord(&mut *rng);
            state.arena.add(Lifeform::seed(vec![OpCode::FinalMoveRandom], 1.0), coord);
        }
    }

    pub fn request_exit(&self) {
        self.exit.store(true, Ordering::Relaxed);
    }

    pub fn exit_requested(&self) -> bool {
        self.exit.load(Ordering::Relaxed)
    }

    /// Runs ticks until `request_exit` is observed at the next iteration
    /// boundary. In-flight ticks always complete (spec.md §5 Cancellation).
    pub fn run(&self) {
        while !self.exit_requested() {
            self.tick();
        }
    }

    pub fn timer_stats(&self) -> TimerStats {
        self.timer.stats()
    }

    /// Runs `f` with a [`SnapshotView`] borrowing this engine's current
    /// state under a single read lock. Observers must not hold more than
    /// one engine's lock at a time (spec.md §5) — this signature enforces
    /// that by scoping the borrow to the closure.
    pub fn with_snapshot<R>(&self, f: impl FnOnce(SnapshotView) -> R) -> R {
        let state = self.state.read().expect("engine state poisoned");
        f(SnapshotView::new(&state.arena, &self.timer))
    }

    pub fn turn(&self) -> u64 {
        self.state.read().expect("engine state poisoned").turn
    }

    /// One full iteration of spec.md §4.6's ten-step pipeline.
    pub fn tick(&self) {
        let timer_start = self.timer.start();

        let decisions = self.decide_phase();
        let buckets = Self::bucket_by_destination(decisions);

        {
            let mut state = self.state.write().expect("engine state poisoned");
            let turn = state.turn;
            let mut rng = self.rng.lock().expect("engine rng poisoned");

            Self::resolve_phase(&mut state.arena, buckets);
            Self::energy_distribution_phase(&mut state.arena);
            Self::metabolism_phase(&mut state.arena, &self.config);
            Self::starvation_phase(&mut state.arena);
            Self::reproduction_phase(&mut state.arena, &mut rng, &self.config);
            Self::asteroid_migration_phase(
                &mut state.arena,
                &mut rng,
                turn,
                &self.asteroid,
                &self.config,
            );

            state.turn += 1;
        }

        self.timer.end(timer_start);
    }

    /// Step 1: sense & decide. Takes only a read lock on the arena, and the
    /// RNG lock only for the lifeforms that actually draw from it
    /// (`FINAL_MOVE_RANDOM`). Pure: returns what each lifeform decided
    /// without touching the arena or mutating any lifeform.
    fn decide_phase(&self) -> Vec<(u64, Coord, ActionKind, f64)> {
        let state = self.state.read().expect("engine state poisoned");
        let mut rng = self.rng.lock().expect("engine rng poisoned");
        state
            .arena
            .roster()
            .iter()
            .map(|lf| {
                let (action, delta) = lf.run(&state.arena, &mut *rng, self.config.random_move_cost);
                (lf.id(), lf.coord(), action, delta)
            })
            .collect()
    }

    /// Step 2: bucket actions by destination coordinate, preserving
    /// recorded order within each bucket.
    fn bucket_by_destination(
        decisions: Vec<(u64, Coord, ActionKind, f64)>,
    ) -> HashMap<Coord, Vec<(u64, ActionKind, f64)>> {
        let mut buckets: HashMap<Coord, Vec<(u64, ActionKind, f64)>> = HashMap::new();
        for (id, coord, action, delta) in decisions {
            let dest = match action {
                ActionKind::Nothing | ActionKind::Apoptosis => coord,
                ActionKind::MoveNorth => coord.north(),
                ActionKind::MoveSouth => coord.south(),
                ActionKind::MoveEast => coord.east(),
                ActionKind::MoveWest => coord.west(),
            };
            buckets.entry(dest).or_default().push((id, action, delta));
        }
        buckets
    }

    /// Steps 3-4: resolve bucketed actions against the arena. Bucket
    /// iteration order is arbitrary; within a bucket, recorded order is
    /// preserved.
    fn resolve_phase(arena: &mut Arena, buckets: HashMap<Coord, Vec<(u64, ActionKind, f64)>>) {
        for (dest, actions) in buckets {
            for (id, action, delta) in actions {
                match action {
                    ActionKind::Apoptosis => {
                        arena.kill(id);
                        continue;
                    }
                    ActionKind::MoveNorth
                    | ActionKind::MoveSouth
                    | ActionKind::MoveEast
                    | ActionKind::MoveWest => {
                        arena.move_lifeform(id, dest);
                    }
                    ActionKind::Nothing => {}
                }
                if delta != 0.0 {
                    if let Some(lf) = arena.get_mut(id) {
                        lf.set_energy(lf.energy() + delta);
                    }
                }
            }
        }
    }

    /// Step 5: apportion each cell's energy to its occupants, or to its
    /// adjacent occupants if the cell itself is empty. Deltas are collected
    /// against the occupancy snapshot observed during this pass, then
    /// applied afterward, so iteration order never affects the totals any
    /// lifeform receives (spec.md §9, "Energy pass atomicity").
    fn energy_distribution_phase(arena: &mut Arena) {
        let mut deltas: HashMap<u64, f64> = HashMap::new();
        for y in 0..arena.height() {
            for x in 0..arena.width() {
                let c = Coord::new(x, y);
                let e = arena.get_energy(c);
                let occupants = arena.lifeforms_at(c);
                if !occupants.is_empty() {
                    let share = e / occupants.len() as f64;
                    for lf in occupants {
                        *deltas.entry(lf.id()).or_insert(0.0) += share;
                    }
                    continue;
                }
                let adjacent = arena.adjacent_lifeforms(c);
                if !adjacent.is_empty() {
                    let share = e / adjacent.len() as f64;
                    for lf in adjacent {
                        *deltas.entry(lf.id()).or_insert(0.0) += share;
                    }
                }
            }
        }
        for (id, delta) in deltas {
            if let Some(lf) = arena.get_mut(id) {
                lf.set_energy(lf.energy() + delta);
            }
        }
    }

    /// Step 6: metabolism cost per living lifeform.
    fn metabolism_phase(arena: &mut Arena, config: &Config) {
        let deltas: Vec<(u64, f64)> = arena
            .roster()
            .iter()
            .map(|lf| {
                let cost = config.cost_of_living + config.cost_of_opcode * lf.dna().len() as f64;
                (lf.id(), -cost)
            })
            .collect();
        for (id, delta) in deltas {
            if let Some(lf) = arena.get_mut(id) {
                lf.set_energy(lf.energy() + delta);
            }
        }
    }

    /// Step 7: kill anything at or below zero energy.
    fn starvation_phase(arena: &mut Arena) {
        let starved: Vec<u64> = arena
            .roster()
            .iter()
            .filter(|lf| lf.energy() <= 0.0)
            .map(|lf| lf.id())
            .collect();
        for id in starved {
            arena.kill(id);
        }
    }

    /// Step 8: split sufficiently energetic lifeforms. Iterates a snapshot
    /// of ids taken before the loop so newly born children never reproduce
    /// in the same tick (spec.md §9, "Reproduction iteration").
    fn reproduction_phase(arena: &mut Arena, rng: &mut ChaCha12Rng, config: &Config) {
        let snapshot: Vec<u64> = arena.roster().iter().map(|lf| lf.id()).collect();
        for id in snapshot {
            let Some(parent) = arena.get(id) else { continue };
            if parent.energy() < config.meiosis_level {
                continue;
            }
            let coord = parent.coord();
            let post_cost = parent.energy() - config.meiosis_cost;
            let half = post_cost / 2.0;

            let mut child = parent.make_child();
            mutator::mutate(&mut child, rng, &config.mutation);
            child.set_energy(half);

            if let Some(parent_mut) = arena.get_mut(id) {
                parent_mut.set_energy(half);
            }
            arena.add(child, coord);
        }
    }

    /// Step 9: on the configured intervals, launch a random resident to the
    /// shared Asteroid and/or land a random resident from it. Takes
    /// `asteroid`/`config` as plain references (rather than `&self`) so it
    /// can run while `tick` still holds the write-locked arena and the
    /// locked RNG as separate, disjoint field borrows.
    fn asteroid_migration_phase(
        arena: &mut Arena,
        rng: &mut ChaCha12Rng,
        turn: u64,
        asteroid: &Asteroid,
        config: &Config,
    ) {
        let launch_interval = config.lifeform_asteroid_launch_interval;
        if launch_interval != 0 && turn % launch_interval == 0 {
            if let Some(lf) = arena.remove_random(rng) {
                asteroid.launch(lf);
            }
        }
        let land_interval = config.lifeform_asteroid_land_interval;
        if land_interval != 0 && turn % land_interval == 0 {
            if let Some(lf) = asteroid.land() {
                let coord = arena.random_coord(rng);
                arena.add(lf, coord);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();
    fn bounds() {
        INIT.call_once(|| crate::coord::set_global_bounds(4, 4));
    }

    /// A metabolism-free baseline (`cost_of_living`/`cost_of_opcode` zeroed)
    /// so tests that assert position or reproduction arithmetic aren't
    /// confounded by incidental starvation; tests that care about
    /// metabolism set their own costs explicitly.
    fn config_no_seeds() -> Config {
        bounds();
        let mut c = Config::default();
        c.width = 4;
        c.height = 4;
        c.starting_lifeforms = 0;
        c.lifeform_asteroid_launch_interval = 0;
        c.lifeform_asteroid_land_interval = 0;
        c.cost_of_living = 0.0;
        c.cost_of_opcode = 0.0;
        c.seed = Some(1);
        c
    }

    fn engine(config: Config) -> Engine {
        Engine::new(config, Arc::new(Asteroid::new(4, ChaCha12Rng::seed_from_u64(2))))
    }

    #[test]
    fn empty_dna_dies_and_increments_dead_counter() {
        let e = engine(config_no_seeds());
        {
            let mut state = e.state.write().unwrap();
            state.arena.add(Lifeform::seed(vec![], 1.0), Coord::new(1, 1));
        }
        e.tick();
        e.with_snapshot(|s| {
            assert_eq!(s.population(), 0);
            assert_eq!(s.dead_count(), 1);
        });
    }

    #[test]
    fn single_opcode_determinism_with_toroidal_wrap() {
        let e = engine(config_no_seeds());
        let id = {
            let mut state = e.state.write().unwrap();
            state
                .arena
                .add(Lifeform::seed(vec![OpCode::FinalMoveNorth], 1.0), Coord::new(2, 2))
        };
        e.tick();
        let moved_to = e.state.read().unwrap().arena.get(id).unwrap().coord();
        assert_eq!(moved_to, Coord::new(2, 1));

        let e2 = engine(config_no_seeds());
        let id2 = {
            let mut state = e2.state.write().unwrap();
            state
                .arena
                .add(Lifeform::seed(vec![OpCode::FinalMoveNorth], 1.0), Coord::new(2, 0))
        };
        e2.tick();
        let wrapped_to = e2.state.read().unwrap().arena.get(id2).unwrap().coord();
        assert_eq!(wrapped_to, Coord::new(2, 3));
    }

    #[test]
    fn crowding_sensor_drives_conditional_move() {
        // spec.md §8 boundary scenario 3: two lifeforms share a cell; the
        // IS_CROWDED sensor fires, CJMP1 skips FINAL_MOVE_NORTH, and
        // FINAL_MOVE_SOUTH runs instead.
        let e = engine(config_no_seeds());
        let a_id = {
            let mut state = e.state.write().unwrap();
            let a = state.arena.add(
                Lifeform::seed(
                    vec![
                        OpCode::IsCrowded,
                        OpCode::CJmp1,
                        OpCode::FinalMoveNorth,
                        OpCode::FinalMoveSouth,
                    ],
                    5.0,
                ),
                Coord::new(1, 1),
            );
            state.arena.add(Lifeform::seed(vec![OpCode::Nop], 5.0), Coord::new(1, 1));
            a
        };
        e.tick();
        let state = e.state.read().unwrap();
        let a = state.arena.get(a_id).expect("lifeform A should survive the tick");
        assert_eq!(a.coord(), Coord::new(1, 2));
    }

    #[test]
    fn reproduction_split_arithmetic() {
        let mut config = config_no_seeds();
        config.meiosis_level = 200.0;
        config.meiosis_cost = 25.0;
        let e = engine(config.clone());
        let parent_id = {
            let mut state = e.state.write().unwrap();
            state
                .arena
                .add(Lifeform::seed(vec![OpCode::Nop], 210.0), Coord::new(0, 0))
        };
        {
            let mut state = e.state.write().unwrap();
            let mut rng = e.rng.lock().unwrap();
            Engine::reproduction_phase(&mut state.arena, &mut rng, &config);
        }
        let state = e.state.read().unwrap();
        let parent = state.arena.get(parent_id).unwrap();
        assert_eq!(parent.energy(), 92.5);
        let child = state
            .arena
            .roster()
            .iter()
            .find(|lf| lf.id() != parent_id)
            .expect("child should have been born");
        assert_eq!(child.energy(), 92.5);
        assert_eq!(child.coord(), Coord::new(0, 0));
        assert_eq!(child.gen(), parent.gen() + 1);
    }

    #[test]
    fn starvation_arithmetic() {
        let mut config = config_no_seeds();
        config.cost_of_living = 2.0;
        config.cost_of_opcode = 0.01;
        let e = engine(config);
        let id = {
            let mut state = e.state.write().unwrap();
            let c = Coord::new(0, 0);
            state.arena.set_energy(c, 0.5);
            state.arena.add(Lifeform::seed(vec![OpCode::Nop], 1.0), c)
        };
        e.tick();
        let state = e.state.read().unwrap();
        assert!(state.arena.get(id).is_none());
        assert_eq!(state.arena.dead_count(), 1);
    }

    #[test]
    fn asteroid_round_trip_between_two_engines() {
        let asteroid = Arc::new(Asteroid::new(1, ChaCha12Rng::seed_from_u64(9)));
        let mut c1 = config_no_seeds();
        c1.lifeform_asteroid_launch_interval = 1;
        let e1 = Engine::new(c1, asteroid.clone());
        let launched_id = {
            let mut state = e1.state.write().unwrap();
            state
                .arena
                .add(Lifeform::seed(vec![OpCode::Nop], 1.0), Coord::new(0, 0))
        };
        e1.tick();
        assert_eq!(asteroid.num_waiting(), 1);
        assert_eq!(asteroid.num_launched(), 1);

        let mut c2 = config_no_seeds();
        c2.lifeform_asteroid_land_interval = 1;
        let e2 = Engine::new(c2, asteroid.clone());
        e2.tick();
        assert_eq!(asteroid.num_waiting(), 0);
        assert_eq!(asteroid.num_landed(), 1);
        let landed = e2
            .state
            .read()
            .unwrap()
            .arena
            .roster()
            .iter()
            .find(|lf| lf.id() == launched_id)
            .cloned();
        assert!(landed.is_some());
    }
}
