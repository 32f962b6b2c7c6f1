use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use tracing::info;

use evol_core::{coord, Asteroid, Config, Engine};

/// Runs a population of Evol lifeforms across one or more independent arenas.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Arena width, shared by every engine.
    #[arg(long, default_value_t = 64)]
    width: i32,

    /// Arena height, shared by every engine.
    #[arg(long, default_value_t = 64)]
    height: i32,

    /// Number of engine threads. 0 autodetects available parallelism.
    #[arg(long, default_value_t = 0)]
    engines: u32,

    /// Lifeforms seeded into each arena at startup.
    #[arg(long, default_value_t = 10)]
    starting_lifeforms: u32,

    /// Capacity of the asteroid shared by every engine.
    #[arg(long, default_value_t = 128)]
    asteroid_size: usize,

    /// RNG seed. Unset means each engine seeds from a non-deterministic source.
    #[arg(long)]
    seed: Option<u64>,

    /// Stop every engine after this many ticks. Unset runs until interrupted.
    #[arg(long)]
    ticks: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut config = Config::default();
    config.width = args.width;
    config.height = args.height;
    config.num_engines = args.engines;
    config.starting_lifeforms = args.starting_lifeforms;
    config.asteroid_size = args.asteroid_size;
    config.seed = args.seed;
    config.validate()?;

    coord::set_global_bounds(config.width, config.height);

    let num_engines = if config.num_engines == 0 {
        thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    } else {
        config.num_engines as usize
    };

    let asteroid_seed = config.seed.unwrap_or_else(|| rand::random::<u64>());
    let asteroid = Arc::new(Asteroid::new(
        config.asteroid_size,
        ChaCha12Rng::seed_from_u64(asteroid_seed),
    ));

    info!(num_engines, width = config.width, height = config.height, "starting evol");

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
        })?;
    }

    let engines: Vec<Arc<Engine>> = (0..num_engines)
        .map(|i| {
            let mut engine_config = config.clone();
            engine_config.seed = config.seed.map(|s| s.wrapping_add(i as u64));
            Arc::new(Engine::new(engine_config, asteroid.clone()))
        })
        .collect();

    let handles: Vec<_> = engines
        .iter()
        .cloned()
        .map(|engine| thread::spawn(move || engine.run()))
        .collect();

    let ticks = args.ticks;
    let watchdog = {
        let engines = engines.clone();
        let shutdown = shutdown.clone();
        thread::spawn(move || loop {
            thread::sleep(Duration::from_millis(200));
            let done = shutdown.load(Ordering::Relaxed)
                || ticks.is_some_and(|limit| engines.iter().all(|e| e.turn() >= limit));
            if done {
                for engine in &engines {
                    engine.request_exit();
                }
                break;
            }
        })
    };

    watchdog.join().expect("watchdog thread panicked");
    for handle in handles {
        handle.join().expect("engine thread panicked");
    }

    for (i, engine) in engines.iter().enumerate() {
        let stats = engine.timer_stats();
        engine.with_snapshot(|s| {
            info!(
                engine = i,
                turn = engine.turn(),
                population = s.population(),
                dead = s.dead_count(),
                tick_count = stats.count,
                tick_min_us = stats.min_micros,
                tick_max_us = stats.max_micros,
                "engine stopped",
            );
        });
    }

    Ok(())
}
