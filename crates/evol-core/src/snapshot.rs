use crate::arena::Arena;
use crate::opcode::OpCode;
use crate::timer::{Timer, TimerStats};

/// A read-only view of one lifeform, borrowed from a locked engine.
#[derive(Debug, Clone, Copy)]
pub struct LifeformSnapshot<'a> {
    pub id: u64,
    pub gen: u64,
    pub alive: bool,
    pub energy: f64,
    pub dna: &'a [OpCode],
}

/// The read-only "arena view" spec.md §6 hands to observers: population and
/// death counts, a borrowing lifeform iterator, and timer stats. Exists to
/// give a future renderer/dumper the borrow-scoped, single-lock access
/// spec.md §5 requires ("must not hold more than one engine's lock at a
/// time"); this crate does not itself run such an observer loop.
pub struct SnapshotView<'a> {
    arena: &'a Arena,
    timer: &'a Timer,
}

impl<'a> SnapshotView<'a> {
    pub fn new(arena: &'a Arena, timer: &'a Timer) -> SnapshotView<'a> {
        SnapshotView { arena, timer }
    }

    pub fn population(&self) -> usize {
        self.arena.population()
    }

    pub fn dead_count(&self) -> u64 {
        self.arena.dead_count()
    }

    pub fn lifeforms(&self) -> impl Iterator<Item = LifeformSnapshot<'a>> {
        self.arena.roster().iter().map(|lf| LifeformSnapshot {
            id: lf.id(),
            gen: lf.gen(),
            alive: lf.alive(),
            energy: lf.energy(),
            dna: lf.dna(),
        })
    }

    pub fn timer_stats(&self) -> TimerStats {
        self.timer.stats()
    }
}
