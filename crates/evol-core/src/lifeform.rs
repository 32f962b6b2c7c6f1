use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use crate::arena_view::ArenaView;
use crate::coord::Coord;
use crate::opcode::{ActionKind, OpCode};

/// Process-wide id source. Shared across every engine/thread so ids stay
/// unique arena-to-arena, matching the original's single `next_id_` counter.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// An autonomous agent: identity, generation, DNA, energy, and coordinate.
/// Arenas are the sole owner of living lifeforms (see the roster in
/// [`crate::arena::Arena`]); this type carries no ownership of its own.
#[derive(Debug, Clone)]
pub struct Lifeform {
    id: u64,
    gen: u64,
    alive: bool,
    dna: Vec<OpCode>,
    energy: f64,
    coord: Coord,
}

impl Lifeform {
    /// A freshly seeded lifeform: generation 0, not yet placed in an arena.
    /// `Arena::add` assigns its real coordinate.
    pub fn seed(dna: Vec<OpCode>, energy: f64) -> Lifeform {
        Lifeform {
            id: next_id(),
            gen: 0,
            alive: true,
            dna,
            energy,
            coord: Coord::new(0, 0),
        }
    }

    /// A child of `self`: next id, `gen + 1`, alive, DNA copied unmutated
    /// (the caller mutates it and sets its post-split energy/coord).
    pub fn make_child(&self) -> Lifeform {
        Lifeform {
            id: next_id(),
            gen: self.gen + 1,
            alive: true,
            dna: self.dna.clone(),
            energy: 0.0,
            coord: self.coord,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
    pub fn gen(&self) -> u64 {
        self.gen
    }
    pub fn alive(&self) -> bool {
        self.alive
    }
    pub fn set_alive(&mut self, alive: bool) {
        self.alive = alive;
    }
    pub fn energy(&self) -> f64 {
        self.energy
    }
    pub fn set_energy(&mut self, energy: f64) {
        self.energy = energy;
    }
    pub fn coord(&self) -> Coord {
        self.coord
    }
    pub fn set_coord(&mut self, coord: Coord) {
        self.coord = coord;
    }
    pub fn dna(&self) -> &[OpCode] {
        &self.dna
    }
    pub(crate) fn dna_mut(&mut self) -> &mut Vec<OpCode> {
        &mut self.dna
    }

    /// Interprets this lifeform's DNA against `arena` and returns the action
    /// it produces, plus any energy delta the run itself incurs (only
    /// `FINAL_MOVE_RANDOM` has one). Pure: does not mutate `self` or
    /// `arena` — the caller applies the action and the energy delta once
    /// the engine holds its write lock (spec.md §4.6 steps 1 vs. 3-4).
    pub fn run<A: ArenaView>(
        &self,
        arena: &A,
        rng: &mut impl Rng,
        random_move_cost: f64,
    ) -> (ActionKind, f64) {
        if self.dna.is_empty() {
            return (ActionKind::Apoptosis, 0.0);
        }

        let mut cmp = false;
        let mut pc: usize = 0;
        let len = self.dna.len();

        while pc < len {
            let op = self.dna[pc];
            match op {
                OpCode::Nop => pc += 1,
                OpCode::Apoptosis => return (ActionKind::Apoptosis, 0.0),
                OpCode::IsNorthOccupied => {
                    cmp = arena.num_lifeforms_at(self.coord.north()) > 0;
                    pc += 1;
                }
                OpCode::IsSouthOccupied => {
                    cmp = arena.num_lifeforms_at(self.coord.south()) > 0;
                    pc += 1;
                }
                OpCode::IsEastOccupied => {
                    cmp = arena.num_lifeforms_at(self.coord.east()) > 0;
                    pc += 1;
                }
                OpCode::IsWestOccupied => {
                    cmp = arena.num_lifeforms_at(self.coord.west()) > 0;
                    pc += 1;
                }
                OpCode::IsCrowded => {
                    cmp = arena.num_lifeforms_at(self.coord) >= 2;
                    pc += 1;
                }
                OpCode::IsNeighbor => {
                    cmp = arena.adjacent_any(self.coord);
                    pc += 1;
                }
                OpCode::Jmp1 | OpCode::Jmp2 | OpCode::Jmp3 | OpCode::Jmp4 | OpCode::Jmp5 => {
                    let n = op.jump_len().expect("unconditional jump has a length") as usize;
                    pc += n + 1;
                }
                OpCode::CJmp1 | OpCode::CJmp2 | OpCode::CJmp3 | OpCode::CJmp4 | OpCode::CJmp5 => {
                    let n = op.jump_len().expect("conditional jump has a length") as usize;
                    pc += if cmp { n + 1 } else { 1 };
                }
                OpCode::FinalMoveNorth => return (ActionKind::MoveNorth, 0.0),
                OpCode::FinalMoveEast => return (ActionKind::MoveEast, 0.0),
                OpCode::FinalMoveSouth => return (ActionKind::MoveSouth, 0.0),
                OpCode::FinalMoveWest => return (ActionKind::MoveWest, 0.0),
                OpCode::FinalMoveRandom => {
                    let action = match rng.random_range(0u8..4) {
                        0 => ActionKind::MoveNorth,
                        1 => ActionKind::MoveSouth,
                        2 => ActionKind::MoveEast,
                        _ => ActionKind::MoveWest,
                    };
                    return (action, -random_move_cost);
                }
                OpCode::End => unreachable!("END is a range sentinel, never a stored opcode"),
            }
        }

        (ActionKind::Nothing, 0.0)
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

    struct EmptyArena;
    impl ArenaView for EmptyArena {
        fn num_lifeforms_at(&self, _c: Coord) -> usize {
            0
        }
        fn adjacent_any(&self, _c: Coord) -> bool {
            false
        }
    }

    struct CrowdedArena;
    impl ArenaView for CrowdedArena {
        fn num_lifeforms_at(&self, _c: Coord) -> usize {
            2
        }
        fn adjacent_any(&self, _c: Coord) -> bool {
            true
        }
    }

    fn rng() -> rand_chacha::ChaCha12Rng {
        <rand_chacha::ChaCha12Rng as rand::SeedableRng>::seed_from_u64(1)
    }

    #[test]
    fn empty_dna_is_apoptosis() {
        bounds();
        let lf = Lifeform::seed(vec![], 1.0);
        let (action, delta) = lf.run(&EmptyArena, &mut rng(), 1.0);
        assert_eq!(action, ActionKind::Apoptosis);
        assert_eq!(delta, 0.0);
    }

    #[test]
    fn falling_off_the_end_is_nothing() {
        bounds();
        let lf = Lifeform::seed(vec![OpCode::Nop, OpCode::Nop], 1.0);
        let (action, _) = lf.run(&EmptyArena, &mut rng(), 1.0);
        assert_eq!(action, ActionKind::Nothing);
    }

    #[test]
    fn final_move_terminates_immediately() {
        bounds();
        let lf = Lifeform::seed(vec![OpCode::FinalMoveNorth, OpCode::Apoptosis], 1.0);
        let (action, delta) = lf.run(&EmptyArena, &mut rng(), 1.0);
        assert_eq!(action, ActionKind::MoveNorth);
        assert_eq!(delta, 0.0);
    }

    #[test]
    fn random_move_deducts_cost() {
        bounds();
        let lf = Lifeform::seed(vec![OpCode::FinalMoveRandom], 10.0);
        let (_, delta) = lf.run(&EmptyArena, &mut rng(), 1.5);
        assert_eq!(delta, -1.5);
    }

    #[test]
    fn crowding_sensor_drives_conditional_jump() {
        bounds();
        // spec.md §8 boundary scenario 3, in VM isolation.
        let lf = Lifeform::seed(
            vec![
                OpCode::IsCrowded,
                OpCode::CJmp1,
                OpCode::FinalMoveNorth,
                OpCode::FinalMoveSouth,
            ],
            1.0,
        );
        let (action, _) = lf.run(&CrowdedArena, &mut rng(), 1.0);
        assert_eq!(action, ActionKind::MoveSouth);
    }

    #[test]
    fn unconditional_jump_skips_n_opcodes() {
        bounds();
        let lf = Lifeform::seed(
            vec![OpCode::Jmp2, OpCode::Apoptosis, OpCode::Apoptosis, OpCode::FinalMoveEast],
            1.0,
        );
        let (action, _) = lf.run(&EmptyArena, &mut rng(), 1.0);
        assert_eq!(action, ActionKind::MoveEast);
    }

    #[test]
    fn vm_terminates_within_program_length_dispatches() {
        bounds();
        let dna: Vec<OpCode> = (0..50).map(|_| OpCode::Nop).collect();
        let n = dna.len();
        let lf = Lifeform::seed(dna, 1.0);
        // Pure length bound: a 50-NOP program must fall through in exactly
        // `n` dispatches, not loop.
        let (action, _) = lf.run(&EmptyArena, &mut rng(), 1.0);
        assert_eq!(action, ActionKind::Nothing);
        assert_eq!(n, 50);
    }

    #[test]
    fn make_child_increments_generation() {
        bounds();
        let parent = Lifeform::seed(vec![OpCode::Nop], 1.0);
        let child = parent.make_child();
        assert_eq!(child.gen(), parent.gen() + 1);
        assert_ne!(child.id(), parent.id());
        assert_eq!(child.dna(), parent.dna());
    }
}
