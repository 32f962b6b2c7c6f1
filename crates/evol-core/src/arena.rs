use std::collections::HashMap;

use rand::Rng;

use crate::arena_block::ArenaBlock;
use crate::arena_view::ArenaView;
use crate::coord::{Coord, Unit};
use crate::lifeform::Lifeform;

/// A dense toroidal grid of [`ArenaBlock`]s plus the master roster of every
/// living lifeform it owns, in insertion order. Per-block resident lists
/// hold non-owning ids; the roster is the sole owner of the `Lifeform`
/// values. Grounded on the teacher's flat-`Vec` `ResourceField` (one `f32`
/// per cell, indexed `y*width+x`), generalized from a scalar field to a
/// struct-of-residents-and-energy cell.
pub struct Arena {
    width: Unit,
    height: Unit,
    blocks: Vec<ArenaBlock>,
    roster: Vec<Lifeform>,
    index: HashMap<u64, usize>,
    deaths: u64,
}

impl Arena {
    pub fn new(width: Unit, height: Unit) -> Self {
        assert!(width > 0 && height > 0, "arena dimensions must be positive");
        let cells = (width as usize) * (height as usize);
        Arena {
            width,
            height,
            blocks: (0..cells).map(|_| ArenaBlock::default()).collect(),
            roster: Vec::new(),
            index: HashMap::new(),
            deaths: 0,
        }
    }

    pub fn width(&self) -> Unit {
        self.width
    }

    pub fn height(&self) -> Unit {
        self.height
    }

    pub fn dead_count(&self) -> u64 {
        self.deaths
    }

    pub fn population(&self) -> usize {
        self.roster.len()
    }

    pub fn roster(&self) -> &[Lifeform] {
        &self.roster
    }

    fn block_index(&self, c: Coord) -> usize {
        (c.y as usize) * (self.width as usize) + (c.x as usize)
    }

    fn block(&self, c: Coord) -> &ArenaBlock {
        &self.blocks[self.block_index(c)]
    }

    fn block_mut(&mut self, c: Coord) -> &mut ArenaBlock {
        let i = self.block_index(c);
        &mut self.blocks[i]
    }

    pub fn get_energy(&self, c: Coord) -> f64 {
        self.block(c).energy()
    }

    pub fn set_energy(&mut self, c: Coord, e: f64) {
        self.block_mut(c).set_energy(e);
    }

    pub fn get(&self, id: u64) -> Option<&Lifeform> {
        self.index.get(&id).map(|&i| &self.roster[i])
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Lifeform> {
        let idx = *self.index.get(&id)?;
        Some(&mut self.roster[idx])
    }

    /// Takes ownership of `lf`, places it at `c`, and appends it to the
    /// roster. Returns the id so callers can look it up again later.
    pub fn add(&mut self, mut lf: Lifeform, c: Coord) -> u64 {
        lf.set_coord(c);
        let id = lf.id();
        let pos = self.roster.len();
        self.roster.push(lf);
        self.index.insert(id, pos);
        self.block_mut(c).add(id);
        id
    }

    /// Moves a resident lifeform to `c`. No-op if it is already there.
    /// Panics if `id` is not in the roster (programming error).
    pub fn move_lifeform(&mut self, id: u64, c: Coord) {
        let pos = *self
            .index
            .get(&id)
            .expect("move_lifeform: id not in roster");
        let old = self.roster[pos].coord();
        if old == c {
            return;
        }
        self.block_mut(old).remove(id);
        self.roster[pos].set_coord(c);
        self.block_mut(c).add(id);
    }

    /// Removes `id` from roster and block, marks it dead, increments the
    /// death counter, and returns the detached lifeform. Panics if absent.
    pub fn kill(&mut self, id: u64) -> Lifeform {
        let mut lf = self.detach(id).expect("kill: id not in roster");
        lf.set_alive(false);
        self.deaths += 1;
        lf
    }

    /// Like `kill`, but does not mark the lifeform dead or count it as a
    /// death — used to hand a live lifeform off to the Asteroid.
    pub fn remove(&mut self, id: u64) -> Lifeform {
        self.detach(id).expect("remove: id not in roster")
    }

    /// Detaches a uniformly random roster member without marking it dead.
    /// Returns `None` if the roster is empty.
    pub fn remove_random(&mut self, rng: &mut impl Rng) -> Option<Lifeform> {
        if self.roster.is_empty() {
            return None;
        }
        let pos = rng.random_range(0..self.roster.len());
        let id = self.roster[pos].id();
        self.detach(id)
    }

    fn detach(&mut self, id: u64) -> Option<Lifeform> {
        let pos = self.index.remove(&id)?;
        let lf = self.roster.remove(pos);
        self.block_mut(lf.coord()).remove(id);
        for (_, idx) in self.index.iter_mut() {
            if *idx > pos {
                *idx -= 1;
            }
        }
        Some(lf)
    }

    pub fn num_lifeforms_at(&self, c: Coord) -> usize {
        self.block(c).len()
    }

    pub fn lifeforms_at(&self, c: Coord) -> Vec<&Lifeform> {
        self.block(c)
            .residents()
            .iter()
            .map(|&id| &self.roster[self.index[&id]])
            .collect()
    }

    pub fn adjacent_lifeforms(&self, c: Coord) -> Vec<&Lifeform> {
        c.neighbors()
            .into_iter()
            .flat_map(|n| self.lifeforms_at(n))
            .collect()
    }

    pub fn adjacent_any(&self, c: Coord) -> bool {
        c.neighbors().into_iter().any(|n| self.num_lifeforms_at(n) > 0)
    }

    pub fn random_coord(&self, rng: &mut impl Rng) -> Coord {
        Coord::new(
            rng.random_range(0..self.width),
            rng.random_range(0..self.height),
        )
    }
}

impl ArenaView for Arena {
    fn num_lifeforms_at(&self, c: Coord) -> usize {
        Arena::num_lifeforms_at(self, c)
    }

    fn adjacent_any(&self, c: Coord) -> bool {
        Arena::adjacent_any(self, c)
    }
}
