use std::sync::OnceLock;

/// Integer grid unit. Matches the original `evol::Unit` (signed 32-bit).
pub type Unit = i32;

static BOUNDS: OnceLock<(Unit, Unit)> = OnceLock::new();

/// Sets the global arena bounds used to normalize every `Coord` constructed
/// from this point on. Callers (the top-level supervisor, or a test) should
/// call this exactly once per configuration; calling it again with the
/// *same* bounds is a harmless no-op, but reconfiguring to different bounds
/// after `Coord`s already exist is a programming error.
pub fn set_global_bounds(width: Unit, height: Unit) {
    assert!(width > 0 && height > 0, "arena bounds must be positive");
    match BOUNDS.get() {
        None => {
            BOUNDS
                .set((width, height))
                .expect("race initializing global arena bounds");
        }
        Some(&existing) if existing == (width, height) => {}
        Some(_) => panic!("set_global_bounds called again with different bounds"),
    }
}

fn bounds() -> (Unit, Unit) {
    *BOUNDS
        .get()
        .expect("Coord constructed before set_global_bounds")
}

/// A toroidal grid coordinate. Every instance satisfies `0 <= x < W` and
/// `0 <= y < H` for the globally configured bounds; construction wraps out-
/// of-range values rather than rejecting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub x: Unit,
    pub y: Unit,
}

impl Coord {
    pub fn new(x: Unit, y: Unit) -> Self {
        let (w, h) = bounds();
        Coord {
            x: x.rem_euclid(w),
            y: y.rem_euclid(h),
        }
    }

    pub fn north(self) -> Coord {
        Coord::new(self.x, self.y - 1)
    }
    pub fn south(self) -> Coord {
        Coord::new(self.x, self.y + 1)
    }
    pub fn east(self) -> Coord {
        Coord::new(self.x + 1, self.y)
    }
    pub fn west(self) -> Coord {
        Coord::new(self.x - 1, self.y)
    }

    /// The eight coordinates surrounding `self`, not including `self`.
    pub fn neighbors(self) -> [Coord; 8] {
        [
            Coord::new(self.x - 1, self.y - 1),
            Coord::new(self.x, self.y - 1),
            Coord::new(self.x + 1, self.y - 1),
            Coord::new(self.x - 1, self.y),
            Coord::new(self.x + 1, self.y),
            Coord::new(self.x - 1, self.y + 1),
            Coord::new(self.x, self.y + 1),
            Coord::new(self.x + 1, self.y + 1),
        ]
    }
}
