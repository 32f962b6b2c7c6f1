use rand::Rng;

use crate::config::MutationParams;
use crate::lifeform::Lifeform;
use crate::opcode::OpCode;

enum Kind {
    Insert,
    Delete,
    Change,
    Translate,
}

fn roll_kind(rng: &mut impl Rng) -> Kind {
    match rng.random_range(0u8..4) {
        0 => Kind::Insert,
        1 => Kind::Delete,
        2 => Kind::Change,
        _ => Kind::Translate,
    }
}

/// Applies 0, 1, or 2 random edits to `lf`'s DNA, per spec.md §4.5. Called
/// only on a freshly born child, with the child's own RNG.
pub fn mutate(lf: &mut Lifeform, rng: &mut impl Rng, params: &MutationParams) {
    let d = rng.random_range(0..=params.die_roll);
    let mutations = if d >= params.two_mutations {
        2
    } else if d >= params.one_mutation {
        1
    } else {
        0
    };

    for _ in 0..mutations {
        apply_one(lf.dna_mut(), rng, params.max_mutation_length);
    }
}

fn apply_one(dna: &mut Vec<OpCode>, rng: &mut impl Rng, max_len: usize) {
    let start = rng.random_range(0..=dna.len());
    let cap = max_len.min(dna.len() - start);
    let len = rng.random_range(0..=cap);
    if len < 1 || start == dna.len() {
        return;
    }

    match roll_kind(rng) {
        Kind::Insert => {
            let insertion = std::iter::repeat(OpCode::Nop).take(len);
            dna.splice(start..start, insertion);
        }
        Kind::Delete => {
            dna.drain(start..start + len);
        }
        Kind::Change => {
            for slot in &mut dna[start..start + len] {
                *slot = OpCode::random(rng);
            }
        }
        Kind::Translate => {
            let t = rng.random_range(0..=dna.len() - len);
            if t == start {
                return;
            }
            let src: Vec<OpCode> = dna[start..start + len].to_vec();
            let tgt: Vec<OpCode> = dna[t..t + len].to_vec();
            dna[t..t + len].copy_from_slice(&src);
            dna[start..start + len].copy_from_slice(&tgt);
        }
    }
}
