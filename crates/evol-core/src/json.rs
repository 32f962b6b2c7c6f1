use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lifeform::Lifeform;
use crate::opcode::OpCode;

/// The JSON dump schema from spec.md §6: one object per lifeform, DNA
/// spelled out as opcode mnemonics. Writing `lifeform-dump.json` to disk on
/// an interval is the out-of-scope Dumper thread; this crate only owns the
/// schema and the (de)serialization it round-trips through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeformRecord {
    pub id: i64,
    pub gen: i64,
    pub alive: bool,
    pub energy: f64,
    pub dna: Vec<String>,
}

impl LifeformRecord {
    pub fn from_lifeform(lf: &Lifeform) -> LifeformRecord {
        LifeformRecord {
            id: lf.id() as i64,
            gen: lf.gen() as i64,
            alive: lf.alive(),
            energy: lf.energy(),
            dna: lf.dna().iter().map(|op| op.as_mnemonic().to_string()).collect(),
        }
    }

    /// Reconstructs the opcode sequence, failing on any mnemonic this port
    /// doesn't recognize (including the literal `?UNKNOWN?` placeholder).
    pub fn to_opcodes(&self) -> Result<Vec<OpCode>, UnknownMnemonic> {
        self.dna
            .iter()
            .map(|m| OpCode::from_mnemonic(m).ok_or_else(|| UnknownMnemonic(m.clone())))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMnemonic(pub String);

impl fmt::Display for UnknownMnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized opcode mnemonic: {}", self.0)
    }
}

impl std::error::Error for UnknownMnemonic {}

/// The placeholder mnemonic for a byte value outside `[NOP, END)`. Never
/// produced by this port's typed `OpCode` (the mutator and VM can't
/// construct an out-of-range value), kept for interoperability with
/// external tools that might feed a wider byte range back in.
pub const UNKNOWN_MNEMONIC: &str = "?UNKNOWN?";

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();
    fn bounds() {
        INIT.call_once(|| crate::coord::set_global_bounds(4, 4));
    }

    #[test]
    fn lifeform_dna_round_trips_through_json() {
        bounds();
        let lf = Lifeform::seed(
            vec![
                OpCode::IsCrowded,
                OpCode::CJmp1,
                OpCode::FinalMoveNorth,
                OpCode::FinalMoveSouth,
            ],
            5.0,
        );
        let record = LifeformRecord::from_lifeform(&lf);
        let text = serde_json::to_string(&record).expect("serialize");
        let back: LifeformRecord = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back.to_opcodes().expect("known mnemonics"), lf.dna().to_vec());
    }

    #[test]
    fn unknown_mnemonic_constant_is_rejected_on_parse() {
        let record = LifeformRecord {
            id: 1,
            gen: 0,
            alive: true,
            energy: 1.0,
            dna: vec![UNKNOWN_MNEMONIC.to_string()],
        };
        assert!(record.to_opcodes().is_err());
    }
}
