use rand::Rng;

/// A single DNA instruction. Variant order matches the canonical table in
/// the opcode reference; `END` is a range-end sentinel only, never stored in
/// a lifeform's DNA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    Nop = 0,
    Apoptosis,
    IsNorthOccupied,
    IsSouthOccupied,
    IsEastOccupied,
    IsWestOccupied,
    IsCrowded,
    IsNeighbor,
    Jmp1,
    Jmp2,
    Jmp3,
    Jmp4,
    Jmp5,
    CJmp1,
    CJmp2,
    CJmp3,
    CJmp4,
    CJmp5,
    FinalMoveNorth,
    FinalMoveEast,
    FinalMoveSouth,
    FinalMoveWest,
    FinalMoveRandom,
    /// Range-end sentinel. `[NOP, End)` is the valid opcode domain for
    /// mutation and never appears in a lifeform's DNA.
    End,
}

/// Number of opcodes in `[NOP, END)`, i.e. the valid, storable domain.
pub const OPCODE_COUNT: u8 = OpCode::End as u8;

const ALL: [OpCode; OPCODE_COUNT as usize] = [
    OpCode::Nop,
    OpCode::Apoptosis,
    OpCode::IsNorthOccupied,
    OpCode::IsSouthOccupied,
    OpCode::IsEastOccupied,
    OpCode::IsWestOccupied,
    OpCode::IsCrowded,
    OpCode::IsNeighbor,
    OpCode::Jmp1,
    OpCode::Jmp2,
    OpCode::Jmp3,
    OpCode::Jmp4,
    OpCode::Jmp5,
    OpCode::CJmp1,
    OpCode::CJmp2,
    OpCode::CJmp3,
    OpCode::CJmp4,
    OpCode::CJmp5,
    OpCode::FinalMoveNorth,
    OpCode::FinalMoveEast,
    OpCode::FinalMoveSouth,
    OpCode::FinalMoveWest,
    OpCode::FinalMoveRandom,
];

impl OpCode {
    /// A uniformly random opcode drawn from `[NOP, END)`, for the CHANGE
    /// mutation operator.
    pub fn random(rng: &mut impl Rng) -> OpCode {
        ALL[rng.random_range(0..ALL.len())]
    }

    /// The JMP/CJMP skip distance `n` this opcode represents, if any.
    pub fn jump_len(self) -> Option<u32> {
        match self {
            OpCode::Jmp1 | OpCode::CJmp1 => Some(1),
            OpCode::Jmp2 | OpCode::CJmp2 => Some(2),
            OpCode::Jmp3 | OpCode::CJmp3 => Some(3),
            OpCode::Jmp4 | OpCode::CJmp4 => Some(4),
            OpCode::Jmp5 | OpCode::CJmp5 => Some(5),
            _ => None,
        }
    }

    pub fn is_conditional_jump(self) -> bool {
        matches!(
            self,
            OpCode::CJmp1 | OpCode::CJmp2 | OpCode::CJmp3 | OpCode::CJmp4 | OpCode::CJmp5
        )
    }

    pub fn is_unconditional_jump(self) -> bool {
        matches!(
            self,
            OpCode::Jmp1 | OpCode::Jmp2 | OpCode::Jmp3 | OpCode::Jmp4 | OpCode::Jmp5
        )
    }

    /// The canonical JSON mnemonic for this opcode (spec.md §6).
    pub fn as_mnemonic(self) -> &'static str {
        match self {
            OpCode::Nop => "NOP",
            OpCode::Apoptosis => "APOPTOSIS",
            OpCode::IsNorthOccupied => "IS_NORTH_OCCUPIED",
            OpCode::IsSouthOccupied => "IS_SOUTH_OCCUPIED",
            OpCode::IsEastOccupied => "IS_EAST_OCCUPIED",
            OpCode::IsWestOccupied => "IS_WEST_OCCUPIED",
            OpCode::IsCrowded => "IS_CROWDED",
            OpCode::IsNeighbor => "IS_NEIGHBOR",
            OpCode::Jmp1 => "JMP1",
            OpCode::Jmp2 => "JMP2",
            OpCode::Jmp3 => "JMP3",
            OpCode::Jmp4 => "JMP4",
            OpCode::Jmp5 => "JMP5",
            OpCode::CJmp1 => "CJMP1",
            OpCode::CJmp2 => "CJMP2",
            OpCode::CJmp3 => "CJMP3",
            OpCode::CJmp4 => "CJMP4",
            OpCode::CJmp5 => "CJMP5",
            OpCode::FinalMoveNorth => "FINAL_MOVE_NORTH",
            OpCode::FinalMoveEast => "FINAL_MOVE_EAST",
            OpCode::FinalMoveSouth => "FINAL_MOVE_SOUTH",
            OpCode::FinalMoveWest => "FINAL_MOVE_WEST",
            OpCode::FinalMoveRandom => "FINAL_MOVE_RANDOM",
            OpCode::End => "END",
        }
    }

    /// Parses a mnemonic back into an opcode. Anything unrecognized maps to
    /// `None`; callers serializing untrusted input should treat that as
    /// `?UNKNOWN?` per spec.md §6.
    pub fn from_mnemonic(s: &str) -> Option<OpCode> {
        Some(match s {
            "NOP" => OpCode::Nop,
            "APOPTOSIS" => OpCode::Apoptosis,
            "IS_NORTH_OCCUPIED" => OpCode::IsNorthOccupied,
            "IS_SOUTH_OCCUPIED" => OpCode::IsSouthOccupied,
            "IS_EAST_OCCUPIED" => OpCode::IsEastOccupied,
            "IS_WEST_OCCUPIED" => OpCode::IsWestOccupied,
            "IS_CROWDED" => OpCode::IsCrowded,
            "IS_NEIGHBOR" => OpCode::IsNeighbor,
            "JMP1" => OpCode::Jmp1,
            "JMP2" => OpCode::Jmp2,
            "JMP3" => OpCode::Jmp3,
            "JMP4" => OpCode::Jmp4,
            "JMP5" => OpCode::Jmp5,
            "CJMP1" => OpCode::CJmp1,
            "CJMP2" => OpCode::CJmp2,
            "CJMP3" => OpCode::CJmp3,
            "CJMP4" => OpCode::CJmp4,
            "CJMP5" => OpCode::CJmp5,
            "FINAL_MOVE_NORTH" => OpCode::FinalMoveNorth,
            "FINAL_MOVE_EAST" => OpCode::FinalMoveEast,
            "FINAL_MOVE_SOUTH" => OpCode::FinalMoveSouth,
            "FINAL_MOVE_WEST" => OpCode::FinalMoveWest,
            "FINAL_MOVE_RANDOM" => OpCode::FinalMoveRandom,
            _ => return None,
        })
    }
}

/// The high-level action a DNA run or a resolved tick step produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Nothing,
    Apoptosis,
    MoveNorth,
    MoveSouth,
    MoveEast,
    MoveWest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonic_round_trips_every_storable_opcode() {
        for &op in ALL.iter() {
            let mnemonic = op.as_mnemonic();
            assert_eq!(OpCode::from_mnemonic(mnemonic), Some(op));
        }
    }

    #[test]
    fn unknown_mnemonic_is_none() {
        assert_eq!(OpCode::from_mnemonic("?UNKNOWN?"), None);
    }

    #[test]
    fn end_is_excluded_from_random_and_all() {
        assert_eq!(ALL.len(), OPCODE_COUNT as usize);
        assert!(!ALL.contains(&OpCode::End));
    }
}
