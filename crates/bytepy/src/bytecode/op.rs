//! Opcode definitions.
//!
//! Opcode numbering and immediate encoding follow the CPython 2.7 instruction
//! set: every opcode is one byte, and opcodes numbered [`HAVE_ARGUMENT`] or
//! higher are followed by a two-byte little-endian immediate.

use strum::{Display, FromRepr, IntoStaticStr};

/// First opcode number that carries a 16-bit immediate.
pub const HAVE_ARGUMENT: u8 = 90;

/// A single instruction opcode.
///
/// `Display` prints the conventional upper-case mnemonic (`BINARY_ADD`,
/// `SLICE+1`). Byte values without a variant are rejected at decode time.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    FromRepr,
    IntoStaticStr,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Opcode {
    StopCode = 0,
    PopTop = 1,
    RotTwo = 2,
    RotThree = 3,
    DupTop = 4,
    RotFour = 5,
    Nop = 9,
    UnaryPositive = 10,
    UnaryNegative = 11,
    UnaryNot = 12,
    UnaryConvert = 13,
    UnaryInvert = 15,
    BinaryPower = 19,
    BinaryMultiply = 20,
    BinaryDivide = 21,
    BinaryModulo = 22,
    BinaryAdd = 23,
    BinarySubtract = 24,
    BinarySubscr = 25,
    BinaryFloorDivide = 26,
    BinaryTrueDivide = 27,
    InplaceFloorDivide = 28,
    InplaceTrueDivide = 29,
    #[strum(serialize = "SLICE+0")]
    Slice0 = 30,
    #[strum(serialize = "SLICE+1")]
    Slice1 = 31,
    #[strum(serialize = "SLICE+2")]
    Slice2 = 32,
    #[strum(serialize = "SLICE+3")]
    Slice3 = 33,
    #[strum(serialize = "STORE_SLICE+0")]
    StoreSlice0 = 40,
    #[strum(serialize = "STORE_SLICE+1")]
    StoreSlice1 = 41,
    #[strum(serialize = "STORE_SLICE+2")]
    StoreSlice2 = 42,
    #[strum(serialize = "STORE_SLICE+3")]
    StoreSlice3 = 43,
    #[strum(serialize = "DELETE_SLICE+0")]
    DeleteSlice0 = 50,
    #[strum(serialize = "DELETE_SLICE+1")]
    DeleteSlice1 = 51,
    #[strum(serialize = "DELETE_SLICE+2")]
    DeleteSlice2 = 52,
    #[strum(serialize = "DELETE_SLICE+3")]
    DeleteSlice3 = 53,
    StoreMap = 54,
    InplaceAdd = 55,
    InplaceSubtract = 56,
    InplaceMultiply = 57,
    InplaceDivide = 58,
    InplaceModulo = 59,
    StoreSubscr = 60,
    DeleteSubscr = 61,
    BinaryLshift = 62,
    BinaryRshift = 63,
    BinaryAnd = 64,
    BinaryXor = 65,
    BinaryOr = 66,
    InplacePower = 67,
    GetIter = 68,
    PrintExpr = 70,
    PrintItem = 71,
    PrintNewline = 72,
    PrintItemTo = 73,
    PrintNewlineTo = 74,
    InplaceLshift = 75,
    InplaceRshift = 76,
    InplaceAnd = 77,
    InplaceXor = 78,
    InplaceOr = 79,
    BreakLoop = 80,
    WithCleanup = 81,
    LoadLocals = 82,
    ReturnValue = 83,
    ImportStar = 84,
    ExecStmt = 85,
    YieldValue = 86,
    PopBlock = 87,
    EndFinally = 88,
    BuildClass = 89,
    StoreName = 90,
    DeleteName = 91,
    UnpackSequence = 92,
    ForIter = 93,
    ListAppend = 94,
    StoreAttr = 95,
    DeleteAttr = 96,
    StoreGlobal = 97,
    DeleteGlobal = 98,
    DupTopx = 99,
    LoadConst = 100,
    LoadName = 101,
    BuildTuple = 102,
    BuildList = 103,
    BuildSet = 104,
    BuildMap = 105,
    LoadAttr = 106,
    CompareOp = 107,
    ImportName = 108,
    ImportFrom = 109,
    JumpForward = 110,
    JumpIfFalseOrPop = 111,
    JumpIfTrueOrPop = 112,
    JumpAbsolute = 113,
    PopJumpIfFalse = 114,
    PopJumpIfTrue = 115,
    LoadGlobal = 116,
    ContinueLoop = 119,
    SetupLoop = 120,
    SetupExcept = 121,
    SetupFinally = 122,
    LoadFast = 124,
    StoreFast = 125,
    DeleteFast = 126,
    RaiseVarargs = 130,
    CallFunction = 131,
    MakeFunction = 132,
    BuildSlice = 133,
    MakeClosure = 134,
    LoadClosure = 135,
    LoadDeref = 136,
    StoreDeref = 137,
    CallFunctionVar = 140,
    CallFunctionKw = 141,
    CallFunctionVarKw = 142,
    SetupWith = 143,
    ExtendedArg = 145,
    SetAdd = 146,
    MapAdd = 147,
}

impl Opcode {
    /// Whether the opcode is followed by a 16-bit immediate.
    #[must_use]
    pub fn has_arg(self) -> bool {
        self as u8 >= HAVE_ARGUMENT
    }

    /// Jumps whose immediate is a delta from the end of the instruction.
    #[must_use]
    pub fn is_relative_jump(self) -> bool {
        matches!(self, Self::JumpForward | Self::ForIter | Self::SetupLoop)
    }

    /// Jumps whose immediate is an absolute bytecode offset.
    #[must_use]
    pub fn is_absolute_jump(self) -> bool {
        matches!(
            self,
            Self::JumpAbsolute
                | Self::JumpIfFalseOrPop
                | Self::JumpIfTrueOrPop
                | Self::PopJumpIfFalse
                | Self::PopJumpIfTrue
                | Self::ContinueLoop
        )
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::from_repr(byte).ok_or(byte)
    }
}
