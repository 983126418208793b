use std::convert::TryFrom;
use std::fmt;

use crate::error::Chip8Error;

/// The CHIP 8 instruction set. Ops decoded from an instruction word have register
/// operands (`x`, `y`) between 0x0 and 0xF, 12 bit addresses and 4 bit sprite
/// heights. Hand built ops are brought into those ranges by [`Op::masked`]
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Op {
    // 00E0 	Display 	disp_clear()
    DispClear,
    // 00EE 	Flow 	return;
    Return,

    // 1NNN 	Flow 	goto NNN;
    Goto(u16),
    // 2NNN 	Flow 	*(0xNNN)()
    GotoSubRtn(u16),

    // 3XNN 	Cond 	if(Vx==NN) skip
    CondVxEq(u8, u8),
    // 4XNN 	Cond 	if(Vx!=NN) skip
    CondVxNe(u8, u8),
    // 5XY0 	Cond 	if(Vx==Vy) skip
    CondVxVyEq(u8, u8),

    // 6XNN 	Const 	Vx = NN
    ConstSetVx(u8, u8),
    // 7XNN 	Const 	Vx += NN, VF untouched
    ConstAddVx(u8, u8),

    // 8XY_ 	Assign, BitOp and Math on Vx and Vy
    AssignVyToVx(u8, u8),
    BitOpOr(u8, u8),
    BitOpAnd(u8, u8),
    BitOpXor(u8, u8),
    MathVxAddVy(u8, u8),
    MathVxMinusVy(u8, u8),
    BitOpRtShift(u8, u8),
    MathVyMinusVx(u8, u8),
    BitOpLftShift(u8, u8),

    // 9XY0 	Cond 	if(Vx!=Vy) skip
    CondVxVyNe(u8, u8),

    // ANNN 	MEM 	I = NNN
    MemSetI(u16),
    // BNNN 	Flow 	PC = V0 + NNN
    GotoPlusV0(u16),
    // CXNN 	Rand 	Vx = rand() & NN
    Rand(u8, u8),
    // DXYN 	Disp 	draw(Vx, Vy, N)
    DispDraw(u8, u8, u8),

    // EX9E / EXA1 	KeyOp
    KeyOpEqVx(u8),
    KeyOpNeVx(u8),

    // FX__ 	Timers, KeyOp, MEM and BCD
    DelayGet(u8),
    KeyOpGet(u8),
    DelaySet(u8),
    SoundSet(u8),
    MemIPlusEqVx(u8),
    MemISetSprite(u8),
    Bcd(u8),
    RegDump(u8),
    RegLoad(u8),
}

impl Op {
    /// Returns true if executing this Op can change the display
    pub fn is_display_op(&self) -> bool {
        matches!(self, Op::DispClear | Op::DispDraw(..))
    }

    /// Keep only the bits each operand has in an instruction word: the low nibble
    /// of register operands and sprite heights, the low 12 bits of addresses
    pub fn masked(self) -> Op {
        let r = |v: u8| v & 0xF;
        let a = |addr: u16| addr & 0xFFF;
        match self {
            Op::DispClear => Op::DispClear,
            Op::Return => Op::Return,
            Op::Goto(addr) => Op::Goto(a(addr)),
            Op::GotoSubRtn(addr) => Op::GotoSubRtn(a(addr)),
            Op::CondVxEq(x, nn) => Op::CondVxEq(r(x), nn),
            Op::CondVxNe(x, nn) => Op::CondVxNe(r(x), nn),
            Op::CondVxVyEq(x, y) => Op::CondVxVyEq(r(x), r(y)),
            Op::ConstSetVx(x, nn) => Op::ConstSetVx(r(x), nn),
            Op::ConstAddVx(x, nn) => Op::ConstAddVx(r(x), nn),
            Op::AssignVyToVx(x, y) => Op::AssignVyToVx(r(x), r(y)),
            Op::BitOpOr(x, y) => Op::BitOpOr(r(x), r(y)),
            Op::BitOpAnd(x, y) => Op::BitOpAnd(r(x), r(y)),
            Op::BitOpXor(x, y) => Op::BitOpXor(r(x), r(y)),
            Op::MathVxAddVy(x, y) => Op::MathVxAddVy(r(x), r(y)),
            Op::MathVxMinusVy(x, y) => Op::MathVxMinusVy(r(x), r(y)),
            Op::BitOpRtShift(x, y) => Op::BitOpRtShift(r(x), r(y)),
            Op::MathVyMinusVx(x, y) => Op::MathVyMinusVx(r(x), r(y)),
            Op::BitOpLftShift(x, y) => Op::BitOpLftShift(r(x), r(y)),
            Op::CondVxVyNe(x, y) => Op::CondVxVyNe(r(x), r(y)),
            Op::MemSetI(addr) => Op::MemSetI(a(addr)),
            Op::GotoPlusV0(addr) => Op::GotoPlusV0(a(addr)),
            Op::Rand(x, nn) => Op::Rand(r(x), nn),
            Op::DispDraw(x, y, n) => Op::DispDraw(r(x), r(y), r(n)),
            Op::KeyOpEqVx(x) => Op::KeyOpEqVx(r(x)),
            Op::KeyOpNeVx(x) => Op::KeyOpNeVx(r(x)),
            Op::DelayGet(x) => Op::DelayGet(r(x)),
            Op::KeyOpGet(x) => Op::KeyOpGet(r(x)),
            Op::DelaySet(x) => Op::DelaySet(r(x)),
            Op::SoundSet(x) => Op::SoundSet(r(x)),
            Op::MemIPlusEqVx(x) => Op::MemIPlusEqVx(r(x)),
            Op::MemISetSprite(x) => Op::MemISetSprite(r(x)),
            Op::Bcd(x) => Op::Bcd(r(x)),
            Op::RegDump(x) => Op::RegDump(r(x)),
            Op::RegLoad(x) => Op::RegLoad(r(x)),
        }
    }
}

/// Combine three nibbles into a 12 bit address, `n1` being the most significant
pub fn three_nibbles_to_address(n1: u8, n2: u8, n3: u8) -> u16 {
    (u16::from(n1) << 8) | (u16::from(n2) << 4) | u16::from(n3)
}

fn byte(hi: u8, lo: u8) -> u8 {
    (hi << 4) | lo
}

impl TryFrom<u16> for Op {
    type Error = Chip8Error;

    /// Decoding happens in two levels: the most significant nibble picks the
    /// instruction group, and for groups 0x0, 0x8, 0xE and 0xF the low nibble
    /// or low byte then picks the operation inside that group
    fn try_from(item: u16) -> Result<Self, Self::Error> {
        let mask = 0xF;

        // these are the 4 nibbles of item, where nibb_1 is the MSB and nibb_4 is the LSB
        let nibb_1 = ((item >> 12) & mask) as u8;
        let nibb_2 = ((item >> 8) & mask) as u8;
        let nibb_3 = ((item >> 4) & mask) as u8;
        let nibb_4 = (item & mask) as u8;
        let unknown = Chip8Error::UnknownInstruction { opcode: item };

        let op = match [nibb_1, nibb_2, nibb_3, nibb_4] {
            [0x0, n2, n3, n4] => match [n2, n3, n4] {
                [0x0, 0xE, 0x0] => Op::DispClear,
                [0x0, 0xE, 0xE] => Op::Return,
                _ => return Err(unknown),
            },
            [0x1, n2, n3, n4] => Op::Goto(three_nibbles_to_address(n2, n3, n4)),
            [0x2, n2, n3, n4] => Op::GotoSubRtn(three_nibbles_to_address(n2, n3, n4)),
            [0x3, x, n3, n4] => Op::CondVxEq(x, byte(n3, n4)),
            [0x4, x, n3, n4] => Op::CondVxNe(x, byte(n3, n4)),
            [0x5, x, y, _] => Op::CondVxVyEq(x, y),
            [0x6, x, n3, n4] => Op::ConstSetVx(x, byte(n3, n4)),
            [0x7, x, n3, n4] => Op::ConstAddVx(x, byte(n3, n4)),
            [0x8, x, y, n4] => match n4 {
                0x0 => Op::AssignVyToVx(x, y),
                0x1 => Op::BitOpOr(x, y),
                0x2 => Op::BitOpAnd(x, y),
                0x3 => Op::BitOpXor(x, y),
                0x4 => Op::MathVxAddVy(x, y),
                0x5 => Op::MathVxMinusVy(x, y),
                0x6 => Op::BitOpRtShift(x, y),
                0x7 => Op::MathVyMinusVx(x, y),
                0xE => Op::BitOpLftShift(x, y),
                _ => return Err(unknown),
            },
            [0x9, x, y, _] => Op::CondVxVyNe(x, y),
            [0xA, n2, n3, n4] => Op::MemSetI(three_nibbles_to_address(n2, n3, n4)),
            [0xB, n2, n3, n4] => Op::GotoPlusV0(three_nibbles_to_address(n2, n3, n4)),
            [0xC, x, n3, n4] => Op::Rand(x, byte(n3, n4)),
            [0xD, x, y, n] => Op::DispDraw(x, y, n),
            [0xE, x, n3, n4] => match [n3, n4] {
                [0x9, 0xE] => Op::KeyOpEqVx(x),
                [0xA, 0x1] => Op::KeyOpNeVx(x),
                _ => return Err(unknown),
            },
            [0xF, x, n3, n4] => match [n3, n4] {
                [0x0, 0x7] => Op::DelayGet(x),
                [0x0, 0xA] => Op::KeyOpGet(x),
                [0x1, 0x5] => Op::DelaySet(x),
                [0x1, 0x8] => Op::SoundSet(x),
                [0x1, 0xE] => Op::MemIPlusEqVx(x),
                [0x2, 0x9] => Op::MemISetSprite(x),
                [0x3, 0x3] => Op::Bcd(x),
                [0x5, 0x5] => Op::RegDump(x),
                [0x6, 0x5] => Op::RegLoad(x),
                _ => return Err(unknown),
            },
            _ => return Err(unknown),
        };

        Ok(op)
    }
}

/// Disassembly in the usual CHIP-8 assembler mnemonics, used in trace logs
impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Op::DispClear => write!(f, "CLS"),
            Op::Return => write!(f, "RET"),
            Op::Goto(addr) => write!(f, "JP {:#05X}", addr),
            Op::GotoSubRtn(addr) => write!(f, "CALL {:#05X}", addr),
            Op::CondVxEq(x, nn) => write!(f, "SE V{:X}, {:#04X}", x, nn),
            Op::CondVxNe(x, nn) => write!(f, "SNE V{:X}, {:#04X}", x, nn),
            Op::CondVxVyEq(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            Op::ConstSetVx(x, nn) => write!(f, "LD V{:X}, {:#04X}", x, nn),
            Op::ConstAddVx(x, nn) => write!(f, "ADD V{:X}, {:#04X}", x, nn),
            Op::AssignVyToVx(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Op::BitOpOr(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            Op::BitOpAnd(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Op::BitOpXor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            Op::MathVxAddVy(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Op::MathVxMinusVy(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            Op::BitOpRtShift(x, y) => write!(f, "SHR V{:X}, V{:X}", x, y),
            Op::MathVyMinusVx(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Op::BitOpLftShift(x, y) => write!(f, "SHL V{:X}, V{:X}", x, y),
            Op::CondVxVyNe(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            Op::MemSetI(addr) => write!(f, "LD I, {:#05X}", addr),
            Op::GotoPlusV0(addr) => write!(f, "JP V0, {:#05X}", addr),
            Op::Rand(x, nn) => write!(f, "RND V{:X}, {:#04X}", x, nn),
            Op::DispDraw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Op::KeyOpEqVx(x) => write!(f, "SKP V{:X}", x),
            Op::KeyOpNeVx(x) => write!(f, "SKNP V{:X}", x),
            Op::DelayGet(x) => write!(f, "LD V{:X}, DT", x),
            Op::KeyOpGet(x) => write!(f, "LD V{:X}, K", x),
            Op::DelaySet(x) => write!(f, "LD DT, V{:X}", x),
            Op::SoundSet(x) => write!(f, "LD ST, V{:X}", x),
            Op::MemIPlusEqVx(x) => write!(f, "ADD I, V{:X}", x),
            Op::MemISetSprite(x) => write!(f, "LD F, V{:X}", x),
            Op::Bcd(x) => write!(f, "LD B, V{:X}", x),
            Op::RegDump(x) => write!(f, "LD [I], V{:X}", x),
            Op::RegLoad(x) => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(op_num: u16) -> Op {
        Op::try_from(op_num).expect("valid opcode")
    }

    fn assert_unknown(op_num: u16) {
        match Op::try_from(op_num) {
            Err(Chip8Error::UnknownInstruction { opcode }) => assert_eq!(opcode, op_num),
            other => panic!("expected unknown instruction, got {:?}", other),
        }
    }

    #[test]
    fn convert_opcodes() {
        assert_eq!(decode(0x00E0), Op::DispClear);
        assert_eq!(decode(0x00EE), Op::Return);
        assert_eq!(decode(0x1000), Op::Goto(0x000));
        assert_eq!(decode(0x2AAA), Op::GotoSubRtn(0xAAA));
        assert_eq!(decode(0x3FAA), Op::CondVxEq(0xF, 0xAA));
        assert_eq!(decode(0x4FAA), Op::CondVxNe(0xF, 0xAA));
        assert_eq!(decode(0x5FA0), Op::CondVxVyEq(0xF, 0xA));
        assert_eq!(decode(0x6FAB), Op::ConstSetVx(0xF, 0xAB));
        assert_eq!(decode(0x7FAB), Op::ConstAddVx(0xF, 0xAB));
        assert_eq!(decode(0x8FA0), Op::AssignVyToVx(0xF, 0xA));
        assert_eq!(decode(0x8FA1), Op::BitOpOr(0xF, 0xA));
        assert_eq!(decode(0x8FA2), Op::BitOpAnd(0xF, 0xA));
        assert_eq!(decode(0x8FA3), Op::BitOpXor(0xF, 0xA));
        assert_eq!(decode(0x8FA4), Op::MathVxAddVy(0xF, 0xA));
        assert_eq!(decode(0x8FA5), Op::MathVxMinusVy(0xF, 0xA));
        assert_eq!(decode(0x8FA6), Op::BitOpRtShift(0xF, 0xA));
        assert_eq!(decode(0x8FA7), Op::MathVyMinusVx(0xF, 0xA));
        assert_eq!(decode(0x8FAE), Op::BitOpLftShift(0xF, 0xA));
        assert_eq!(decode(0x9FA0), Op::CondVxVyNe(0xF, 0xA));
        assert_eq!(decode(0xAFAB), Op::MemSetI(0xFAB));
        assert_eq!(decode(0xBFAB), Op::GotoPlusV0(0xFAB));
        assert_eq!(decode(0xCFAB), Op::Rand(0xF, 0xAB));
        assert_eq!(decode(0xDFAB), Op::DispDraw(0xF, 0xA, 0xB));
        assert_eq!(decode(0xEF9E), Op::KeyOpEqVx(0xF));
        assert_eq!(decode(0xEFA1), Op::KeyOpNeVx(0xF));
        assert_eq!(decode(0xF907), Op::DelayGet(0x9));
        assert_eq!(decode(0xF90A), Op::KeyOpGet(0x9));
        assert_eq!(decode(0xF915), Op::DelaySet(0x9));
        assert_eq!(decode(0xF918), Op::SoundSet(0x9));
        assert_eq!(decode(0xF91E), Op::MemIPlusEqVx(0x9));
        assert_eq!(decode(0xF929), Op::MemISetSprite(0x9));
        assert_eq!(decode(0xF933), Op::Bcd(0x9));
        assert_eq!(decode(0xF955), Op::RegDump(0x9));
        assert_eq!(decode(0xF965), Op::RegLoad(0x9));
    }

    #[test]
    fn skip_register_compares_ignore_low_nibble() {
        assert_eq!(decode(0x5AB7), Op::CondVxVyEq(0xA, 0xB));
        assert_eq!(decode(0x9AB7), Op::CondVxVyNe(0xA, 0xB));
    }

    #[test]
    fn unknown_opcodes_in_group_0() {
        // 0NNN machine code calls are not part of this instruction set
        assert_unknown(0x0FFF);
        assert_unknown(0x00E1);
        assert_unknown(0x0000);
    }

    #[test]
    fn unknown_opcodes_in_group_8() {
        assert_unknown(0x8DE8);
        assert_unknown(0x8DEF);
    }

    #[test]
    fn unknown_opcodes_in_group_e() {
        assert_unknown(0xED9F);
    }

    #[test]
    fn unknown_opcodes_in_group_f() {
        assert_unknown(0xFDEF);
        assert_unknown(0xF000);
    }

    #[test]
    fn display_ops() {
        assert!(decode(0x00E0).is_display_op());
        assert!(decode(0xD125).is_display_op());
        assert!(!decode(0x00EE).is_display_op());
        assert!(!decode(0xF129).is_display_op());
    }

    #[test]
    fn disassembly() {
        assert_eq!(decode(0x00E0).to_string(), "CLS");
        assert_eq!(decode(0x2ABC).to_string(), "CALL 0xABC");
        assert_eq!(decode(0x6A0F).to_string(), "LD VA, 0x0F");
        assert_eq!(decode(0x8AB4).to_string(), "ADD VA, VB");
        assert_eq!(decode(0xD125).to_string(), "DRW V1, V2, 5");
        assert_eq!(decode(0xF365).to_string(), "LD V3, [I]");
    }

    #[test]
    fn three_u8s_to_address_test() {
        assert_eq!(0x0FA, three_nibbles_to_address(0x0, 0xF, 0xA));
        assert_eq!(0xFFF, three_nibbles_to_address(0xF, 0xF, 0xF));
    }

    #[test]
    fn masked_keeps_instruction_word_bits() {
        assert_eq!(Op::ConstSetVx(0x21, 0xFF).masked(), Op::ConstSetVx(0x1, 0xFF));
        assert_eq!(Op::DispDraw(0x10, 0x1F, 0x10).masked(), Op::DispDraw(0x0, 0xF, 0x0));
        assert_eq!(Op::Goto(0x1234).masked(), Op::Goto(0x234));
        assert_eq!(decode(0xD12F).masked(), decode(0xD12F));
    }
}
