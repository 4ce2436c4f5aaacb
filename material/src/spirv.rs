//! SPIR-V word stream helpers.

/// SPIR-V magic number, first word of every module.
pub const MAGIC: u32 = 0x0723_0203;

const HEADER_WORDS: usize = 5;

/// Opcodes carrying only debug information.
const DEBUG_OPCODES: [u16; 9] = [
    2,   // OpSourceContinued
    3,   // OpSource
    4,   // OpSourceExtension
    5,   // OpName
    6,   // OpMemberName
    7,   // OpString
    8,   // OpLine
    317, // OpNoLine
    330, // OpModuleProcessed
];

/// Returns `true` if `words` starts with a SPIR-V header.
pub fn is_spirv(words: &[u32]) -> bool {
    words.len() >= HEADER_WORDS && words[0] == MAGIC
}

/// Removes debug instructions from a module.
///
/// Input that is not a well-formed module is returned unchanged.
pub fn strip_debug_info(words: &[u32]) -> Vec<u32> {
    if !is_spirv(words) {
        return words.to_vec();
    }

    let mut out = Vec::with_capacity(words.len());
    out.extend_from_slice(&words[..HEADER_WORDS]);

    let mut cursor = HEADER_WORDS;
    while cursor < words.len() {
        let word = words[cursor];
        let count = (word >> 16) as usize;
        let opcode = (word & 0xffff) as u16;
        if count == 0 || cursor + count > words.len() {
            log::warn!("malformed SPIR-V instruction at word {cursor}; leaving remainder untouched");
            out.extend_from_slice(&words[cursor..]);
            break;
        }
        if !DEBUG_OPCODES.contains(&opcode) {
            out.extend_from_slice(&words[cursor..cursor + count]);
        }
        cursor += count;
    }
    out
}

/// Strips debug instructions from a module stored as bytes.
pub fn strip_debug_info_bytes(bytes: &[u8]) -> Vec<u8> {
    if bytes.len() % 4 != 0 {
        return bytes.to_vec();
    }
    let words: Vec<u32> = bytemuck::pod_collect_to_vec(bytes);
    bytemuck::cast_slice(&strip_debug_info(&words)).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instruction(opcode: u16, operands: &[u32]) -> Vec<u32> {
        let mut words = vec![((operands.len() as u32 + 1) << 16) | opcode as u32];
        words.extend_from_slice(operands);
        words
    }

    fn module() -> Vec<u32> {
        let mut words = vec![MAGIC, 0x0001_0000, 0, 16, 0];
        words.extend(instruction(17, &[1])); // OpCapability Shader
        words.extend(instruction(5, &[3, 0x6e69_616d, 0])); // OpName %3 "main"
        words.extend(instruction(3, &[2, 450])); // OpSource GLSL 450
        words.extend(instruction(19, &[2])); // OpTypeVoid
        words.extend(instruction(8, &[4, 10, 2])); // OpLine
        words.extend(instruction(253, &[])); // OpReturn
        words
    }

    #[test]
    fn removes_debug_instructions() {
        let stripped = strip_debug_info(&module());
        let mut expected = vec![MAGIC, 0x0001_0000, 0, 16, 0];
        expected.extend(instruction(17, &[1]));
        expected.extend(instruction(19, &[2]));
        expected.extend(instruction(253, &[]));
        assert_eq!(stripped, expected);
    }

    #[test]
    fn non_spirv_is_untouched() {
        let words = vec![1, 2, 3];
        assert_eq!(strip_debug_info(&words), words);
    }

    #[test]
    fn malformed_tail_is_preserved() {
        let mut words = module();
        words.push(0x0005_0011); // claims 5 words, only 1 present
        let stripped = strip_debug_info(&words);
        assert_eq!(stripped.last(), Some(&0x0005_0011));
    }

    #[test]
    fn byte_form_matches_word_form() {
        let words = module();
        let bytes: &[u8] = bytemuck::cast_slice(&words);
        let stripped: Vec<u32> = bytemuck::pod_collect_to_vec(&strip_debug_info_bytes(bytes));
        assert_eq!(stripped, strip_debug_info(&words));
    }
}
