//! Packing of string literals into immediate machine words.

use crate::asm::WORD_SIZE;

/// Packs `bytes` into words in memory order: word `i` holds bytes `8 * i ..`, with the first byte of each
/// chunk in the least significant position. A short final chunk is zero padded.
///
/// Pushing the words in reverse order leaves the original byte sequence at the stack pointer.
pub fn pack_words(bytes: &[u8]) -> Vec<u64> {
    bytes
        .chunks(WORD_SIZE)
        .map(|chunk| {
            let mut word = [0u8; WORD_SIZE];
            word[..chunk.len()].copy_from_slice(chunk);
            u64::from_le_bytes(word)
        })
        .collect()
}

/// Formats a word as a hexadecimal immediate.
pub fn immediate(word: u64) -> String {
    format!("0x{:X}", word)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lays the words out the way they end up in memory.
    fn memory(words: &[u64], len: usize) -> Vec<u8> {
        let mut bytes: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes().to_vec()).collect();
        bytes.truncate(len);
        bytes
    }

    #[test]
    fn short_string() {
        let words = pack_words(b"Hello\n");
        assert_eq!(words, vec![0x0A6F6C6C6548]);
        assert_eq!(immediate(words[0]), "0xA6F6C6C6548");
    }

    #[test]
    fn exact_word() {
        let words = pack_words(b"abcdefgh");
        assert_eq!(words.len(), 1);
        assert_eq!(memory(&words, 8), b"abcdefgh".to_vec());
    }

    #[test]
    fn multiple_words() {
        let text = "hello, world of nob!\n";
        let words = pack_words(text.as_bytes());
        assert_eq!(words.len(), 3);
        assert_eq!(memory(&words, text.len()), text.as_bytes().to_vec());
    }

    #[test]
    fn empty() {
        assert!(pack_words(b"").is_empty());
    }
}
