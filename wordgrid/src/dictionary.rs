use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;

use wordgrid_core::error::WordgridErrorKind;
use wordgrid_core::search::SearchConfig;
use wordgrid_core::trie::{Trie, TrieBuilder};
use wordgrid_core::WordgridResult;

/// Reads a word list: one word per line, ASCII letters only, lower case
/// folded to upper. Any other character aborts with its line number, and
/// so does a final word without a terminating newline.
///
/// Words whose length cannot occur on the board are dropped: a length of
/// `rows` or `cols` always fits, anything up to `cols` fits when black
/// squares are available, everything else can never be placed.
pub fn read_words<R: Read>(mut reader: R, config: &SearchConfig) -> WordgridResult<Vec<Vec<u8>>> {
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .map_err(|err| WordgridErrorKind::Io.with_error(anyhow::anyhow!(err)))?;
    let mut words = Vec::new();
    let mut word = Vec::new();
    let mut line = 1usize;
    let mut dropped = 0usize;
    for &byte in &data {
        let symbol = byte.to_ascii_uppercase();
        if symbol.is_ascii_uppercase() {
            word.push(symbol);
        } else if byte == b'\n' {
            if fits_board(word.len(), config) {
                words.push(std::mem::take(&mut word));
            } else {
                dropped += 1;
                word.clear();
            }
            line += 1;
        } else {
            return Err(WordgridErrorKind::Content.with_error(anyhow::anyhow!(
                "invalid character {:?} in dictionary on line {}",
                byte as char,
                line
            )));
        }
    }
    if !word.is_empty() {
        return Err(WordgridErrorKind::Content.with_error(anyhow::anyhow!(
            "unexpected end of dictionary on line {}",
            line
        )));
    }
    debug!("dictionary read: {} words kept, {} dropped", words.len(), dropped);
    Ok(words)
}

pub fn load_words(path: &Path, config: &SearchConfig) -> WordgridResult<Vec<Vec<u8>>> {
    let file = File::open(path).map_err(|err| {
        WordgridErrorKind::Io.with_error(anyhow::anyhow!(
            "could not open the dictionary {}: {}",
            path.display(),
            err
        ))
    })?;
    read_words(file, config)
}

pub fn build_trie(words: &[Vec<u8>], config: &SearchConfig) -> WordgridResult<Trie> {
    let mut builder = TrieBuilder::new(config.cols);
    for word in words {
        builder.insert(word)?;
    }
    Ok(builder.build(config.word_slots(), config.allow_breaks()))
}

fn fits_board(len: usize, config: &SearchConfig) -> bool {
    (config.blacks_max > 0 && len <= config.cols) || len == config.rows || len == config.cols
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{build_trie, read_words};
    use wordgrid_core::error::WordgridErrorKind;
    use wordgrid_core::search::{Heuristic, SearchConfig};
    use wordgrid_core::trie::{END, ROOT_NODE};

    fn config(rows: usize, cols: usize, blacks_max: usize) -> SearchConfig {
        SearchConfig {
            rows,
            cols,
            blacks_min: 0,
            blacks_max,
            heuristic: Heuristic::None,
            choices_max: 1,
            sym_blacks: false,
            connected_whites: false,
            linear_blacks: false,
            seed: 0,
        }
    }

    #[test]
    fn test_reads_and_upcases() {
        let words = read_words(Cursor::new("cat\nDOG\n"), &config(1, 3, 0)).unwrap();
        assert_eq!(words, vec![b"CAT".to_vec(), b"DOG".to_vec()]);
    }

    #[test]
    fn test_length_filter_without_blacks() {
        // only lengths 2 and 4 can occur on a 2x4 board with no blacks
        let words = read_words(Cursor::new("AB\nABC\nABCD\nABCDE\n"), &config(2, 4, 0)).unwrap();
        assert_eq!(words, vec![b"AB".to_vec(), b"ABCD".to_vec()]);
    }

    #[test]
    fn test_length_filter_with_blacks() {
        let words = read_words(Cursor::new("AB\nABC\nABCD\nABCDE\n"), &config(2, 4, 3)).unwrap();
        assert_eq!(
            words,
            vec![b"AB".to_vec(), b"ABC".to_vec(), b"ABCD".to_vec()]
        );
    }

    #[test]
    fn test_invalid_character_reports_line() {
        let err = read_words(Cursor::new("CAT\nD0G\n"), &config(1, 3, 0)).unwrap_err();
        assert_eq!(err.kind(), WordgridErrorKind::Content);
        assert!(err.to_string().contains("line 2"), "{}", err);
    }

    #[test]
    fn test_unterminated_word_is_an_error() {
        let err = read_words(Cursor::new("CAT\nDOG"), &config(1, 3, 0)).unwrap_err();
        assert_eq!(err.kind(), WordgridErrorKind::Content);
    }

    #[test]
    fn test_build_trie_installs_break_edge() {
        let cfg = config(2, 2, 1);
        let words = read_words(Cursor::new("IT\nTO\n"), &cfg).unwrap();
        let trie = build_trie(&words, &cfg).unwrap();
        assert_eq!(trie.letters(ROOT_NODE)[0].symbol, END);
        let cfg0 = config(2, 2, 0);
        let trie = build_trie(&words, &cfg0).unwrap();
        assert_ne!(trie.letters(ROOT_NODE)[0].symbol, END);
    }
}
