use std::path::Path;

use log::debug;

use wordgrid_core::search::{Reporter, SearchConfig, Solver};
use wordgrid_core::WordgridResult;

use crate::config::GeneratorConfig;
use crate::dictionary;

/// A dictionary wired to a configured solver.
#[derive(Debug)]
pub struct Generator {
    solver: Solver,
}

impl Generator {
    /// Builds a generator from a dictionary file.
    pub fn from_path(path: &Path, config: &GeneratorConfig) -> WordgridResult<Generator> {
        let search = config.search_config();
        search.validate()?;
        let words = dictionary::load_words(path, &search)?;
        Generator::from_words(&words, search)
    }

    /// Builds a generator from an already-read word list.
    pub fn from_words(words: &[Vec<u8>], search: SearchConfig) -> WordgridResult<Generator> {
        search.validate()?;
        debug!(
            "building generator: {}x{} board, {} words",
            search.rows,
            search.cols,
            words.len()
        );
        let trie = dictionary::build_trie(words, &search)?;
        Ok(Generator {
            solver: Solver::new(trie, &search)?,
        })
    }

    /// Runs the search to completion, reporting progress and every
    /// improved grid through `reporter`.
    pub fn run<R: Reporter>(&mut self, reporter: &mut R) {
        self.solver.run(reporter);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::Generator;
    use crate::config::GeneratorConfig;
    use wordgrid_core::board::Grid;
    use wordgrid_core::error::WordgridErrorKind;
    use wordgrid_core::search::Reporter;

    #[derive(Default)]
    struct Collect {
        grids: Vec<(Vec<String>, usize)>,
        accepted: bool,
    }

    impl Reporter for Collect {
        fn solution(&mut self, grid: &Grid, blacks: usize) {
            let rows = (0..grid.rows())
                .map(|r| String::from_utf8(grid.row_symbols(r).to_vec()).unwrap())
                .collect();
            self.grids.push((rows, blacks));
        }
        fn accepted(&mut self) {
            self.accepted = true;
        }
    }

    #[test]
    fn test_generates_word_square() {
        let config = GeneratorConfig::from_params_str("2 2 0 0 2 100 0 7").unwrap();
        let words = vec![b"IT".to_vec(), b"IS".to_vec(), b"TO".to_vec()];
        let mut generator = Generator::from_words(&words, config.search_config()).unwrap();
        let mut collect = Collect::default();
        generator.run(&mut collect);
        assert!(collect.accepted);
        assert_eq!(
            collect.grids.last().unwrap(),
            &(vec!["IT".to_string(), "TO".to_string()], 0)
        );
    }

    #[test]
    fn test_missing_dictionary_is_io_error() {
        let config = GeneratorConfig::from_params_str("2 2 0 0 0 1 0").unwrap();
        let err = Generator::from_path(Path::new("no-such-dictionary.txt"), &config).unwrap_err();
        assert_eq!(err.kind(), WordgridErrorKind::Io);
    }

    #[test]
    fn test_invalid_settings_rejected_before_reading() {
        let config = GeneratorConfig::from_params_str("3 2 0 0 0 1 0").unwrap();
        let err = Generator::from_path(Path::new("no-such-dictionary.txt"), &config).unwrap_err();
        assert_eq!(err.kind(), WordgridErrorKind::Args);
    }
}
