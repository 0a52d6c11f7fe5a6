use std::str::SplitWhitespace;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use wordgrid_core::error::WordgridErrorKind;
use wordgrid_core::search::{Heuristic, SearchConfig};
use wordgrid_core::WordgridResult;

pub const OPT_SYM_BLACKS: u32 = 1;
pub const OPT_CONNECTED_WHITES: u32 = 2;
pub const OPT_LINEAR_BLACKS: u32 = 4;

/// Raw generation parameters as the user supplies them.
///
/// `heuristic` is a numeric code (0 frequency, 1 random, anything greater
/// none) and `options` a bitmask of `OPT_*` flags, matching the parameter
/// list read from standard input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub rows: usize,
    pub cols: usize,
    pub blacks_min: usize,
    pub blacks_max: usize,
    pub heuristic: u64,
    pub choices_max: usize,
    pub options: u32,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GeneratorConfig {
    /// Parses the whitespace-separated parameter list fed on standard
    /// input: rows, columns, minimum and maximum number of black squares,
    /// heuristic code, initial branching cap, options bitmask and an
    /// optional seed.
    pub fn from_params_str(s: &str) -> WordgridResult<GeneratorConfig> {
        let mut params = s.split_whitespace();
        let rows = next_param(&mut params, "number of rows")? as usize;
        let cols = next_param(&mut params, "number of columns")? as usize;
        let blacks_min = next_param(&mut params, "minimum number of black squares")? as usize;
        let blacks_max = next_param(&mut params, "maximum number of black squares")? as usize;
        let heuristic = next_param(&mut params, "heuristic")?;
        let choices_max = next_param(&mut params, "maximum number of choices")? as usize;
        let options = next_param(&mut params, "options")? as u32;
        let seed = match params.next() {
            Some(token) => Some(token.parse::<u64>().map_err(|err| {
                WordgridErrorKind::Parse.with_error(anyhow::anyhow!("invalid seed: {}", err))
            })?),
            None => None,
        };
        Ok(GeneratorConfig {
            rows,
            cols,
            blacks_min,
            blacks_max,
            heuristic,
            choices_max,
            options,
            seed,
        })
    }

    pub fn sym_blacks(&self) -> bool {
        self.options & OPT_SYM_BLACKS != 0
    }

    pub fn connected_whites(&self) -> bool {
        self.options & OPT_CONNECTED_WHITES != 0
    }

    pub fn linear_blacks(&self) -> bool {
        self.options & OPT_LINEAR_BLACKS != 0
    }

    /// The explicit seed, or one derived from the wall clock.
    pub fn seed_or_now(&self) -> u64 {
        match self.seed {
            Some(seed) => seed,
            None => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            rows: self.rows,
            cols: self.cols,
            blacks_min: self.blacks_min,
            blacks_max: self.blacks_max,
            heuristic: Heuristic::from_code(self.heuristic),
            choices_max: self.choices_max,
            sym_blacks: self.sym_blacks(),
            connected_whites: self.connected_whites(),
            linear_blacks: self.linear_blacks(),
            seed: self.seed_or_now(),
        }
    }
}

fn next_param(params: &mut SplitWhitespace, name: &str) -> WordgridResult<u64> {
    let token = params.next().ok_or_else(|| {
        WordgridErrorKind::Parse.with_error(anyhow::anyhow!("missing parameter: {}", name))
    })?;
    token.parse::<u64>().map_err(|err| {
        WordgridErrorKind::Parse
            .with_error(anyhow::anyhow!("invalid {}: {}", name, err))
    })
}

#[cfg(test)]
mod tests {
    use super::GeneratorConfig;
    use wordgrid_core::error::WordgridErrorKind;
    use wordgrid_core::search::Heuristic;

    #[test]
    fn test_parse_params() {
        let config = GeneratorConfig::from_params_str("5 7 2 10 0 3 5").unwrap();
        assert_eq!((config.rows, config.cols), (5, 7));
        assert_eq!((config.blacks_min, config.blacks_max), (2, 10));
        assert_eq!(config.choices_max, 3);
        assert!(config.sym_blacks());
        assert!(!config.connected_whites());
        assert!(config.linear_blacks());
        assert_eq!(config.seed, None);
        let search = config.search_config();
        assert_eq!(search.heuristic, Heuristic::Frequency);
        assert!(search.sym_blacks);
        assert!(search.linear_blacks);
        assert!(!search.connected_whites);
    }

    #[test]
    fn test_parse_params_with_seed() {
        let config = GeneratorConfig::from_params_str("3 3 0 0 2 1 0 42").unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.search_config().seed, 42);
        assert_eq!(config.search_config().heuristic, Heuristic::None);
    }

    #[test]
    fn test_parse_params_missing() {
        let err = GeneratorConfig::from_params_str("3 3 0").unwrap_err();
        assert_eq!(err.kind(), WordgridErrorKind::Parse);
    }

    #[test]
    fn test_parse_params_garbage() {
        let err = GeneratorConfig::from_params_str("3 x 0 0 0 1 0").unwrap_err();
        assert_eq!(err.kind(), WordgridErrorKind::Parse);
    }

    #[test]
    fn test_json_round_trip() {
        let config = GeneratorConfig::from_params_str("4 4 0 4 1 2 6 9").unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: GeneratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rows, 4);
        assert_eq!(back.options, 6);
        assert_eq!(back.seed, Some(9));
    }
}
