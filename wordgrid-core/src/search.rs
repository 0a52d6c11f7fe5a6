use std::str::FromStr;

use log::debug;

use crate::board::{Board, Grid, BLACK, RESERVED_WHITE, UNKNOWN};
use crate::choice::{frequency_order, Choice};
use crate::error::WordgridErrorKind;
use crate::rng::SearchRng;
use crate::trie::{Letter, LetterId, NodeId, Trie, END, ROOT_LETTER};
use crate::WordgridResult;

/// Candidate ordering at each cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    /// Prefer choices with the largest product of remaining leaves on the
    /// two axes.
    Frequency,
    /// Fisher-Yates shuffle with the seeded generator.
    Random,
    /// Keep symbol-ascending enumeration order.
    None,
}

impl Heuristic {
    /// Numeric code from the parameter list: 0 frequency, 1 random,
    /// anything greater none.
    pub fn from_code(code: u64) -> Heuristic {
        match code {
            0 => Heuristic::Frequency,
            1 => Heuristic::Random,
            _ => Heuristic::None,
        }
    }
}

impl FromStr for Heuristic {
    type Err = crate::error::WordgridError;
    fn from_str(s: &str) -> Result<Heuristic, Self::Err> {
        match s {
            "frequency" => Ok(Heuristic::Frequency),
            "random" => Ok(Heuristic::Random),
            "none" => Ok(Heuristic::None),
            _ => Err(WordgridErrorKind::Args
                .with_error(anyhow::anyhow!("invalid heuristic: {}", s))),
        }
    }
}

/// Ceiling on `rows * cols`, chosen so the half-word products of the
/// frequency heuristic stay exact.
pub const fn cells_max() -> usize {
    1 << (usize::BITS / 2)
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub rows: usize,
    pub cols: usize,
    pub blacks_min: usize,
    pub blacks_max: usize,
    pub heuristic: Heuristic,
    pub choices_max: usize,
    pub sym_blacks: bool,
    pub connected_whites: bool,
    pub linear_blacks: bool,
    pub seed: u64,
}

impl SearchConfig {
    pub fn validate(&self) -> WordgridResult<()> {
        if self.rows < 1 {
            return Err(WordgridErrorKind::Args
                .with_error(anyhow::anyhow!("number of rows must be at least 1")));
        }
        if self.cols < self.rows {
            return Err(WordgridErrorKind::Args.with_error(anyhow::anyhow!(
                "number of columns must be at least the number of rows"
            )));
        }
        if self.rows > cells_max() / self.cols {
            return Err(WordgridErrorKind::Args.with_error(anyhow::anyhow!(
                "number of cells must be at most {}",
                cells_max()
            )));
        }
        if self.blacks_max < self.blacks_min {
            return Err(WordgridErrorKind::Args.with_error(anyhow::anyhow!(
                "maximum number of black squares must be at least the minimum"
            )));
        }
        if self.blacks_max > self.rows * self.cols {
            return Err(WordgridErrorKind::Args.with_error(anyhow::anyhow!(
                "maximum number of black squares must be at most the number of cells"
            )));
        }
        if self.choices_max < 1 {
            return Err(WordgridErrorKind::Args
                .with_error(anyhow::anyhow!("maximum number of choices must be at least 1")));
        }
        Ok(())
    }

    /// Upper bound on the number of word slots a grid can contain: one per
    /// row and column plus one extra slot per axis for every black square.
    /// Used to seed `END`-edge leaf counts so that one word may fill
    /// several slots, and never runs out on a single search path.
    pub fn word_slots(&self) -> u32 {
        (2 * self.blacks_max + self.rows + self.cols) as u32
    }

    /// Whether words may end inside a row or column. Black squares carry
    /// the word boundaries, so this is simply `blacks_max > 0`.
    pub fn allow_breaks(&self) -> bool {
        self.blacks_max > 0
    }
}

/// Sink for search progress and results. All methods default to no-ops.
pub trait Reporter {
    /// The driver entered an iteration with the given branching cap.
    fn pass_started(&mut self, _choices_max: usize) {}

    /// A cell was reached for the first time (border cells included).
    fn cell_entered(&mut self, _row: i32, _col: i32) {}

    /// An improved grid was found; the bound tightens below `blacks`.
    fn solution(&mut self, _grid: &Grid, _blacks: usize) {}

    /// No further improvement is possible.
    fn accepted(&mut self) {}
}

/// Backtracking grid solver.
///
/// Owns every piece of mutable search state: the board, the trie leaf
/// counters, the shared choice buffer, the per-column reservations, the
/// flood-fill scratch queue and the counters. Every mutation made on the
/// way down the recursion is reversed on the way up, so sibling subtrees
/// observe identical state.
#[derive(Debug)]
pub struct Solver {
    trie: Trie,
    board: Board,
    choices: Vec<Choice>,
    queue: Vec<usize>,
    blacks_in_cols: Vec<usize>,
    rng: SearchRng,

    rows: i32,
    cols: i32,
    stride: usize,
    blacks_min: usize,
    // exclusive bound; accepting a solution tightens it to that
    // solution's black count
    blacks_limit: usize,
    blacks_ratio: f64,
    heuristic: Heuristic,
    choices_max: usize,
    sym_blacks: bool,
    connected_whites: bool,
    linear_blacks: bool,
    seed: u64,

    symmetric: bool,
    unknown_cells: usize,
    blacks_n: usize,
    blacks_pending: usize,
    blacks_excess: usize,
    whites_n: usize,
    overflow: bool,
}

impl Solver {
    pub fn new(trie: Trie, config: &SearchConfig) -> WordgridResult<Solver> {
        config.validate()?;
        let cells = config.rows * config.cols;
        Ok(Solver {
            trie,
            board: Board::new(config.rows, config.cols),
            choices: Vec::new(),
            queue: Vec::with_capacity(cells),
            blacks_in_cols: vec![0; config.cols],
            rng: SearchRng::seeded(config.seed),
            rows: config.rows as i32,
            cols: config.cols as i32,
            stride: config.cols + 2,
            blacks_min: config.blacks_min,
            blacks_limit: config.blacks_max + 1,
            blacks_ratio: config.blacks_max as f64 / cells as f64,
            heuristic: config.heuristic,
            choices_max: config.choices_max,
            sym_blacks: config.sym_blacks,
            connected_whites: config.connected_whites,
            linear_blacks: config.linear_blacks,
            seed: config.seed,
            symmetric: config.rows == config.cols,
            unknown_cells: cells,
            blacks_n: 0,
            blacks_pending: 0,
            blacks_excess: 0,
            whites_n: 0,
            overflow: false,
        })
    }

    /// Runs the search to completion, widening the branching cap and
    /// retrying as long as a capped pass fails.
    pub fn run<R: Reporter>(&mut self, reporter: &mut R) {
        loop {
            reporter.pass_started(self.choices_max);
            debug!("pass started, branching cap {}", self.choices_max);
            self.rng = SearchRng::seeded(self.seed);
            self.overflow = false;
            let done = self.solve(self.board.start(), reporter);
            if self.overflow && !done {
                self.choices_max += 1;
            } else {
                return;
            }
        }
    }

    fn solve<R: Reporter>(&mut self, ix: usize, reporter: &mut R) -> bool {
        let (row, col) = {
            let cell = self.board.cell(ix);
            (cell.row, cell.col)
        };
        if !self.board.cell(ix).visited {
            self.board.cell_mut(ix).visited = true;
            reporter.cell_entered(row, col);
        }
        if row < self.rows {
            let node_hor = self.trie.letter(self.board.cell(ix - 1).hor).next;
            if col < self.cols {
                return self.solve_cell(ix, row, col, node_hor, reporter);
            }
            // the horizontal run must close here; skip the next row's
            // border cell
            return self.finalize_run(node_hor, ix + 2, reporter);
        }
        if col < self.cols {
            if self.rows == 1 {
                // a single-row board has no vertical words
                return self.solve(ix + 1, reporter);
            }
            let node_ver = self.trie.letter(self.board.cell(ix - self.stride).ver).next;
            return self.finalize_run(node_ver, ix + 1, reporter);
        }
        // every run closed: the grid is a solution; tighten the bound and
        // keep looking for one with strictly fewer blacks
        self.blacks_limit = self.blacks_n;
        let grid = self.board.snapshot();
        reporter.solution(&grid, self.blacks_n);
        if self.blacks_min >= self.blacks_limit {
            reporter.accepted();
            return true;
        }
        false
    }

    // A run ends entering this node: END must be a valid continuation.
    fn finalize_run<R: Reporter>(&mut self, node: NodeId, next: usize, reporter: &mut R) -> bool {
        let first = match self.trie.first(node) {
            Some(id) => id,
            None => return false,
        };
        if self.trie.letter(first).symbol != END || self.trie.letter(first).leaves == 0 {
            return false;
        }
        self.trie.letter_mut(first).leaves -= 1;
        let done = self.solve(next, reporter);
        self.trie.letter_mut(first).leaves += 1;
        done
    }

    fn solve_cell<R: Reporter>(
        &mut self,
        ix: usize,
        row: i32,
        col: i32,
        node_hor: NodeId,
        reporter: &mut R,
    ) -> bool {
        let node_ver = self.trie.letter(self.board.cell(ix - self.stride).ver).next;
        let sym180 = self.board.sym180(ix);

        // allowed word-length windows for the runs crossing this cell
        let (hor_min, hor_max, ver_min, ver_max) = if self.sym_blacks {
            // the committed half constrains this one: scan the twin region
            // to the first undecided cell for the minimum, then to the
            // first black for the maximum
            let twin_row = self.board.cell(sym180).row;
            let twin_col = self.board.cell(sym180).col;
            let mut s = sym180;
            while self.board.cell(s).symbol != UNKNOWN && self.board.cell(s).symbol != BLACK {
                s -= self.stride;
            }
            let ver_min = twin_row - self.board.cell(s).row;
            while self.board.cell(s).symbol != BLACK {
                s -= self.stride;
            }
            let ver_max = twin_row - self.board.cell(s).row;
            let mut s = sym180;
            while self.board.cell(s).symbol != UNKNOWN && self.board.cell(s).symbol != BLACK {
                s -= 1;
            }
            let hor_min = twin_col - self.board.cell(s).col;
            while self.board.cell(s).symbol != BLACK {
                s -= 1;
            }
            let hor_max = twin_col - self.board.cell(s).col;
            if sym180 > ix {
                self.unknown_cells -= 2;
            } else if sym180 == ix {
                self.unknown_cells -= 1;
            }
            (hor_min, hor_max, ver_min, ver_max)
        } else {
            let ver_max = self.rows - row;
            let hor_max = self.cols - col;
            if self.blacks_n + 1 < self.blacks_limit {
                (0, hor_max, 0, ver_max)
            } else {
                // no black square left: both runs must reach the border
                (hor_max, hor_max, ver_max, ver_max)
            }
        };

        let choices_lo = self.choices.len();
        let cell_symbol = self.board.cell(ix).symbol;
        let sym90_symbol = if self.symmetric && row > col {
            self.board.cell(self.board.sym90(ix)).symbol
        } else {
            0
        };

        let hor_n = self.trie.letters(node_hor).len();
        let mut i = 0;
        if self.symmetric && row > col {
            // below the diagonal of a still-symmetric square prefix, skip
            // symbols under the transposed cell's: those grids are
            // 90-degree rotations of grids already explored
            while i < hor_n && self.trie.letters(node_hor)[i].symbol < sym90_symbol {
                i += 1;
            }
        }
        if self.rows == 1 {
            while i < hor_n {
                let hid = self.trie.letter_id(node_hor, i);
                let (symbol, ok) = {
                    let l = self.trie.letter(hid);
                    (
                        l.symbol,
                        l.leaves > 0
                            && l.len_min as i32 <= hor_max
                            && l.len_max as i32 >= hor_min,
                    )
                };
                if ok && admits(cell_symbol, symbol) {
                    self.push_choice(hid, hid);
                }
                i += 1;
            }
        } else if node_hor == node_ver {
            // both axes read the same node: each letter pairs with itself
            while i < hor_n {
                let hid = self.trie.letter_id(node_hor, i);
                let (symbol, hor_ok, ver_ok) = {
                    let l = self.trie.letter(hid);
                    (
                        l.symbol,
                        viable(l, true, hor_max, hor_min),
                        viable(l, true, ver_max, ver_min),
                    )
                };
                if hor_ok && ver_ok && admits(cell_symbol, symbol) {
                    self.push_choice(hid, hid);
                }
                i += 1;
            }
        } else {
            // walk the two sorted letter lists in tandem
            let ver_n = self.trie.letters(node_ver).len();
            let mut j = 0;
            while i < hor_n {
                let hid = self.trie.letter_id(node_hor, i);
                let (symbol, hor_ok) = {
                    let l = self.trie.letter(hid);
                    (l.symbol, viable(l, false, hor_max, hor_min))
                };
                if hor_ok {
                    while j < ver_n && self.trie.letters(node_ver)[j].symbol < symbol {
                        j += 1;
                    }
                    if j < ver_n && self.trie.letters(node_ver)[j].symbol == symbol {
                        let vid = self.trie.letter_id(node_ver, j);
                        if viable(self.trie.letter(vid), false, ver_max, ver_min)
                            && admits(cell_symbol, symbol)
                        {
                            self.push_choice(hid, vid);
                        }
                        j += 1;
                    }
                }
                i += 1;
            }
        }

        let n = self.choices.len() - choices_lo;
        if n > 1 {
            match self.heuristic {
                Heuristic::Frequency => {
                    self.choices[choices_lo..].sort_unstable_by(frequency_order)
                }
                Heuristic::Random => {
                    let hi = self.choices.len();
                    for k in choices_lo..hi {
                        let r = k + self.rng.uniform(hi - k);
                        self.choices.swap(k, r);
                    }
                }
                Heuristic::None => {}
            }
            if n > self.choices_max {
                self.choices.truncate(choices_lo + self.choices_max);
                self.overflow = true;
            }
        }

        let choices_hi = self.choices.len();
        let symmetric_bak = self.symmetric;
        let blacks_in_col = self.blacks_in_cols[col as usize];
        let root_span = self.trie.letter(ROOT_LETTER).len_max as i32 + 1;
        // connectivity does not depend on which letter lands here, so the
        // check result is shared by every letter candidate of this cell
        let mut white_ok = if self.connected_whites { None } else { Some(true) };
        let mut done = false;
        let mut k = choices_lo;
        while k < choices_hi && !done {
            let choice = self.choices[k];
            {
                let cell = self.board.cell_mut(ix);
                cell.hor = choice.hor;
                cell.ver = choice.ver;
            }
            if symmetric_bak && row > col {
                self.symmetric = choice.symbol == sym90_symbol;
            }
            if choice.symbol != END {
                done = self.commit_letter(
                    ix,
                    row,
                    col,
                    sym180,
                    &choice,
                    root_span,
                    blacks_in_col,
                    &mut white_ok,
                    reporter,
                );
            } else {
                done = self.commit_black(
                    ix,
                    row,
                    col,
                    sym180,
                    &choice,
                    root_span,
                    blacks_in_col,
                    reporter,
                );
            }
            k += 1;
        }
        self.blacks_in_cols[col as usize] = blacks_in_col;
        self.symmetric = symmetric_bak;
        self.choices.truncate(choices_lo);
        if self.sym_blacks {
            if sym180 > ix {
                self.unknown_cells += 2;
            } else if sym180 == ix {
                self.unknown_cells += 1;
            }
        }
        done
    }

    #[allow(clippy::too_many_arguments)]
    fn commit_letter<R: Reporter>(
        &mut self,
        ix: usize,
        row: i32,
        col: i32,
        sym180: usize,
        choice: &Choice,
        root_span: i32,
        blacks_in_col: usize,
        white_ok: &mut Option<bool>,
        reporter: &mut R,
    ) -> bool {
        // a vertical run that cannot reach the bottom border forces at
        // least one more black in this column; estimate how many assuming
        // maximum-length words fill the rest
        let ver_len_max = self.trie.letter(choice.ver).len_max as i32;
        let reserve = if row + ver_len_max < self.rows {
            (1 + (self.rows - row - ver_len_max - 1) / root_span) as usize
        } else {
            0
        };
        self.blacks_in_cols[col as usize] = reserve;
        self.blacks_pending = self.blacks_pending + reserve - blacks_in_col;
        let mut done = false;
        if self.blacks_n + self.blacks_pending < self.blacks_limit
            && (!self.sym_blacks
                || self.blacks_pending <= self.blacks_excess + self.unknown_cells)
        {
            let paint_twin = self.sym_blacks && sym180 > ix;
            if self.connected_whites {
                self.whites_n += if paint_twin { 2 } else { 1 };
                if white_ok.is_none() {
                    *white_ok =
                        Some(self.whites_connected(ix, sym180, self.whites_n, RESERVED_WHITE));
                }
            }
            if *white_ok == Some(true) {
                self.trie.letter_mut(choice.hor).leaves -= 1;
                if self.rows > 1 {
                    self.trie.letter_mut(choice.ver).leaves -= 1;
                }
                self.board.cell_mut(ix).symbol = choice.symbol;
                if paint_twin {
                    self.board.cell_mut(sym180).symbol = RESERVED_WHITE;
                }
                done = self.solve(ix + 1, reporter);
                if paint_twin {
                    self.board.cell_mut(sym180).symbol = UNKNOWN;
                }
                self.board.cell_mut(ix).symbol = if self.sym_blacks && sym180 < ix {
                    RESERVED_WHITE
                } else {
                    UNKNOWN
                };
                if self.rows > 1 {
                    self.trie.letter_mut(choice.ver).leaves += 1;
                }
                self.trie.letter_mut(choice.hor).leaves += 1;
            }
            if self.connected_whites {
                self.whites_n -= if paint_twin { 2 } else { 1 };
            }
        }
        self.blacks_pending = self.blacks_pending + blacks_in_col - reserve;
        done
    }

    #[allow(clippy::too_many_arguments)]
    fn commit_black<R: Reporter>(
        &mut self,
        ix: usize,
        row: i32,
        col: i32,
        sym180: usize,
        choice: &Choice,
        root_span: i32,
        blacks_in_col: usize,
        reporter: &mut R,
    ) -> bool {
        self.blacks_n += 1;
        let reserve = ((self.rows - row - 1) / root_span) as usize;
        self.blacks_in_cols[col as usize] = reserve;
        self.blacks_pending = self.blacks_pending + reserve - blacks_in_col;
        if self.sym_blacks {
            if sym180 > ix {
                self.blacks_excess += 1;
            } else if sym180 < ix {
                self.blacks_excess -= 1;
            }
        }
        let pos = (row * self.cols + col) as usize;
        let feasible = self.blacks_n + self.blacks_pending < self.blacks_limit
            && (!self.sym_blacks
                || (self.blacks_n + self.blacks_excess < self.blacks_limit
                    && self.blacks_pending <= self.blacks_excess + self.unknown_cells))
            && (!self.linear_blacks
                || pos == 0
                || self.blacks_n as f64 / pos as f64 <= self.blacks_ratio)
            && (!self.connected_whites
                || self.whites_connected(ix, sym180, self.whites_n, BLACK));
        let mut done = false;
        if feasible {
            self.trie.letter_mut(choice.hor).leaves -= 1;
            if self.rows > 1 {
                self.trie.letter_mut(choice.ver).leaves -= 1;
            }
            // when the twin committed first, this cell already wears its
            // black and the twin's frame owns the repaint
            let own = !self.sym_blacks || sym180 >= ix;
            if own {
                self.board.cell_mut(ix).symbol = BLACK;
            }
            if self.sym_blacks && sym180 > ix {
                self.board.cell_mut(sym180).symbol = BLACK;
            }
            done = self.solve(ix + 1, reporter);
            if self.sym_blacks && sym180 > ix {
                self.board.cell_mut(sym180).symbol = UNKNOWN;
            }
            if own {
                self.board.cell_mut(ix).symbol = UNKNOWN;
            }
            if self.rows > 1 {
                self.trie.letter_mut(choice.ver).leaves += 1;
            }
            self.trie.letter_mut(choice.hor).leaves += 1;
        }
        if self.sym_blacks {
            if sym180 > ix {
                self.blacks_excess -= 1;
            } else if sym180 < ix {
                self.blacks_excess += 1;
            }
        }
        self.blacks_pending = self.blacks_pending + blacks_in_col - reserve;
        self.blacks_n -= 1;
        done
    }

    fn push_choice(&mut self, hor: LetterId, ver: LetterId) {
        let choice = Choice::new(
            self.trie.letter(hor),
            self.trie.letter(ver),
            hor,
            ver,
            self.heuristic == Heuristic::Frequency,
        );
        self.choices.push(choice);
    }

    // Flood fill from the first non-black cell, marching through
    // four-neighbours, counting committed whites; connected iff the count
    // matches `target`. `probe` is what the current cell (and its painted
    // twin) would become.
    fn whites_connected(&mut self, ix: usize, sym180: usize, target: usize, probe: u8) -> bool {
        if self.sym_blacks && sym180 < ix {
            // the unexplored half mirrors the committed one; asymmetry
            // cannot appear past the center
            return true;
        }
        let first = if probe == RESERVED_WHITE {
            ix
        } else {
            let mut found = None;
            'scan: for r in 1..=self.board.rows() {
                for c in 1..=self.board.cols() {
                    let cand = r * self.stride + c;
                    if self.board.cell(cand).symbol != BLACK {
                        found = Some(cand);
                        break 'scan;
                    }
                }
            }
            match found {
                Some(f) => f,
                None => return true,
            }
        };
        self.board.cell_mut(ix).symbol = probe;
        let paint_twin = self.sym_blacks && sym180 > ix;
        if paint_twin {
            self.board.cell_mut(sym180).symbol = probe;
        }
        self.queue.clear();
        self.enqueue(first);
        let mut remaining = target;
        let mut head = 0;
        while head < self.queue.len() {
            let cur = self.queue[head];
            if self.board.cell(cur).symbol != UNKNOWN {
                remaining -= 1;
            }
            if remaining == 0 {
                break;
            }
            self.enqueue(cur - 1);
            self.enqueue(cur - self.stride);
            self.enqueue(cur + 1);
            self.enqueue(cur + self.stride);
            head += 1;
        }
        for qi in 0..self.queue.len() {
            let q = self.queue[qi];
            self.board.cell_mut(q).queued = false;
        }
        if paint_twin {
            self.board.cell_mut(sym180).symbol = UNKNOWN;
        }
        self.board.cell_mut(ix).symbol = UNKNOWN;
        remaining == 0
    }

    fn enqueue(&mut self, ix: usize) {
        let cell = self.board.cell_mut(ix);
        if cell.symbol != BLACK && !cell.queued {
            cell.queued = true;
            self.queue.push(ix);
        }
    }
}

fn viable(letter: &Letter, same_node: bool, whites_max: i32, whites_min: i32) -> bool {
    // with both axes on the same node the edge is decremented twice, so a
    // single remaining leaf is not enough
    let leaves_ok = if same_node {
        letter.leaves > 1
    } else {
        letter.leaves > 0
    };
    leaves_ok
        && letter.len_min as i32 <= whites_max
        && letter.len_max as i32 >= whites_min
}

// A letter may land on an undecided or reserved-white cell; a boundary on
// an undecided cell or one its twin already painted black.
fn admits(cell_symbol: u8, symbol: u8) -> bool {
    if symbol == END {
        cell_symbol == UNKNOWN || cell_symbol == BLACK
    } else {
        cell_symbol == UNKNOWN || cell_symbol == RESERVED_WHITE
    }
}
