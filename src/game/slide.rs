//! Tile movement and merging rules.
//!
//! Every direction is reduced to sliding four independent lines towards
//! index 0: a `Left` move reads each row left to right, `Right` reads it
//! right to left, `Up` reads each column top to bottom and `Down` bottom to
//! top. Results are written back through the same index mapping.

use crate::game::action::GameAction;

pub const BOARD_SIZE: usize = 4;

pub type Board = [[u32; BOARD_SIZE]; BOARD_SIZE];
pub type Line = [u32; BOARD_SIZE];

/// Board coordinates of the `k`-th cell of line `line` when sliding towards `action`.
#[inline]
fn cell_of(action: GameAction, line: usize, k: usize) -> (usize, usize) {
    match action {
        GameAction::Left => (line, k),
        GameAction::Right => (line, BOARD_SIZE - 1 - k),
        GameAction::Up => (k, line),
        GameAction::Down => (BOARD_SIZE - 1 - k, line),
    }
}

/// Reads line `line` of `board` in the sliding order of `action`.
pub fn read_line(board: &Board, action: GameAction, line: usize) -> Line {
    let mut values = [0; BOARD_SIZE];
    for (k, value) in values.iter_mut().enumerate() {
        let (row, col) = cell_of(action, line, k);
        *value = board[row][col];
    }
    values
}

fn write_line(board: &mut Board, action: GameAction, line: usize, values: &Line) {
    for (k, value) in values.iter().enumerate() {
        let (row, col) = cell_of(action, line, k);
        board[row][col] = *value;
    }
}

/// Slides one line towards index 0, merging each pair of equal tiles at most once.
///
/// Returns the score gained, i.e. the sum of the values of all merged tiles.
pub fn slide_line(line: &mut Line) -> u64 {
    let mut packed = [0u32; BOARD_SIZE];
    let mut len = 0;
    for &value in line.iter().filter(|&&v| v != 0) {
        packed[len] = value;
        len += 1;
    }

    let mut result = [0u32; BOARD_SIZE];
    let mut score = 0u64;
    let mut read = 0;
    let mut write = 0;
    while read < len {
        if read + 1 < len && packed[read] == packed[read + 1] {
            let merged = packed[read] * 2;
            result[write] = merged;
            score += u64::from(merged);
            read += 2;
        } else {
            result[write] = packed[read];
            read += 1;
        }
        write += 1;
    }

    *line = result;
    score
}

/// Slides the whole board in place and returns the merge score.
pub fn slide_board(board: &mut Board, action: GameAction) -> u64 {
    let mut score = 0;
    for line in 0..BOARD_SIZE {
        let mut values = read_line(board, action, line);
        score += slide_line(&mut values);
        write_line(board, action, line, &values);
    }
    score
}

/// A move is legal when at least one tile can step into an empty or equal neighbour.
pub fn can_slide(board: &Board, action: GameAction) -> bool {
    (0..BOARD_SIZE).any(|line| {
        let values = read_line(board, action, line);
        (1..BOARD_SIZE).any(|k| {
            let source = values[k];
            let target = values[k - 1];
            source != 0 && (target == 0 || target == source)
        })
    })
}
