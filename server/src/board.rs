//! Board generation: random word placement and letter fill
//!
//! Each word from the input list gets a bounded number of randomized
//! placement attempts (random direction, random anchor cell). A placement is
//! feasible when the whole run is in-bounds and every cell along it is still
//! unwritten or already holds the needed letter, so crossing words may share
//! letters. Words that exhaust the attempt bound are dropped silently; the
//! returned placement list may be shorter than the input. Remaining cells
//! are padded with uniform random letters.
//!
//! All entry points take the random source as a parameter so tests can seed
//! a deterministic generator while production uses `thread_rng()`.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use shared::{Board, Direction, WordPlacement, ALPHABET, MAX_PLACEMENT_ATTEMPTS};

/// Sample dictionary backing `generate_word_list`. A fixed list is enough
/// for game sessions; a real dictionary would slot in here.
const SAMPLE_WORDS: &[&str] = &[
    "JAVASCRIPT",
    "PYTHON",
    "REACT",
    "NODE",
    "EXPRESS",
    "MONGODB",
    "MYSQL",
    "HTML",
    "CSS",
    "TYPESCRIPT",
    "ANGULAR",
    "VUE",
    "SVELTE",
    "NEXT",
    "WEBPACK",
    "VITE",
    "ESLINT",
    "PRETTIER",
    "JEST",
    "CYPRESS",
    "DOCKER",
    "KUBERNETES",
    "AWS",
    "AZURE",
    "GCP",
    "NGINX",
    "REDIS",
    "POSTGRESQL",
    "FIREBASE",
    "GRAPHQL",
    "REST",
    "API",
    "JWT",
    "OAUTH",
    "GIT",
    "GITHUB",
    "GITLAB",
    "BITBUCKET",
    "CI",
    "CD",
    "DEVOPS",
    "ALGORITHM",
    "DATABASE",
    "FRONTEND",
    "BACKEND",
    "FULLSTACK",
    "RESPONSIVE",
    "MOBILE",
    "DESKTOP",
    "WEB",
    "APP",
    "FRAMEWORK",
    "LIBRARY",
    "PACKAGE",
    "MODULE",
    "COMPONENT",
    "FUNCTION",
    "CLASS",
    "OBJECT",
    "ARRAY",
    "STRING",
    "NUMBER",
    "BOOLEAN",
    "VARIABLE",
];

/// Builds a `width`×`height` board with the given words hidden in it.
///
/// Words are attempted in input order and normalized to uppercase before
/// placement. Returns the finished board together with one placement record
/// per word that actually fit.
pub fn generate<R: Rng>(
    width: usize,
    height: usize,
    words: &[String],
    rng: &mut R,
) -> (Board, Vec<WordPlacement>) {
    let mut cells: Vec<Vec<Option<char>>> = vec![vec![None; width]; height];
    let mut placements = Vec::new();

    for word in words {
        let word = word.to_uppercase();
        if let Some(placement) = place_word(&mut cells, &word, width, height, rng) {
            placements.push(placement);
        } else {
            debug!(
                "Dropped word {:?} after {} placement attempts",
                word, MAX_PLACEMENT_ATTEMPTS
            );
        }
    }

    let mut grid: Vec<Vec<char>> = Vec::with_capacity(height);
    for row in cells {
        let mut filled = Vec::with_capacity(width);
        for cell in row {
            filled.push(match cell {
                Some(letter) => letter,
                None => random_letter(rng),
            });
        }
        grid.push(filled);
    }

    (
        Board {
            width,
            height,
            cells: grid,
        },
        placements,
    )
}

/// Samples `count` words (or the whole dictionary, if smaller) without
/// replacement, in random order.
pub fn generate_word_list<R: Rng>(count: usize, rng: &mut R) -> Vec<String> {
    let mut words: Vec<&str> = SAMPLE_WORDS.to_vec();
    words.shuffle(rng);
    words.truncate(count.min(SAMPLE_WORDS.len()));
    words.into_iter().map(str::to_string).collect()
}

fn place_word<R: Rng>(
    cells: &mut [Vec<Option<char>>],
    word: &str,
    width: usize,
    height: usize,
    rng: &mut R,
) -> Option<WordPlacement> {
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
        let start_x = rng.gen_range(0..width) as i32;
        let start_y = rng.gen_range(0..height) as i32;

        if can_place(cells, word, start_x, start_y, direction, width, height) {
            write_word(cells, word, start_x, start_y, direction);
            return Some(WordPlacement {
                word: word.to_string(),
                start_x,
                start_y,
                direction,
            });
        }
    }

    None
}

fn can_place(
    cells: &[Vec<Option<char>>],
    word: &str,
    start_x: i32,
    start_y: i32,
    direction: Direction,
    width: usize,
    height: usize,
) -> bool {
    let (dx, dy) = direction.unit();
    let len = word.len() as i32;
    let end_x = start_x + (len - 1) * dx;
    let end_y = start_y + (len - 1) * dy;

    if end_x < 0 || end_x >= width as i32 || end_y < 0 || end_y >= height as i32 {
        return false;
    }

    for (i, letter) in word.chars().enumerate() {
        let x = (start_x + i as i32 * dx) as usize;
        let y = (start_y + i as i32 * dy) as usize;
        match cells[y][x] {
            None => {}
            // Crossing words may share a cell when the letters agree
            Some(existing) if existing == letter => {}
            Some(_) => return false,
        }
    }

    true
}

fn write_word(
    cells: &mut [Vec<Option<char>>],
    word: &str,
    start_x: i32,
    start_y: i32,
    direction: Direction,
) {
    let (dx, dy) = direction.unit();
    for (i, letter) in word.chars().enumerate() {
        let x = (start_x + i as i32 * dx) as usize;
        let y = (start_y + i as i32 * dy) as usize;
        cells[y][x] = Some(letter);
    }
}

fn random_letter<R: Rng>(rng: &mut R) -> char {
    let letters = ALPHABET.as_bytes();
    letters[rng.gen_range(0..letters.len())] as char
}
