//! Maps a difficulty rating to answer credit.

use crate::models::Difficulty;

/// Credit earned by one graded answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// 1 for a correct answer, 0 otherwise.
    pub credit: u32,
    pub is_correct: bool,
}

impl Outcome {
    /// Amount added to an incorrect-answer counter.
    pub fn penalty(&self) -> u32 {
        1 - self.credit
    }
}

/// Easy and good answers earn full credit; hard counts the same as a miss.
pub fn grade(rating: Difficulty) -> Outcome {
    match rating {
        Difficulty::Easy | Difficulty::Good => Outcome {
            credit: 1,
            is_correct: true,
        },
        Difficulty::Hard => Outcome {
            credit: 0,
            is_correct: false,
        },
    }
}
