//! Line-based question and answer I/O.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use versequiz_core::grader::Answer;
use versequiz_core::history::Outcome;
use versequiz_core::model::QuestionType;
use versequiz_core::question::Question;
use versequiz_core::session::Feedback;

pub const SKIP: &str = ":s";
pub const QUIT: &str = ":q";

/// What the learner typed for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Answer(Answer),
    Skip,
    Quit,
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, line: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", line.as_ref()).context("failed to write to terminal")
    }

    /// Read one line without its terminator. `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        self.output.flush().context("failed to flush terminal")?;
        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .context("failed to read answer")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Show `question` and read an answer, asking again on unusable input.
    /// `progress` is the 1-based position and total for exams.
    pub fn ask(&mut self, question: &Question, progress: Option<(usize, usize)>) -> Result<Input> {
        self.say("")?;
        match progress {
            Some((n, total)) => self.say(format!("[{n}/{total}] {}", question.prompt))?,
            None => self.say(&question.prompt)?,
        }
        if let Some(passage) = question.passage() {
            self.say(format!("  {passage}"))?;
        }
        if let Some(options) = question.options() {
            for (i, o) in options.iter().enumerate() {
                self.say(format!("  {}) {o}", i + 1))?;
            }
        }

        loop {
            write!(self.output, "> ").context("failed to write to terminal")?;
            let Some(line) = self.read_line()? else {
                return Ok(Input::Quit);
            };
            let trimmed = line.trim();
            if trimmed == QUIT {
                return Ok(Input::Quit);
            }
            if trimmed == SKIP {
                return Ok(Input::Skip);
            }
            match parse_answer(question, trimmed) {
                Some(answer) => return Ok(Input::Answer(answer)),
                None => self.say(hint(question.qtype()))?,
            }
        }
    }

    pub fn show_feedback(&mut self, feedback: &Feedback) -> Result<()> {
        match feedback.outcome {
            Outcome::Correct => self.say("Correct!"),
            Outcome::Wrong => self.say(format!("Wrong. Answer: {}", feedback.expected)),
            Outcome::Skipped => self.say(format!("Skipped. Answer: {}", feedback.expected)),
        }
    }
}

fn hint(qtype: QuestionType) -> &'static str {
    match qtype {
        QuestionType::IdentifyRef => "Enter a reference like `John 3:16`, :s to skip, :q to quit.",
        QuestionType::MultipleChoice | QuestionType::MultipleChoiceText => {
            "Enter an option number, :s to skip, :q to quit."
        }
        QuestionType::Cloze | QuestionType::ContinueVerse => {
            "Type the verse text, :s to skip, :q to quit."
        }
    }
}

/// Turn a typed line into an answer of the shape `question` expects.
pub fn parse_answer(question: &Question, line: &str) -> Option<Answer> {
    if line.is_empty() {
        return None;
    }
    match question.qtype() {
        QuestionType::IdentifyRef => parse_reference(line),
        QuestionType::Cloze | QuestionType::ContinueVerse => Some(Answer::Text(line.to_string())),
        QuestionType::MultipleChoice | QuestionType::MultipleChoiceText => {
            let count = question.options().map_or(0, <[String]>::len);
            parse_choice(line, count).map(Answer::Choice)
        }
    }
}

/// Parse `Book 3:16`, `Book 3,16`, or `Book 3 16`. Book names may contain
/// spaces and digits (`1 John 4:8`).
pub fn parse_reference(line: &str) -> Option<Answer> {
    let spaced = line.replace([':', ','], " ");
    let mut parts: Vec<&str> = spaced.split_whitespace().collect();
    let mut numbers = Vec::with_capacity(2);
    while numbers.len() < 2 && parts.len() > 1 {
        match parts.last().and_then(|p| p.parse::<u32>().ok()) {
            Some(n) => {
                numbers.push(n);
                parts.pop();
            }
            None => break,
        }
    }
    numbers.reverse();

    let book = parts.join(" ");
    if !book.chars().any(char::is_alphabetic) {
        return None;
    }
    Some(Answer::Reference {
        book,
        chapter: numbers.first().copied(),
        verse: numbers.get(1).copied(),
    })
}

/// 1-based option number to a 0-based index.
pub fn parse_choice(line: &str, count: usize) -> Option<usize> {
    let n: usize = line.trim().parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}
