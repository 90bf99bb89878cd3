//! Multi-step prompts.
//!
//! A [`Getter`] asks its questions in order and validates each answer. An
//! empty answer or `b` cancels the whole form; `q` cancels it and asks the
//! session to quit. Invalid answers show the prompt's help and ask again.

use crate::error::Result;
use crate::io::Interaction;
use crate::names;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Integer(i64),
    /// Zero-based indices into the offered names.
    Selection(Vec<usize>),
    /// Zero-based index of a single choice.
    Choice(usize),
    YesNo(bool),
}

impl Answer {
    pub fn text(&self) -> Option<&str> {
        match self {
            Answer::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self) -> Option<i64> {
        match self {
            Answer::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn selection(&self) -> Option<&[usize]> {
        match self {
            Answer::Selection(s) => Some(s),
            _ => None,
        }
    }

    pub fn choice(&self) -> Option<usize> {
        match self {
            Answer::Choice(i) => Some(*i),
            _ => None,
        }
    }

    pub fn yes(&self) -> bool {
        matches!(self, Answer::YesNo(true))
    }
}

#[derive(Debug, Clone)]
enum Expect {
    Text,
    Integer { min: i64, max: i64 },
    Selection(Vec<String>),
    Choice(Vec<String>),
    /// The answer must be exactly this word; anything else cancels.
    Exact(String),
}

#[derive(Debug, Clone)]
struct Question {
    message: String,
    expect: Expect,
    help: String,
}

#[derive(Debug, Clone, Default)]
pub struct Getter {
    questions: Vec<Question>,
}

impl Getter {
    pub fn new() -> Self {
        Self::default()
    }

    fn ask(mut self, message: &str, expect: Expect, help: String) -> Self {
        self.questions.push(Question {
            message: message.to_string(),
            expect,
            help,
        });
        self
    }

    pub fn text(self, message: &str) -> Self {
        self.ask(message, Expect::Text, "value must be a string.".into())
    }

    pub fn integer(self, message: &str, min: i64, max: i64) -> Self {
        let help = format!("value must be an integer between {} and {}.", min, max);
        self.ask(message, Expect::Integer { min, max }, help)
    }

    /// One or more of `names` by number, range (`1-3,5`), `all`, or name prefix.
    pub fn selection(self, message: &str, names: Vec<String>) -> Self {
        let help = format!(
            "value must be numbers or ranges between 1 and {}, or names.",
            names.len()
        );
        self.ask(message, Expect::Selection(names), help)
    }

    /// Exactly one of `names` by number or name prefix.
    pub fn choice(self, message: &str, names: Vec<String>) -> Self {
        let help = format!("value must be a number between 1 and {}, or a name.", names.len());
        self.ask(message, Expect::Choice(names), help)
    }

    pub fn exact(self, message: &str, word: &str) -> Self {
        let help = format!("type {:?} to proceed.", word);
        self.ask(message, Expect::Exact(word.to_string()), help)
    }

    /// Ask every question. `None` when the user cancelled.
    pub fn run<I>(&self, io: &mut I) -> Result<Option<Vec<Answer>>>
    where
        I: Interaction + ?Sized,
    {
        let mut answers = Vec::with_capacity(self.questions.len());
        for question in &self.questions {
            loop {
                let Some(raw) = io.prompt(&question.message)? else {
                    return Ok(None);
                };
                let raw = names::untilde(raw.trim());
                match raw.as_str() {
                    "" | "b" => return Ok(None),
                    "q" => {
                        io.request_quit();
                        return Ok(None);
                    }
                    _ => {}
                }
                if let Expect::Exact(word) = &question.expect {
                    if raw == *word {
                        answers.push(Answer::YesNo(true));
                        break;
                    }
                    return Ok(None);
                }
                match validate(&question.expect, &raw) {
                    Some(answer) => {
                        answers.push(answer);
                        break;
                    }
                    None => io.display(&[question.help.clone()])?,
                }
            }
        }
        Ok(Some(answers))
    }

    /// Convenience for single-question getters.
    pub fn run_one<I>(&self, io: &mut I) -> Result<Option<Answer>>
    where
        I: Interaction + ?Sized,
    {
        Ok(self.run(io)?.and_then(|answers| answers.into_iter().next()))
    }
}

fn validate(expect: &Expect, raw: &str) -> Option<Answer> {
    match expect {
        Expect::Text => Some(Answer::Text(raw.to_string())),
        Expect::Integer { min, max } => raw
            .parse::<i64>()
            .ok()
            .filter(|n| (*min..=*max).contains(n))
            .map(Answer::Integer),
        Expect::Selection(names) => parse_selection(raw, names).map(Answer::Selection),
        Expect::Choice(names) => match parse_selection(raw, names)?.as_slice() {
            [one] => Some(Answer::Choice(*one)),
            _ => None,
        },
        Expect::Exact(word) => (raw == word).then_some(Answer::YesNo(true)),
    }
}

/// Parse `1-3,5`, `all`, or comma-separated name prefixes into zero-based
/// indices, keeping first-mention order and dropping repeats.
///
/// ```
/// use scoreide::getter::parse_selection;
///
/// let names: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
/// assert_eq!(parse_selection("1-2,4", &names), Some(vec![0, 1, 3]));
/// assert_eq!(parse_selection("3-1", &names), Some(vec![2, 1, 0]));
/// assert_eq!(parse_selection("5", &names), None);
/// ```
pub fn parse_selection(raw: &str, names: &[String]) -> Option<Vec<usize>> {
    let count = names.len();
    if count == 0 {
        return None;
    }
    if raw.trim() == "all" {
        return Some((0..count).collect());
    }
    let mut out: Vec<usize> = Vec::new();
    let push = |i: usize, out: &mut Vec<usize>| {
        if !out.contains(&i) {
            out.push(i);
        }
    };
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((start, stop)) = part.split_once('-')
            && let (Ok(start), Ok(stop)) = (start.trim().parse::<usize>(), stop.trim().parse::<usize>())
        {
            if start == 0 || stop == 0 || start > count || stop > count {
                return None;
            }
            if start <= stop {
                (start..=stop).for_each(|n| push(n - 1, &mut out));
            } else {
                (stop..=start).rev().for_each(|n| push(n - 1, &mut out));
            }
        } else if let Ok(n) = part.parse::<usize>() {
            if n == 0 || n > count {
                return None;
            }
            push(n - 1, &mut out);
        } else {
            let wanted = part.to_lowercase();
            let index = names
                .iter()
                .position(|name| name.to_lowercase() == wanted)
                .or_else(|| {
                    names
                        .iter()
                        .position(|name| name.to_lowercase().starts_with(&wanted))
                })?;
            push(index, &mut out);
        }
    }
    if out.is_empty() { None } else { Some(out) }
}

/// Show `items` numbered and ask for one of them.
pub fn select<I>(io: &mut I, message: &str, items: &[String]) -> Result<Option<usize>>
where
    I: Interaction + ?Sized,
{
    if items.is_empty() {
        return Ok(None);
    }
    let lines: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{:>4}: {}", i + 1, item))
        .collect();
    io.display(&lines)?;
    Ok(Getter::new()
        .choice(message, items.to_vec())
        .run_one(io)?
        .and_then(|a| a.choice()))
}
