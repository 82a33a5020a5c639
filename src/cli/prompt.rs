use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;

use crate::application::{ReceiveRequest, ShipRequest};

/// Answer that cancels an interactive ship or receive.
pub const ABORT: &str = "abort";

/// Source of answers for interactive questions.
pub trait Prompter {
    /// Show `question` and return the answer without its line ending.
    fn ask(&mut self, question: &str) -> Result<String>;
}

/// Prompter over any line-based reader and writer; stdin/stdout in the binary.
#[derive(Debug)]
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl LinePrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read answer")?;
        if read == 0 {
            bail!("Input closed while waiting for an answer to '{}'", question.trim());
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

/// Result of an interactive question sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asked<T> {
    Proceed(T),
    /// The user typed `abort`; carries whatever was given as the station.
    Aborted { station: String },
}

/// Ask whether to write the ledgers. Only an exact `y` confirms.
pub fn confirm_save(prompter: &mut dyn Prompter) -> Result<bool> {
    Ok(prompter.ask("Save? (y/n) ")? == "y")
}

/// Ask for every field of a shipment. An empty date means `today`.
pub fn ask_ship(prompter: &mut dyn Prompter, today: NaiveDate) -> Result<Asked<ShipRequest>> {
    let station = prompter.ask("station tag: ")?;
    let low = prompter.ask("low flask number: ")?;
    let high = prompter.ask("high flask number: ")?;
    let date = prompter.ask("Date Shipped (YYYY-MM-DD): ")?;
    let notes = prompter.ask("notes: ")?;

    if [&station, &low, &high, &date, &notes]
        .iter()
        .any(|answer| answer.as_str() == ABORT)
    {
        return Ok(Asked::Aborted { station });
    }

    let ship_date = if date.trim().is_empty() {
        today
    } else {
        super::parse_date(date.trim())?
    };

    let mut request = ShipRequest::new(station.trim(), low.trim(), ship_date);
    if let Some(high) = non_empty(&high) {
        request = request.with_high_id(high);
    }
    if let Some(notes) = non_empty(&notes) {
        request = request.with_notes(notes);
    }
    Ok(Asked::Proceed(request))
}

/// Ask for the fields of a returned flask pair.
pub fn ask_receive(prompter: &mut dyn Prompter) -> Result<Asked<ReceiveRequest>> {
    let station = prompter.ask("station tag: ")?;
    let low = prompter.ask("low flask number: ")?;
    let notes = prompter.ask("notes: ")?;

    if [&station, &low, &notes]
        .iter()
        .any(|answer| answer.as_str() == ABORT)
    {
        return Ok(Asked::Aborted { station });
    }

    let mut request = ReceiveRequest::new(station.trim(), low.trim());
    if let Some(notes) = non_empty(&notes) {
        request = request.with_notes(notes);
    }
    Ok(Asked::Proceed(request))
}

fn non_empty(answer: &str) -> Option<&str> {
    let answer = answer.trim();
    if answer.is_empty() { None } else { Some(answer) }
}
