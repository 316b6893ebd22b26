//! Line-oriented console: prompts on a writer, answers from an async reader.

use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::cli::display::render_menu;
use crate::preprocessing::Catalog;

pub struct Console<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", text)?;
        self.writer.flush()
    }

    pub fn prompt(&mut self, text: &str) -> io::Result<()> {
        write!(self.writer, "{}", text)?;
        self.writer.flush()
    }

    /// Next line without its terminator; `None` once input is closed.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    pub async fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompt(prompt)?;
        self.read_line().await
    }

    /// Asks until a non-blank answer arrives.
    pub async fn ask_text(&mut self, prompt: &str) -> io::Result<Option<String>> {
        loop {
            match self.ask(prompt).await? {
                None => return Ok(None),
                Some(answer) if answer.trim().is_empty() => continue,
                Some(answer) => return Ok(Some(answer.trim().to_string())),
            }
        }
    }

    /// Prints a numbered menu for `C` and re-prompts until a valid number is
    /// entered.
    pub async fn choose<C, F>(
        &mut self,
        heading: &str,
        prompt: &str,
        describe: F,
    ) -> io::Result<Option<C>>
    where
        C: Catalog,
        F: Fn(&C) -> String,
    {
        self.say(heading)?;
        self.prompt(&render_menu::<C, _>(describe))?;

        loop {
            let Some(answer) = self.ask(prompt).await? else {
                return Ok(None);
            };
            match C::select_str(&answer) {
                Ok(choice) => return Ok(Some(choice)),
                Err(e) => self.say(&e.to_string())?,
            }
        }
    }
}
