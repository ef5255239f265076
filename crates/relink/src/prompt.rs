//! Terminal confirmation channel
//!
//! Line-oriented implementation of [`ConfirmationChannel`] over any
//! `BufRead`/`Write` pair. End of input counts as an empty answer, which
//! always declines.

use crate::document::Candidate;
use crate::errors::RelinkError;
use crate::policy::{parse_yes_no, ConfirmationChannel, Decision};
use std::io::{self, BufRead, Write};
use std::path::Path;

pub struct TerminalChannel<R, W> {
    input: R,
    output: W,
}

impl TerminalChannel<io::StdinLock<'static>, io::Stderr> {
    /// Channel on the process's stdin, prompting on stderr so stdout stays
    /// clean for reports.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalChannel<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line)
    }

    fn show_candidate(&mut self, candidate: &Candidate) -> io::Result<()> {
        writeln!(self.output, "\n[{}]", candidate.kind.label())?;
        if candidate.kind.is_risky() {
            writeln!(self.output, "  context:  {}", candidate.before_text())?;
            writeln!(self.output, "  becomes:  {}", candidate.after_text())?;
        } else {
            writeln!(self.output, "  original: {}", candidate.matched)?;
            writeln!(self.output, "  becomes:  {}", candidate.replacement)?;
        }
        Ok(())
    }
}

impl<R: BufRead, W: Write> ConfirmationChannel for TerminalChannel<R, W> {
    fn review(&mut self, document: &Path, candidate: &Candidate) -> Result<Decision, RelinkError> {
        writeln!(self.output, "\n{}", document.display())?;
        self.show_candidate(candidate)?;
        let answer = self.ask("Replace? (y/n/gg = yes to all, default n): ")?;
        Ok(Decision::parse(&answer))
    }

    fn confirm_risky_batch(
        &mut self,
        document: &Path,
        example: &Candidate,
    ) -> Result<bool, RelinkError> {
        writeln!(
            self.output,
            "\n{} contains bare file names or shortcode list entries.",
            document.display()
        )?;
        writeln!(
            self.output,
            "They are only replaced when the converted file exists, but plain text may still match."
        )?;
        writeln!(self.output, "Example:")?;
        self.show_candidate(example)?;
        let answer = self.ask("Replace these references in this document? (y/n, default n): ")?;
        Ok(parse_yes_no(&answer, false))
    }

    fn confirm_overwrite(&mut self, target: &Path) -> Result<Decision, RelinkError> {
        let answer = self.ask(&format!(
            "\n{} already exists. Overwrite? (y/n/gg = yes to all, default n): ",
            target.display()
        ))?;
        Ok(Decision::parse(&answer))
    }

    fn confirm(&mut self, question: &str) -> Result<bool, RelinkError> {
        let answer = self.ask(&format!("{} (y/n, default n): ", question))?;
        Ok(parse_yes_no(&answer, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Context, ReferenceKind, Region};
    use std::io::Cursor;

    fn candidate(kind: ReferenceKind) -> Candidate {
        Candidate {
            kind,
            region: Region::Body,
            path_span: 6..13,
            original: "555.jpg".to_string(),
            converted: "555.webp".to_string(),
            matched: "555.jpg".to_string(),
            replacement: "555.webp".to_string(),
            context: Context {
                before: "hoto ".to_string(),
                after: " is g".to_string(),
            },
        }
    }

    fn channel(input: &str) -> TerminalChannel<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalChannel::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_review_reads_one_line_per_candidate() {
        let mut channel = channel("y\ngg\n");
        let c = candidate(ReferenceKind::StandardLink);

        assert_eq!(
            channel.review(Path::new("a.md"), &c).unwrap(),
            Decision::Apply
        );
        assert_eq!(
            channel.review(Path::new("a.md"), &c).unwrap(),
            Decision::ApplyAndSwitchToAuto
        );

        let shown = String::from_utf8(channel.into_output()).unwrap();
        assert!(shown.contains("a.md"));
        assert!(shown.contains("original: 555.jpg"));
        assert!(shown.contains("becomes:  555.webp"));
    }

    #[test]
    fn test_eof_declines() {
        let mut channel = channel("");
        let c = candidate(ReferenceKind::StandardLink);
        assert_eq!(channel.review(Path::new("a.md"), &c).unwrap(), Decision::Skip);
        assert!(!channel.confirm("Delete?").unwrap());
    }

    #[test]
    fn test_risky_batch_shows_context() {
        let mut channel = channel("y\n");
        let c = candidate(ReferenceKind::BarePath);
        assert!(channel
            .confirm_risky_batch(Path::new("a.md"), &c)
            .unwrap());

        let shown = String::from_utf8(channel.into_output()).unwrap();
        assert!(shown.contains("...hoto 555.jpg is g..."));
        assert!(shown.contains("...hoto 555.webp is g..."));
    }

    #[test]
    fn test_confirm_overwrite_prompt() {
        let mut channel = channel("n\n");
        assert_eq!(
            channel.confirm_overwrite(Path::new("img/a.webp")).unwrap(),
            Decision::Skip
        );
        let shown = String::from_utf8(channel.into_output()).unwrap();
        assert!(shown.contains("img/a.webp already exists"));
    }
}
