//! Confirmation policy
//!
//! Whether a candidate is applied is decided by a small state machine:
//! `Confirming` asks about every candidate, `Auto` applies without asking.
//! A reviewer can move `Confirming -> Auto` with the distinguished response
//! (`gg`); there is no way back.
//!
//! Risky kinds (bare paths, shortcode list items) get one extra gate in
//! `Auto`: before the first one is applied in a document, the channel is
//! shown a concrete example and must approve the whole batch. A refusal
//! drops every risky candidate of that document and nothing else.
//!
//! All human interaction goes through [`ConfirmationChannel`], so the state
//! machine runs the same against a terminal or a [`ScriptedChannel`].

use crate::document::Candidate;
use crate::errors::RelinkError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Policy state of a processing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyState {
    #[default]
    Confirming,
    Auto,
}

impl PolicyState {
    /// State after a reviewer's decision. Only a switch request changes it.
    pub fn after(self, decision: Decision) -> Self {
        match decision {
            Decision::ApplyAndSwitchToAuto => PolicyState::Auto,
            Decision::Apply | Decision::Skip => self,
        }
    }
}

/// A reviewer's answer about one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Apply,
    Skip,
    ApplyAndSwitchToAuto,
}

impl Decision {
    /// Parse a typed response: `y`/`yes` apply, `gg`/`a`/`all` apply and
    /// switch to auto, anything else (including an empty line) skips.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => Decision::Apply,
            "gg" | "a" | "all" => Decision::ApplyAndSwitchToAuto,
            _ => Decision::Skip,
        }
    }

    pub fn applies(self) -> bool {
        !matches!(self, Decision::Skip)
    }
}

/// Parse a yes/no answer, falling back to `default` on anything else.
pub fn parse_yes_no(input: &str, default: bool) -> bool {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}

/// Outcome of the one-time risky-kind gate for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskyApproval {
    Ask,
    Accepted,
    Declined,
}

/// Request/response boundary to whoever confirms changes.
pub trait ConfirmationChannel {
    /// Review one candidate while confirming each change.
    fn review(&mut self, document: &Path, candidate: &Candidate) -> Result<Decision, RelinkError>;

    /// Approve applying risky-kind candidates of `document` automatically,
    /// given one concrete example.
    fn confirm_risky_batch(
        &mut self,
        document: &Path,
        example: &Candidate,
    ) -> Result<bool, RelinkError>;

    /// Overwrite an existing converted image.
    fn confirm_overwrite(&mut self, target: &Path) -> Result<Decision, RelinkError>;

    /// Generic yes/no question; declining is the safe default.
    fn confirm(&mut self, question: &str) -> Result<bool, RelinkError>;
}

/// Per-document decision state.
///
/// Constructed from the batch's current [`PolicyState`]; after the document
/// is done, [`ConfirmationPolicy::state`] is the state to carry forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    state: PolicyState,
    risky: RiskyApproval,
}

impl ConfirmationPolicy {
    pub fn new(state: PolicyState) -> Self {
        Self {
            state,
            risky: RiskyApproval::Ask,
        }
    }

    /// Pre-answer the risky-kind gate (for non-interactive runs).
    pub fn with_risky_approval(mut self, approval: RiskyApproval) -> Self {
        self.risky = approval;
        self
    }

    pub fn state(&self) -> PolicyState {
        self.state
    }

    pub fn risky_approval(&self) -> RiskyApproval {
        self.risky
    }

    /// Decide whether `candidate` is applied, asking `channel` as needed.
    pub fn decide(
        &mut self,
        document: &Path,
        candidate: &Candidate,
        channel: &mut dyn ConfirmationChannel,
    ) -> Result<bool, RelinkError> {
        match self.state {
            PolicyState::Confirming => {
                let decision = channel.review(document, candidate)?;
                self.state = self.state.after(decision);
                Ok(decision.applies())
            }
            PolicyState::Auto if !candidate.kind.is_risky() => Ok(true),
            PolicyState::Auto => {
                if self.risky == RiskyApproval::Ask {
                    self.risky = if channel.confirm_risky_batch(document, candidate)? {
                        RiskyApproval::Accepted
                    } else {
                        RiskyApproval::Declined
                    };
                }
                Ok(self.risky == RiskyApproval::Accepted)
            }
        }
    }
}

/// A question asked through a [`ScriptedChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Review { document: PathBuf, label: String },
    RiskyBatch { document: PathBuf, label: String },
    Overwrite(PathBuf),
    Question(String),
}

/// Channel answering from a fixed list of typed responses.
///
/// Responses are consumed in order and parsed exactly like terminal input;
/// once the script runs out every question gets an empty answer, which
/// declines. Every question asked is recorded.
///
/// ```
/// use relink::policy::{ConfirmationChannel, ScriptedChannel};
///
/// let mut channel = ScriptedChannel::new(["y"]);
/// assert!(channel.confirm("Continue?").unwrap());
/// assert!(!channel.confirm("Again?").unwrap());
/// assert_eq!(channel.prompts().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    responses: VecDeque<String>,
    prompts: Vec<Prompt>,
}

impl ScriptedChannel {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn remaining(&self) -> usize {
        self.responses.len()
    }

    fn next_response(&mut self) -> String {
        self.responses.pop_front().unwrap_or_default()
    }
}

impl ConfirmationChannel for ScriptedChannel {
    fn review(&mut self, document: &Path, candidate: &Candidate) -> Result<Decision, RelinkError> {
        self.prompts.push(Prompt::Review {
            document: document.to_path_buf(),
            label: candidate.label(),
        });
        Ok(Decision::parse(&self.next_response()))
    }

    fn confirm_risky_batch(
        &mut self,
        document: &Path,
        example: &Candidate,
    ) -> Result<bool, RelinkError> {
        self.prompts.push(Prompt::RiskyBatch {
            document: document.to_path_buf(),
            label: example.label(),
        });
        Ok(parse_yes_no(&self.next_response(), false))
    }

    fn confirm_overwrite(&mut self, target: &Path) -> Result<Decision, RelinkError> {
        self.prompts.push(Prompt::Overwrite(target.to_path_buf()));
        Ok(Decision::parse(&self.next_response()))
    }

    fn confirm(&mut self, question: &str) -> Result<bool, RelinkError> {
        self.prompts.push(Prompt::Question(question.to_string()));
        Ok(parse_yes_no(&self.next_response(), false))
    }
}
