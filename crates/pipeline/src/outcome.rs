use crate::error::Error;
use derive_more::Display;
use std::path::PathBuf;
use std::time::Duration;
use time::UtcDateTime;

/// Something a stage actually did to the filesystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// An extensionless file was given the extension its content implies.
    Renamed { from: PathBuf, to: PathBuf },
    /// A source file was removed because its PDF counterpart exists.
    Deleted(PathBuf),
    /// A PDF was produced next to its source.
    Converted { input: PathBuf, output: PathBuf },
}

/// Why a file was left alone. None of these are problems.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum Skip {
    #[display("file no longer exists")]
    Vanished,
    #[display("file already has an extension")]
    HasExtension,
    #[display("content identified as excluded type `{_0}`")]
    Excluded(&'static str),
    #[display("content not recognised")]
    Unrecognised,
    #[display("rename target {} already exists", _0.display())]
    TargetExists(PathBuf),
    #[display("output {} already exists", _0.display())]
    OutputExists(PathBuf),
    #[display("output {} is already being produced from a sibling", _0.display())]
    SiblingQueued(PathBuf),
    #[display("PDF counterpart {} no longer exists", _0.display())]
    NoCounterpart(PathBuf),
}

/// Per-file result of any stage. Mirrors `Result`, with a third arm for
/// "nothing to do".
#[derive(Debug)]
pub enum Outcome {
    Success(Action),
    Skipped(PathBuf, Skip),
    Failed(PathBuf, Error),
}

impl Outcome {
    pub fn action(&self) -> Option<&Action> {
        match self {
            Self::Success(action) => Some(action),
            _ => None,
        }
    }
}

/// The stages of a run, in execution order.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Stage {
    #[display("rename")]
    Rename,
    #[display("pre-cleanup")]
    PreCleanup,
    #[display("convert")]
    Convert,
    #[display("post-cleanup")]
    PostCleanup,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Tally {
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}

impl<'a> FromIterator<&'a Outcome> for Tally {
    fn from_iter<I: IntoIterator<Item = &'a Outcome>>(iter: I) -> Self {
        iter.into_iter().fold(Tally::default(), |mut tally, outcome| {
            match outcome {
                Outcome::Success(_) => tally.succeeded += 1,
                Outcome::Skipped(..) => tally.skipped += 1,
                Outcome::Failed(..) => tally.failed += 1,
            }
            tally
        })
    }
}

#[derive(Debug)]
pub struct StageReport {
    pub stage: Stage,
    pub elapsed: Duration,
    pub tally: Tally,
    pub outcomes: Vec<Outcome>,
}

impl StageReport {
    pub(crate) fn new(stage: Stage, elapsed: Duration, outcomes: Vec<Outcome>) -> Self {
        let tally = outcomes.iter().collect();
        Self { stage, elapsed, tally, outcomes }
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.outcomes.iter().filter_map(Outcome::action)
    }
}

/// Everything a completed run did.
#[derive(Debug)]
pub struct RunSummary {
    pub started: UtcDateTime,
    pub elapsed: Duration,
    /// Size of the Directory Set: roots plus every subdirectory found.
    pub directories: usize,
    /// Files discovered before any stage ran.
    pub files: usize,
    /// Time spent walking directories and listing files.
    pub discovery: Duration,
    pub stages: Vec<StageReport>,
}

impl RunSummary {
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|report| report.stage == stage)
    }

    pub fn tally(&self) -> Tally {
        self.stages.iter().fold(Tally::default(), |acc, report| Tally {
            succeeded: acc.succeeded + report.tally.succeeded,
            skipped: acc.skipped + report.tally.skipped,
            failed: acc.failed + report.tally.failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_tally() {
        let outcomes = vec![
            Outcome::Success(Action::Deleted(PathBuf::from("a.ps"))),
            Outcome::Skipped(PathBuf::from("b.pdf"), Skip::HasExtension),
            Outcome::Skipped(PathBuf::from("c"), Skip::Unrecognised),
            Outcome::Failed(PathBuf::from("d.ps"), exn::Exn::from(ErrorKind::Convert(PathBuf::from("d.ps")))),
        ];
        let report = StageReport::new(Stage::Convert, Duration::ZERO, outcomes);
        assert_eq!(report.tally, Tally { succeeded: 1, skipped: 2, failed: 1 });
        assert_eq!(report.tally.total(), 4);
        assert_eq!(report.actions().collect::<Vec<_>>(), [&Action::Deleted(PathBuf::from("a.ps"))]);
    }

    #[test]
    fn test_skip_display() {
        assert_eq!(Skip::Excluded("ogg").to_string(), "content identified as excluded type `ogg`");
        assert_eq!(Skip::OutputExists(PathBuf::from("job.pdf")).to_string(), "output job.pdf already exists");
    }
}
