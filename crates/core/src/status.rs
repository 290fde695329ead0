//! Job status set and vendor-string classification.
//!
//! Remote services report free-form status strings. They are mapped into
//! the closed [`JobStatus`] set through a fixed lookup table so that the
//! watcher never compares vendor literals itself. Unrecognised strings are
//! kept verbatim in [`JobStatus::Unknown`] and still get a usable label.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Label shown while the job waits for a render slot.
pub const LABEL_QUEUED: &str = "🕐 **Queued** - Waiting in line...";

/// Label shown while the job is being rendered.
pub const LABEL_RENDERING: &str = "🎬 **Rendering** - Creating your video...";

/// Label shown once the output is ready.
pub const LABEL_COMPLETE: &str = "✅ **Complete** - Video ready!";

/// Label shown when the service reports a failure.
pub const LABEL_ERROR: &str = "❌ **Error** - Generation failed";

/// Vendor status strings with a known meaning.
///
/// `draft` is what a project reports before it enters the render queue and
/// `canceled` is terminal on the vendor side, so it is reported as an error.
const STATUS_TABLE: &[(&str, KnownStatus)] = &[
    ("draft", KnownStatus::Queued),
    ("queued", KnownStatus::Queued),
    ("rendering", KnownStatus::Rendering),
    ("complete", KnownStatus::Complete),
    ("error", KnownStatus::Error),
    ("canceled", KnownStatus::Error),
];

#[derive(Debug, Clone, Copy)]
enum KnownStatus {
    Queued,
    Rendering,
    Complete,
    Error,
}

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Observed state of a remote job.
///
/// Equality is by value; two `Unknown` statuses are equal only when their
/// raw strings are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Rendering,
    Complete,
    Error,
    /// A status string not present in the lookup table, kept verbatim.
    Unknown(String),
}

impl JobStatus {
    /// Map a raw vendor status string into the fixed status set.
    pub fn from_raw(raw: &str) -> Self {
        match STATUS_TABLE.iter().find(|(name, _)| *name == raw) {
            Some((_, KnownStatus::Queued)) => JobStatus::Queued,
            Some((_, KnownStatus::Rendering)) => JobStatus::Rendering,
            Some((_, KnownStatus::Complete)) => JobStatus::Complete,
            Some((_, KnownStatus::Error)) => JobStatus::Error,
            None => JobStatus::Unknown(raw.to_string()),
        }
    }

    /// Canonical name, or the raw string for unknown statuses.
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Rendering => "rendering",
            JobStatus::Complete => "complete",
            JobStatus::Error => "error",
            JobStatus::Unknown(raw) => raw,
        }
    }

    /// `complete` and `error` end polling; everything else keeps it going.
    pub fn is_terminal(&self) -> bool {
        self.terminal_kind().is_some()
    }

    pub fn terminal_kind(&self) -> Option<TerminalKind> {
        match self {
            JobStatus::Complete => Some(TerminalKind::Success),
            JobStatus::Error => Some(TerminalKind::Failure),
            _ => None,
        }
    }

    /// User-facing label for progress displays.
    pub fn label(&self) -> Cow<'static, str> {
        match self {
            JobStatus::Queued => Cow::Borrowed(LABEL_QUEUED),
            JobStatus::Rendering => Cow::Borrowed(LABEL_RENDERING),
            JobStatus::Complete => Cow::Borrowed(LABEL_COMPLETE),
            JobStatus::Error => Cow::Borrowed(LABEL_ERROR),
            JobStatus::Unknown(raw) => Cow::Owned(format!("⏳ {raw}")),
        }
    }

    pub fn color(&self) -> ColorState {
        match self.terminal_kind() {
            Some(TerminalKind::Success) => ColorState::Success,
            Some(TerminalKind::Failure) => ColorState::Failure,
            None => ColorState::InProgress,
        }
    }

    pub fn classification(&self) -> Classification {
        Classification {
            label: self.label().into_owned(),
            is_terminal: self.is_terminal(),
            terminal_kind: self.terminal_kind(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// How a terminal status ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalKind {
    Success,
    Failure,
}

/// Display colour family for a progress or result message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorState {
    InProgress,
    Success,
    Failure,
}

impl ColorState {
    /// 24-bit RGB value used for chat embeds.
    pub fn rgb(self) -> u32 {
        match self {
            ColorState::InProgress => 0xffa500,
            ColorState::Success => 0x00ff00,
            ColorState::Failure => 0xff0000,
        }
    }
}

/// Result of [`classify`]: everything a caller needs to render a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub label: String,
    pub is_terminal: bool,
    pub terminal_kind: Option<TerminalKind>,
}

/// Classify a raw vendor status string. Never fails.
pub fn classify(raw: &str) -> Classification {
    JobStatus::from_raw(raw).classification()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
