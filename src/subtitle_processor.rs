use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use regex::Regex;
use once_cell::sync::Lazy;
use log::{debug, warn};

use crate::errors::SubtitleError;

// @module: SRT parsing and VTT serialisation

/// Header line every WebVTT document starts with
pub const VTT_HEADER: &str = "WEBVTT";

// @const: Single SRT/VTT timestamp, hours may exceed two digits
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{2}):(\d{2})[,.](\d{3})$").unwrap()
});

// @const: Comma-separated milliseconds inside an SRT time range
static SRT_MILLIS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+:\d{2}:\d{2}),(\d{3})").unwrap()
});

/// Convert an SRT time range to VTT syntax.
///
/// Only the millisecond separator of each timestamp changes:
/// `00:01:02,345 --> 00:01:05,678` becomes `00:01:02.345 --> 00:01:05.678`.
pub fn convert_time_range(range: &str) -> String {
    SRT_MILLIS_REGEX.replace_all(range, "$1.$2").into_owned()
}

/// Parse a single `HH:MM:SS,mmm` (or `HH:MM:SS.mmm`) timestamp
pub fn parse_timestamp(timestamp: &str) -> Result<Duration, SubtitleError> {
    let caps = TIMESTAMP_REGEX
        .captures(timestamp.trim())
        .ok_or_else(|| SubtitleError::InvalidTimestamp(timestamp.to_string()))?;

    let field = |i: usize| -> Result<u64, SubtitleError> {
        caps[i]
            .parse::<u64>()
            .map_err(|_| SubtitleError::InvalidTimestamp(timestamp.to_string()))
    };

    let (hours, minutes, seconds, millis) = (field(1)?, field(2)?, field(3)?, field(4)?);
    if minutes >= 60 || seconds >= 60 {
        return Err(SubtitleError::InvalidTimestamp(timestamp.to_string()));
    }

    // The hour field is unbounded, so a garbage timestamp can overflow
    let total = hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1_000 + millis))
        .ok_or_else(|| SubtitleError::InvalidTimestamp(timestamp.to_string()))?;

    Ok(Duration::from_millis(total))
}

/// Format a duration as an SRT timestamp (HH:MM:SS,mmm)
pub fn format_srt_timestamp(time: Duration) -> String {
    let ms = time.as_millis();
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Parse `start --> end`, ignoring any trailing cue settings
fn parse_time_range(line: &str) -> Result<(Duration, Duration), SubtitleError> {
    let (start, rest) = line
        .split_once("-->")
        .ok_or_else(|| SubtitleError::InvalidTimestamp(line.to_string()))?;
    let end = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| SubtitleError::InvalidTimestamp(line.to_string()))?;

    Ok((parse_timestamp(start)?, parse_timestamp(end)?))
}

// @struct: Single timed caption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    // @field: Index as written in the source, not renumbered
    pub index: usize,

    // @field: Start offset
    pub start_time: Duration,

    // @field: End offset, never before start
    pub end_time: Duration,

    // @field: Time-range line as written in the source, cue settings included
    pub time_range: String,

    // @field: Source text lines
    pub lines: Vec<String>,
}

impl Cue {
    /// Build a cue from millisecond offsets and newline-separated text
    pub fn new(index: usize, start_ms: u64, end_ms: u64, text: &str) -> Self {
        let start_time = Duration::from_millis(start_ms);
        let end_time = Duration::from_millis(end_ms);
        Self {
            index,
            start_time,
            end_time,
            time_range: format!(
                "{} --> {}",
                format_srt_timestamp(start_time),
                format_srt_timestamp(end_time)
            ),
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Source text with lines joined by `\n`
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether there is anything to translate
    pub fn has_text(&self) -> bool {
        self.lines.iter().any(|line| !line.trim().is_empty())
    }

    /// Time range in VTT syntax, the source line with only its separators changed
    pub fn vtt_time_range(&self) -> String {
        convert_time_range(&self.time_range)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{}", self.time_range)?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)
    }
}

/// Ordered cues of one subtitle file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Cues in source order
    pub cues: Vec<Cue>,
}

impl Document {
    /// Parse SRT content.
    ///
    /// Blocks are separated by blank lines. A block needs an index line and a
    /// time-range line; any further lines are the cue text, which may be absent
    /// for timing-only cues. Blocks that do not fit that shape are skipped.
    pub fn parse(content: &str) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut cues = Vec::new();
        let mut seen = HashSet::new();
        let mut block: Vec<&str> = Vec::new();

        for line in content.lines().chain(std::iter::once("")) {
            if !line.trim().is_empty() {
                block.push(line.trim_end());
                continue;
            }
            if block.is_empty() {
                continue;
            }

            if let Some(cue) = Self::parse_block(&block) {
                if seen.insert(cue.index) {
                    cues.push(cue);
                } else {
                    warn!("Skipping cue with duplicate index {}", cue.index);
                }
            }
            block.clear();
        }

        Self { cues }
    }

    fn parse_block(block: &[&str]) -> Option<Cue> {
        if block.len() < 2 {
            debug!("Skipping malformed block: {:?}", block);
            return None;
        }

        let index = match block[0].trim().parse::<usize>() {
            Ok(index) => index,
            Err(_) => {
                debug!("Skipping block with non-numeric index: {}", block[0]);
                return None;
            }
        };

        let (start_time, end_time) = match parse_time_range(block[1]) {
            Ok(range) => range,
            Err(e) => {
                debug!("Skipping cue {}: {}", index, e);
                return None;
            }
        };

        if end_time < start_time {
            debug!("Skipping cue {}: ends before it starts", index);
            return None;
        }

        Some(Cue {
            index,
            start_time,
            end_time,
            time_range: block[1].trim().to_string(),
            lines: block[2..].iter().map(|line| line.to_string()).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

/// Parse SRT content into a document
pub fn parse(content: &str) -> Document {
    Document::parse(content)
}

/// Translated cue ready for output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputCue {
    pub index: usize,
    pub time_range: String,
    pub text: String,
}

/// One VTT document for one target language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDocument {
    /// Target language code
    pub language: String,
    /// Cues in the order of the source document
    pub cues: Vec<OutputCue>,
}

impl OutputDocument {
    /// Pair each cue with its translation, by position.
    ///
    /// `translations[i]` belongs to `document.cues[i]`; a length mismatch is an error.
    pub fn format(
        document: &Document,
        language: &str,
        translations: Vec<String>,
    ) -> Result<Self, SubtitleError> {
        if translations.len() != document.len() {
            return Err(SubtitleError::TranslationCountMismatch {
                language: language.to_string(),
                expected: document.len(),
                actual: translations.len(),
            });
        }

        let cues = document
            .cues
            .iter()
            .zip(translations)
            .map(|(cue, text)| OutputCue {
                index: cue.index,
                time_range: cue.vtt_time_range(),
                text: sanitize_cue_text(&text),
            })
            .collect();

        Ok(Self {
            language: language.to_string(),
            cues,
        })
    }

    /// Serialise to WebVTT
    pub fn to_vtt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for OutputDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", VTT_HEADER)?;
        writeln!(f)?;
        for cue in &self.cues {
            writeln!(f, "{}", cue.index)?;
            writeln!(f, "{}", cue.time_range)?;
            if !cue.text.is_empty() {
                writeln!(f, "{}", cue.text)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Drop trailing whitespace and blank lines, which would end the cue early
pub fn sanitize_cue_text(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
