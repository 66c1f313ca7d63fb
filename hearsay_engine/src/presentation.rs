//! What the driver shows: dialogue lines and open choices.
//!
//! The driver owns a [`Presentation`] and lends it to the story on every call, so
//! the story never keeps a reference across a suspension.

use hearsay_data::ClearKind;
use serde::{Deserialize, Serialize};

/// One line of dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub speaker: Option<String>,
    pub text: String,
}

/// A choice the player may currently pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    lines: Vec<Line>,
    choices: Vec<Offer>,
}

impl Presentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn choices(&self) -> &[Offer] {
        &self.choices
    }

    pub fn has_choice(&self, id: &str) -> bool {
        self.choices.iter().any(|offer| offer.id == id)
    }

    /// Replace all dialogue with a single line.
    pub fn say(&mut self, speaker: Option<&str>, text: impl Into<String>) {
        self.lines.clear();
        self.lines.push(Line {
            speaker: speaker.map(str::to_string),
            text: text.into(),
        });
    }

    /// Continue the last line if it belongs to the same speaker, otherwise start a new one.
    pub fn append(&mut self, speaker: Option<&str>, text: &str) {
        if let Some(last) = self.lines.last_mut()
            && last.speaker.as_deref() == speaker
        {
            if !last.text.is_empty() && !text.is_empty() {
                last.text.push(' ');
            }
            last.text.push_str(text);
            return;
        }
        self.lines.push(Line {
            speaker: speaker.map(str::to_string),
            text: text.to_string(),
        });
    }

    /// Open a choice. Offering an id again replaces its text.
    pub fn offer(&mut self, id: impl Into<String>, text: impl Into<String>) {
        let (id, text) = (id.into(), text.into());
        match self.choices.iter_mut().find(|offer| offer.id == id) {
            Some(offer) => offer.text = text,
            None => self.choices.push(Offer { id, text }),
        }
    }

    pub fn clear(&mut self, kind: ClearKind) {
        match kind {
            ClearKind::All => {
                self.lines.clear();
                self.choices.clear();
            },
            ClearKind::Choices => self.choices.clear(),
            ClearKind::Dialog => self.lines.clear(),
        }
    }
}
