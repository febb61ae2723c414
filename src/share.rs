use std::io::Write;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

pub const SHARE_TITLE: &str = "足球賽事";
pub const COPIED_NOTICE: &str = "賽事信息已複製到剪貼板！";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Whatever the host offers for sharing: a native share sheet and/or a clipboard.
pub trait SharePlatform {
    fn supports_native_share(&self) -> bool {
        false
    }

    fn native_share(&mut self, _payload: &SharePayload) -> Result<()> {
        Err(anyhow::anyhow!("native share unavailable"))
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// No fixture with that id; nothing happened.
    NotFound,
    Shared,
    Copied,
    CopyFailed(String),
}

/// Clipboard through the OSC 52 terminal escape; most modern terminals honour it.
pub struct Osc52Clipboard<W: Write> {
    out: W,
}

impl<W: Write> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SharePlatform for Osc52Clipboard<W> {
    fn copy_to_clipboard(&mut self, text: &str) -> Result<()> {
        let seq = osc52_sequence(text);
        self.out
            .write_all(seq.as_bytes())
            .context("write clipboard escape")?;
        self.out.flush().context("flush clipboard escape")?;
        Ok(())
    }
}

pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", BASE64.encode(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osc52_wraps_base64_payload() {
        let mut clip = Osc52Clipboard::new(Vec::new());
        clip.copy_to_clipboard("hi").expect("vec writer");
        let written = String::from_utf8(clip.into_inner()).expect("utf8");
        assert_eq!(written, "\x1b]52;c;aGk=\x07");
        assert!(!clip_supports_native());
    }

    fn clip_supports_native() -> bool {
        Osc52Clipboard::new(Vec::<u8>::new()).supports_native_share()
    }
}
