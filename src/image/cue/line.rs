use crate::cd::Msf;
use crate::image::cue::error::{CueError, CueResult};
use std::str::FromStr;

/// Cursor over the whitespace separated fields of one cue sheet line.
pub struct CueLine<'a> {
    rest: &'a str,
}

impl<'a> CueLine<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            rest: line.trim_end_matches('\r'),
        }
    }

    fn next_word(&mut self) -> Option<&'a str> {
        let trimmed = self.rest.trim_start();
        if trimmed.is_empty() {
            self.rest = trimmed;
            return None;
        }
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let (word, rest) = trimmed.split_at(end);
        self.rest = rest;
        Some(word)
    }

    /// Next field upper-cased; an empty string once the line is exhausted.
    pub fn keyword(&mut self) -> String {
        self.next_word()
            .map(|word| word.to_ascii_uppercase())
            .unwrap_or_default()
    }

    /// A double-quoted string (which may contain spaces) or a bare word.
    pub fn string(&mut self, command: &'static str) -> CueResult<String> {
        let trimmed = self.rest.trim_start();
        let Some(quoted) = trimmed.strip_prefix('"') else {
            return self
                .next_word()
                .map(str::to_string)
                .ok_or(CueError::MissingArgument(command));
        };

        let end = quoted
            .find('"')
            .ok_or_else(|| CueError::InvalidQuotedString(trimmed.to_string()))?;
        self.rest = &quoted[end + 1..];
        Ok(quoted[..end].to_string())
    }

    pub fn int<T: FromStr<Err = std::num::ParseIntError>>(
        &mut self,
        command: &'static str,
    ) -> CueResult<T> {
        let word = self.next_word().ok_or(CueError::MissingArgument(command))?;
        Ok(word.parse()?)
    }

    /// An `mm:ss:ff` position converted to frames.
    pub fn frames(&mut self, command: &'static str) -> CueResult<u32> {
        let word = self.next_word().ok_or(CueError::MissingArgument(command))?;
        Ok(parse_msf(word)?.to_frames())
    }
}

pub fn parse_msf(msf_str: &str) -> CueResult<Msf> {
    let parts: Vec<&str> = msf_str.split(':').collect();
    if parts.len() != 3 {
        return Err(CueError::InvalidMSFFormat(msf_str.to_string()));
    }

    let field = |part: &str| {
        part.parse::<u8>()
            .map_err(|_| CueError::InvalidMSFFormat(msf_str.to_string()))
    };

    Ok(Msf::new(field(parts[0])?, field(parts[1])?, field(parts[2])?))
}
