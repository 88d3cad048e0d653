//! Navigation commands as data.
//!
//! Everything that can ask the router to move (controls, timers, the CLI
//! script runner) speaks [`NavCommand`]. Commands serialize as an internally
//! tagged object:
//!
//! ```text
//! {"op": "push", "screen": "Settings", "param": {"tab": 2}}
//! {"op": "pop"}
//! {"op": "home"}
//! ```
//!
//! The script form parsed by [`NavCommand::from_str`] is one command per line:
//! `push ID [json]`, `replace ID [json]`, `to ID [json]`, `home [json]`,
//! `pop`, `root`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::registry::ScreenId;
use crate::screen::NavParam;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum NavCommand {
    Push {
        screen: ScreenId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        param: Option<NavParam>,
    },
    Pop,
    PopToRoot,
    Replace {
        screen: ScreenId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        param: Option<NavParam>,
    },
    Home {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        param: Option<NavParam>,
    },
    NavigateTo {
        screen: ScreenId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        param: Option<NavParam>,
    },
}

impl NavCommand {
    pub fn push(screen: impl Into<ScreenId>) -> Self {
        NavCommand::Push {
            screen: screen.into(),
            param: None,
        }
    }

    pub fn replace(screen: impl Into<ScreenId>) -> Self {
        NavCommand::Replace {
            screen: screen.into(),
            param: None,
        }
    }

    pub fn navigate_to(screen: impl Into<ScreenId>) -> Self {
        NavCommand::NavigateTo {
            screen: screen.into(),
            param: None,
        }
    }

    pub fn home() -> Self {
        NavCommand::Home { param: None }
    }

    /// Attaches `param` to commands that carry one; no-op for the rest.
    pub fn with_param(mut self, value: NavParam) -> Self {
        match &mut self {
            NavCommand::Push { param, .. }
            | NavCommand::Replace { param, .. }
            | NavCommand::Home { param }
            | NavCommand::NavigateTo { param, .. } => *param = Some(value),
            NavCommand::Pop | NavCommand::PopToRoot => {}
        }
        self
    }

    /// Screen the command names explicitly, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            NavCommand::Push { screen, .. }
            | NavCommand::Replace { screen, .. }
            | NavCommand::NavigateTo { screen, .. } => Some(screen),
            NavCommand::Pop | NavCommand::PopToRoot | NavCommand::Home { .. } => None,
        }
    }

    pub fn param(&self) -> Option<&NavParam> {
        match self {
            NavCommand::Push { param, .. }
            | NavCommand::Replace { param, .. }
            | NavCommand::Home { param }
            | NavCommand::NavigateTo { param, .. } => param.as_ref(),
            NavCommand::Pop | NavCommand::PopToRoot => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NavCommand::Push { .. } => "push",
            NavCommand::Pop => "pop",
            NavCommand::PopToRoot => "pop-to-root",
            NavCommand::Replace { .. } => "replace",
            NavCommand::Home { .. } => "home",
            NavCommand::NavigateTo { .. } => "navigate-to",
        }
    }
}

impl fmt::Display for NavCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            Some(screen) => write!(f, "{} {}", self.name(), screen)?,
            None => write!(f, "{}", self.name())?,
        }
        if let Some(param) = self.param() {
            write!(f, " {}", param)?;
        }
        Ok(())
    }
}

// ============================================================================
// Script parsing
// ============================================================================

#[derive(Debug, PartialEq)]
pub enum ParseCommandError {
    Empty,
    UnknownVerb(String),
    MissingScreen(&'static str),
    BadParam(String),
}

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCommandError::Empty => write!(f, "empty command"),
            ParseCommandError::UnknownVerb(v) => write!(f, "unknown command '{v}'"),
            ParseCommandError::MissingScreen(verb) => write!(f, "'{verb}' needs a screen id"),
            ParseCommandError::BadParam(e) => write!(f, "param is not valid JSON: {e}"),
        }
    }
}

impl std::error::Error for ParseCommandError {}

impl FromStr for NavCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(v, r)| (v, r.trim()));

        match verb {
            "" => Err(ParseCommandError::Empty),
            "pop" => Ok(NavCommand::Pop),
            "root" | "pop-to-root" => Ok(NavCommand::PopToRoot),
            "home" => Ok(NavCommand::Home {
                param: parse_param(rest)?,
            }),
            "push" | "replace" | "to" | "navigate-to" => {
                let (screen, json) = rest
                    .split_once(char::is_whitespace)
                    .map_or((rest, ""), |(s, j)| (s, j.trim()));
                if screen.is_empty() {
                    return Err(ParseCommandError::MissingScreen(match verb {
                        "push" => "push",
                        "replace" => "replace",
                        _ => "to",
                    }));
                }
                let screen = screen.to_string();
                let param = parse_param(json)?;
                Ok(match verb {
                    "push" => NavCommand::Push { screen, param },
                    "replace" => NavCommand::Replace { screen, param },
                    _ => NavCommand::NavigateTo { screen, param },
                })
            }
            other => Err(ParseCommandError::UnknownVerb(other.to_string())),
        }
    }
}

fn parse_param(raw: &str) -> Result<Option<NavParam>, ParseCommandError> {
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(raw)
        .map(Some)
        .map_err(|e| ParseCommandError::BadParam(e.to_string()))
}
