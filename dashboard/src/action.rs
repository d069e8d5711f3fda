//! Lifecycle verbs accepted on `POST /containers/{id}/{action}`

use std::fmt;
use std::str::FromStr;

use crate::engine::{ContainerEngine, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Pause,
    Unpause,
    Stop,
}

/// The verb in the URL is not one of the four lifecycle actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "start" => Ok(Action::Start),
            "pause" => Ok(Action::Pause),
            "unpause" => Ok(Action::Unpause),
            "stop" => Ok(Action::Stop),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Action::Start => "start",
            Action::Pause => "pause",
            Action::Unpause => "unpause",
            Action::Stop => "stop",
        };
        f.write_str(verb)
    }
}

impl Action {
    /// Issue the matching engine call, with engine defaults for every option.
    pub async fn apply(self, engine: &dyn ContainerEngine, id: &str) -> Result<()> {
        match self {
            Action::Start => engine.start(id).await,
            Action::Pause => engine.pause(id).await,
            Action::Unpause => engine.unpause(id).await,
            Action::Stop => engine.stop(id).await,
        }
    }
}
