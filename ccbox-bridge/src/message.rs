//! Bridge messages (§4.H): every state mutation flows through one of
//! these, whether it originates from the ticker, stdin, or a detached
//! action task reporting back.

use crate::state::ContainerInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Quit,
    New,
    Stop,
    Record,
    Paste,
    Enter,
    Other(char),
}

#[derive(Debug, Clone)]
pub enum Msg {
    Tick,
    Refresh(Vec<ContainerInfo>),
    Key(Key),
    StatusMsg(String),
    ContainerStopped(String),
    Resize(u16, u16),
}
