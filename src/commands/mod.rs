pub mod feeds;
pub mod hello;
pub mod ingest;
pub mod init;

use crate::console::Console;

/// Per-invocation state handed to every command.
pub(crate) struct Context {
    pub console: Console,
}

impl Context {
    pub(crate) fn new() -> Self {
        Self {
            console: Console::stderr(),
        }
    }
}
