use std::collections::HashMap;

use tagwm_utils::{is_descendant, ProcessTree};
use x11rb::protocol::xproto::Window;

use crate::window::client::Client;

/// Terminals hidden behind the windows they spawned, keyed by substitute.
#[derive(Debug, Default)]
pub struct Substitutions {
    entries: HashMap<Window, Client>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, substitute: Window, terminal: Client) {
        self.entries.insert(substitute, terminal);
    }

    /// Whether `substitute` is standing in for a terminal.
    pub fn is_substitute(&self, substitute: Window) -> bool {
        self.entries.contains_key(&substitute)
    }

    /// The substitute currently occupying `terminal`'s slot.
    pub fn displaced_by(&self, terminal: Window) -> Option<Window> {
        self.entries
            .iter()
            .find(|(_, c)| c.window == terminal)
            .map(|(s, _)| *s)
    }

    pub fn take(&mut self, substitute: Window) -> Option<Client> {
        self.entries.remove(&substitute)
    }

    /// Drop the record of a hidden terminal that went away on its own.
    pub fn forget_terminal(&mut self, terminal: Window) -> Option<Client> {
        let substitute = self.displaced_by(terminal)?;
        self.entries.remove(&substitute)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether `client` is allowed to take a terminal's place.
pub fn can_swallow(client: &Client, swallow_floating: bool) -> bool {
    !(client.no_swallow || client.is_terminal || (client.is_floating && !swallow_floating))
}

/// The managed terminal whose process spawned `pid`, if any.
pub fn find_terminal<'a>(
    clients: impl IntoIterator<Item = &'a Client>,
    substitutions: &Substitutions,
    tree: &dyn ProcessTree,
    pid: u32,
) -> Option<Window> {
    if pid == 0 {
        return None;
    }
    clients
        .into_iter()
        .filter(|c| c.is_terminal && c.pid != 0 && c.pid != pid)
        .filter(|c| !substitutions.is_substitute(c.window))
        .find(|c| is_descendant(tree, c.pid, pid))
        .map(|c| c.window)
}

/// Put `new` where `old` sits in `list`. Returns false when `old` is absent.
pub fn splice(list: &mut [Window], old: Window, new: Window) -> bool {
    match list.iter_mut().find(|w| **w == old) {
        Some(slot) => {
            *slot = new;
            true
        }
        None => false,
    }
}
