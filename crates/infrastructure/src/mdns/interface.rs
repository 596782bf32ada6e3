//! Interfaces the engine runs on, each with its own record cache.

use super::cache::RecordCache;
use compact_str::CompactString;
use mdnsd_domain::{InterfaceInfo, LinkState};
use std::net::Ipv4Addr;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Fresh cache, publish owned records.
    Start,
    /// Tear down publish sets and clear the cache.
    Reset,
    Nothing,
}

pub fn link_transition(state: LinkState, event: LinkEvent) -> (LinkState, LinkAction) {
    match (state, event) {
        (LinkState::Down, LinkEvent::Up) => (LinkState::Up, LinkAction::Start),
        (LinkState::Up, LinkEvent::Down) => (LinkState::Down, LinkAction::Reset),
        (state, _) => (state, LinkAction::Nothing),
    }
}

pub struct Interface {
    pub info: InterfaceInfo,
    pub state: LinkState,
    pub cache: RecordCache,
}

impl Interface {
    pub fn new(info: InterfaceInfo) -> Self {
        let cache = RecordCache::new(&info.name);
        Self {
            info,
            state: LinkState::Down,
            cache,
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn is_up(&self) -> bool {
        self.state == LinkState::Up
    }
}

#[derive(Default)]
pub struct InterfaceManager {
    interfaces: Vec<Interface>,
}

impl InterfaceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Interface> {
        self.interfaces.iter_mut().find(|i| i.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter()
    }

    pub fn active(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter().filter(|i| i.is_up())
    }

    pub fn active_names(&self) -> Vec<CompactString> {
        self.active().map(|i| CompactString::from(i.name())).collect()
    }

    pub fn caches(&self) -> impl Iterator<Item = &RecordCache> {
        self.active().map(|i| &i.cache)
    }

    /// The active interface a packet from `src` arrived on: the one whose
    /// subnet or peer address contains it.
    pub fn find_by_source(&self, src: Ipv4Addr) -> Option<&Interface> {
        self.active().find(|i| i.info.contains(src))
    }

    /// Reports the link of `info.name` up. An unknown interface is added; a
    /// known one that is down picks up the new addresses.
    pub fn up(&mut self, info: InterfaceInfo) -> LinkAction {
        let iface = match self.interfaces.iter().position(|i| i.info.name == info.name) {
            Some(pos) => &mut self.interfaces[pos],
            None => {
                self.interfaces.push(Interface::new(info.clone()));
                let last = self.interfaces.len() - 1;
                &mut self.interfaces[last]
            }
        };

        let (state, action) = link_transition(iface.state, LinkEvent::Up);
        if action == LinkAction::Start {
            iface.info = info;
            iface.cache = RecordCache::new(&iface.info.name);
            info!(
                iface = %iface.info.name,
                address = %iface.info.address,
                netmask = %iface.info.netmask,
                "Interface up"
            );
        }
        iface.state = state;
        action
    }

    pub fn down(&mut self, name: &str) -> LinkAction {
        let Some(iface) = self.get_mut(name) else {
            debug!(iface = %name, "Down event for unknown interface");
            return LinkAction::Nothing;
        };
        let (state, action) = link_transition(iface.state, LinkEvent::Down);
        if action == LinkAction::Reset {
            info!(iface = %name, "Interface down");
        }
        iface.state = state;
        action
    }
}
